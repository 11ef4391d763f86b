use std::sync::Arc;

use log::{error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, Reply, WithStatus};
use warp::Filter;

use crate::environment::Environment;
use crate::errors::{BackendError, ErrorKind};

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The maximum form data size to accept. This should be enforced by
/// the HTTP gateway, so on the Rust side it’s set to an unreasonably
/// large number.
const MAX_CONTENT_LENGTH: u64 = 64 * 1024 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);
        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status_code_for(e)));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    match e.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidState | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Permission => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Every public route, with backend errors turned into JSON responses.
pub fn make_api_routes(
    environment: Environment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    let logger = environment.logger.clone();

    make_company_details_route(environment.clone())
        .or(make_runs_list_route(environment.clone()))
        .or(make_run_creation_route(environment.clone()))
        .or(make_run_retrieval_route(environment.clone()))
        .or(make_run_update_route(environment.clone()))
        .or(make_run_start_route(environment.clone()))
        .or(make_run_stop_route(environment.clone()))
        .or(make_positions_list_route(environment.clone()))
        .or(make_position_route(environment.clone()))
        .or(make_users_list_route(environment.clone()))
        .or(make_user_detail_route(environment.clone()))
        .or(make_athlete_info_route(environment.clone()))
        .or(make_athlete_info_update_route(environment.clone()))
        .or(make_challenges_list_route(environment.clone()))
        .or(make_challenges_summary_route(environment.clone()))
        .or(make_items_list_route(environment.clone()))
        .or(make_item_creation_route(environment.clone()))
        .or(make_upload_route(environment.clone()))
        .or(make_subscription_route(environment.clone()))
        .or(make_rating_route(environment.clone()))
        .or(make_analytics_route(environment))
        .recover(move |r| format_rejection(logger.clone(), r))
}

mod internal {
    use warp::body::json;
    use warp::filters::multipart::form;
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{get as g, patch, path as p, path::param as par, post, put, query};

    use super::{handlers, query as q, MAX_CONTENT_LENGTH};
    use crate::athlete::AthleteInfoUpdate;
    use crate::environment::Environment;
    use crate::item::ItemInput;
    use crate::position::PositionSample;
    use crate::run::{NewRun, RunFilter, RunUpdate};
    use crate::Id;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
        ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
        ($route_variable:ident; $first:expr, $($rest:expr),+) => (
            let $route_variable = $route_variable.and($first);
            route_filter!($route_variable; $($rest),+);
        )
    }

    macro_rules! route {
        ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
            pub fn $name(environment: Environment) -> Route {
                let r = environment.urls.api_path.clone();

                let $route_variable = warp::any()
                    .map(move || environment.clone())
                    .and(p(r));

                route_filter!($route_variable; $($filters),+);

                $route_variable.and_then(handlers::$handler)
                    .boxed()
            }
        );
    }

    route!(make_company_details_route => company_details, rt; p("company_details"), end(), g());
    route!(make_runs_list_route => list_runs, rt; p("runs"), end(), g(), query::<RunFilter>());
    route!(make_run_creation_route => create_run, rt; p("runs"), end(), post(), json::<NewRun>());
    route!(make_run_retrieval_route => retrieve_run, rt; p("runs"), par::<Id>(), end(), g());
    route!(make_run_update_route => update_run, rt; p("runs"), par::<Id>(), end(), patch(), json::<RunUpdate>());
    route!(make_run_start_route => start_run, rt; p("runs"), par::<Id>(), p("start"), end(), post());
    route!(make_run_stop_route => stop_run, rt; p("runs"), par::<Id>(), p("stop"), end(), post());
    route!(make_positions_list_route => list_positions, rt; p("positions"), end(), g(), query::<q::PositionQuery>());
    route!(make_position_route => record_position, rt; p("positions"), end(), post(), json::<PositionSample>());
    route!(make_users_list_route => list_users, rt; p("users"), end(), g(), query::<q::UserQuery>());
    route!(make_user_detail_route => user_detail, rt; p("users"), par::<Id>(), end(), g());
    route!(make_athlete_info_route => athlete_info, rt; p("athlete_info"), par::<Id>(), end(), g());
    route!(make_athlete_info_update_route => update_athlete_info, rt; p("athlete_info"), par::<Id>(), end(), put(), json::<AthleteInfoUpdate>());
    route!(make_challenges_list_route => list_challenges, rt; p("challenges"), end(), g(), query::<q::ChallengeQuery>());
    route!(make_challenges_summary_route => challenges_summary, rt; p("challenges_summary"), end(), g());
    route!(make_items_list_route => list_items, rt; p("collectible_item"), end(), g());
    route!(make_item_creation_route => create_item, rt; p("collectible_item"), end(), post(), json::<ItemInput>());
    route!(make_upload_route => upload_items, rt; p("upload_file"), end(), post(), form().max_length(MAX_CONTENT_LENGTH));
    route!(make_subscription_route => subscribe, rt; p("subscribe_to_coach"), par::<Id>(), end(), post(), json::<q::SubscriptionRequest>());
    route!(make_rating_route => rate, rt; p("rate_coach"), par::<Id>(), end(), post(), json::<q::RatingRequest>());
    route!(make_analytics_route => analytics, rt; p("analytics_for_coach"), par::<Id>(), end(), g());
}
