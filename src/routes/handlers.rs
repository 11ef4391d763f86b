use std::time::{Duration, Instant};

use log::{debug, info};
use warp::{
    filters::multipart::FormData,
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::athlete::{self, AthleteInfoUpdate};
use crate::challenge;
use crate::coaching::{self, RatingOutcome};
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::io::{parse_upload, FILE_PART};
use crate::item::{self, ItemInput};
use crate::position::{self, PositionSample};
use crate::routes::{
    query::{ChallengeQuery, PositionQuery, RatingRequest, SubscriptionRequest, UserQuery},
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::run::{self, NewRun, RunFilter, RunUpdate};
use crate::user;
use crate::Id;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn company_details(environment: Environment) -> RouteResult {
    timed! {
        json(&environment.config.company)
    }
}

pub async fn list_runs(environment: Environment, filter: RunFilter) -> RouteResult {
    timed! {
        let runs = run::list(&*environment.db, filter)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::runs(filter), e))?;

        json(&runs)
    }
}

pub async fn create_run(environment: Environment, new_run: NewRun) -> RouteResult {
    timed! {
        let athlete = new_run.athlete;
        let error_handler = |e: BackendError| Rejection::new(Context::create_run(athlete), e);

        let run = run::create(&*environment.db, new_run)
            .await
            .map_err(error_handler)?;
        debug!(environment.logger, "Created run"; "id" => run.id(), "athlete" => athlete);

        let location = environment.urls.run(run.id()).map_err(error_handler)?;

        with_header(
            with_status(json(&run), StatusCode::CREATED),
            "location",
            location.as_str(),
        )
    }
}

pub async fn retrieve_run(environment: Environment, id: Id) -> RouteResult {
    timed! {
        let run = run::retrieve(&*environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::run(id, "retrieve"), e))?;

        json(&run)
    }
}

pub async fn update_run(environment: Environment, id: Id, update: RunUpdate) -> RouteResult {
    timed! {
        let run = run::update(&*environment.db, id, update)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::run(id, "update"), e))?;

        json(&run)
    }
}

pub async fn start_run(environment: Environment, id: Id) -> RouteResult {
    timed! {
        let run = run::start(&*environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::run(id, "start"), e))?;
        debug!(environment.logger, "Started run"; "id" => id);

        json(&run)
    }
}

pub async fn stop_run(environment: Environment, id: Id) -> RouteResult {
    timed! {
        let stopped = run::stop(&*environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::run(id, "stop"), e))?;

        let awarded: Vec<_> = stopped.awarded.iter().map(|b| b.full_name()).collect();
        debug!(
            environment.logger, "Finished run";
            "id" => id,
            "distance" => ?stopped.run.distance(),
            "run_time_seconds" => stopped.run.run_time_seconds()
        );

        if !awarded.is_empty() {
            info!(
                environment.logger, "Awarded challenges";
                "athlete" => stopped.run.athlete_id(),
                "challenges" => ?awarded
            );
        };

        json(&stopped.run)
    }
}

pub async fn list_positions(environment: Environment, query: PositionQuery) -> RouteResult {
    timed! {
        let positions = position::list(&*environment.db, query.run)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::positions(query.run), e))?;

        json(&positions)
    }
}

pub async fn record_position(environment: Environment, sample: PositionSample) -> RouteResult {
    timed! {
        let run = sample.run;
        let ingestion = position::record(&*environment.db, sample)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::positions(Some(run)), e))?;

        if !ingestion.collected.is_empty() {
            debug!(environment.logger, "Collected items"; "run" => run, "items" => ?ingestion.collected);
        };

        with_status(json(&ingestion.position), StatusCode::CREATED)
    }
}

pub async fn list_users(environment: Environment, query: UserQuery) -> RouteResult {
    timed! {
        let users = user::list(&*environment.db, query.kind)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::users(query.kind), e))?;

        json(&users)
    }
}

pub async fn user_detail(environment: Environment, id: Id) -> RouteResult {
    timed! {
        let detail = user::detail(&*environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::user(id, "retrieve"), e))?;

        json(&detail)
    }
}

pub async fn athlete_info(environment: Environment, id: Id) -> RouteResult {
    timed! {
        let info = athlete::retrieve(&*environment.db, id)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::user(id, "athlete_info"), e))?;

        json(&info)
    }
}

pub async fn update_athlete_info(
    environment: Environment,
    id: Id,
    update: AthleteInfoUpdate,
) -> RouteResult {
    timed! {
        let info = athlete::update(&*environment.db, id, update)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::user(id, "update_athlete_info"), e))?;

        json(&info)
    }
}

pub async fn list_challenges(environment: Environment, query: ChallengeQuery) -> RouteResult {
    timed! {
        let challenges = challenge::list(&*environment.db, query.athlete)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::challenges(query.athlete), e))?;

        json(&challenges)
    }
}

pub async fn challenges_summary(environment: Environment) -> RouteResult {
    timed! {
        let summary = challenge::summary(&*environment.db)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::challenges(None), e))?;

        json(&summary)
    }
}

pub async fn list_items(environment: Environment) -> RouteResult {
    timed! {
        let items = item::list(&*environment.db)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::items("list"), e))?;

        json(&items)
    }
}

pub async fn create_item(environment: Environment, input: ItemInput) -> RouteResult {
    timed! {
        let item = item::create(&*environment.db, input)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::items("create"), e))?;
        debug!(environment.logger, "Created item"; "id" => item.id(), "uid" => item.uid());

        with_status(json(&item), StatusCode::CREATED)
    }
}

pub async fn upload_items(environment: Environment, content: FormData) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::items("upload"), e);

        debug!(environment.logger, "Parsing submission..."; "part" => FILE_PART);
        let data = parse_upload(content).await.map_err(error_handler)?;

        debug!(environment.logger, "Importing items..."; "bytes" => data.len());
        let failed = item::import(&*environment.db, &data)
            .await
            .map_err(error_handler)?;
        debug!(environment.logger, "Imported items"; "failed" => failed.len());

        json(&SuccessResponse::Upload { failed })
    }
}

pub async fn subscribe(
    environment: Environment,
    coach: Id,
    request: SubscriptionRequest,
) -> RouteResult {
    timed! {
        let athlete = request.athlete;
        coaching::subscribe(&*environment.db, athlete, coach)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::coach(coach, Some(athlete), "subscribe"), e))?;
        debug!(environment.logger, "Subscribed"; "athlete" => athlete, "coach" => coach);

        json(&SuccessResponse::Message {
            message: format!("Athlete {} subscribed to coach {}", athlete, coach),
        })
    }
}

pub async fn rate(environment: Environment, coach: Id, request: RatingRequest) -> RouteResult {
    timed! {
        let RatingRequest { athlete, rating } = request;
        let outcome = coaching::rate(&*environment.db, athlete, coach, rating)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::coach(coach, Some(athlete), "rate"), e))?;

        let verb = match outcome {
            RatingOutcome::Created => "rated",
            RatingOutcome::Updated => "changed their rating of",
        };

        json(&SuccessResponse::Message {
            message: format!("Athlete {} {} coach {}: {}", athlete, verb, coach, rating),
        })
    }
}

pub async fn analytics(environment: Environment, coach: Id) -> RouteResult {
    timed! {
        let analytics = coaching::analytics(&*environment.db, coach)
            .await
            .map_err(|e: BackendError| Rejection::new(Context::coach(coach, None, "analytics"), e))?;

        json(&analytics)
    }
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
