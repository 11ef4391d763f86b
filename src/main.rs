use std::error::Error;
use std::sync::Arc;

use futures::future::FutureExt;
use tokio::sync::mpsc;
use warp::Filter;

use log::{error, info, initialize_logger};
use stride::config::{get_variable, CompanyDetails};
use stride::db::PgDb;
use stride::environment::{Config, Environment};
use stride::routes;
use stride::urls::Urls;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("STRIDE_PORT").parse()?;
    let admin_port: u16 = get_variable("STRIDE_ADMIN_PORT").parse()?;

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("STRIDE_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string).await?;
    let db = Arc::new(PgDb::new(pool));

    let urls = Arc::new(Urls::new(
        get_variable("STRIDE_BASE_URL"),
        get_variable("STRIDE_API_PATH"),
    )?);

    let config = Config::new(CompanyDetails::from_env());
    let environment = Environment::new(logger.clone(), db, urls, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate: routes::admin::TerminationFunctionWrapper = {
        let logger = logger.clone();

        Arc::new(move || {
            let termination_sender = termination_sender.clone();
            let logger = logger.clone();

            async move {
                if termination_sender.send(()).await.is_err() {
                    error!(logger, "Termination was already requested");
                }
            }
            .boxed()
        })
    };

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let (_, main_server) = warp::serve(routes::make_api_routes(environment.clone()))
            .bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    info!(logger, "Listening..."; "version" => info::VERSION, "revision" => info::REVISION);
    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
