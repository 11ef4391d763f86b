use std::sync::Mutex;

use slog::Drain;
use slog::Fuse;
use slog_async::Async;
use slog_json::Json;

pub use slog::{debug, error, info, o, trace, warn, Discard, Logger};

/// Builds the root logger: JSON records on standard error, written from a
/// background thread, tagged with the build information.
pub fn initialize_logger() -> Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);
    let drain = Async::new(drain).build().fuse();

    #[cfg(feature = "env_logging")]
    let drain = slog_envlogger::new(drain).fuse();

    Logger::root(
        drain,
        o!("service" => info::NAME, "version" => info::VERSION, "revision" => info::REVISION, "build_timestamp" => info::BUILD_TIMESTAMP),
    )
}

/// Returns a logger that drops every record.
pub fn discard() -> Logger {
    Logger::root(Discard, o!())
}
