use slog::{o, Drain, FilterLevel, Logger};
use std::env;

pub mod codes;

/// Name of the environment variable holding the `slog-envlogger` filter,
/// e.g. `POSTGRAPH_LOG=postgraph_graphql=debug`
pub const LOG_ENV_VAR: &str = "POSTGRAPH_LOG";

pub fn logger(show_debug: bool) -> Logger {
    logger_with_levels(show_debug, env::var(LOG_ENV_VAR).ok().as_deref())
}

pub fn logger_with_levels(show_debug: bool, levels: Option<&str>) -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();

    let mut builder = slog_envlogger::LogBuilder::new(drain);
    builder = match levels {
        Some(levels) => builder.parse(levels),
        None => builder.filter(
            None,
            if show_debug {
                FilterLevel::Debug
            } else {
                FilterLevel::Info
            },
        ),
    };
    let drain = builder.build();

    let drain = slog_async::Async::new(drain)
        .chan_size(20000)
        .build()
        .fuse();
    Logger::root(drain, o!())
}

/// A logger that throws everything away, for tests
pub fn discard() -> Logger {
    Logger::root(slog::Discard, o!())
}
