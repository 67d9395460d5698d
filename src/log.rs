use std::fs::File;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::AppError;

/// The filter used in development: `RUST_LOG` directives, with this crate at `info` by default.
pub fn env_filter() -> Result<EnvFilter, AppError> {
    Ok(EnvFilter::from_default_env().add_directive("tourney_board=info".parse()?))
}

/// Sets up the tracing subscriber for the embedding application.
///
/// Development builds log pretty output to stdout. Release builds only log errors, to `debug.log`.
pub fn setup_tracing() -> Result<(), AppError> {
    if cfg!(debug_assertions) {
        tracing_subscriber::fmt::fmt()
            .with_env_filter(env_filter()?)
            .with_span_events(FmtSpan::NONE)
            .pretty()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;

        return Ok(());
    }

    let log_file = File::create("debug.log")?;

    // Set up tracing with a filter that only logs errors in production
    tracing_subscriber::fmt::fmt()
        .with_span_events(FmtSpan::NONE)
        .with_max_level(LevelFilter::ERROR)
        .with_writer(log_file)
        .pretty()
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}
