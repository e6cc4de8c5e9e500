//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - `LOG_LEVEL` controls the filter (e.g. "debug" or directives like
//!   "info,rush=debug,rush_supply=debug").
//! - `LOG_FORMAT` selects "pretty" (default) or "json" structured logs.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
        EnvFilter::new("info,rush=info,rush_supply=info,rush_score=info,rush_api=warn")
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}
