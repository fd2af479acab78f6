// ==========================================
// KBO Loader - Logging setup
// ==========================================
// tracing + tracing-subscriber, level from RUST_LOG
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// Set to "json" for one JSON object per log line
pub const LOG_FORMAT_ENV: &str = "KBO_LOADER_LOG_FORMAT";

/// Initialises logging
///
/// # Environment
/// - RUST_LOG: filter (default: info),
///   e.g. RUST_LOG=debug or RUST_LOG=kbo_loader::importer=trace
/// - KBO_LOADER_LOG_FORMAT=json: structured output
///
/// # Example
/// ```no_run
/// use kbo_loader::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Test logging: debug level, captured by the test harness
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
