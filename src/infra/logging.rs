//! Structured logging setup
//!
//! Level is configurable via the RUST_LOG env var (default: info). Logs go to
//! stderr so stdout stays free for the JSON report.

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `json` switches to one JSON object per line for log shipping.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
