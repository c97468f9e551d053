//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "QUANTDESK_LOG";

/// Filter directive: `QUANTDESK_LOG` if set, otherwise `level`.
pub fn resolve_filter(level: &str) -> String {
    std::env::var(LOG_ENV).unwrap_or_else(|_| level.to_string())
}

/// Install the global subscriber. `format` is `text` or `compact`.
///
/// Logs go to stderr so stdout stays clean for tables and symbol lists.
pub fn init_tracing(level: &str, format: &str) -> Result<(), String> {
    let env_filter = EnvFilter::try_new(resolve_filter(level))
        .map_err(|err| format!("invalid log filter: {err}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match format.trim().to_lowercase().as_str() {
        "text" | "" => builder
            .try_init()
            .map_err(|err| format!("failed to install subscriber: {err}")),
        "compact" => builder
            .compact()
            .try_init()
            .map_err(|err| format!("failed to install subscriber: {err}")),
        other => Err(format!("unknown log format '{other}', expected text or compact")),
    }
}
