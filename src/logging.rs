use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Map a `LOG_LEVEL` value to a filter directive; unknown values fall back
/// to `default_level`
fn level_directive<'a>(log_level: &str, default_level: &'a str) -> &'a str {
    match log_level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => default_level,
    }
}

/// Build the filter from `RUST_LOG`, then `LOG_LEVEL`, then `default_level`
pub fn env_filter(default_level: &str) -> EnvFilter {
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        // Use RUST_LOG if set (allows module-specific logging)
        EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new(default_level))
    } else if let Ok(log_level) = std::env::var("LOG_LEVEL") {
        EnvFilter::new(level_directive(&log_level, default_level))
    } else {
        EnvFilter::new(default_level)
    }
}

/// Logs go to stderr: stdout carries MCP frames and chat output
pub fn init_logging(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .compact()
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
