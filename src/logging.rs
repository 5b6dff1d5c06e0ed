use log::{debug, error, info, log_enabled, warn, Level};

/// Initializes the logger with the `env_logger` crate.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger() {
    let _ = env_logger::try_init();
}

/// Logging initialization honouring an explicit default filter.
///
/// `RUST_LOG` still takes precedence when it is set.
///
/// # Examples
/// ```rust,no_run
/// use rail_netdev::logging::init_enhanced_logging;
///
/// init_enhanced_logging("debug").expect("Failed to initialize logging");
/// log::info!("driver starting");
/// ```
pub fn init_enhanced_logging(
    default_filter: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_micros()
        .try_init()?;
    Ok(())
}

/// Logs an error message.
pub fn log_error(message: &str) {
    if log_enabled!(Level::Error) {
        error!("{message}");
    }
}

/// Logs a warning message.
pub fn log_warn(message: &str) {
    if log_enabled!(Level::Warn) {
        warn!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

/// Logs a debug message.
pub fn log_debug(message: &str) {
    if log_enabled!(Level::Debug) {
        debug!("{message}");
    }
}
