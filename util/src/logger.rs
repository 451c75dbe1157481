//! Generic logger utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Log levels of an executable, normally the `[log]` table of its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogParams {
    /// Level of every module without an override, `debug` or `trace` are accepted as well as
    /// any higher level.
    pub level: String,

    /// Level overrides keyed by module path, e.g. `"arm_lib::sim" = "info"`.
    pub modules: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level less than `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Unknown log level {0:?}")]
    UnknownLevel(String),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LogParams {
    fn default() -> Self {
        let mut modules = BTreeMap::new();

        // The simulated equipment logs every accepted demand
        modules.insert("arm_lib::sim".to_string(), "info".to_string());

        Self {
            level: "debug".to_string(),
            modules,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// Records are written both to stdout and to the session's log file.
///
/// # Notes
///
/// - The default level must be greater than `log::Level::Info`. Module overrides may be any
///   level.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    params: &LogParams,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    let min_level = parse_level(&params.level)?;
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let overrides = params
        .modules
        .iter()
        .map(|(module, level)| Ok((module.clone(), parse_level(level)?)))
        .collect::<Result<Vec<_>, LoggerInitError>>()?;

    let log_file =
        fern::log_file(session.log_file_path.clone()).map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new().level(min_level);
    for (module, level) in overrides.iter() {
        dispatch = dispatch.level_for(module.clone(), *level);
    }

    dispatch
        .format(|out, message, record| {
            // If debug or trace include the target, otherwise don't include it
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    for (module, level) in overrides.iter() {
        info!("    Log level of {}: {:?}", module, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse a level name such as `info` or `DEBUG`.
fn parse_level(level: &str) -> Result<LevelFilter, LoggerInitError> {
    level
        .trim()
        .parse()
        .map_err(|_| LoggerInitError::UnknownLevel(level.to_string()))
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::Info);
        assert_eq!(parse_level(" TRACE ").unwrap(), LevelFilter::Trace);
        assert!(matches!(
            parse_level("loud"),
            Err(LoggerInitError::UnknownLevel(ref l)) if l == "loud"
        ));
    }

    #[test]
    fn test_log_params() {
        let params: LogParams = crate::params::from_str(
            r#"
            level = "trace"

            [modules]
            "arm_lib::motion_seq" = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(params.level, "trace");
        assert_eq!(params.modules.len(), 1);
        assert_eq!(params.modules["arm_lib::motion_seq"], "debug");

        let default = LogParams::default();
        assert_eq!(parse_level(&default.level).unwrap(), LevelFilter::Debug);
        assert_eq!(default.modules["arm_lib::sim"], "info");
    }
}
