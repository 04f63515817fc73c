//! Host-installed logging over the `log` facade.
//!
//! The bridge records its diagnostics (dropped messages, denied origins,
//! doomed replies, ceremony failures) through the standard `log` macros.
//! The embedding host supplies a [`Logger`] implementation to receive those
//! records, typically forwarding them to the platform log sink.

use std::sync::{Arc, OnceLock};

/// Severity of a forwarded log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Very low priority, extremely detailed messages.
    Trace,
    /// Debugging information.
    Debug,
    /// Progress of normal bridge operation.
    Info,
    /// Potentially harmful situations.
    Warn,
    /// Failures the bridge recovered from.
    Error,
}

/// Receives bridge log records on the host side.
pub trait Logger: Send + Sync {
    /// Handles one log record.
    fn log(&self, level: LogLevel, message: String);
}

/// Adapter forwarding `log` records to the host-provided [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        // Debug/trace chatter from foreign crates is not the host's concern.
        let from_bridge = record
            .module_path()
            .is_some_and(|path| path.starts_with("passkey_bridge"));
        let low_priority = record.level() == log::Level::Debug
            || record.level() == log::Level::Trace;
        if low_priority && !from_bridge {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(log_level(record.level()), format!("{}", record.args()));
        }
    }

    fn flush(&self) {}
}

const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

/// The host-provided logger, installed once per process.
static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Installs the host's logger and wires it into the `log` facade.
///
/// Call once, before the bridge handles any message. A second call is
/// ignored with a note on stderr rather than replacing the sink.
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("passkey-bridge logger already set");
        return;
    }
    static FORWARDER: ForeignLogger = ForeignLogger;
    if log::set_logger(&FORWARDER).is_ok() {
        log::set_max_level(log::LevelFilter::Trace);
    }
}
