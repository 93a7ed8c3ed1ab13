//! Observability hooks for the transform engine.
//!
//! The engine logs through the `log` facade only; the host decides where the
//! records go. `log_metric!` emits one structured key/value line per call at
//! debug level, and `enable_verbose_logging` wires up `env_logger` for hosts
//! (and tests) that have no logger of their own.

use log::LevelFilter;
use std::fs::OpenOptions;
use std::sync::Once;

/// Logs a structured key-value metric line at debug level.
///
/// # Example
/// ```
/// use stepflow::log_metric;
/// let samples = 4;
/// log_metric!("event"="stage_done", "stage"="accumulate", "samples"=&samples);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if $crate::__log::log_enabled!($crate::__log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            $crate::__log::debug!("STEPFLOW_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend at `level`, optionally appending to `log_file`.
///
/// Only the first call has an effect. If another logger is already installed the
/// call is a no-op, as is a log file that cannot be opened (records then go to stderr).
pub fn enable_verbose_logging(level: LevelFilter, log_file: Option<&str>) {
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        // Just the level and the message.
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())
        });

        if let Some(filename) = log_file {
            match OpenOptions::new().append(true).create(true).open(filename) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => eprintln!("stepflow: could not open log file {}: {}", filename, e),
            }
        }

        let _ = builder.try_init();
    });
}
