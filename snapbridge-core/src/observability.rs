//! Logging setup.
//!
//! The library itself only emits through the `log` facade. Nothing is printed
//! until a binary or an adapter calls `enable_verbose_logging`, which installs an
//! `env_logger` exactly once per process.

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Mutex, Once};

use log::LevelFilter;

use crate::error::BridgeError;

static INIT_LOGGER: Once = Once::new();
static INIT_RESULT: Mutex<Option<String>> = Mutex::new(None);

/// Turns on `Debug`-level logging with a `[LEVEL] message` format.
///
/// With `log_file`, records are appended to that file instead of stderr. Only
/// the first call has any effect; later calls report the first call's outcome.
pub fn enable_verbose_logging(log_file: Option<&str>) -> Result<(), BridgeError> {
    INIT_LOGGER.call_once(|| {
        if let Err(e) = install(log_file) {
            if let Ok(mut slot) = INIT_RESULT.lock() {
                *slot = Some(e.to_string());
            }
        }
    });
    match INIT_RESULT.lock() {
        Ok(slot) => match slot.as_ref() {
            Some(reason) => Err(BridgeError::InvalidInput(reason.clone())),
            None => Ok(()),
        },
        Err(_) => Ok(()),
    }
}

fn install(log_file: Option<&str>) -> Result<(), BridgeError> {
    let mut builder = env_logger::Builder::new();

    builder.is_test(false);
    builder.filter_level(LevelFilter::Debug);
    builder.format(|buf, record| {
        writeln!(buf, "[{}] {}", record.level(), record.args())?;
        buf.flush()
    });

    if let Some(filename) = log_file {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(filename)
            .map_err(|e| {
                BridgeError::InvalidInput(format!("cannot open log file {}: {}", filename, e))
            })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // Another logger may already be installed by the embedding application.
    let _ = builder.try_init();
    Ok(())
}
