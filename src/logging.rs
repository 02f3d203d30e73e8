//! Console logging for the `log` facade
//!
//! In the browser every record goes to the matching `console` method with a
//! `[ClearCost]` prefix. Native hosts install their own logger (tests use
//! `env_logger`); `init_logging` there only sets the max level.

use log::{Level, LevelFilter, Log, Metadata, Record};

const PREFIX: &str = "[ClearCost]";

/// Forwards `log` records to `web_sys::console`
pub struct ConsoleLogger;

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        emit(record.level(), &format_message(record.level(), &record.args().to_string()));
    }

    fn flush(&self) {}
}

/// `[ClearCost] message`, with the level spelled out below `Info`
pub fn format_message(level: Level, message: &str) -> String {
    match level {
        Level::Error | Level::Warn | Level::Info => format!("{} {}", PREFIX, message),
        Level::Debug | Level::Trace => format!("{} {}: {}", PREFIX, level, message),
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    let value = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::Error => web_sys::console::error_1(&value),
        Level::Warn => web_sys::console::warn_1(&value),
        Level::Info => web_sys::console::log_1(&value),
        Level::Debug | Level::Trace => web_sys::console::debug_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_level: Level, line: &str) {
    eprintln!("{}", line);
}

/// Install the console logger (browser) and apply `level`.
/// A logger that is already installed is left in place.
pub fn init_logging(level: LevelFilter) {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = log::set_logger(&LOGGER);
    }
    log::set_max_level(level);
}
