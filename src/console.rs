//! `log` backend for the browser console
//!
//! Installed from the wasm start hook so skipped records and stage
//! summaries show up in devtools. Native builds bring their own logger.

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Forwards `log` records to `console.error/warn/info/debug`
pub struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&console_line(
            record.level(),
            record.target(),
            &record.args().to_string(),
        ));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger at `level`. A logger installed earlier wins.
pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn console_line(level: Level, target: &str, message: &str) -> String {
    format!("[mentiongraph] {} {}: {}", level, target, message)
}
