use crate::{log::*, settings::*};
use std::sync::Mutex;

// One per inspection session. Lookup hooks and printers borrow it for the duration of a display request.
pub struct Context {
    pub settings: Settings,
    pub log: Mutex<Log>,
}

impl Context {
    pub fn new(settings: Settings) -> Self { Self {settings, log: Mutex::new(Log::new())} }

    pub fn log_lines(&self) -> Vec<String> {
        match self.log.lock() {
            Ok(log) => log.lines.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for Context { fn default() -> Self { Self::new(Settings::default()) } }
