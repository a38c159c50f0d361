use std::collections::VecDeque;

// Diagnostics for the developer, not for the user: which value failed to decode and why.
// Printers never surface errors to the front-end (they degrade to a placeholder or a truncated list), so this is the only trace of them.
pub struct Log {
    pub lines: VecDeque<String>,
}

const MAX_LINES: usize = 100;

impl Log {
    pub fn new() -> Log {
        Log {lines: VecDeque::new()}
    }

    pub fn add_line(&mut self, line: String) {
        self.lines.push_back(line);
        while self.lines.len() > MAX_LINES {
            self.lines.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
impl Default for Log { fn default() -> Self { Self::new() } }

#[macro_export]
macro_rules! log {
    ($log:expr, $($arg:tt)*) => (
        ($log).add_line(format!($($arg)*))
    );
}
