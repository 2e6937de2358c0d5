//! Run log that writes straight to the terminal.

use projagg_core::log::RunLog;

/// Prints run lines to stdout as they arrive.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLog;

impl RunLog for ConsoleLog {
    fn log(&self, line: &str) {
        println!("{}", line);
    }
}
