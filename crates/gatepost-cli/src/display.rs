//! Status display on the process log.
//!
//! Headless terminals have no screen; every message goes to the log at a
//! level matching its emphasis.

use gatepost_hardware::{Emphasis, Result, StatusDisplay, StatusMessage};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    last: Option<String>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of the last message shown.
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

impl StatusDisplay for ConsoleDisplay {
    async fn show(&mut self, message: &StatusMessage) -> Result<()> {
        match message.emphasis {
            Emphasis::Failure => warn!(target: "display", text = %message.text, "Status"),
            _ => info!(
                target: "display",
                text = %message.text,
                emphasis = %message.emphasis,
                "Status"
            ),
        }
        self.last = Some(message.text.clone());
        Ok(())
    }
}
