//! Mock status display keeping every message shown.

use crate::{Result, traits::StatusDisplay, types::StatusMessage};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock(messages: &Mutex<Vec<StatusMessage>>) -> MutexGuard<'_, Vec<StatusMessage>> {
    messages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock display for testing and development.
#[derive(Debug)]
pub struct MockDisplay {
    messages: Arc<Mutex<Vec<StatusMessage>>>,
}

impl MockDisplay {
    pub fn new() -> (Self, MockDisplayHandle) {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let handle = MockDisplayHandle {
            messages: Arc::clone(&messages),
        };
        (Self { messages }, handle)
    }
}

impl StatusDisplay for MockDisplay {
    async fn show(&mut self, message: &StatusMessage) -> Result<()> {
        lock(&self.messages).push(message.clone());
        Ok(())
    }
}

/// Handle for reading what a mock display has shown.
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    messages: Arc<Mutex<Vec<StatusMessage>>>,
}

impl MockDisplayHandle {
    pub fn messages(&self) -> Vec<StatusMessage> {
        lock(&self.messages).clone()
    }

    /// Texts of every message, in order.
    pub fn texts(&self) -> Vec<String> {
        lock(&self.messages).iter().map(|m| m.text.clone()).collect()
    }

    pub fn last(&self) -> Option<StatusMessage> {
        lock(&self.messages).last().cloned()
    }

    /// Whether any message so far contained `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        lock(&self.messages).iter().any(|m| m.text.contains(needle))
    }

    pub fn clear(&self) {
        lock(&self.messages).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_messages_are_kept_in_order() {
        let (mut display, handle) = MockDisplay::new();

        display
            .show(&StatusMessage::normal("Ready", Duration::ZERO))
            .await
            .unwrap();
        display
            .show(&StatusMessage::success("Welcome, Ana", Duration::from_secs(3)))
            .await
            .unwrap();

        assert_eq!(handle.texts(), vec!["Ready", "Welcome, Ana"]);
        assert!(handle.contains("Ana"));
        assert_eq!(handle.last().unwrap().text, "Welcome, Ana");

        handle.clear();
        assert!(handle.messages().is_empty());
    }
}
