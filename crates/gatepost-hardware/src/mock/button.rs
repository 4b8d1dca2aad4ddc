//! Mock exit button.

use crate::{Result, traits::ExitButton};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock exit button for testing and development.
///
/// Each press queued through the handle is reported by exactly one
/// `is_pressed()` poll.
#[derive(Debug)]
pub struct MockButton {
    presses: Arc<AtomicUsize>,
}

impl MockButton {
    pub fn new() -> (Self, MockButtonHandle) {
        let presses = Arc::new(AtomicUsize::new(0));
        let handle = MockButtonHandle {
            presses: Arc::clone(&presses),
        };
        (Self { presses }, handle)
    }
}

impl ExitButton for MockButton {
    async fn is_pressed(&mut self) -> Result<bool> {
        let taken = self
            .presses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        Ok(taken.is_ok())
    }
}

/// Handle for pressing a mock exit button.
#[derive(Debug, Clone)]
pub struct MockButtonHandle {
    presses: Arc<AtomicUsize>,
}

impl MockButtonHandle {
    pub fn press(&self) {
        self.presses.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_each_press_reported_once() {
        let (mut button, handle) = MockButton::new();
        assert!(!button.is_pressed().await.unwrap());

        handle.press();
        handle.press();
        assert!(button.is_pressed().await.unwrap());
        assert!(button.is_pressed().await.unwrap());
        assert!(!button.is_pressed().await.unwrap());
    }
}
