//! Mock gate relay recording every state change.

use crate::{HardwareError, Result, traits::Relay};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;

#[derive(Debug, Default)]
struct RelayState {
    active: bool,
    transitions: Vec<(bool, Instant)>,
    fail_next: bool,
}

fn lock(state: &Mutex<RelayState>) -> MutexGuard<'_, RelayState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock relay for testing and development.
///
/// Transitions are timestamped with [`tokio::time::Instant`], so tests
/// running on a paused clock can check hold durations exactly.
#[derive(Debug)]
pub struct MockRelay {
    state: Arc<Mutex<RelayState>>,
}

impl MockRelay {
    pub fn new() -> (Self, MockRelayHandle) {
        let state = Arc::new(Mutex::new(RelayState::default()));
        let handle = MockRelayHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl Relay for MockRelay {
    async fn set_active(&mut self, active: bool) -> Result<()> {
        let mut state = lock(&self.state);

        if state.fail_next {
            state.fail_next = false;
            return Err(HardwareError::communication("relay driver not responding"));
        }

        state.active = active;
        state.transitions.push((active, Instant::now()));
        Ok(())
    }
}

/// Handle for inspecting a mock relay.
#[derive(Debug, Clone)]
pub struct MockRelayHandle {
    state: Arc<Mutex<RelayState>>,
}

impl MockRelayHandle {
    pub fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    /// Number of times the relay was energized.
    pub fn activations(&self) -> usize {
        lock(&self.state)
            .transitions
            .iter()
            .filter(|(active, _)| *active)
            .count()
    }

    /// Every state change, in order.
    pub fn transitions(&self) -> Vec<(bool, Instant)> {
        lock(&self.state).transitions.clone()
    }

    /// Durations of completed activate/release pairs.
    pub fn pulse_lengths(&self) -> Vec<std::time::Duration> {
        lock(&self.state)
            .transitions
            .windows(2)
            .filter(|pair| pair[0].0 && !pair[1].0)
            .map(|pair| pair[1].1 - pair[0].1)
            .collect()
    }

    /// The next `set_active` call fails.
    pub fn fail_next(&self) {
        lock(&self.state).fail_next = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_pulse_is_recorded() {
        let (mut relay, handle) = MockRelay::new();

        relay.set_active(true).await.unwrap();
        assert!(handle.is_active());
        tokio::time::sleep(Duration::from_millis(250)).await;
        relay.set_active(false).await.unwrap();

        assert!(!handle.is_active());
        assert_eq!(handle.activations(), 1);
        assert_eq!(handle.pulse_lengths(), vec![Duration::from_millis(250)]);
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_state() {
        let (mut relay, handle) = MockRelay::new();
        handle.fail_next();

        assert!(relay.set_active(true).await.is_err());
        assert!(!handle.is_active());
        assert!(handle.transitions().is_empty());

        relay.set_active(true).await.unwrap();
        assert!(handle.is_active());
    }
}
