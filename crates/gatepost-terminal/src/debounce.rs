//! Minimum spacing between accepted credentials.

use gatepost_core::CredentialEvent;
use gatepost_core::constants::DEBOUNCE_COOLDOWN_MS;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cooldown shared by every credential kind.
///
/// A tag read 2 s after a fingerprint match is rejected just like a second
/// tag would be.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    cooldown: Duration,
    last_accepted_at: Option<Instant>,
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_COOLDOWN_MS))
    }
}

impl DebounceGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted_at: None,
        }
    }

    /// Admit `event` if the cooldown has passed since the last admitted one.
    ///
    /// The first event is always admitted. The window is inclusive: an event
    /// exactly `cooldown` after the previous one gets through. Rejected
    /// events do not restart the window.
    pub fn admit(&mut self, event: &CredentialEvent) -> bool {
        let now = event.observed_at();

        if let Some(last) = self.last_accepted_at {
            let since = now.saturating_duration_since(last);
            if since < self.cooldown {
                debug!(
                    credential = %event,
                    since_ms = since.as_millis() as u64,
                    "Credential inside cooldown"
                );
                return false;
            }
        }

        self.last_accepted_at = Some(now);
        true
    }

    pub fn last_accepted_at(&self) -> Option<Instant> {
        self.last_accepted_at
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatepost_core::TemplateId;
    use rstest::rstest;

    fn tag_at(base: Instant, ms: u64) -> CredentialEvent {
        CredentialEvent::tag(1, base + Duration::from_millis(ms))
    }

    #[test]
    fn test_first_event_admitted() {
        let mut gate = DebounceGate::default();
        assert!(gate.admit(&tag_at(Instant::now(), 0)));
    }

    #[rstest]
    #[case(1, false)]
    #[case(5999, false)]
    #[case(6000, true)]
    #[case(6001, true)]
    #[case(60_000, true)]
    fn test_cooldown_boundary(#[case] gap_ms: u64, #[case] admitted: bool) {
        let base = Instant::now();
        let mut gate = DebounceGate::default();
        assert!(gate.admit(&tag_at(base, 0)));
        assert_eq!(gate.admit(&tag_at(base, gap_ms)), admitted);
    }

    #[test]
    fn test_rejection_does_not_restart_window() {
        let base = Instant::now();
        let mut gate = DebounceGate::default();

        assert!(gate.admit(&tag_at(base, 0)));
        assert!(!gate.admit(&tag_at(base, 4000)));
        assert!(gate.admit(&tag_at(base, 6000)));
        assert_eq!(gate.last_accepted_at(), Some(base + Duration::from_millis(6000)));
    }

    #[test]
    fn test_cooldown_shared_across_kinds() {
        let base = Instant::now();
        let mut gate = DebounceGate::default();

        let finger = CredentialEvent::biometric(TemplateId::new(4).unwrap(), base);
        assert!(gate.admit(&finger));
        assert!(!gate.admit(&tag_at(base, 2000)));
    }
}
