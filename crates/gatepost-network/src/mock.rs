//! Scripted reporter for testing and development.

use crate::{ReportError, Reporter};
use gatepost_protocol::{ReportRequest, ReportResponse};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;

#[derive(Debug, Default)]
struct ReporterState {
    replies: VecDeque<Result<ReportResponse, ReportError>>,
    requests: Vec<(ReportRequest, Instant)>,
}

fn lock(state: &Mutex<ReporterState>) -> MutexGuard<'_, ReporterState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reporter answering from a script.
///
/// Every request is recorded together with the (tokio) time it was made.
/// Once the script runs out, reports fail with a transport error.
#[derive(Debug)]
pub struct MockReporter {
    state: Arc<Mutex<ReporterState>>,
}

impl MockReporter {
    pub fn new() -> (Self, MockReporterHandle) {
        let state = Arc::new(Mutex::new(ReporterState::default()));
        let handle = MockReporterHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl Reporter for MockReporter {
    async fn report(&mut self, request: &ReportRequest) -> Result<ReportResponse, ReportError> {
        let mut state = lock(&self.state);
        state.requests.push((request.clone(), Instant::now()));
        state
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(ReportError::Transport("connection refused".to_string())))
    }
}

/// Handle for scripting and inspecting a [`MockReporter`].
#[derive(Debug, Clone)]
pub struct MockReporterHandle {
    state: Arc<Mutex<ReporterState>>,
}

impl MockReporterHandle {
    /// Queue a reply.
    pub fn respond(&self, reply: ReportResponse) {
        lock(&self.state).replies.push_back(Ok(reply));
    }

    /// Queue a failure.
    pub fn fail(&self, error: ReportError) {
        lock(&self.state).replies.push_back(Err(error));
    }

    /// Requests made so far.
    pub fn requests(&self) -> Vec<ReportRequest> {
        lock(&self.state)
            .requests
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    /// When each request was made.
    pub fn request_times(&self) -> Vec<Instant> {
        lock(&self.state).requests.iter().map(|(_, at)| *at).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReportRequest {
        ReportRequest {
            rfid: Some("1".to_string()),
            fingerprint_id: None,
            device_id: "t1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_replies_in_order_then_fails() {
        let (mut reporter, handle) = MockReporter::new();
        handle.respond(ReportResponse::granted("Ana"));
        handle.fail(ReportError::Status(503));

        assert_eq!(
            reporter.report(&request()).await.unwrap(),
            ReportResponse::granted("Ana")
        );
        assert!(matches!(
            reporter.report(&request()).await,
            Err(ReportError::Status(503))
        ));
        assert!(matches!(
            reporter.report(&request()).await,
            Err(ReportError::Transport(_))
        ));

        assert_eq!(handle.requests().len(), 3);
        assert_eq!(handle.request_times().len(), 3);
    }
}
