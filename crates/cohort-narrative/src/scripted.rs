//! Completion client that replays canned responses.

use crate::client::{CompletionClient, CompletionRequest};
use crate::error::NarrativeError;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Replays a fixed script of responses in order and records every request.
///
/// Once the script runs out every call fails with
/// [`NarrativeError::MalformedResponse`].
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, NarrativeError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    /// Create a client answering with `responses`, in order.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|s| Ok(s.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Append a response to the script.
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock_responses().push_back(Ok(response.into()));
    }

    /// Append a failure to the script.
    pub fn push_error(&self, error: NarrativeError) {
        self.lock_responses().push_back(Err(error));
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_responses(&self) -> MutexGuard<'_, VecDeque<Result<String, NarrativeError>>> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, NarrativeError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        self.lock_responses().pop_front().unwrap_or_else(|| {
            Err(NarrativeError::MalformedResponse(
                "scripted responses exhausted".to_string(),
            ))
        })
    }
}
