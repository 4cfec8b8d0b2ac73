//! Mock job dispatcher for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::dispatch::{DispatchError, JobDispatcher, RecallJob};

/// Mock implementation of the [`JobDispatcher`] trait.
///
/// Records every dispatched job for assertions and can be told to fail
/// deliveries.
#[derive(Debug, Default)]
pub struct MockDispatcher {
    jobs: Mutex<Vec<RecallJob>>,
    failure: Mutex<Option<String>>,
}

impl MockDispatcher {
    /// Create a mock dispatcher that accepts every job.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent dispatch fail with the given reason.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(reason.into());
    }

    /// Accept deliveries again.
    pub fn succeed(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Jobs dispatched so far, in order.
    pub fn dispatched_jobs(&self) -> Vec<RecallJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobDispatcher for MockDispatcher {
    async fn dispatch(&self, job: RecallJob) -> Result<(), DispatchError> {
        if let Some(reason) = self.failure.lock().unwrap().clone() {
            return Err(DispatchError::Transport(reason));
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}
