//! Single-watch bookkeeping on top of [`watch_analysis`].
//!
//! A front end only ever follows one analysis at a time. The tracker
//! enforces that: starting a watch for a new id cancels the previous
//! loop through its cancellation token, and dropping either the tracker
//! or an individual [`Watch`] handle cancels deterministically. No
//! shared "currently tracked id" flag, no orphaned polls.

use tokio_util::sync::CancellationToken;

use crate::api::VeraeApi;
use crate::models::AnalysisSnapshot;
use crate::poll::{watch_analysis, PollConfig, WatchOutcome};

/// Spawns and supervises at most one polling loop at a time.
#[derive(Debug)]
pub struct AnalysisTracker {
    api: VeraeApi,
    config: PollConfig,
    current: Option<TrackedWatch>,
}

/// Bookkeeping for the currently running watch.
#[derive(Debug)]
struct TrackedWatch {
    analysis_id: String,
    cancel: CancellationToken,
}

/// Handle to one spawned polling loop.
///
/// Await [`Watch::outcome`] for the terminal state, or drop the handle
/// to cancel the loop.
#[derive(Debug)]
pub struct Watch {
    analysis_id: String,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<WatchOutcome>,
}

impl AnalysisTracker {
    /// Create a tracker using the given client and poll timing.
    pub fn new(api: VeraeApi, config: PollConfig) -> Self {
        Self {
            api,
            config,
            current: None,
        }
    }

    /// Start watching `analysis_id`, cancelling any previous watch first.
    ///
    /// `on_update` receives every accepted status snapshot, including the
    /// terminal one.
    pub fn track(
        &mut self,
        analysis_id: &str,
        on_update: impl FnMut(&AnalysisSnapshot) + Send + 'static,
    ) -> Watch {
        self.cancel_current();

        let cancel = CancellationToken::new();
        let api = self.api.clone();
        let config = self.config.clone();
        let id = analysis_id.to_string();
        let task_cancel = cancel.clone();
        let task_id = id.clone();

        let task = tokio::spawn(async move {
            watch_analysis(&api, &task_id, &config, &task_cancel, on_update).await
        });

        self.current = Some(TrackedWatch {
            analysis_id: id.clone(),
            cancel: cancel.clone(),
        });

        Watch {
            analysis_id: id,
            cancel,
            task,
        }
    }

    /// Cancel the running watch, if any.
    pub fn cancel_current(&mut self) {
        if let Some(watch) = self.current.take() {
            tracing::debug!(analysis_id = %watch.analysis_id, "Cancelling previous watch");
            watch.cancel.cancel();
        }
    }

    /// Id of the analysis currently being watched, if any.
    pub fn tracked_id(&self) -> Option<&str> {
        self.current.as_ref().map(|watch| watch.analysis_id.as_str())
    }
}

impl Drop for AnalysisTracker {
    fn drop(&mut self) {
        self.cancel_current();
    }
}

impl Watch {
    /// Id of the analysis this watch follows.
    pub fn analysis_id(&self) -> &str {
        &self.analysis_id
    }

    /// Request cancellation without consuming the handle.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the watch to reach a terminal state.
    pub async fn outcome(mut self) -> WatchOutcome {
        match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(analysis_id = %self.analysis_id, error = %e, "Watch task aborted");
                WatchOutcome::Cancelled
            }
        }
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
