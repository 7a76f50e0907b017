//! Polling state machine for a submitted analysis.
//!
//! While an analysis is `pending` or `processing`, the service is polled
//! via `GET /analyses/{id}`. The loop runs until it reaches one of the
//! terminal outcomes in [`WatchOutcome`]; it never issues another
//! request after that.
//!
//! Timing policy: the first poll goes out immediately; subsequent polls
//! run at a fixed short interval for an initial flat window, after which
//! the interval grows multiplicatively up to a cap. An overall deadline
//! bounds the whole watch regardless of the last observed status.
//! Transport and plain service errors are transient: the loop logs and
//! retries at the same cadence. A rejected token ends the watch.
//!
//! Cancellation is cooperative via a [`CancellationToken`]: the loop
//! selects on it at every await point, so dropping or re-pointing a
//! watch never leaves an orphaned poll running against a stale id.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use verae_core::status::AnalysisStatus;

use crate::api::VeraeApi;
use crate::error::ApiError;
use crate::models::{AnalysisSnapshot, RiskResult};

/// Tunable parameters for the polling cadence.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval between polls during the initial flat window.
    pub initial_interval: Duration,
    /// Elapsed time after which the interval starts growing.
    pub backoff_after: Duration,
    /// Factor by which the interval grows per poll once past the flat
    /// window.
    pub multiplier: f64,
    /// Upper bound on the interval between polls.
    pub max_interval: Duration,
    /// Overall deadline for the watch; reaching it yields
    /// [`WatchOutcome::TimedOut`].
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(1500),
            backoff_after: Duration::from_secs(8),
            multiplier: 1.5,
            max_interval: Duration::from_secs(15),
            deadline: Duration::from_secs(75),
        }
    }
}

/// Calculate the interval for the next poll.
///
/// Within the flat window (`elapsed <= backoff_after`) the interval is
/// unchanged; afterwards it grows by the multiplier, clamped to
/// [`PollConfig::max_interval`].
pub fn next_interval(current: Duration, elapsed: Duration, config: &PollConfig) -> Duration {
    if elapsed <= config.backoff_after {
        return current;
    }
    let grown_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(grown_ms).min(config.max_interval)
}

/// Terminal state of a watch.
#[derive(Debug)]
pub enum WatchOutcome {
    /// The analysis completed; `result` holds the one-time follow-up
    /// fetch of the risk result (`None` if it was not yet available or
    /// the fetch failed).
    Completed { result: Option<RiskResult> },
    /// The analysis ended in failure; no result will appear.
    Failed,
    /// The service does not know the analysis id.
    NotFound,
    /// The deadline elapsed before the analysis reached a terminal
    /// status.
    TimedOut,
    /// The bearer token was rejected mid-watch; the session token has
    /// been cleared.
    Unauthorized,
    /// The watch was cancelled before reaching any other outcome.
    Cancelled,
}

/// Poll an analysis until it reaches a terminal outcome.
///
/// `on_update` is invoked for every accepted status snapshot, including
/// the terminal one. Snapshots that would move the lifecycle backwards
/// (stale reads) are ignored.
pub async fn watch_analysis(
    api: &VeraeApi,
    analysis_id: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
    mut on_update: impl FnMut(&AnalysisSnapshot),
) -> WatchOutcome {
    let started = Instant::now();
    let mut interval = config.initial_interval;
    let mut last_status: Option<AnalysisStatus> = None;

    loop {
        if cancel.is_cancelled() {
            return WatchOutcome::Cancelled;
        }
        if started.elapsed() >= config.deadline {
            tracing::info!(analysis_id, "Polling deadline reached");
            return WatchOutcome::TimedOut;
        }

        match api.analysis_status(analysis_id).await {
            Ok(Some(snapshot)) => {
                let accepted =
                    last_status.is_none_or(|prev| prev.can_transition_to(snapshot.status));
                if accepted {
                    last_status = Some(snapshot.status);
                    on_update(&snapshot);
                    match snapshot.status {
                        AnalysisStatus::Completed => {
                            tracing::info!(analysis_id, "Analysis completed");
                            return WatchOutcome::Completed {
                                result: fetch_result_once(api, analysis_id).await,
                            };
                        }
                        AnalysisStatus::Failed => {
                            tracing::info!(analysis_id, "Analysis failed");
                            return WatchOutcome::Failed;
                        }
                        AnalysisStatus::Pending | AnalysisStatus::Processing => {}
                    }
                } else {
                    tracing::debug!(
                        analysis_id,
                        status = %snapshot.status,
                        "Ignoring stale status snapshot",
                    );
                }
            }
            Ok(None) => {
                tracing::warn!(analysis_id, "Analysis not found");
                return WatchOutcome::NotFound;
            }
            Err(ApiError::Unauthorized) => {
                return WatchOutcome::Unauthorized;
            }
            Err(e) => {
                tracing::warn!(analysis_id, error = %e, "Status poll failed; will retry");
            }
        }

        // Never sleep past the deadline; the loop top turns the wakeup
        // into TimedOut.
        let remaining = config.deadline.saturating_sub(started.elapsed());
        tokio::select! {
            _ = cancel.cancelled() => return WatchOutcome::Cancelled,
            _ = tokio::time::sleep(interval.min(remaining)) => {}
        }

        interval = next_interval(interval, started.elapsed(), config);
    }
}

/// One-time fetch of the risk result after observing `completed`.
///
/// Failures are logged rather than retried; the caller can always fetch
/// the result again explicitly.
async fn fetch_result_once(api: &VeraeApi, analysis_id: &str) -> Option<RiskResult> {
    match api.analysis_result(analysis_id).await {
        Ok(Some(result)) => Some(result),
        Ok(None) => {
            tracing::warn!(analysis_id, "Result not yet available after completion");
            None
        }
        Err(e) => {
            tracing::warn!(analysis_id, error = %e, "Result fetch failed");
            None
        }
    }
}
