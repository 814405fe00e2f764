//! Paced tick loop shared by the `--next` commands.
//!
//! Each tick sleeps a jittered delay, then runs one synchronizer step under
//! a timeout. Retryable failures and timeouts are logged and the loop moves
//! on; any other failure stops the run.

use std::future::Future;
use std::time::Duration;

use ccdb_core::AppConfig;
use ccdb_sync::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickStatus {
    Progress,
    /// Nothing left to do; the loop ends early.
    Idle,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Pacing {
    pub sleep_min_ms: u64,
    pub sleep_max_ms: u64,
    pub tick_timeout: Duration,
}

impl Pacing {
    pub(crate) fn from_app_config(config: &AppConfig) -> Self {
        Self {
            sleep_min_ms: config.sleep_min_ms,
            sleep_max_ms: config.sleep_max_ms,
            tick_timeout: Duration::from_secs(config.tick_timeout_secs),
        }
    }

    /// Uniform delay in `[sleep_min_ms, sleep_max_ms]`.
    pub(crate) fn jitter(&self) -> Duration {
        if self.sleep_max_ms <= self.sleep_min_ms {
            return Duration::from_millis(self.sleep_min_ms);
        }
        Duration::from_millis(rand::random_range(self.sleep_min_ms..=self.sleep_max_ms))
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct TickSummary {
    pub progressed: u32,
    pub retried: u32,
    pub timed_out: u32,
}

/// Runs up to `count` ticks of `tick`.
///
/// A timed-out tick is dropped mid-flight; its open transaction, if any, is
/// rolled back with it.
///
/// # Errors
///
/// Returns the first error that is not retryable. Earlier ticks keep their
/// effects.
pub(crate) async fn run_ticks<F, Fut>(
    label: &'static str,
    count: u32,
    pacing: Pacing,
    mut tick: F,
) -> anyhow::Result<TickSummary>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<TickStatus, SyncError>>,
{
    let mut summary = TickSummary::default();

    for n in 1..=count {
        tokio::time::sleep(pacing.jitter()).await;

        match tokio::time::timeout(pacing.tick_timeout, tick()).await {
            Ok(Ok(TickStatus::Progress)) => summary.progressed += 1,
            Ok(Ok(TickStatus::Idle)) => {
                tracing::info!(label, tick = n, "nothing left to refresh");
                break;
            }
            Ok(Err(e)) if e.is_retryable() => {
                tracing::warn!(label, tick = n, error = %e, "tick failed; will retry later");
                summary.retried += 1;
            }
            Ok(Err(e)) => {
                tracing::error!(
                    label,
                    tick = n,
                    requires_operator = e.requires_operator(),
                    error = %e,
                    "tick failed; stopping"
                );
                return Err(e.into());
            }
            Err(_) => {
                tracing::warn!(
                    label,
                    tick = n,
                    timeout_secs = pacing.tick_timeout.as_secs(),
                    "tick timed out; nothing was persisted"
                );
                summary.timed_out += 1;
            }
        }
    }

    tracing::info!(
        label,
        progressed = summary.progressed,
        retried = summary.retried,
        timed_out = summary.timed_out,
        "run finished"
    );
    Ok(summary)
}
