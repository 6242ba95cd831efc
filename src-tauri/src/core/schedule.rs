//! Fixed-interval background task with explicit start and teardown.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use log::{debug, error, info};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Runs `tick` immediately and then once per `period` until stopped or
/// until `tick` returns [`ControlFlow::Break`].
///
/// A tick is never interrupted halfway; cancellation is observed between
/// ticks. Dropping the task cancels it without waiting.
pub struct PeriodicTask {
    name: &'static str,
    cancel_token: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let cancel_token = CancellationToken::new();
        let cancel_for_task = cancel_token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel_for_task.cancelled() => break,
                    _ = interval.tick() => {
                        debug!("{name}: tick");
                        if tick().await.is_break() {
                            info!("{name}: finished on its own.");
                            break;
                        }
                    }
                }
            }
        });

        info!("{name}: started with a period of {period:?}.");
        Self {
            name,
            cancel_token,
            task_handle: Some(handle),
        }
    }

    /// True until the task ends, whether stopped or by itself.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancels the task and waits for it to wind down.
    pub async fn stop(&mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(()) => info!("{}: stopped.", self.name),
                Err(e) if e.is_cancelled() => info!("{}: task was cancelled.", self.name),
                Err(e) => error!("{}: task ended with a join error: {:?}", self.name, e),
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
