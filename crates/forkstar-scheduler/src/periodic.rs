use std::future::Future;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Runs an async job immediately and then once per `period` until stopped.
///
/// A tick that is still running when the next one is due delays the schedule
/// rather than bursting to catch up.
pub struct PeriodicTask {
    name: &'static str,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.child_token();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        tracing::debug!(task = name, "periodic tick");
                        tokio::select! {
                            _ = child.cancelled() => break,
                            _ = job() => {}
                        }
                    }
                }
            }
            tracing::debug!(task = name, "periodic task stopped");
        });

        Self {
            name,
            token,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Signal the loop to stop without waiting for it.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Stop the loop and wait for the current tick to unwind.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!(task = self.name, "periodic task ended abnormally: {e}");
                }
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn counting_task(period_ms: u64) -> (Arc<AtomicUsize>, PeriodicTask) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let task = PeriodicTask::spawn("test", Duration::from_millis(period_ms), move || {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
            }
        });
        (hits, task)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_on_period() {
        let (hits, task) = counting_task(1_000);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        task.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_future_ticks() {
        let (hits, task) = counting_task(100);
        sleep(Duration::from_millis(10)).await;
        task.stop();
        assert!(!task.is_running());

        sleep(Duration::from_millis(500)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_halts_future_ticks() {
        let (hits, task) = counting_task(100);
        sleep(Duration::from_millis(10)).await;
        drop(task);

        sleep(Duration::from_millis(500)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
