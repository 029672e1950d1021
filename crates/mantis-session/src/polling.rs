use std::future::Future;
use std::sync::Arc;

use mantis_client::ApiError;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

/// Stops a polling loop from anywhere; cheap to clone
#[derive(Debug, Clone, Default)]
pub struct PollCanceller(Arc<Notify>);

impl PollCanceller {
    pub fn cancel(&self) {
        // notify_one keeps a permit, so a cancel issued before the loop starts still lands
        self.0.notify_one();
    }

    async fn cancelled(&self) {
        self.0.notified().await;
    }
}

/// A running polling loop
///
/// Every way out (natural completion, terminal failure, exhaustion, `cancel`,
/// dropping the handle) ends the task and drops its pending timers.
pub struct PollHandle<T> {
    canceller: PollCanceller,
    task: Option<JoinHandle<Result<T, ApiError>>>,
}

impl<T> PollHandle<T> {
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> PollCanceller {
        self.canceller.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the loop's result; a cancelled loop yields [`ApiError::Cancelled`]
    pub async fn join(mut self) -> Result<T, ApiError> {
        let Some(task) = self.task.take() else {
            return Err(ApiError::Cancelled);
        };
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(ApiError::Cancelled),
        }
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Polling handle dropped, cancelling loop");
            self.canceller.cancel();
        }
    }
}

/// Runs `poll` on the runtime until it finishes or is cancelled
pub fn spawn_polling<T, F>(poll: F) -> PollHandle<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let canceller = PollCanceller::default();
    let signal = canceller.clone();
    let task = tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = signal.cancelled() => Err(ApiError::Cancelled),
            result = poll => result,
        }
    });
    PollHandle {
        canceller,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_loop_and_its_timer() {
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = ticks.clone();
        let handle = spawn_polling(async move {
            loop {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            #[allow(unreachable_code)]
            Ok::<(), ApiError>(())
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.cancel();
        assert_eq!(handle.join().await, Err(ApiError::Cancelled));

        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_poll_is_honoured() {
        let handle = spawn_polling(async { Ok::<u32, ApiError>(7) });
        handle.cancel();
        assert_eq!(handle.join().await, Err(ApiError::Cancelled));
    }

    #[tokio::test]
    async fn test_natural_completion() {
        let handle = spawn_polling(async { Ok::<u32, ApiError>(7) });
        assert_eq!(handle.join().await, Ok(7));
    }
}
