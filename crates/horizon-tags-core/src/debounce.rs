//! Trailing-edge debouncing for Horizon Tags.
//!
//! A [`Debouncer`] collapses a burst of calls into a single invocation of its
//! action, made `delay` after the last call of the burst with that call's
//! arguments. Each call restarts the timer.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::runtime;

/// Debounces calls to an action taking `Args`.
pub struct Debouncer<Args> {
    action: Arc<dyn Fn(Args) + Send + Sync>,
    delay: Mutex<Duration>,
    /// Bumped on every call and cancel; a timer only fires if it still holds the latest value.
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<Args: Send + 'static> Debouncer<Args> {
    /// Create a debouncer that runs `action` once calls settle for `delay`.
    pub fn new<F>(delay: Duration, action: F) -> Self
    where
        F: Fn(Args) + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
            delay: Mutex::new(delay),
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// The current delay.
    pub fn delay(&self) -> Duration {
        *self.delay.lock()
    }

    /// Change the delay. Applies to calls made after this point.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Schedule the action with `args`, replacing any pending call.
    ///
    /// Without any runtime to host the timer the action runs immediately.
    pub fn call(&self, args: Args) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let delay = self.delay();
        let latest = self.generation.clone();
        let action = self.action.clone();

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        tracing::trace!(target: "horizon_tags_core::debounce", generation, ?delay, "debounce scheduled");
        let args = Arc::new(Mutex::new(Some(args)));
        let task_args = args.clone();
        let spawned = runtime::spawn(async move {
            tokio::time::sleep(delay).await;
            if latest.load(Ordering::Acquire) != generation {
                return;
            }
            let args = task_args.lock().take();
            if let Some(args) = args {
                tracing::trace!(target: "horizon_tags_core::debounce", generation, "debounce fired");
                action(args);
            }
        });

        match spawned {
            Ok(handle) => *pending = Some(handle),
            Err(err) => {
                drop(pending);
                tracing::warn!(
                    target: "horizon_tags_core::debounce",
                    %err,
                    "no runtime available for debounce timer, running immediately"
                );
                let args = args.lock().take();
                if let Some(args) = args {
                    (self.action)(args);
                }
            }
        }
    }

    /// Drop any pending call without running it.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }
    }

    /// Whether a call is waiting for its delay to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<Args> fmt::Debug for Debouncer<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &*self.delay.lock())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}

impl<Args> Drop for Debouncer<Args> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.get_mut().take() {
            pending.abort();
        }
    }
}

static_assertions::assert_impl_all!(Debouncer<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(delay_ms: u64) -> (Debouncer<&'static str>, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_clone = calls.clone();
        let debouncer = Debouncer::new(Duration::from_millis(delay_ms), move |arg| {
            calls_clone.lock().push(arg);
        });
        (debouncer, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_call() {
        let (debouncer, calls) = recording(100);

        debouncer.call("a");
        tokio::time::sleep(Duration::from_millis(50)).await;
        debouncer.call("ab");
        tokio::time::sleep(Duration::from_millis(50)).await;
        debouncer.call("abc");
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*calls.lock(), vec!["abc"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_each_fire() {
        let (debouncer, calls) = recording(100);

        debouncer.call("first");
        tokio::time::sleep(Duration::from_millis(150)).await;
        debouncer.call("second");
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(*calls.lock(), vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_restarts_on_each_call() {
        let (debouncer, calls) = recording(100);

        debouncer.call("x");
        tokio::time::sleep(Duration::from_millis(90)).await;
        debouncer.call("y");
        tokio::time::sleep(Duration::from_millis(90)).await;
        assert!(calls.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*calls.lock(), vec!["y"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_call() {
        let (debouncer, calls) = recording(100);

        debouncer.call("never");
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(calls.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_delay() {
        let (debouncer, calls) = recording(100);
        debouncer.set_delay(Duration::from_millis(10));
        assert_eq!(debouncer.delay(), Duration::from_millis(10));

        debouncer.call("quick");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*calls.lock(), vec!["quick"]);
    }
}
