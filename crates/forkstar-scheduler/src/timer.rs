//! ScopedTimer - restartable one-shot timer owned by a component
//!
//! `restart` replaces any pending callback, so a burst of activity only fires
//! once, `delay` after the last call. Dropping the timer cancels it.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::task::JoinHandle;
use tokio::time::Duration;

#[derive(Default)]
struct TimerState {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

#[derive(Default)]
pub struct ScopedTimer {
    state: Arc<Mutex<TimerState>>,
}

fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl ScopedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending callback and schedule `f` to run after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn restart<F>(&self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = lock(&self.state);
        state.generation += 1;
        let generation = state.generation;
        if let Some(previous) = state.handle.take() {
            previous.abort();
        }

        let shared: Weak<Mutex<TimerState>> = Arc::downgrade(&self.state);
        state.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(shared) = shared.upgrade() else {
                return;
            };
            {
                let mut state = lock(&shared);
                if state.generation != generation {
                    return;
                }
                state.handle = None;
            }
            f();
        }));
    }

    /// Cancel the pending callback. Returns `true` if one was pending.
    pub fn cancel(&self) -> bool {
        let mut state = lock(&self.state);
        state.generation += 1;
        match state.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.state).handle.is_some()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
