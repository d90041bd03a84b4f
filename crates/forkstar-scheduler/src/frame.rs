//! Per-frame coalescing of work requests.
//!
//! The first `request` in a frame schedules its callback for the next frame
//! boundary; further requests before that boundary are dropped. Callbacks
//! must read live state when they run.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Roughly one frame at 60 Hz.
pub const DEFAULT_FRAME_MS: u64 = 16;

#[derive(Default)]
struct FrameState {
    pending: Option<JoinHandle<()>>,
    frames_run: u64,
}

pub struct FrameScheduler {
    frame: Duration,
    state: Arc<Mutex<FrameState>>,
}

fn lock(state: &Mutex<FrameState>) -> MutexGuard<'_, FrameState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_FRAME_MS))
    }
}

impl FrameScheduler {
    pub fn new(frame: Duration) -> Self {
        Self {
            frame,
            state: Arc::new(Mutex::new(FrameState::default())),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame
    }

    /// Schedule `f` for the next frame unless a frame is already pending.
    ///
    /// Returns `true` if `f` was scheduled, `false` if it was coalesced into
    /// the pending frame.
    pub fn request<F>(&self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = lock(&self.state);
        if state.pending.is_some() {
            return false;
        }

        let shared: Weak<Mutex<FrameState>> = Arc::downgrade(&self.state);
        let frame = self.frame;
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(frame).await;
            let Some(shared) = shared.upgrade() else {
                return;
            };
            {
                let mut state = lock(&shared);
                state.pending = None;
                state.frames_run += 1;
            }
            f();
        }));
        true
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Number of frames that actually ran a callback.
    pub fn frames_run(&self) -> u64 {
        lock(&self.state).frames_run
    }

    /// Drop the pending frame, if any.
    pub fn cancel(&self) -> bool {
        match lock(&self.state).pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
