use std::sync::Mutex;

use forkstar_scheduler::ScopedTimer;
use tokio::time::Duration;

use crate::{TransitionConfig, UiState};

/// Shows the loading indicator for a fixed time after each route change.
///
/// Drives `UiState::loading`: true as soon as navigation starts, false once
/// the display time has elapsed without another navigation.
pub struct RouteTransition {
    ui: UiState,
    timer: ScopedTimer,
    display: Duration,
    current: Mutex<Option<String>>,
}

impl RouteTransition {
    pub fn new(ui: UiState, config: &TransitionConfig) -> Self {
        Self {
            ui,
            timer: ScopedTimer::new(),
            display: Duration::from_millis(config.loader_ms),
            current: Mutex::new(None),
        }
    }

    /// Record a route change. Returns `false` if `path` is already current.
    pub fn navigate(&self, path: &str) -> bool {
        {
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            if current.as_deref() == Some(path) {
                return false;
            }
            *current = Some(path.to_string());
        }
        tracing::debug!(path, "route change");
        self.begin();
        true
    }

    /// Raise the loading flag and (re)start the display timer.
    pub fn begin(&self) {
        self.ui.set_loading(true);
        let loading = self.ui.loading.clone();
        self.timer.restart(self.display, move || loading.set(false));
    }

    /// Clear the loading flag now.
    pub fn finish(&self) {
        self.timer.cancel();
        self.ui.set_loading(false);
    }

    pub fn current_path(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }
}

impl Drop for RouteTransition {
    /// Clears the loader if its display timer is still pending.
    fn drop(&mut self) {
        if self.timer.cancel() {
            self.ui.set_loading(false);
        }
    }
}
