//! Scroll Tracker
//!
//! Turns raw scroll notifications into [`ScrollSnapshot`]s:
//! - progress through the scrollable range, clamped to `[0, 1]`
//! - direction relative to the previous sample only
//! - an activity flag that clears after an idle interval
//!
//! Notifications are coalesced so at most one recomputation runs per frame.
//! The snapshot is published through an observable that consumers can read
//! but not write.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use forkstar_bus::{Observable, ObservableReader};
use forkstar_scheduler::{FrameScheduler, ScopedTimer};
use forkstar_schema::{ScrollDirection, ScrollSnapshot};
use tokio::time::Duration;

use crate::ScrollConfig;

/// The scrollable document being observed.
pub trait ScrollSurface: Send + Sync {
    /// Current vertical scroll offset in pixels.
    fn scroll_offset(&self) -> f64;
    /// Full height of the document content.
    fn document_height(&self) -> f64;
    /// Height of the visible viewport.
    fn viewport_height(&self) -> f64;

    fn max_scroll(&self) -> f64 {
        self.document_height() - self.viewport_height()
    }
}

/// `offset / max_scroll` clamped to `[0, 1]`; 0 when nothing can scroll.
pub fn scroll_progress(offset: f64, max_scroll: f64) -> f64 {
    if max_scroll.is_nan() || max_scroll <= 0.0 {
        return 0.0;
    }
    let raw = offset / max_scroll;
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 1.0)
}

/// Strictly greater is down; anything else, including no movement, is up.
pub fn scroll_direction(current: f64, previous: f64) -> ScrollDirection {
    if current > previous {
        ScrollDirection::Down
    } else {
        ScrollDirection::Up
    }
}

/// Compute an active snapshot for one sample.
pub fn compute_snapshot(offset: f64, max_scroll: f64, previous_offset: f64) -> ScrollSnapshot {
    let offset = offset.max(0.0);
    ScrollSnapshot {
        vertical_offset: offset,
        progress: scroll_progress(offset, max_scroll),
        direction: scroll_direction(offset, previous_offset),
        is_active: true,
    }
}

/// A surface whose geometry is set by hand. Used by simulations and tests.
#[derive(Debug)]
pub struct ManualSurface {
    geometry: Mutex<(f64, f64, f64)>,
}

impl ManualSurface {
    pub fn new(document_height: f64, viewport_height: f64) -> Self {
        Self {
            geometry: Mutex::new((0.0, document_height, viewport_height)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, (f64, f64, f64)> {
        self.geometry.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn scroll_to(&self, offset: f64) {
        self.lock().0 = offset;
    }

    pub fn resize(&self, document_height: f64, viewport_height: f64) {
        let mut geometry = self.lock();
        geometry.1 = document_height;
        geometry.2 = viewport_height;
    }
}

impl ScrollSurface for ManualSurface {
    fn scroll_offset(&self) -> f64 {
        self.lock().0
    }

    fn document_height(&self) -> f64 {
        self.lock().1
    }

    fn viewport_height(&self) -> f64 {
        self.lock().2
    }
}

struct Sample {
    last_offset: f64,
    seq: u64,
    mounted: bool,
}

struct TrackerInner {
    surface: Arc<dyn ScrollSurface>,
    snapshot: Observable<ScrollSnapshot>,
    sample: Mutex<Sample>,
    /// Serializes sample checks with the snapshot writes that depend on them.
    publish: Mutex<()>,
    frames: FrameScheduler,
    idle: ScopedTimer,
    idle_interval: Duration,
}

impl TrackerInner {
    fn sample(&self) -> MutexGuard<'_, Sample> {
        self.sample.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publishing(&self) -> MutexGuard<'_, ()> {
        self.publish.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn recompute(self: &Arc<Self>) {
        let _publish = self.publishing();
        let (snapshot, seq) = {
            let mut sample = self.sample();
            if !sample.mounted {
                return;
            }
            let snapshot = compute_snapshot(
                self.surface.scroll_offset(),
                self.surface.max_scroll(),
                sample.last_offset,
            );
            sample.last_offset = snapshot.vertical_offset;
            sample.seq += 1;
            (snapshot, sample.seq)
        };

        tracing::trace!(
            offset = snapshot.vertical_offset,
            progress = snapshot.progress,
            direction = ?snapshot.direction,
            "scroll sample"
        );
        self.snapshot.set(snapshot);

        let weak = Arc::downgrade(self);
        self.idle.restart(self.idle_interval, move || {
            if let Some(inner) = weak.upgrade() {
                inner.settle(seq);
            }
        });
    }

    fn settle(&self, seq: u64) {
        let _publish = self.publishing();
        {
            let sample = self.sample();
            if !sample.mounted || sample.seq != seq {
                return;
            }
        }
        self.deactivate();
    }

    fn deactivate(&self) {
        self.snapshot.update(|s| ScrollSnapshot {
            is_active: false,
            ..*s
        });
    }
}

/// Tracks one surface from `mount` until `unmount` or drop.
///
/// Must be mounted inside a tokio runtime; frame and idle timers are tokio
/// tasks. Snapshot subscribers must not call `unmount` from inside their
/// callback.
pub struct ScrollTracker {
    inner: Arc<TrackerInner>,
}

impl ScrollTracker {
    /// Start tracking and compute the first snapshot immediately, so a page
    /// that is already scrolled on load reports its real position.
    pub fn mount(surface: Arc<dyn ScrollSurface>, config: &ScrollConfig) -> Self {
        let inner = Arc::new(TrackerInner {
            surface,
            snapshot: Observable::new(ScrollSnapshot::default()),
            sample: Mutex::new(Sample {
                last_offset: 0.0,
                seq: 0,
                mounted: true,
            }),
            publish: Mutex::new(()),
            frames: FrameScheduler::new(config.frame_interval()),
            idle: ScopedTimer::new(),
            idle_interval: config.idle_interval(),
        });
        inner.recompute();
        tracing::debug!(
            idle_ms = config.idle_ms,
            frame_ms = config.frame_ms,
            "scroll tracker mounted"
        );
        Self { inner }
    }

    /// Scroll listener entry point.
    ///
    /// Schedules a recomputation for the next frame. Returns `false` when the
    /// notification was folded into an already pending frame or the tracker
    /// is unmounted.
    pub fn notify_scroll(&self) -> bool {
        {
            let mut sample = self.inner.sample();
            if !sample.mounted {
                return false;
            }
            // Any idle expiry armed before this notification is now stale.
            sample.seq += 1;
        }
        self.inner.idle.cancel();

        let weak: Weak<TrackerInner> = Arc::downgrade(&self.inner);
        self.inner.frames.request(move || {
            if let Some(inner) = weak.upgrade() {
                inner.recompute();
            }
        })
    }

    pub fn snapshot(&self) -> ScrollSnapshot {
        self.inner.snapshot.get()
    }

    /// Read-only handle for consumers.
    pub fn reader(&self) -> ObservableReader<ScrollSnapshot> {
        self.inner.snapshot.reader()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.sample().mounted
    }

    pub fn idle_interval(&self) -> Duration {
        self.inner.idle_interval
    }

    /// Stop listening and cancel pending frame and idle work.
    ///
    /// The last snapshot stays readable and is published once more as
    /// inactive, so readers never see a detached tracker as scrolling.
    pub fn unmount(&self) {
        let _publish = self.inner.publishing();
        let was_mounted = {
            let mut sample = self.inner.sample();
            std::mem::replace(&mut sample.mounted, false)
        };
        self.inner.frames.cancel();
        self.inner.idle.cancel();
        if was_mounted {
            if self.inner.snapshot.get().is_active {
                self.inner.deactivate();
            }
            tracing::debug!("scroll tracker unmounted");
        }
    }
}

impl Drop for ScrollTracker {
    fn drop(&mut self) {
        self.unmount();
    }
}
