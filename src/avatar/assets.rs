//! Asset load tracking and readiness gating
//!
//! The native layer loads avatar meshes and textures asynchronously and
//! reports each load by id. The tracker holds the set of in-flight ids and
//! fires a single readiness notification when the set drains, gating when the
//! session can be shown. Completions may arrive from a loader context other
//! than the tick loop, so the pending set lives behind a mutex.

use std::collections::HashSet;
use std::sync::Mutex;

use tokio::sync::Notify;

/// Where the tracker is in its load lifecycle.
///
/// `Ready` is terminal: the tracker never re-arms, so the readiness event can
/// fire at most once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Loads may still be pending; the avatar is not yet presentable
    Loading,
    /// Every requested load has completed
    Ready,
}

/// The one-shot event returned when the last pending load completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetsReady;

#[derive(Debug)]
struct TrackerInner {
    pending: HashSet<u64>,
    phase: LoadPhase,
}

/// Tracks in-flight asset loads for one avatar session.
#[derive(Debug)]
pub struct AssetTracker {
    inner: Mutex<TrackerInner>,
    ready_notify: Notify,
}

impl Default for AssetTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetTracker {
    /// Create a tracker with nothing pending
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                pending: HashSet::new(),
                phase: LoadPhase::Loading,
            }),
            ready_notify: Notify::new(),
        }
    }

    /// Record that a load has been requested.
    ///
    /// Duplicate ids are absorbed (set semantics). Requests after the tracker
    /// has gone `Ready` are ignored; readiness never re-arms.
    pub fn request_load(&self, id: u64) {
        let mut inner = self.lock();
        if inner.phase == LoadPhase::Ready {
            tracing::warn!("Asset load {} requested after readiness; ignoring", id);
            return;
        }
        if inner.pending.insert(id) {
            tracing::debug!("Asset load pending: {} ({} in flight)", id, inner.pending.len());
        }
    }

    /// Record that a load has completed.
    ///
    /// Returns the one-shot [`AssetsReady`] event when this completion drains
    /// the pending set for the first time. Completions for ids never requested
    /// (duplicate or late signals from the loader) are no-ops.
    pub fn complete_load(&self, id: u64) -> Option<AssetsReady> {
        let mut inner = self.lock();

        if !inner.pending.remove(&id) {
            tracing::debug!("Asset load {} completed without a pending request; ignoring", id);
            return None;
        }

        if inner.pending.is_empty() && inner.phase == LoadPhase::Loading {
            inner.phase = LoadPhase::Ready;
            drop(inner);
            tracing::info!("All avatar assets finished loading");
            self.ready_notify.notify_waiters();
            return Some(AssetsReady);
        }

        tracing::debug!("Asset load complete: {} ({} remaining)", id, inner.pending.len());
        None
    }

    /// Current load phase
    pub fn phase(&self) -> LoadPhase {
        self.lock().phase
    }

    /// Whether every requested load has completed
    pub fn is_ready(&self) -> bool {
        self.phase() == LoadPhase::Ready
    }

    /// Number of loads still in flight
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Wait until the tracker goes `Ready`.
    ///
    /// Returns immediately if readiness has already fired.
    pub async fn wait_ready(&self) {
        loop {
            let notified = self.ready_notify.notified();
            if self.is_ready() {
                return;
            }
            notified.await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerInner> {
        // A poisoned lock only means a panic elsewhere; the set is still valid
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
