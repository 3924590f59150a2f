//! Boundary to the native avatar layer
//!
//! The native SDK renders the avatar and produces raw pose/viseme samples for
//! an instance identified by an opaque handle. [`AvatarRuntime`] is the seam
//! the session talks through; [`BoundAvatar`] owns an acquired handle and
//! guarantees release on every exit path.

pub mod synthetic;

pub use synthetic::SyntheticRuntime;

use std::sync::Arc;

use crate::avatar::lipsync::VisemeVector;
use crate::avatar::skeleton::PoseSnapshot;
use crate::config::CapabilitySet;
use crate::error::AcquireError;

/// Opaque identifier for one native avatar instance.
///
/// Deliberately not `Clone`: exactly one owner exists per acquisition, and the
/// owning [`BoundAvatar`] hands it back to the runtime on release.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AvatarHandle(u64);

impl AvatarHandle {
    /// Wrap a raw native instance id
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw native instance id
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The native avatar layer as the session consumes it.
///
/// Sampling returns `None` when the instance has no fresh data this tick;
/// callers treat that as "no update", never as an error.
pub trait AvatarRuntime: Send + Sync {
    /// Instantiate a native avatar for a user with the given skeletal layers
    fn acquire(
        &self,
        capabilities: CapabilitySet,
        user_id: u64,
    ) -> Result<AvatarHandle, AcquireError>;

    /// Tear down a native avatar instance
    fn release(&self, handle: &AvatarHandle);

    /// Sample the current skeletal pose, if available
    fn sample_skeleton(&self, handle: &AvatarHandle) -> Option<PoseSnapshot>;

    /// Sample the current raw viseme scores, if available
    fn sample_visemes(&self, handle: &AvatarHandle) -> Option<VisemeVector>;

    /// Toggle the SDK's own packet recorder (native packet source mode).
    ///
    /// Runtimes without a built-in packetizer can leave the default no-op.
    fn set_packet_recording(&self, _handle: &AvatarHandle, _enabled: bool) {}
}

/// An acquired avatar handle bound to its runtime.
///
/// Releases the handle in `Drop`, so teardown happens exactly once no matter
/// how the owner exits.
pub struct BoundAvatar {
    runtime: Arc<dyn AvatarRuntime>,
    handle: AvatarHandle,
}

impl BoundAvatar {
    /// Acquire a handle from `runtime` and bind it
    pub fn acquire(
        runtime: Arc<dyn AvatarRuntime>,
        capabilities: CapabilitySet,
        user_id: u64,
    ) -> Result<Self, AcquireError> {
        let handle = runtime.acquire(capabilities, user_id)?;
        tracing::info!("Acquired native avatar handle {}", handle.raw());
        Ok(Self { runtime, handle })
    }

    /// The bound handle
    pub fn handle(&self) -> &AvatarHandle {
        &self.handle
    }

    /// Sample the current skeletal pose
    pub fn sample_skeleton(&self) -> Option<PoseSnapshot> {
        self.runtime.sample_skeleton(&self.handle)
    }

    /// Sample the current raw viseme scores
    pub fn sample_visemes(&self) -> Option<VisemeVector> {
        self.runtime.sample_visemes(&self.handle)
    }

    /// Toggle the SDK-side packet recorder
    pub fn set_packet_recording(&self, enabled: bool) {
        self.runtime.set_packet_recording(&self.handle, enabled);
    }
}

impl Drop for BoundAvatar {
    fn drop(&mut self) {
        tracing::debug!("Releasing native avatar handle {}", self.handle.raw());
        self.runtime.release(&self.handle);
    }
}

impl std::fmt::Debug for BoundAvatar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundAvatar")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
