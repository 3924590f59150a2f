//! Avatar session lifecycle and per-tick orchestration
//!
//! The session owns one native avatar handle and runs the capture pipeline:
//! sample raw pose and viseme scores, blend the visemes, and emit replication
//! packets on the configured cadence. It moves through three phases,
//! `Uninitialized → Active → Destroyed`, and every public operation outside
//! its phase is a no-op, so late ticks, double starts, and double teardowns
//! are all safe.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::avatar::assets::AssetTracker;
use crate::avatar::lipsync::{VisemeBlender, VisemeVector, LAUGHTER_CHANNEL};
use crate::avatar::skeleton::PoseSnapshot;
use crate::config::{Config, PacketSource};
use crate::error::{Result, SessionError};
use crate::native::{AvatarRuntime, BoundAvatar};
use crate::replication::{AvatarPacket, PacketScheduler};

/// Lifecycle phase of an [`AvatarSession`].
///
/// `Destroyed` is terminal; a torn-down session never re-acquires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Active,
    Destroyed,
}

/// One avatar's capture and replication pipeline.
pub struct AvatarSession {
    runtime: Arc<dyn AvatarRuntime>,
    config: Config,
    phase: SessionPhase,
    bound: Option<BoundAvatar>,
    blender: VisemeBlender,
    visemes: VisemeVector,
    last_pose: PoseSnapshot,
    /// Present only when packets come from the local scheduler; in native
    /// source mode the SDK records and this stays `None`
    scheduler: Option<PacketScheduler>,
    /// Seconds of session time accumulated while Active
    clock: f64,
    assets: Arc<AssetTracker>,
    packet_tx: broadcast::Sender<AvatarPacket>,
}

impl AvatarSession {
    /// Build a session over `runtime` from a validated configuration.
    ///
    /// Fails on invalid packet cadence; all other tuning was checked by
    /// [`Config::validate`].
    pub fn new(config: Config, runtime: Arc<dyn AvatarRuntime>) -> Result<Self> {
        let scheduler = match config.packets.source {
            PacketSource::Local => Some(PacketScheduler::new(
                config.packets.update_rate_hz,
                config.packets.enabled,
            )?),
            PacketSource::Native => None,
        };

        let (packet_tx, _) = broadcast::channel(64);

        Ok(Self {
            blender: VisemeBlender::new(&config.lipsync),
            runtime,
            config,
            phase: SessionPhase::Uninitialized,
            bound: None,
            visemes: VisemeVector::default(),
            last_pose: PoseSnapshot::default(),
            scheduler,
            clock: 0.0,
            assets: Arc::new(AssetTracker::new()),
            packet_tx,
        })
    }

    /// Acquire the native handle and go Active.
    ///
    /// On acquisition failure the session stays Uninitialized and the error
    /// is returned; retrying is the caller's choice. Starting an Active or
    /// Destroyed session is a warned no-op.
    pub fn start(&mut self) -> Result<()> {
        match self.phase {
            SessionPhase::Uninitialized => {}
            SessionPhase::Active => {
                warn!("Session already active; ignoring start");
                return Ok(());
            }
            SessionPhase::Destroyed => {
                warn!("Session destroyed; ignoring start");
                return Ok(());
            }
        }

        let user_id = parse_user_id(&self.config.session.user_id);
        let bound = BoundAvatar::acquire(
            Arc::clone(&self.runtime),
            self.config.session.capabilities,
            user_id,
        )
        .map_err(SessionError::Acquisition)?;

        if self.config.packets.source == PacketSource::Native && self.config.packets.enabled {
            bound.set_packet_recording(true);
            info!("Native packet recording enabled");
        }

        self.bound = Some(bound);
        self.phase = SessionPhase::Active;
        info!(
            "Avatar session active (user {}, packet source {:?})",
            user_id, self.config.packets.source
        );
        Ok(())
    }

    /// Advance the session by one host tick of `dt` seconds.
    ///
    /// Samples the native layer, blends visemes, and returns a packet when
    /// the local schedule says one is due (the same packet is also broadcast
    /// to subscribers). A tick with no fresh samples, an inactive session, or
    /// an off-schedule tick all return `None`.
    pub fn tick(&mut self, dt: f32) -> Option<AvatarPacket> {
        if self.phase != SessionPhase::Active {
            return None;
        }
        let dt = dt.max(0.0);
        let bound = self.bound.as_ref()?;

        // A missing sample means no update this tick, not a failure
        let Some(pose) = bound.sample_skeleton() else {
            debug!("No skeleton sample this tick; skipping update");
            return None;
        };
        let Some(mut target) = bound.sample_visemes() else {
            debug!("No viseme sample this tick; skipping update");
            return None;
        };

        if !self.config.lipsync.laughter {
            // With laughter off the channel decays to silence at the falloff rate
            target.set(LAUGHTER_CHANNEL, 0.0);
        }

        self.visemes = self.blender.blend(&self.visemes, &target, dt);
        self.last_pose = pose;
        self.clock += f64::from(dt);

        let due = self.scheduler.as_mut()?.tick(dt)?;
        let packet = AvatarPacket {
            sequence: due.sequence,
            timestamp: self.clock,
            pose: self.last_pose,
            visemes: self.visemes,
        };

        debug!("Recorded packet {} at t={:.3}", packet.sequence, packet.timestamp);
        let _ = self.packet_tx.send(packet);
        Some(packet)
    }

    /// Release the native handle and go Destroyed.
    ///
    /// Safe to call in any phase and at any time; the second and later calls
    /// are no-ops.
    pub fn teardown(&mut self) {
        if self.phase == SessionPhase::Destroyed {
            return;
        }

        if let Some(bound) = self.bound.take() {
            if self.config.packets.source == PacketSource::Native && self.config.packets.enabled {
                bound.set_packet_recording(false);
            }
            // Dropping the guard releases the handle
            drop(bound);
        }

        self.phase = SessionPhase::Destroyed;
        info!("Avatar session destroyed");
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Subscribe to packets as they are recorded
    pub fn subscribe_packets(&self) -> broadcast::Receiver<AvatarPacket> {
        self.packet_tx.subscribe()
    }

    /// The session's asset tracker, shareable with a loader context
    pub fn assets(&self) -> Arc<AssetTracker> {
        Arc::clone(&self.assets)
    }

    /// Register an in-flight asset load.
    ///
    /// Ignored once the session is destroyed.
    pub fn request_asset_load(&self, id: u64) {
        if self.phase == SessionPhase::Destroyed {
            return;
        }
        self.assets.request_load(id);
    }

    /// The most recently blended viseme vector
    pub fn visemes(&self) -> &VisemeVector {
        &self.visemes
    }

    /// Sequence number the next locally recorded packet will carry
    pub fn next_sequence(&self) -> Option<u32> {
        self.scheduler.as_ref().map(PacketScheduler::next_sequence)
    }
}

impl Drop for AvatarSession {
    fn drop(&mut self) {
        // The bound guard would release on its own, but teardown also settles
        // the phase and the native recording flag
        self.teardown();
    }
}

impl std::fmt::Debug for AvatarSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarSession")
            .field("phase", &self.phase)
            .field("clock", &self.clock)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

/// Parse the platform user id, falling back to 0 when unparseable.
fn parse_user_id(raw: &str) -> u64 {
    if raw.is_empty() {
        return 0;
    }
    match raw.parse() {
        Ok(id) => id,
        Err(_) => {
            warn!("User id {:?} is not numeric; using 0", raw);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::SyntheticRuntime;

    fn expressive_config() -> Config {
        let mut config = Config::default();
        config.session.capabilities.expressive = true;
        config.session.user_id = "42".to_string();
        config
    }

    fn active_session(config: Config) -> AvatarSession {
        let runtime = Arc::new(SyntheticRuntime::new());
        let mut session = AvatarSession::new(config, runtime).unwrap();
        session.start().unwrap();
        session
    }

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id("271828182845"), 271828182845);
        assert_eq!(parse_user_id(""), 0);
        assert_eq!(parse_user_id("not-a-number"), 0);
    }

    #[test]
    fn test_phase_transitions() {
        let runtime = Arc::new(SyntheticRuntime::new());
        let mut session = AvatarSession::new(Config::default(), runtime).unwrap();
        assert_eq!(session.phase(), SessionPhase::Uninitialized);
        assert!(session.tick(1.0 / 60.0).is_none(), "uninitialized sessions do not tick");

        session.start().unwrap();
        assert_eq!(session.phase(), SessionPhase::Active);

        session.teardown();
        assert_eq!(session.phase(), SessionPhase::Destroyed);
        assert!(session.tick(1.0 / 60.0).is_none());

        // A destroyed session never re-acquires
        session.start().unwrap();
        assert_eq!(session.phase(), SessionPhase::Destroyed);
    }

    #[test]
    fn test_tick_emits_on_schedule() {
        let mut session = active_session(expressive_config());

        // 30 Hz cadence under 60 fps ticks: packets on every other tick
        let mut packets = Vec::new();
        for _ in 0..8 {
            if let Some(p) = session.tick(1.0 / 60.0) {
                packets.push(p);
            }
        }

        assert_eq!(packets.len(), 4);
        for (i, p) in packets.iter().enumerate() {
            assert_eq!(p.sequence, i as u32);
        }
        // Timestamps follow the session clock, two ticks apart. The clock
        // accumulates widened f32 deltas, so the expected gap is two widened
        // steps, not the f64 constant 1/30
        let step = 2.0 * f64::from(1.0f32 / 60.0);
        assert!((packets[1].timestamp - packets[0].timestamp - step).abs() < 1e-12);
        assert!((packets[0].timestamp - step).abs() < 1e-12);
    }

    #[test]
    fn test_packets_reach_subscribers() {
        let mut session = active_session(expressive_config());
        let mut rx = session.subscribe_packets();

        let emitted = loop {
            if let Some(p) = session.tick(1.0 / 60.0) {
                break p;
            }
        };

        assert_eq!(rx.try_recv().unwrap(), emitted);
    }

    #[test]
    fn test_native_source_builds_no_local_packets() {
        let mut config = expressive_config();
        config.packets.source = PacketSource::Native;
        let mut session = active_session(config);

        assert_eq!(session.next_sequence(), None);
        for _ in 0..240 {
            assert!(session.tick(1.0 / 60.0).is_none());
        }
        // The pipeline still blends even though nothing is recorded locally
        assert!(session.visemes().silence() > 0.0 || session.visemes().dominant().1 > 0.0);
    }

    #[test]
    fn test_laughter_gating() {
        let mut config = expressive_config();
        config.lipsync.laughter = false;
        let mut session = active_session(config);

        // Run long enough to cover the scripted laugh
        for _ in 0..240 {
            session.tick(1.0 / 60.0);
            assert_eq!(session.visemes().laughter(), 0.0);
        }
    }

    #[test]
    fn test_asset_loads_halt_after_teardown() {
        let mut session = active_session(Config::default());
        session.request_asset_load(1);
        assert_eq!(session.assets().pending_count(), 1);

        session.teardown();
        session.request_asset_load(2);
        assert_eq!(session.assets().pending_count(), 1);
    }
}
