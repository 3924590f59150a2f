//! Avatarlink - Networked Avatar Presence Pipeline
//!
//! A Rust library for virtual-avatar replication that:
//! - Samples skeletal pose and lip-sync state from a native avatar layer
//! - Blends 16-channel viseme scores with asymmetric onset/falloff rates
//! - Records replication packets on a fixed, jitter-tolerant cadence
//! - Gates avatar presentation on asynchronous asset readiness
//!
//! The pipeline is tick-driven: the host calls [`AvatarSession::tick`] once
//! per frame and subscribes to the packets the session records. A built-in
//! deterministic runtime ([`native::SyntheticRuntime`]) stands in for the
//! real native SDK in the demo binary and in tests.

pub mod avatar;
pub mod config;
pub mod error;
pub mod native;
pub mod replication;

pub use avatar::{AssetTracker, AvatarSession, SessionPhase, VisemeBlender, VisemeVector};
pub use config::Config;
pub use error::{AvatarLinkError, Result};
pub use replication::{AvatarPacket, PacketScheduler};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
