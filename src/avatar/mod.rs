//! Avatar capture pipeline
//!
//! Session lifecycle, lip-sync blending, skeletal addressing, and asset
//! readiness tracking.

pub mod assets;
pub mod lipsync;
pub mod session;
pub mod skeleton;

pub use assets::{AssetTracker, AssetsReady, LoadPhase};
pub use lipsync::{VisemeBlender, VisemeVector};
pub use session::{AvatarSession, SessionPhase};
pub use skeleton::{bone_path, HandJoint, HandSide, PoseSnapshot};
