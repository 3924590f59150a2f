//! Replication packet type and wire codec

use serde::{Deserialize, Serialize};

use crate::avatar::lipsync::VisemeVector;
use crate::avatar::skeleton::PoseSnapshot;
use crate::error::PacketError;

/// One serialized snapshot of avatar state, ready for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvatarPacket {
    /// Per-session sequence number, starting at 0
    pub sequence: u32,
    /// Session time of capture, in seconds since the session went active
    pub timestamp: f64,
    /// Skeletal sample at capture time
    pub pose: PoseSnapshot,
    /// Blended viseme amplitudes at capture time
    pub visemes: VisemeVector,
}

impl AvatarPacket {
    /// Encode the packet into compact wire bytes
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        Ok(postcard::to_stdvec(self)?)
    }

    /// Decode a packet from wire bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        Ok(postcard::from_bytes(bytes)?)
    }
}
