//! Packet scheduling and wire encoding for avatar replication

pub mod packet;
pub mod scheduler;

pub use packet::AvatarPacket;
pub use scheduler::{PacketDue, PacketScheduler};
