//! Error types for avatarlink

use thiserror::Error;

/// Main error type for avatarlink
#[derive(Error, Debug)]
pub enum AvatarLinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised by the native avatar layer while acquiring a handle.
///
/// Produced by [`AvatarRuntime::acquire`](crate::native::AvatarRuntime::acquire)
/// implementations. Everything after acquisition is sample-or-skip and never
/// surfaces an error.
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("native avatar service unavailable: {0}")]
    Unavailable(String),

    #[error("avatar request rejected for user {user_id}: {reason}")]
    Rejected { user_id: u64, reason: String },
}

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("avatar handle acquisition failed: {0}")]
    Acquisition(#[from] AcquireError),
}

/// Replication packet errors
#[derive(Error, Debug)]
pub enum PacketError {
    #[error("packet serialization error: {0}")]
    Serialization(#[from] postcard::Error),
}

/// Result type alias for avatarlink operations
pub type Result<T> = std::result::Result<T, AvatarLinkError>;
