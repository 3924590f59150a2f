//! Configuration parsing and management for avatarlink

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AvatarLinkError, ConfigError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub packets: PacketConfig,
    pub lipsync: LipsyncConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            packets: PacketConfig::default(),
            lipsync: LipsyncConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AvatarLinkError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, AvatarLinkError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, AvatarLinkError> {
        // Try config paths in order
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AvatarLinkError> {
        // Packet cadence must be a usable rate
        if !self.packets.update_rate_hz.is_finite() || self.packets.update_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "packets.update_rate_hz".to_string(),
                message: "Update rate must be a positive number of Hz".to_string(),
            }
            .into());
        }

        // Lip-sync blend rates
        if !self.lipsync.onset_rate.is_finite() || self.lipsync.onset_rate <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "lipsync.onset_rate".to_string(),
                message: "Onset rate must be positive".to_string(),
            }
            .into());
        }

        if !self.lipsync.falloff_rate.is_finite() || self.lipsync.falloff_rate <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "lipsync.falloff_rate".to_string(),
                message: "Falloff rate must be positive".to_string(),
            }
            .into());
        }

        if !self.lipsync.level_multiplier.is_finite() || self.lipsync.level_multiplier <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "lipsync.level_multiplier".to_string(),
                message: "Level multiplier must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Session identity and skeletal capability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// User identity as supplied by the platform (display form; parsed to a
    /// numeric id at session start, falling back to 0 when unparseable)
    pub user_id: String,
    /// Which skeletal layers the native avatar tracks
    pub capabilities: CapabilitySet,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            capabilities: CapabilitySet::default(),
        }
    }
}

/// Skeletal capability flags. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitySet {
    /// Track the body skeleton
    pub body: bool,
    /// Track hand skeletons
    pub hands: bool,
    /// Track the base (root anchor) transform
    pub base: bool,
    /// Drive the expressive face layer (visemes, laughter)
    pub expressive: bool,
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self {
            body: true,
            hands: true,
            base: true,
            expressive: false,
        }
    }
}

/// Packet recording configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacketConfig {
    /// Enable packet recording
    pub enabled: bool,
    /// Packet emission rate in Hz (local source only)
    pub update_rate_hz: f32,
    /// Who produces packets: the local scheduler or the native SDK packetizer
    pub source: PacketSource,
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            update_rate_hz: 30.0,
            source: PacketSource::Local,
        }
    }
}

/// Packet source selection.
///
/// The two paths are mutually exclusive: in `Native` mode the local scheduler
/// is never constructed and the session only toggles SDK-side recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketSource {
    /// Packets are built locally on the accumulator schedule
    Local,
    /// The native SDK records its own packets; none are built locally
    Native,
}

impl Default for PacketSource {
    fn default() -> Self {
        Self::Local
    }
}

/// Lip-sync blend tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LipsyncConfig {
    /// Per-second rate at which a viseme channel rises toward its target
    pub onset_rate: f32,
    /// Per-second rate at which a viseme channel decays toward its target
    pub falloff_rate: f32,
    /// Overall amplitude multiplier applied after blending
    pub level_multiplier: f32,
    /// Drive the laughter channel from the native scores
    pub laughter: bool,
}

impl Default for LipsyncConfig {
    fn default() -> Self {
        Self {
            onset_rate: 30.0,
            falloff_rate: 20.0,
            level_multiplier: 1.5,
            laughter: true,
        }
    }
}

/// Get the platform config directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("avatarlink");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/avatarlink");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/avatarlink");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("avatarlink");
        }
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.packets.enabled);
        assert_eq!(config.packets.update_rate_hz, 30.0);
        assert_eq!(config.packets.source, PacketSource::Local);
        assert!(config.session.capabilities.body);
        assert!(!config.session.capabilities.expressive);
        assert_eq!(config.lipsync.onset_rate, 30.0);
        assert_eq!(config.lipsync.falloff_rate, 20.0);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [session]
            user_id = "271828182845"

            [session.capabilities]
            expressive = true

            [packets]
            update_rate_hz = 20.0
            source = "native"

            [lipsync]
            falloff_rate = 12.5
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.session.user_id, "271828182845");
        assert!(config.session.capabilities.expressive);
        assert!(config.session.capabilities.body, "unset flags keep defaults");
        assert_eq!(config.packets.update_rate_hz, 20.0);
        assert_eq!(config.packets.source, PacketSource::Native);
        assert_eq!(config.lipsync.falloff_rate, 12.5);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let mut config = Config::default();
        config.packets.update_rate_hz = 0.0;
        assert!(config.validate().is_err());

        config.packets.update_rate_hz = -30.0;
        assert!(config.validate().is_err());

        config.packets.update_rate_hz = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_blend_tuning_rejected() {
        let mut config = Config::default();
        config.lipsync.onset_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.lipsync.level_multiplier = -1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[packets]\nupdate_rate_hz = 15.0").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.packets.update_rate_hz, 15.0);

        assert!(Config::from_file(dir.path().join("missing.toml")).is_err());
    }
}
