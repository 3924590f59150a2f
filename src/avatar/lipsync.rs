//! Viseme vector and lip-sync blending
//!
//! The native layer reports raw per-channel viseme scores each tick; the
//! blender moves the session's current vector toward those targets with a
//! fast attack and a slower release so mouth shapes snap in without
//! flickering out.

use serde::{Deserialize, Serialize};

use crate::config::LipsyncConfig;

/// Number of viseme channels: silence, 14 phoneme shapes, laughter.
pub const VISEME_COUNT: usize = 16;

/// Channel index of the silence score.
pub const SILENCE_CHANNEL: usize = 0;

/// Channel index of the laughter score.
pub const LAUGHTER_CHANNEL: usize = VISEME_COUNT - 1;

/// Diagnostic names for the viseme channels, in channel order.
pub const VISEME_NAMES: [&str; VISEME_COUNT] = [
    "sil", "PP", "FF", "TH", "DD", "kk", "CH", "SS", "nn", "RR", "aa", "E", "ih", "oh", "ou",
    "Laughter",
];

/// An ordered vector of 16 viseme amplitudes, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisemeVector([f32; VISEME_COUNT]);

impl Default for VisemeVector {
    fn default() -> Self {
        Self([0.0; VISEME_COUNT])
    }
}

impl VisemeVector {
    /// Create a vector from raw channel values, clamping each into [0, 1]
    pub fn new(values: [f32; VISEME_COUNT]) -> Self {
        let mut clamped = values;
        for v in &mut clamped {
            *v = v.clamp(0.0, 1.0);
        }
        Self(clamped)
    }

    /// Get a channel value
    pub fn get(&self, channel: usize) -> f32 {
        self.0[channel]
    }

    /// Set a channel value, clamped into [0, 1]
    pub fn set(&mut self, channel: usize, value: f32) {
        self.0[channel] = value.clamp(0.0, 1.0);
    }

    /// Get the silence score
    pub fn silence(&self) -> f32 {
        self.0[SILENCE_CHANNEL]
    }

    /// Get the laughter score
    pub fn laughter(&self) -> f32 {
        self.0[LAUGHTER_CHANNEL]
    }

    /// Borrow all channel values
    pub fn values(&self) -> &[f32; VISEME_COUNT] {
        &self.0
    }

    /// The highest-amplitude channel and its value
    pub fn dominant(&self) -> (usize, f32) {
        let mut best = (0, self.0[0]);
        for (i, &v) in self.0.iter().enumerate().skip(1) {
            if v > best.1 {
                best = (i, v);
            }
        }
        best
    }

    /// Diagnostic name of the highest-amplitude channel
    pub fn dominant_name(&self) -> &'static str {
        VISEME_NAMES[self.dominant().0]
    }
}

/// Asymmetric per-channel blender for viseme vectors.
///
/// Blending is a pure function of (current, target, dt): identical inputs
/// always produce identical output, which keeps record/playback symmetric and
/// tests reproducible.
#[derive(Debug, Clone, Copy)]
pub struct VisemeBlender {
    /// Per-second rate when rising toward a target
    onset_rate: f32,
    /// Per-second rate when decaying toward a target
    falloff_rate: f32,
    /// Amplitude multiplier applied after the move
    level_multiplier: f32,
}

impl VisemeBlender {
    /// Create a blender from validated lip-sync tuning
    pub fn new(config: &LipsyncConfig) -> Self {
        Self {
            onset_rate: config.onset_rate,
            falloff_rate: config.falloff_rate,
            level_multiplier: config.level_multiplier,
        }
    }

    /// Move `current` toward `target` for one tick of `dt` seconds.
    ///
    /// Each channel moves linearly at the onset rate when rising and the
    /// falloff rate when decaying, never past the target; the moved value is
    /// then scaled by the level multiplier and clamped into [0, 1].
    pub fn blend(&self, current: &VisemeVector, target: &VisemeVector, dt: f32) -> VisemeVector {
        let dt = dt.max(0.0);
        let mut out = [0.0f32; VISEME_COUNT];

        for (i, slot) in out.iter_mut().enumerate() {
            let cur = current.0[i];
            let tgt = target.0[i];

            let moved = if tgt > cur {
                (cur + self.onset_rate * dt).min(tgt)
            } else {
                (cur - self.falloff_rate * dt).max(tgt)
            };

            *slot = (moved * self.level_multiplier).clamp(0.0, 1.0);
        }

        VisemeVector(out)
    }

    /// The configured onset rate in units per second
    pub fn onset_rate(&self) -> f32 {
        self.onset_rate
    }

    /// The configured falloff rate in units per second
    pub fn falloff_rate(&self) -> f32 {
        self.falloff_rate
    }
}
