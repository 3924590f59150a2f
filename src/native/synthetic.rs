//! Built-in deterministic avatar runtime
//!
//! Stands in for the real native SDK: procedural sine-phase motion for the
//! skeleton and a looping scripted viseme performance for the mouth. Drives
//! the demo binary and doubles as a test backend. All output is a pure
//! function of the per-handle sample count, so runs are reproducible.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use glam::{Quat, Vec3};

use crate::avatar::lipsync::{VisemeVector, LAUGHTER_CHANNEL, SILENCE_CHANNEL, VISEME_COUNT};
use crate::avatar::skeleton::{HandFrame, PoseSnapshot, Transform, HAND_JOINT_COUNT};
use crate::config::CapabilitySet;
use crate::error::AcquireError;

use super::{AvatarHandle, AvatarRuntime};

/// Nominal sample step; the synthetic clock advances this much per skeleton
/// sample regardless of host tick timing.
const SAMPLE_STEP: f64 = 1.0 / 60.0;

/// One cue of the scripted mouth performance.
struct ScriptCue {
    /// Viseme channel driven during the cue
    channel: usize,
    /// Target amplitude for the channel
    level: f32,
    /// Cue length in seconds
    duration: f64,
}

struct PerformanceScript {
    cues: Vec<ScriptCue>,
    total: f64,
}

impl PerformanceScript {
    /// Target scores at performance time `t`, looping over the script
    fn target_at(&self, t: f64) -> VisemeVector {
        let mut t = t % self.total;
        let mut values = [0.0f32; VISEME_COUNT];

        for cue in &self.cues {
            if t < cue.duration {
                values[cue.channel] = cue.level;
                if cue.channel != SILENCE_CHANNEL {
                    // Silence fills whatever the cue leaves
                    values[SILENCE_CHANNEL] = (1.0 - cue.level).max(0.0);
                }
                return VisemeVector::new(values);
            }
            t -= cue.duration;
        }

        values[SILENCE_CHANNEL] = 1.0;
        VisemeVector::new(values)
    }
}

/// The script is process-wide and built exactly once, on first use.
fn performance_script() -> &'static PerformanceScript {
    static SCRIPT: OnceLock<PerformanceScript> = OnceLock::new();
    SCRIPT.get_or_init(|| {
        // A short nonsense phrase cycling through open and closed mouth
        // shapes, a pause, then a laugh
        let cues = vec![
            ScriptCue { channel: 10, level: 0.9, duration: 0.20 }, // aa
            ScriptCue { channel: 1, level: 0.8, duration: 0.10 },  // PP
            ScriptCue { channel: 13, level: 0.9, duration: 0.25 }, // oh
            ScriptCue { channel: 7, level: 0.6, duration: 0.15 },  // SS
            ScriptCue { channel: 11, level: 0.8, duration: 0.20 }, // E
            ScriptCue { channel: SILENCE_CHANNEL, level: 1.0, duration: 0.60 },
            ScriptCue { channel: LAUGHTER_CHANNEL, level: 0.7, duration: 0.50 },
            ScriptCue { channel: SILENCE_CHANNEL, level: 1.0, duration: 0.40 },
        ];
        let total = cues.iter().map(|c| c.duration).sum();
        PerformanceScript { cues, total }
    })
}

struct Instance {
    capabilities: CapabilitySet,
    /// Skeleton samples served so far; the instance clock
    samples: u64,
}

/// Deterministic in-process [`AvatarRuntime`].
pub struct SyntheticRuntime {
    instances: Mutex<HashMap<u64, Instance>>,
    next_handle: Mutex<u64>,
}

impl Default for SyntheticRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticRuntime {
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
            next_handle: Mutex::new(1),
        }
    }

    /// Number of live instances
    pub fn active_count(&self) -> usize {
        self.lock_instances().len()
    }

    fn lock_instances(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Instance>> {
        self.instances.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Procedural pose at instance time `t`
    fn pose_at(t: f64, capabilities: CapabilitySet) -> PoseSnapshot {
        let t = t as f32;
        let mut pose = PoseSnapshot::default();

        if capabilities.body || capabilities.base {
            // Idle sway around a standing root
            let sway = (t * 0.4 * std::f32::consts::PI).sin();
            let root_rot = Quat::from_axis_angle(Vec3::Z, sway * 0.006);
            pose.root = Transform {
                position: [sway * 0.01, 1.6, 0.0],
                rotation: root_rot.to_array(),
            };
        }

        if capabilities.hands {
            pose.right_hand = Self::hand_at(t, 0.0, 1.0);
            pose.left_hand = Self::hand_at(t, std::f32::consts::PI * 0.5, -1.0);
        }

        pose
    }

    /// One hand's joints: a gentle pendulum with fingers curling in phase
    fn hand_at(t: f32, phase: f32, mirror: f32) -> HandFrame {
        let swing = (t * 0.8 * std::f32::consts::PI + phase).sin();
        let curl = (t * 1.3 + phase).sin().abs() * 0.4;

        let mut frame = HandFrame::default();
        for (i, joint) in frame.joints.iter_mut().enumerate() {
            let depth = i as f32 / HAND_JOINT_COUNT as f32;
            let rot = Quat::from_axis_angle(Vec3::X, curl * depth)
                * Quat::from_axis_angle(Vec3::Z, swing * 0.05 * mirror);
            *joint = Transform {
                position: [mirror * (0.25 + depth * 0.08), 1.3 + swing * 0.02, 0.1],
                rotation: rot.to_array(),
            };
        }
        frame
    }
}

impl AvatarRuntime for SyntheticRuntime {
    fn acquire(
        &self,
        capabilities: CapabilitySet,
        user_id: u64,
    ) -> Result<AvatarHandle, AcquireError> {
        let raw = {
            let mut next = self.next_handle.lock().unwrap_or_else(|e| e.into_inner());
            let raw = *next;
            *next += 1;
            raw
        };

        self.lock_instances().insert(
            raw,
            Instance {
                capabilities,
                samples: 0,
            },
        );

        tracing::debug!("Synthetic avatar {} instantiated for user {}", raw, user_id);
        Ok(AvatarHandle::from_raw(raw))
    }

    fn release(&self, handle: &AvatarHandle) {
        if self.lock_instances().remove(&handle.raw()).is_none() {
            tracing::warn!("Release of unknown synthetic handle {}", handle.raw());
        }
    }

    fn sample_skeleton(&self, handle: &AvatarHandle) -> Option<PoseSnapshot> {
        let mut instances = self.lock_instances();
        let instance = instances.get_mut(&handle.raw())?;

        let t = instance.samples as f64 * SAMPLE_STEP;
        instance.samples += 1;
        Some(Self::pose_at(t, instance.capabilities))
    }

    fn sample_visemes(&self, handle: &AvatarHandle) -> Option<VisemeVector> {
        let instances = self.lock_instances();
        let instance = instances.get(&handle.raw())?;

        if !instance.capabilities.expressive {
            let mut silent = [0.0f32; VISEME_COUNT];
            silent[SILENCE_CHANNEL] = 1.0;
            return Some(VisemeVector::new(silent));
        }

        // Viseme time follows the skeleton clock without advancing it. The
        // skeleton sample of the same tick already incremented the count, so
        // step back one to land on the time that pose was served at
        let t = instance.samples.saturating_sub(1) as f64 * SAMPLE_STEP;
        Some(performance_script().target_at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expressive_caps() -> CapabilitySet {
        CapabilitySet {
            expressive: true,
            ..CapabilitySet::default()
        }
    }

    #[test]
    fn test_acquire_release_bookkeeping() {
        let runtime = SyntheticRuntime::new();
        let a = runtime.acquire(CapabilitySet::default(), 1).unwrap();
        let b = runtime.acquire(CapabilitySet::default(), 2).unwrap();
        assert_ne!(a, b);
        assert_eq!(runtime.active_count(), 2);

        runtime.release(&a);
        assert_eq!(runtime.active_count(), 1);
        assert!(runtime.sample_skeleton(&a).is_none(), "released handles stop sampling");
        assert!(runtime.sample_skeleton(&b).is_some());
    }

    #[test]
    fn test_samples_are_deterministic_across_runs() {
        let first = SyntheticRuntime::new();
        let second = SyntheticRuntime::new();
        let ha = first.acquire(expressive_caps(), 1).unwrap();
        let hb = second.acquire(expressive_caps(), 1).unwrap();

        for _ in 0..120 {
            assert_eq!(first.sample_visemes(&ha), second.sample_visemes(&hb));
            assert_eq!(first.sample_skeleton(&ha), second.sample_skeleton(&hb));
        }
    }

    #[test]
    fn test_viseme_sample_matches_skeleton_clock() {
        let runtime = SyntheticRuntime::new();
        let handle = runtime.acquire(expressive_caps(), 1).unwrap();

        // Tick order is skeleton first, visemes second; both samples of one
        // tick must sit on the same instance time
        for n in 0u64..90 {
            runtime.sample_skeleton(&handle).unwrap();
            let visemes = runtime.sample_visemes(&handle).unwrap();
            let expected = performance_script().target_at(n as f64 * SAMPLE_STEP);
            assert_eq!(visemes, expected, "tick {} drifted off the skeleton clock", n);
        }
    }

    #[test]
    fn test_capabilities_gate_output() {
        let runtime = SyntheticRuntime::new();
        let caps = CapabilitySet {
            body: false,
            hands: false,
            base: false,
            expressive: false,
        };
        let handle = runtime.acquire(caps, 1).unwrap();

        let pose = runtime.sample_skeleton(&handle).unwrap();
        assert_eq!(pose, PoseSnapshot::default());

        let visemes = runtime.sample_visemes(&handle).unwrap();
        assert_eq!(visemes.silence(), 1.0);
        assert_eq!(visemes.laughter(), 0.0);
    }

    #[test]
    fn test_script_loops_and_reaches_laughter() {
        let script = performance_script();
        assert!(script.total > 0.0);

        let mut saw_laughter = false;
        let mut t = 0.0;
        while t < script.total * 2.0 {
            if script.target_at(t).laughter() > 0.0 {
                saw_laughter = true;
            }
            t += 1.0 / 60.0;
        }
        assert!(saw_laughter);

        // Looping: the same phase one cycle later gives the same target
        let early = script.target_at(0.1);
        let late = script.target_at(0.1 + script.total);
        assert_eq!(early, late);
    }
}
