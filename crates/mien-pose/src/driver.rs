//! Pose driver - computes the next pose from emotion, time, and chance
//!
//! One `tick` applies, in order: emotion overlay onto the target, sway
//! randomization of the target, integration of the current pose toward the
//! target, then the blink/talk/breathing overlays directly onto the
//! integrated pose. Integration runs first so the overlays win their
//! channels for the tick; the integrator relaxes those channels back on
//! the next tick because the overlays never touch the target.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mien_core::{Morph, PoseVector};

use crate::{EmotionPreset, EmotionRegistry, DEFAULT_EMOTION};

/// Driver tuning. Defaults are the production values.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Fraction of the remaining distance covered per integration step
    pub step: f32,

    /// Sway macro targets stay within [-amplitude, amplitude]
    pub sway_amplitude: f32,

    /// Per-tick micro-jitter added on top of the macro target
    pub sway_jitter: f32,

    /// Seconds a sway target is held before re-randomizing (uniform range)
    pub sway_hold_secs: (f32, f32),

    /// Per-tick blink probability
    pub blink_probability: f64,

    /// Seconds before another blink may begin (uniform range)
    pub blink_refractory_secs: (f32, f32),

    /// Emotion that disables the blink refractory gate...
    pub blink_override_emotion: String,

    /// ...for this long after the emotion was entered
    pub blink_override_window: Duration,

    /// Length of one breathing cycle
    pub breathing_cycle: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            sway_amplitude: 0.6,
            sway_jitter: 0.02,
            sway_hold_secs: (5.0, 10.0),
            // Humans blink 12-20 times a minute, one blink every 3-5 s.
            blink_probability: 0.03,
            blink_refractory_secs: (2.0, 5.0),
            blink_override_emotion: "confusion".to_string(),
            blink_override_window: Duration::from_secs(10),
            breathing_cycle: Duration::from_secs(4),
        }
    }
}

/// The pose-animation state machine.
///
/// Owned exclusively by the animator loop; all mutation happens inside
/// [`PoseDriver::tick`]. Deterministic under a seeded RNG and
/// caller-supplied instants.
#[derive(Debug)]
pub struct PoseDriver {
    config: DriverConfig,
    registry: EmotionRegistry,
    rng: StdRng,

    current_pose: Option<PoseVector>,

    last_emotion: Option<String>,
    last_emotion_change: Option<Instant>,

    last_blink: Option<Instant>,
    blink_interval: Option<f32>,

    sway_target: Option<PoseVector>,
    last_sway_at: Option<Instant>,
    sway_interval: Option<f32>,

    breathing_epoch: Instant,
}

impl PoseDriver {
    pub fn new(registry: EmotionRegistry, config: DriverConfig) -> Self {
        Self::with_rng(registry, config, StdRng::from_entropy(), Instant::now())
    }

    /// Fully injected constructor: tests seed the RNG and pin the epoch.
    pub fn with_rng(
        registry: EmotionRegistry,
        config: DriverConfig,
        rng: StdRng,
        now: Instant,
    ) -> Self {
        PoseDriver {
            config,
            registry,
            rng,
            current_pose: None,
            last_emotion: None,
            last_emotion_change: None,
            last_blink: None,
            blink_interval: None,
            sway_target: None,
            last_sway_at: None,
            sway_interval: None,
            breathing_epoch: now,
        }
    }

    /// Drop all animation state. The next tick re-initializes from the
    /// active emotion's full pose.
    pub fn reset(&mut self, now: Instant) {
        self.current_pose = None;
        self.last_emotion = None;
        self.last_emotion_change = None;
        self.last_blink = None;
        self.blink_interval = None;
        self.sway_target = None;
        self.last_sway_at = None;
        self.sway_interval = None;
        self.breathing_epoch = now;
    }

    /// Last pose produced by [`tick`](Self::tick), if any.
    pub fn current_pose(&self) -> Option<&PoseVector> {
        self.current_pose.as_ref()
    }

    /// Advance the animation by one tick and return the new pose.
    ///
    /// Unknown emotion names resolve to [`DEFAULT_EMOTION`]; rejecting them
    /// loudly is the control surface's job, not the driver's.
    pub fn tick(&mut self, emotion: &str, talking: bool, now: Instant) -> PoseVector {
        let emotion = if self.registry.contains(emotion) {
            emotion
        } else {
            DEFAULT_EMOTION
        };
        let preset = self.resolve_preset(emotion);

        // First tick after startup or reset: start from the emotion's full
        // pose instead of animating in from nothing.
        let current = match self.current_pose {
            Some(pose) => pose,
            None => preset.to_pose(),
        };

        let emotion_changed = self.last_emotion.as_deref() != Some(emotion);
        if emotion_changed {
            self.last_emotion_change = Some(now);
        }

        // Emotion overlay: preset channels onto the working target, the
        // rest keeps the current pose's values.
        let mut target = current;
        preset.apply_to(&mut target);

        // Sway: randomized macro target (cached) plus per-tick jitter.
        let target = self.sway_target(&target, emotion_changed, now);

        // Integration first, overlays after - they overwrite their
        // channels outright for this tick.
        let mut pose = current.step_toward(&target, self.config.step);
        self.animate_blink(&mut pose, emotion, now);
        self.animate_talking(&mut pose, talking);
        self.animate_breathing(&mut pose, now);

        // Updated last so the drivers above still saw the old emotion.
        self.last_emotion = Some(emotion.to_string());
        self.current_pose = Some(pose);
        pose
    }

    fn resolve_preset(&self, emotion: &str) -> EmotionPreset {
        let (preset, _) = self.registry.resolve(emotion);
        preset.clone()
    }

    /// History-free sway driver. The macro target is re-randomized only on
    /// an emotion change or when the hold interval lapses; between those
    /// points the cached target is reused so the integrator does the actual
    /// motion. Micro-jitter is fresh every tick and never cached.
    fn sway_target(&mut self, base: &PoseVector, emotion_changed: bool, now: Instant) -> PoseVector {
        let mut pick_new_target = true;
        if !emotion_changed {
            if let (Some(interval), Some(at)) = (self.sway_interval, self.last_sway_at) {
                if now.duration_since(at).as_secs_f32() < interval {
                    pick_new_target = false;
                }
            }
        }

        let mut target = if pick_new_target {
            let amplitude = self.config.sway_amplitude;
            let mut swayed = *base;
            for &morph in Morph::sway_parts() {
                let value = base.get(morph);
                // Cut the random range so the swayed target stays within
                // [-amplitude, amplitude] no matter where the base sits.
                let upper = (amplitude - value).max(0.0);
                let lower = (-amplitude - value).min(0.0);
                swayed.set(morph, value + self.rng.gen_range(lower..=upper));
            }
            self.sway_target = Some(swayed);
            self.last_sway_at = Some(now);
            let (lo, hi) = self.config.sway_hold_secs;
            self.sway_interval = Some(self.rng.gen_range(lo..hi));
            swayed
        } else {
            self.sway_target.unwrap_or(*base)
        };

        let jitter = self.config.sway_jitter;
        for &morph in Morph::sway_parts() {
            let value = (target.get(morph) + self.rng.gen_range(-jitter..=jitter)).clamp(-1.0, 1.0);
            target.set(morph, value);
        }
        target
    }

    /// Blink driver. A positive draw is suppressed inside the refractory
    /// interval, except shortly after entering the override emotion - a
    /// freshly confused character flutters.
    fn animate_blink(&mut self, pose: &mut PoseVector, emotion: &str, now: Instant) {
        let mut should_blink = self.rng.gen_bool(self.config.blink_probability);

        if let (Some(interval), Some(last)) = (self.blink_interval, self.last_blink) {
            let override_active = emotion == self.config.blink_override_emotion
                && self
                    .last_emotion_change
                    .is_some_and(|at| now.duration_since(at) < self.config.blink_override_window);
            if !override_active && now.duration_since(last).as_secs_f32() < interval {
                should_blink = false;
            }
        }

        if !should_blink {
            return;
        }

        // Eyes shut for this tick only; the integrator reopens them since
        // the wink channels are never part of the target.
        for &morph in Morph::blink_parts() {
            pose.set(morph, 1.0);
        }
        self.last_blink = Some(now);
        let (lo, hi) = self.config.blink_refractory_secs;
        self.blink_interval = Some(self.rng.gen_range(lo..hi));
    }

    /// Talking driver: a bounded random walk on the mouth-open channel that
    /// tends to alternate toward the extremes.
    fn animate_talking(&mut self, pose: &mut PoseVector, talking: bool) {
        if !talking {
            return;
        }
        let previous = pose.get(Morph::MouthAaa);
        let next = ((1.0 - previous).abs() + self.rng.gen_range(-2.0f32..2.0)).clamp(0.0, 1.0);
        pose.set(Morph::MouthAaa, next);
    }

    /// Breathing driver: smooth 0..1..0 envelope over the cycle duration.
    /// The epoch resets once per cycle to bound float drift in long
    /// sessions.
    fn animate_breathing(&mut self, pose: &mut PoseVector, now: Instant) {
        let cycle_secs = self.config.breathing_cycle.as_secs_f64();
        let elapsed = now.duration_since(self.breathing_epoch).as_secs_f64();
        let cycle_pos = elapsed / cycle_secs;
        if cycle_pos > 1.0 {
            self.breathing_epoch = now;
        }
        let phase = cycle_pos.fract();
        pose.set(Morph::Breathing, ((phase * PI).sin().powi(2)) as f32);
    }
}
