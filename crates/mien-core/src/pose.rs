//! Pose vector - one frame's full expression/posture
//!
//! A pose is the fixed-length, ordered set of all morph channel values.
//! Components pass poses by value; the vector is small enough that copying
//! beats sharing.

use crate::Morph;

/// The full ordered set of morph-channel values describing one frame's pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseVector([f32; Morph::COUNT]);

impl Default for PoseVector {
    fn default() -> Self {
        Self::neutral()
    }
}

impl PoseVector {
    /// All channels at rest
    pub fn neutral() -> Self {
        PoseVector([0.0; Morph::COUNT])
    }

    /// Build from a raw channel array (wire order)
    pub fn from_array(values: [f32; Morph::COUNT]) -> Self {
        PoseVector(values)
    }

    /// Raw channel values in wire order
    pub fn as_array(&self) -> &[f32; Morph::COUNT] {
        &self.0
    }

    /// Value of one channel
    pub fn get(&self, morph: Morph) -> f32 {
        self.0[morph.index()]
    }

    /// Set one channel
    pub fn set(&mut self, morph: Morph, value: f32) {
        self.0[morph.index()] = value;
    }

    /// Set one channel, clamped to its legal range
    pub fn set_clamped(&mut self, morph: Morph, value: f32) {
        let (lo, hi) = morph.range();
        self.0[morph.index()] = value.clamp(lo, hi);
    }

    /// Clamp every channel to its legal range
    pub fn clamped(mut self) -> Self {
        for morph in Morph::all() {
            let (lo, hi) = morph.range();
            let idx = morph.index();
            self.0[idx] = self.0[idx].clamp(lo, hi);
        }
        self
    }

    /// True if every channel is within its legal range
    pub fn in_range(&self) -> bool {
        Morph::all().iter().all(|m| {
            let (lo, hi) = m.range();
            let v = self.get(*m);
            v >= lo && v <= hi
        })
    }

    /// Advance every channel a fraction `step` of the way toward `target`.
    ///
    /// `step` in [0, 1]; 0 stays put, 1 lands on the target. Feeding the
    /// output back as the current pose with a constant target traces a
    /// saturating exponential approach - no progress state needed.
    pub fn step_toward(&self, target: &PoseVector, step: f32) -> PoseVector {
        let mut next = *self;
        for idx in 0..Morph::COUNT {
            let delta = target.0[idx] - self.0[idx];
            next.0[idx] = self.0[idx] + step * delta;
        }
        next
    }

    /// Largest absolute per-channel difference to another pose
    pub fn max_abs_diff(&self, other: &PoseVector) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}
