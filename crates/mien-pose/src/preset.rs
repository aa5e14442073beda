//! Emotion presets - named partial target poses
//!
//! A preset maps morph channel names to target values. Channels absent from
//! a preset keep whatever value the working pose already has; the breathing
//! channel is driven exclusively by the breathing animation and is never
//! accepted from a preset.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, warn};

use mien_core::{MienError, MienResult, Morph, PoseVector};

/// A named partial mapping from morph channel to target value.
#[derive(Debug, Clone, Default)]
pub struct EmotionPreset {
    name: String,
    channels: Vec<(Morph, f32)>,
}

impl EmotionPreset {
    /// Empty preset (all channels keep their current values).
    pub fn empty(name: impl Into<String>) -> Self {
        EmotionPreset {
            name: name.into(),
            channels: Vec::new(),
        }
    }

    /// Build from (channel, value) pairs. Values are clamped to each
    /// channel's legal range; the breathing channel is dropped.
    pub fn from_channels(
        name: impl Into<String>,
        channels: impl IntoIterator<Item = (Morph, f32)>,
    ) -> Self {
        let channels = channels
            .into_iter()
            .filter(|(morph, _)| *morph != Morph::Breathing)
            .map(|(morph, value)| {
                let (lo, hi) = morph.range();
                (morph, value.clamp(lo, hi))
            })
            .collect();
        EmotionPreset {
            name: name.into(),
            channels,
        }
    }

    /// Full expression pose: an all-zero base for every channel except
    /// breathing, with `overrides` applied on top. Built-in presets are
    /// full so the integrator always has a definite target to relax the
    /// blink/talk channels back toward.
    pub fn full(
        name: impl Into<String>,
        overrides: impl IntoIterator<Item = (Morph, f32)>,
    ) -> Self {
        let mut channels: Vec<(Morph, f32)> = Morph::all()
            .iter()
            .filter(|m| **m != Morph::Breathing)
            .map(|m| (*m, 0.0))
            .collect();
        for (morph, value) in overrides {
            if morph == Morph::Breathing {
                continue;
            }
            let (lo, hi) = morph.range();
            if let Some(slot) = channels.iter_mut().find(|(m, _)| *m == morph) {
                slot.1 = value.clamp(lo, hi);
            }
        }
        EmotionPreset {
            name: name.into(),
            channels,
        }
    }

    /// Parse a preset from its JSON file representation: a flat object of
    /// channel name to value. Unknown channel names and the breathing
    /// channel are skipped with a warning; values are clamped on load.
    pub fn from_json(name: impl Into<String>, json: &str) -> MienResult<Self> {
        let name = name.into();
        let raw: BTreeMap<String, f32> =
            serde_json::from_str(json).map_err(|e| MienError::PresetParse(e.to_string()))?;

        let mut channels = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            match Morph::from_name(&key) {
                Some(Morph::Breathing) => {
                    warn!(preset = %name, "preset tried to set breathing; ignored");
                }
                Some(morph) => {
                    let (lo, hi) = morph.range();
                    channels.push((morph, value.clamp(lo, hi)));
                }
                None => {
                    warn!(preset = %name, channel = %key, "unknown morph channel in preset; ignored");
                }
            }
        }
        Ok(EmotionPreset { name, channels })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channels this preset sets
    pub fn channels(&self) -> &[(Morph, f32)] {
        &self.channels
    }

    /// Copy every channel of this preset onto `target`. Channels the preset
    /// does not mention keep the value already in `target`.
    pub fn apply_to(&self, target: &mut PoseVector) {
        for (morph, value) in &self.channels {
            if *morph == Morph::Breathing {
                continue;
            }
            target.set(*morph, *value);
        }
    }

    /// Full pose for this preset: neutral everywhere the preset is silent.
    pub fn to_pose(&self) -> PoseVector {
        let mut pose = PoseVector::neutral();
        self.apply_to(&mut pose);
        pose
    }
}

/// The emotion preset store: name to preset table, assembled at startup.
///
/// Always contains "neutral". Lookups of unknown names fall back to
/// "neutral" - the animation must keep running no matter what label the
/// classifier produces.
#[derive(Debug, Clone)]
pub struct EmotionRegistry {
    presets: HashMap<String, EmotionPreset>,
}

/// The emotion every unknown label resolves to.
pub const DEFAULT_EMOTION: &str = "neutral";

impl Default for EmotionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EmotionRegistry {
    /// The built-in preset table. A preset directory can extend or
    /// override these at startup.
    pub fn builtin() -> Self {
        use Morph::*;
        let mut registry = EmotionRegistry {
            presets: HashMap::new(),
        };

        registry.insert(EmotionPreset::full("neutral", []));
        registry.insert(EmotionPreset::full(
            "joy",
            [
                (EyebrowHappyLeft, 0.9),
                (EyebrowHappyRight, 0.9),
                (EyeHappyWinkLeft, 0.4),
                (EyeHappyWinkRight, 0.4),
                (MouthRaisedCornerLeft, 0.7),
                (MouthRaisedCornerRight, 0.7),
            ],
        ));
        registry.insert(EmotionPreset::full(
            "sadness",
            [
                (EyebrowTroubledLeft, 0.8),
                (EyebrowTroubledRight, 0.8),
                (EyeRelaxedLeft, 0.5),
                (EyeRelaxedRight, 0.5),
                (MouthLoweredCornerLeft, 0.6),
                (MouthLoweredCornerRight, 0.6),
            ],
        ));
        registry.insert(EmotionPreset::full(
            "anger",
            [
                (EyebrowAngryLeft, 1.0),
                (EyebrowAngryRight, 1.0),
                (EyeRaisedLowerEyelidLeft, 0.4),
                (EyeRaisedLowerEyelidRight, 0.4),
                (MouthDelta, 0.5),
            ],
        ));
        registry.insert(EmotionPreset::full(
            "fear",
            [
                (EyebrowTroubledLeft, 1.0),
                (EyebrowTroubledRight, 1.0),
                (EyeSurprisedLeft, 0.6),
                (EyeSurprisedRight, 0.6),
                (MouthUuu, 0.4),
            ],
        ));
        registry.insert(EmotionPreset::full(
            "surprise",
            [
                (EyebrowRaisedLeft, 1.0),
                (EyebrowRaisedRight, 1.0),
                (EyeSurprisedLeft, 1.0),
                (EyeSurprisedRight, 1.0),
                (MouthOoo, 0.8),
            ],
        ));
        registry.insert(EmotionPreset::full(
            "disgust",
            [
                (EyebrowLoweredLeft, 0.8),
                (EyebrowLoweredRight, 0.8),
                (EyeUnimpressedLeft, 0.9),
                (EyeUnimpressedRight, 0.9),
                (MouthLoweredCornerLeft, 0.4),
                (MouthLoweredCornerRight, 0.4),
            ],
        ));
        registry.insert(EmotionPreset::full(
            "confusion",
            [
                (EyebrowTroubledLeft, 0.6),
                (EyebrowRaisedRight, 0.7),
                (IrisRotationX, 0.3),
                (MouthSmirk, 0.3),
            ],
        ));
        registry.insert(EmotionPreset::full(
            "curiosity",
            [
                (EyebrowRaisedLeft, 0.7),
                (EyebrowRaisedRight, 0.7),
                (IrisSmallLeft, 0.3),
                (IrisSmallRight, 0.3),
                (HeadY, 0.2),
            ],
        ));

        registry
    }

    /// Built-ins plus every `<name>.json` in `dir`. Files that fail to
    /// parse are skipped with a warning; a missing directory is not an
    /// error (the built-ins stand alone).
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let mut registry = Self::builtin();
        let dir = dir.as_ref();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "no preset directory; using built-ins");
                return registry;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(json) => match EmotionPreset::from_json(&name, &json) {
                    Ok(preset) => {
                        debug!(preset = %name, "loaded emotion preset");
                        registry.insert(preset);
                    }
                    Err(e) => warn!(preset = %name, error = %e, "skipping unparseable preset"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable preset"),
            }
        }

        registry
    }

    fn insert(&mut self, preset: EmotionPreset) {
        self.presets.insert(preset.name().to_string(), preset);
    }

    /// Exact lookup.
    pub fn get(&self, name: &str) -> Option<&EmotionPreset> {
        self.presets.get(name)
    }

    /// True if `name` is a known emotion.
    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Lookup with the neutral fallback: unknown names resolve to
    /// [`DEFAULT_EMOTION`]. The bool reports whether a fallback happened.
    pub fn resolve(&self, name: &str) -> (&EmotionPreset, bool) {
        match self.presets.get(name) {
            Some(preset) => (preset, false),
            None => (
                self.presets
                    .get(DEFAULT_EMOTION)
                    .expect("registry always contains neutral"),
                true,
            ),
        }
    }

    /// Known emotion names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.presets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_neutral() {
        let registry = EmotionRegistry::builtin();
        assert!(registry.contains("neutral"));
        assert!(registry.contains("confusion"));
    }

    #[test]
    fn test_resolve_falls_back_to_neutral() {
        let registry = EmotionRegistry::builtin();
        let (preset, fell_back) = registry.resolve("joyyy");
        assert_eq!(preset.name(), "neutral");
        assert!(fell_back);

        let (preset, fell_back) = registry.resolve("joy");
        assert_eq!(preset.name(), "joy");
        assert!(!fell_back);
    }

    #[test]
    fn test_apply_keeps_absent_channels() {
        let preset = EmotionPreset::from_channels("test", [(Morph::MouthAaa, 0.5)]);
        let mut pose = PoseVector::neutral();
        pose.set(Morph::HeadX, 0.3);
        preset.apply_to(&mut pose);
        assert_eq!(pose.get(Morph::MouthAaa), 0.5);
        assert_eq!(pose.get(Morph::HeadX), 0.3);
    }

    #[test]
    fn test_breathing_never_accepted() {
        let preset = EmotionPreset::from_channels("test", [(Morph::Breathing, 1.0)]);
        let mut pose = PoseVector::neutral();
        preset.apply_to(&mut pose);
        assert_eq!(pose.get(Morph::Breathing), 0.0);

        let parsed = EmotionPreset::from_json("test", r#"{"breathing": 1.0}"#).unwrap();
        assert!(parsed.channels().is_empty());
    }

    #[test]
    fn test_from_json_clamps_and_skips_unknown() {
        let json = r#"{"mouth_aaa": 4.0, "head_x": -7.0, "not_a_channel": 0.5}"#;
        let preset = EmotionPreset::from_json("test", json).unwrap();
        let mut pose = PoseVector::neutral();
        preset.apply_to(&mut pose);
        assert_eq!(pose.get(Morph::MouthAaa), 1.0);
        assert_eq!(pose.get(Morph::HeadX), -1.0);
        assert_eq!(preset.channels().len(), 2);
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(EmotionPreset::from_json("test", "not json").is_err());
    }

    #[test]
    fn test_builtin_presets_are_in_range() {
        let registry = EmotionRegistry::builtin();
        for name in registry.names() {
            let (preset, _) = registry.resolve(name);
            assert!(preset.to_pose().in_range(), "preset {name} out of range");
        }
    }
}
