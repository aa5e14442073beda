//! Morph channel table - the fixed control vocabulary of the posing model
//!
//! The posing model consumes a fixed-length vector of scalar controls
//! ("morphs"). Order is part of the contract: every component in the
//! pipeline addresses channels through this table, never through raw
//! indices.

/// One named scalar control of the character's expressive pose.
///
/// The discriminant IS the channel's index in a [`crate::PoseVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Morph {
    EyebrowTroubledLeft,
    EyebrowTroubledRight,
    EyebrowAngryLeft,
    EyebrowAngryRight,
    EyebrowLoweredLeft,
    EyebrowLoweredRight,
    EyebrowRaisedLeft,
    EyebrowRaisedRight,
    EyebrowHappyLeft,
    EyebrowHappyRight,
    EyebrowSeriousLeft,
    EyebrowSeriousRight,
    EyeWinkLeft,
    EyeWinkRight,
    EyeHappyWinkLeft,
    EyeHappyWinkRight,
    EyeSurprisedLeft,
    EyeSurprisedRight,
    EyeRelaxedLeft,
    EyeRelaxedRight,
    EyeUnimpressedLeft,
    EyeUnimpressedRight,
    EyeRaisedLowerEyelidLeft,
    EyeRaisedLowerEyelidRight,
    IrisSmallLeft,
    IrisSmallRight,
    IrisRotationX,
    IrisRotationY,
    HeadX,
    HeadY,
    NeckZ,
    MouthAaa,
    MouthIii,
    MouthUuu,
    MouthEee,
    MouthOoo,
    MouthDelta,
    MouthLoweredCornerLeft,
    MouthLoweredCornerRight,
    MouthRaisedCornerLeft,
    MouthRaisedCornerRight,
    MouthSmirk,
    BodyY,
    BodyZ,
    Breathing,
}

impl Morph {
    /// Number of morph channels
    pub const COUNT: usize = 45;

    /// All channels in wire order
    pub fn all() -> &'static [Morph] {
        use Morph::*;
        &[
            EyebrowTroubledLeft,
            EyebrowTroubledRight,
            EyebrowAngryLeft,
            EyebrowAngryRight,
            EyebrowLoweredLeft,
            EyebrowLoweredRight,
            EyebrowRaisedLeft,
            EyebrowRaisedRight,
            EyebrowHappyLeft,
            EyebrowHappyRight,
            EyebrowSeriousLeft,
            EyebrowSeriousRight,
            EyeWinkLeft,
            EyeWinkRight,
            EyeHappyWinkLeft,
            EyeHappyWinkRight,
            EyeSurprisedLeft,
            EyeSurprisedRight,
            EyeRelaxedLeft,
            EyeRelaxedRight,
            EyeUnimpressedLeft,
            EyeUnimpressedRight,
            EyeRaisedLowerEyelidLeft,
            EyeRaisedLowerEyelidRight,
            IrisSmallLeft,
            IrisSmallRight,
            IrisRotationX,
            IrisRotationY,
            HeadX,
            HeadY,
            NeckZ,
            MouthAaa,
            MouthIii,
            MouthUuu,
            MouthEee,
            MouthOoo,
            MouthDelta,
            MouthLoweredCornerLeft,
            MouthLoweredCornerRight,
            MouthRaisedCornerLeft,
            MouthRaisedCornerRight,
            MouthSmirk,
            BodyY,
            BodyZ,
            Breathing,
        ]
    }

    /// Channel index in a pose vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Channel name as used in emotion preset files
    pub fn name(self) -> &'static str {
        use Morph::*;
        match self {
            EyebrowTroubledLeft => "eyebrow_troubled_left",
            EyebrowTroubledRight => "eyebrow_troubled_right",
            EyebrowAngryLeft => "eyebrow_angry_left",
            EyebrowAngryRight => "eyebrow_angry_right",
            EyebrowLoweredLeft => "eyebrow_lowered_left",
            EyebrowLoweredRight => "eyebrow_lowered_right",
            EyebrowRaisedLeft => "eyebrow_raised_left",
            EyebrowRaisedRight => "eyebrow_raised_right",
            EyebrowHappyLeft => "eyebrow_happy_left",
            EyebrowHappyRight => "eyebrow_happy_right",
            EyebrowSeriousLeft => "eyebrow_serious_left",
            EyebrowSeriousRight => "eyebrow_serious_right",
            EyeWinkLeft => "eye_wink_left",
            EyeWinkRight => "eye_wink_right",
            EyeHappyWinkLeft => "eye_happy_wink_left",
            EyeHappyWinkRight => "eye_happy_wink_right",
            EyeSurprisedLeft => "eye_surprised_left",
            EyeSurprisedRight => "eye_surprised_right",
            EyeRelaxedLeft => "eye_relaxed_left",
            EyeRelaxedRight => "eye_relaxed_right",
            EyeUnimpressedLeft => "eye_unimpressed_left",
            EyeUnimpressedRight => "eye_unimpressed_right",
            EyeRaisedLowerEyelidLeft => "eye_raised_lower_eyelid_left",
            EyeRaisedLowerEyelidRight => "eye_raised_lower_eyelid_right",
            IrisSmallLeft => "iris_small_left",
            IrisSmallRight => "iris_small_right",
            IrisRotationX => "iris_rotation_x",
            IrisRotationY => "iris_rotation_y",
            HeadX => "head_x",
            HeadY => "head_y",
            NeckZ => "neck_z",
            MouthAaa => "mouth_aaa",
            MouthIii => "mouth_iii",
            MouthUuu => "mouth_uuu",
            MouthEee => "mouth_eee",
            MouthOoo => "mouth_ooo",
            MouthDelta => "mouth_delta",
            MouthLoweredCornerLeft => "mouth_lowered_corner_left",
            MouthLoweredCornerRight => "mouth_lowered_corner_right",
            MouthRaisedCornerLeft => "mouth_raised_corner_left",
            MouthRaisedCornerRight => "mouth_raised_corner_right",
            MouthSmirk => "mouth_smirk",
            BodyY => "body_y",
            BodyZ => "body_z",
            Breathing => "breathing",
        }
    }

    /// Look a channel up by its preset-file name
    pub fn from_name(name: &str) -> Option<Morph> {
        Morph::all().iter().copied().find(|m| m.name() == name)
    }

    /// Legal value range of this channel.
    ///
    /// Rotation-like channels swing both ways; everything else is an
    /// activation in [0, 1].
    pub fn range(self) -> (f32, f32) {
        use Morph::*;
        match self {
            IrisRotationX | IrisRotationY | HeadX | HeadY | NeckZ | BodyY | BodyZ => (-1.0, 1.0),
            _ => (0.0, 1.0),
        }
    }

    /// Channels the sway driver drifts (head/neck/body axes)
    pub fn sway_parts() -> &'static [Morph] {
        use Morph::*;
        &[HeadX, HeadY, NeckZ, BodyY, BodyZ]
    }

    /// Channels forced shut by a blink
    pub fn blink_parts() -> &'static [Morph] {
        use Morph::*;
        &[EyeWinkLeft, EyeWinkRight]
    }
}
