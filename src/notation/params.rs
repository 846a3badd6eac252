use crate::foundation::error::{CadenzaError, CadenzaResult};

/// How consecutive beats relate to each other when the engine picks motions.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum ContinuityMode {
    /// Each beat flows from the end state of the previous one.
    #[default]
    Continuous,
    /// Beats are drawn independently.
    Random,
}

/// Overall shape of the generated sequence.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum SequenceMode {
    /// No closure constraint.
    #[default]
    Freeform,
    /// The sequence must return to (a permutation of) its start state.
    Circular,
}

/// Rotation granularity for circular sequences with a strict-rotated cap.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum RotationType {
    /// The second half repeats the first, rotated by a half turn.
    #[default]
    Halved,
    /// Four quarter-turn repetitions of the first quarter.
    Quartered,
}

/// Continuation-and-permutation cap applied to circular sequences.
///
/// A cap names the symmetry relating the back half of a sequence to its
/// front half. `rotation_type` is only consulted for [`CapType::StrictRotated`].
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum CapType {
    /// Back half is a pure rotation of the front half.
    #[default]
    StrictRotated,
    /// Back half is a pure mirror of the front half.
    StrictMirrored,
    /// Back half swaps the two hands of the front half.
    StrictSwapped,
    /// Back half complements each motion of the front half.
    StrictComplementary,
    /// Mirror composed with rotation.
    MirroredRotated,
    /// Mirror composed with hand swap.
    MirroredSwapped,
    /// Mirror composed with complement.
    MirroredComplementary,
    /// Rotation composed with hand swap.
    RotatedSwapped,
    /// Rotation composed with complement.
    RotatedComplementary,
    /// Hand swap composed with complement.
    SwappedComplementary,
    /// Any cap the engine finds reachable.
    Any,
}

/// Where the sequence starts.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum StartPosition {
    /// Let the engine pick any legal start position.
    #[default]
    Any,
    /// Pin a named start position (e.g. `"alpha1"`).
    Named(String),
}

/// Immutable parameter set for one generation call.
///
/// Validated once at batch start via [`GenerationParams::validate`]; the
/// orchestrator derives per-job variations with
/// [`GenerationParams::varied_for_batch`] and never mutates a caller's value.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct GenerationParams {
    /// Number of content beats the artifact must contain. Must be > 0.
    pub length: u32,
    /// Difficulty level, 1–3.
    pub level: u8,
    /// Density of turns the engine should aim for.
    #[serde(default)]
    pub turn_intensity: f64,
    /// Beat-to-beat continuity discipline.
    #[serde(default)]
    pub continuity: ContinuityMode,
    /// Freeform or circular sequence shape.
    #[serde(default)]
    pub mode: SequenceMode,
    /// Rotation granularity; only meaningful for circular + strict-rotated.
    #[serde(default)]
    pub rotation_type: RotationType,
    /// Symmetry cap for circular sequences.
    #[serde(default)]
    pub cap_type: CapType,
    /// Requested start position.
    #[serde(default)]
    pub start_position: StartPosition,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            length: 8,
            level: 1,
            turn_intensity: 0.0,
            continuity: ContinuityMode::default(),
            mode: SequenceMode::default(),
            rotation_type: RotationType::default(),
            cap_type: CapType::default(),
            start_position: StartPosition::default(),
        }
    }
}

impl GenerationParams {
    /// Check numeric ranges. Called once per batch before any session exists.
    pub fn validate(&self) -> CadenzaResult<()> {
        if self.length == 0 {
            return Err(CadenzaError::validation(
                "GenerationParams length must be > 0",
            ));
        }
        if !(1..=3).contains(&self.level) {
            return Err(CadenzaError::validation(
                "GenerationParams level must be in 1..=3",
            ));
        }
        if !self.turn_intensity.is_finite() || self.turn_intensity < 0.0 {
            return Err(CadenzaError::validation(
                "GenerationParams turn_intensity must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Derive the parameter set for the `job_index`-th job of a batch.
    ///
    /// The first job uses the caller's parameters untouched. Every later job
    /// forces `start_position = Any`: engines seed their internal randomness
    /// from the inputs, and a pinned start position would collapse a batch
    /// into identical repeats.
    pub fn varied_for_batch(&self, job_index: u32) -> Self {
        let mut params = self.clone();
        if job_index > 0 {
            params.start_position = StartPosition::Any;
        }
        params
    }
}
