/// Fixed set of toggles accepted by [`SequenceEngine::render_artifact`].
///
/// A closed struct of named fields, not an open key/value map: every option
/// the renderer honors is spelled here.
///
/// [`SequenceEngine::render_artifact`]: crate::engine::SequenceEngine::render_artifact
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct RenderOptions {
    /// Number each content beat in its corner.
    #[serde(default)]
    pub show_beat_numbers: bool,
    /// Draw reversal symbols on reversing beats.
    #[serde(default)]
    pub show_reversal_symbols: bool,
    /// Draw the author/date credit line.
    #[serde(default)]
    pub show_credit: bool,
    /// Draw the derived word label above the grid.
    #[serde(default)]
    pub show_word_label: bool,
    /// Draw the difficulty badge.
    #[serde(default)]
    pub show_difficulty_badge: bool,
    /// Include the start-position tile before the first beat.
    #[serde(default)]
    pub include_start_position: bool,
    /// Explicit scale factor; `None` lets the renderer pick its native scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_override: Option<f64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_beat_numbers: true,
            show_reversal_symbols: true,
            show_credit: false,
            show_word_label: true,
            show_difficulty_badge: true,
            include_start_position: true,
            scale_override: None,
        }
    }
}

impl RenderOptions {
    /// Copy of these options with the scale override set.
    pub fn with_scale(&self, scale: f64) -> Self {
        Self {
            scale_override: Some(scale),
            ..self.clone()
        }
    }
}
