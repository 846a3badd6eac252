use std::path::{Path, PathBuf};

use crate::foundation::core::ArtifactId;
use crate::notation::beat::RawSequence;
use crate::notation::params::GenerationParams;

/// A generated sequence plus its rendering state.
///
/// Mutation is deliberately narrow: `approved` flips only through the
/// orchestrator's approval flow, and `render_path` is stamped once by the
/// render pool on success.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Artifact {
    id: ArtifactId,
    word: String,
    raw: RawSequence,
    params: GenerationParams,
    approved: bool,
    render_path: Option<PathBuf>,
}

impl Artifact {
    /// Build an artifact from a validated raw sequence.
    pub fn new(id: ArtifactId, raw: RawSequence, params: GenerationParams) -> Self {
        let word = raw.word();
        Self {
            id,
            word,
            raw,
            params,
            approved: false,
            render_path: None,
        }
    }

    /// Stable artifact id.
    pub fn id(&self) -> ArtifactId {
        self.id
    }

    /// Word label derived from the beat letters.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// The raw beat records.
    pub fn raw(&self) -> &RawSequence {
        &self.raw
    }

    /// Parameters the artifact was generated with.
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Whether the approval flow has accepted this artifact.
    pub fn approved(&self) -> bool {
        self.approved
    }

    /// Where the rendered preview was written, once rendered.
    pub fn render_path(&self) -> Option<&Path> {
        self.render_path.as_deref()
    }

    pub(crate) fn set_approved(&mut self, approved: bool) {
        self.approved = approved;
    }

    pub(crate) fn set_render_path(&mut self, path: PathBuf) {
        debug_assert!(self.render_path.is_none(), "render_path is set-once");
        self.render_path = Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::beat::{Beat, BeatRecord};

    fn seq(word: &str) -> RawSequence {
        let mut raw = RawSequence::new();
        raw.push(BeatRecord::StartPosition("alpha1".to_owned()));
        for letter in word.chars() {
            raw.push(BeatRecord::Beat(Beat {
                letter,
                turns: 0.0,
                reversal: false,
            }));
        }
        raw
    }

    #[test]
    fn word_is_derived_at_construction() {
        let a = Artifact::new(ArtifactId(1), seq("FLOW"), GenerationParams::default());
        assert_eq!(a.word(), "FLOW");
        assert!(!a.approved());
        assert!(a.render_path().is_none());
    }

    #[test]
    fn render_path_is_stamped_once() {
        let mut a = Artifact::new(ArtifactId(2), seq("AB"), GenerationParams::default());
        a.set_render_path(PathBuf::from("/tmp/ab.png"));
        assert_eq!(a.render_path(), Some(Path::new("/tmp/ab.png")));
    }
}
