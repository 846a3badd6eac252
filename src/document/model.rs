use crate::notation::beat::RawSequence;

/// A sequence workspace: the shared document the user edits, and the scratch
/// documents background jobs generate into, are both this type.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Document {
    /// The working sequence.
    #[serde(default)]
    pub sequence: RawSequence,
}

impl Document {
    /// The known-good empty default the restore path falls back to.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the workspace holds any records at all.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}
