//! Boundary to the external sequence engine.
//!
//! The engine that actually builds beat data and paints pictures is a
//! collaborator, not part of this crate. The pipeline talks to it through
//! [`SequenceEngine`] so that generation always targets an isolated scratch
//! document and rendering can run on worker threads.

pub(crate) mod options;
pub(crate) mod preview;
pub(crate) mod scripted;

pub use options::RenderOptions;
pub use preview::PreviewImage;
pub use scripted::{EngineScript, ScriptedEngine};

use crate::document::model::Document;
use crate::foundation::error::CadenzaResult;
use crate::notation::beat::RawSequence;
use crate::notation::params::GenerationParams;

/// Contract with the external sequence engine.
///
/// `build_sequence` follows the engine's normal "build into the current
/// document" shape; the pipeline always hands it a session's scratch
/// document, never the shared one. `render_artifact` must be callable from
/// worker threads, hence `Send + Sync`.
pub trait SequenceEngine: Send + Sync {
    /// Populate `scratch` with the beat records for one sequence.
    fn build_sequence(
        &self,
        params: &GenerationParams,
        scratch: &mut Document,
    ) -> CadenzaResult<()>;

    /// Render a raw sequence to a preview image.
    fn render_artifact(
        &self,
        raw: &RawSequence,
        opts: &RenderOptions,
    ) -> CadenzaResult<PreviewImage>;
}
