use std::sync::Arc;

use crate::document::model::Document;
use crate::engine::SequenceEngine;
use crate::fault::JobError;
use crate::foundation::core::ArtifactId;
use crate::notation::artifact::Artifact;
use crate::notation::params::GenerationParams;

/// Drives the external engine inside a session to produce one artifact.
///
/// The engine's normal "build into the current document" behavior is aimed
/// at the session's scratch document, so nothing it does can leak into the
/// shared one. Output length is a hard gate: a wrong-length sequence is
/// discarded, never accepted.
pub struct ArtifactGenerator {
    engine: Arc<dyn SequenceEngine>,
    next_artifact_id: u64,
}

impl ArtifactGenerator {
    /// Generator over the given engine.
    pub fn new(engine: Arc<dyn SequenceEngine>) -> Self {
        Self {
            engine,
            next_artifact_id: 0,
        }
    }

    /// Generate one artifact into `scratch`.
    #[tracing::instrument(skip(self, scratch))]
    pub fn generate(
        &mut self,
        params: &GenerationParams,
        scratch: &mut Document,
    ) -> Result<Artifact, JobError> {
        scratch.sequence.clear();
        self.engine
            .build_sequence(params, scratch)
            .map_err(|e| JobError::Generation(e.to_string()))?;

        if scratch.sequence.is_empty() {
            return Err(JobError::Generation("engine produced nothing".to_owned()));
        }

        let actual = scratch.sequence.content_len();
        if actual != params.length {
            scratch.sequence.clear();
            return Err(JobError::Validation {
                expected: params.length,
                actual,
            });
        }

        let id = ArtifactId(self.next_artifact_id);
        self.next_artifact_id += 1;
        Ok(Artifact::new(id, scratch.sequence.clone(), params.clone()))
    }

    /// Generate the `job_index`-th artifact of a batch, applying the
    /// deterministic parameter variation that keeps a seeded engine from
    /// repeating itself.
    pub fn generate_batch_item(
        &mut self,
        base: &GenerationParams,
        job_index: u32,
        scratch: &mut Document,
    ) -> Result<Artifact, JobError> {
        let params = base.varied_for_batch(job_index);
        self.generate(&params, scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scripted::{EngineScript, ScriptedEngine};
    use crate::notation::params::StartPosition;

    fn params(length: u32) -> GenerationParams {
        GenerationParams {
            length,
            ..GenerationParams::default()
        }
    }

    #[test]
    fn generates_an_artifact_with_the_exact_length() {
        let mut g = ArtifactGenerator::new(Arc::new(ScriptedEngine::new()));
        let mut scratch = Document::empty();
        let artifact = g.generate(&params(9), &mut scratch).unwrap();
        assert_eq!(artifact.raw().content_len(), 9);
        assert_eq!(artifact.word().len(), 9);
    }

    #[test]
    fn wrong_length_output_is_discarded_as_validation_failure() {
        let engine = ScriptedEngine::with_script(EngineScript {
            short_builds: vec![0],
            ..EngineScript::default()
        });
        let mut g = ArtifactGenerator::new(Arc::new(engine));
        let mut scratch = Document::empty();

        let err = g.generate(&params(6), &mut scratch).unwrap_err();
        assert_eq!(
            err,
            JobError::Validation {
                expected: 6,
                actual: 5
            }
        );
        // Discarded means discarded: nothing lingers in the scratch.
        assert!(scratch.is_empty());
    }

    #[test]
    fn engine_failure_maps_to_generation_failure() {
        let engine = ScriptedEngine::with_script(EngineScript {
            fail_builds: vec![0],
            ..EngineScript::default()
        });
        let mut g = ArtifactGenerator::new(Arc::new(engine));
        let mut scratch = Document::empty();
        assert!(matches!(
            g.generate(&params(4), &mut scratch),
            Err(JobError::Generation(_))
        ));
    }

    #[test]
    fn batch_items_after_the_first_unpin_the_start_position() {
        let mut g = ArtifactGenerator::new(Arc::new(ScriptedEngine::new()));
        let base = GenerationParams {
            start_position: StartPosition::Named("beta3".to_owned()),
            ..params(4)
        };
        let mut scratch = Document::empty();

        let first = g.generate_batch_item(&base, 0, &mut scratch).unwrap();
        assert_eq!(
            first.params().start_position,
            StartPosition::Named("beta3".to_owned())
        );

        let second = g.generate_batch_item(&base, 1, &mut scratch).unwrap();
        assert_eq!(second.params().start_position, StartPosition::Any);
        assert_ne!(first.id(), second.id());
    }
}
