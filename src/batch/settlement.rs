use crate::engine::preview::PreviewImage;
use crate::fault::JobError;
use crate::notation::artifact::Artifact;

/// Terminal outcome of one job. Every job produces exactly one of these.
#[derive(Clone, Debug)]
pub enum Settlement {
    /// Generation and rendering both succeeded.
    Rendered {
        /// The generated artifact, with `render_path` stamped when a preview
        /// directory is configured.
        artifact: Artifact,
        /// The validated preview image.
        image: PreviewImage,
    },
    /// The job committed fallback output instead of a rendered preview.
    Fallback {
        /// The generated artifact, when generation succeeded but rendering
        /// did not. `None` when generation itself failed.
        artifact: Option<Artifact>,
        /// The failure that exhausted the job.
        error: JobError,
        /// Placeholder image committed in place of the preview.
        image: PreviewImage,
        /// True when the batch was force-completed rather than the job
        /// failing on its own.
        forced: bool,
    },
}

impl Settlement {
    /// Whether this settlement carries a real rendered preview.
    pub fn is_rendered(&self) -> bool {
        matches!(self, Settlement::Rendered { .. })
    }

    /// The artifact, if one was generated.
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Settlement::Rendered { artifact, .. } => Some(artifact),
            Settlement::Fallback { artifact, .. } => artifact.as_ref(),
        }
    }

    /// The committed image: the rendered preview or the fallback placeholder.
    pub fn image(&self) -> &PreviewImage {
        match self {
            Settlement::Rendered { image, .. } => image,
            Settlement::Fallback { image, .. } => image,
        }
    }

    pub(crate) fn artifact_mut(&mut self) -> Option<&mut Artifact> {
        match self {
            Settlement::Rendered { artifact, .. } => Some(artifact),
            Settlement::Fallback { artifact, .. } => artifact.as_mut(),
        }
    }
}
