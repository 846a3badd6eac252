use std::path::{Path, PathBuf};

use crate::engine::preview::PreviewImage;
use crate::foundation::core::JobId;
use crate::foundation::error::{CadenzaError, CadenzaResult};

/// Write one preview image as a PNG under `dir`, creating the directory if
/// needed. Returns the path written.
pub(crate) fn write_preview_png(
    dir: &Path,
    job: JobId,
    word: &str,
    image: &PreviewImage,
) -> CadenzaResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CadenzaError::render(format!("create {}: {e}", dir.display())))?;

    let stem: String = word.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let path = dir.join(format!("job{:03}-{stem}.png", job.0));

    image::save_buffer_with_format(
        &path,
        &image.data,
        image.width,
        image.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| CadenzaError::render(format!("write {}: {e}", path.display())))?;
    Ok(path)
}
