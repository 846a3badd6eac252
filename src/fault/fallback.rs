use std::collections::HashMap;

use crate::engine::preview::PreviewImage;
use crate::foundation::core::JobId;

const PLACEHOLDER_WIDTH: u32 = 190;
const PLACEHOLDER_HEIGHT: u32 = 166;
const PLACEHOLDER_BG: [u8; 4] = [0x2b, 0x2b, 0x2b, 0xff];
const PLACEHOLDER_FG: [u8; 4] = [0xb0, 0x4a, 0x4a, 0xff];

/// Deterministic placeholder output for jobs that exhausted their retries or
/// were force-completed.
///
/// Lookup order: a per-job cached fallback, else the shared generic error
/// image, else a freshly synthesized placeholder (which is then cached for
/// the job). The triggering error text travels on the settlement record, not
/// in the pixels.
#[derive(Debug, Default)]
pub struct FallbackSupplier {
    per_job: HashMap<JobId, PreviewImage>,
    generic: Option<PreviewImage>,
}

impl FallbackSupplier {
    /// Supplier with no generic image configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplier serving `generic` for any job without a cached fallback.
    pub fn with_generic(generic: PreviewImage) -> Self {
        Self {
            per_job: HashMap::new(),
            generic: Some(generic),
        }
    }

    /// Cache a fallback for one job ahead of time.
    pub fn insert(&mut self, job: JobId, image: PreviewImage) {
        self.per_job.insert(job, image);
    }

    /// Fetch the placeholder committed for a job that is settling without a
    /// rendered preview.
    pub fn get_or_create_placeholder(&mut self, job: JobId) -> PreviewImage {
        if let Some(cached) = self.per_job.get(&job) {
            return cached.clone();
        }
        if let Some(generic) = &self.generic {
            return generic.clone();
        }
        let synthesized = synthesize_placeholder();
        self.per_job.insert(job, synthesized.clone());
        synthesized
    }

    /// Drop all cached per-job fallbacks.
    pub fn clear(&mut self) {
        self.per_job.clear();
    }
}

/// Bordered error tile with a diagonal cross.
fn synthesize_placeholder() -> PreviewImage {
    let w = PLACEHOLDER_WIDTH;
    let h = PLACEHOLDER_HEIGHT;
    let mut img = PreviewImage::solid(w, h, PLACEHOLDER_BG);

    for x in 0..w {
        for t in 0..2 {
            img.put_pixel(x, t, PLACEHOLDER_FG);
            img.put_pixel(x, h - 1 - t, PLACEHOLDER_FG);
        }
    }
    for y in 0..h {
        for t in 0..2 {
            img.put_pixel(t, y, PLACEHOLDER_FG);
            img.put_pixel(w - 1 - t, y, PLACEHOLDER_FG);
        }
    }
    for x in 0..w {
        let y = (u64::from(x) * u64::from(h - 1) / u64::from(w - 1)) as u32;
        img.put_pixel(x, y, PLACEHOLDER_FG);
        img.put_pixel(x, h - 1 - y, PLACEHOLDER_FG);
    }
    img
}
