use std::sync::atomic::{AtomicU32, Ordering};

use crate::document::model::Document;
use crate::engine::SequenceEngine;
use crate::engine::options::RenderOptions;
use crate::engine::preview::PreviewImage;
use crate::foundation::error::CadenzaResult;
use crate::layout::scale::{TILE_SIZE, grid_dimensions};
use crate::notation::beat::{Beat, BeatRecord, RawSequence, SequenceMetadata};
use crate::notation::params::{GenerationParams, StartPosition};

/// Failure script for [`ScriptedEngine`], keyed by 0-based call index.
#[derive(Clone, Debug, Default)]
pub struct EngineScript {
    /// Build calls that fail outright.
    pub fail_builds: Vec<u32>,
    /// Build calls that produce one beat fewer than requested.
    pub short_builds: Vec<u32>,
    /// Render calls that fail outright.
    pub fail_renders: Vec<u32>,
    /// Render calls that return a structurally invalid image.
    pub invalid_renders: Vec<u32>,
}

/// Deterministic in-process engine for tests and demos.
///
/// Sequences are synthesized from the parameters and the call index, so two
/// calls with the same inputs differ only by index, which is exactly the
/// repeat hazard the batch parameter variation exists to break. Failures are
/// injected per [`EngineScript`].
pub struct ScriptedEngine {
    script: EngineScript,
    build_calls: AtomicU32,
    render_calls: AtomicU32,
    build_hook: Option<Box<dyn Fn(u32) + Send + Sync>>,
}

impl ScriptedEngine {
    /// Engine that always succeeds.
    pub fn new() -> Self {
        Self::with_script(EngineScript::default())
    }

    /// Engine following the given failure script.
    pub fn with_script(script: EngineScript) -> Self {
        Self {
            script,
            build_calls: AtomicU32::new(0),
            render_calls: AtomicU32::new(0),
            build_hook: None,
        }
    }

    /// Install a hook invoked with each build call index, before the build
    /// runs. Tests use this to trip cancellation at a deterministic point.
    pub fn with_build_hook(mut self, hook: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.build_hook = Some(Box::new(hook));
        self
    }

    /// Number of build calls made so far.
    pub fn build_calls(&self) -> u32 {
        self.build_calls.load(Ordering::SeqCst)
    }

    /// Number of render calls made so far.
    pub fn render_calls(&self) -> u32 {
        self.render_calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceEngine for ScriptedEngine {
    fn build_sequence(
        &self,
        params: &GenerationParams,
        scratch: &mut Document,
    ) -> CadenzaResult<()> {
        let call = self.build_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.build_hook {
            hook(call);
        }
        if self.script.fail_builds.contains(&call) {
            return Err(anyhow::anyhow!("scripted build failure at call {call}").into());
        }

        let start = match &params.start_position {
            StartPosition::Named(name) => name.clone(),
            StartPosition::Any => format!("alpha{}", (call % 8) + 1),
        };

        let count = if self.script.short_builds.contains(&call) {
            params.length.saturating_sub(1)
        } else {
            params.length
        };

        scratch.sequence.clear();
        scratch.sequence.push(BeatRecord::Metadata(SequenceMetadata {
            word: String::new(),
            author: None,
            level: params.level,
        }));
        scratch.sequence.push(BeatRecord::StartPosition(start));
        for i in 0..count {
            let letter = char::from(b'A' + (((call + i) % 26) as u8));
            scratch.sequence.push(BeatRecord::Beat(Beat {
                letter,
                turns: params.turn_intensity * f64::from(i % 3),
                reversal: i % 5 == 4,
            }));
        }
        Ok(())
    }

    fn render_artifact(
        &self,
        raw: &RawSequence,
        opts: &RenderOptions,
    ) -> CadenzaResult<PreviewImage> {
        let call = self.render_calls.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_renders.contains(&call) {
            return Err(anyhow::anyhow!("scripted render failure at call {call}").into());
        }
        if self.script.invalid_renders.contains(&call) {
            return Ok(PreviewImage {
                width: 0,
                height: 0,
                data: Vec::new(),
            });
        }

        let mut tiles = raw.content_len();
        if opts.include_start_position {
            tiles += 1;
        }
        let (cols, rows) = grid_dimensions(tiles);
        let scale = opts.scale_override.unwrap_or(1.0);
        let cell = ((TILE_SIZE * scale).round() as u32).max(1);

        // Word-derived fill so distinct sequences render distinctly.
        let seed = raw
            .word()
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        let rgba = [
            (seed & 0xff) as u8,
            ((seed >> 8) & 0xff) as u8,
            ((seed >> 16) & 0xff) as u8,
            255,
        ];
        Ok(PreviewImage::solid(cols * cell, rows * cell, rgba))
    }
}
