use kurbo::Size;

/// Edge length of one composition tile at full scale, in pixels.
pub const TILE_SIZE: f64 = 950.0;

/// Vertical allowance above the grid for the word label at full scale.
const TOP_MARGIN: f64 = 200.0;
/// Vertical allowance below the grid for the credit footer at full scale.
const BOTTOM_MARGIN: f64 = 150.0;
/// Floor below which a preview stops being legible.
const MIN_SCALE: f64 = 0.05;

/// Where a scale-fitted rendering is going, which sets the scale ceiling.
///
/// The two ceilings are intentional: page-cell thumbnails may render at full
/// scale when the cell is large enough, while the interactive review panel
/// caps at half scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FitContext {
    /// Thumbnail inside a placement-grid cell.
    #[default]
    PageCell,
    /// Larger interactive review rendering.
    ReviewPanel,
}

impl FitContext {
    /// Maximum scale permitted in this context.
    pub fn ceiling(self) -> f64 {
        match self {
            FitContext::PageCell => 1.0,
            FitContext::ReviewPanel => 0.5,
        }
    }
}

/// Grid shape (columns, rows) the renderer lays `item_count` tiles out in.
///
/// Every scale-fit caller goes through this one rule; a private copy that
/// drifts from the renderer's layout would silently produce wrong fits.
pub fn grid_dimensions(item_count: u32) -> (u32, u32) {
    let n = item_count.max(1);
    let cols = (f64::from(n).sqrt().ceil() as u32).max(1);
    let rows = n.div_ceil(cols);
    (cols, rows)
}

/// Reverse-calculate the render scale that fits a full-size composition of
/// `content_len` beats (plus the start-position tile when requested) into
/// `target`.
///
/// The full-scale footprint is the tile grid plus fixed label and footer
/// allowances; the result is clamped to `[0.05, ctx.ceiling()]`.
pub fn compute_scale(
    target: Size,
    content_len: u32,
    include_start_position: bool,
    ctx: FitContext,
) -> f64 {
    let tiles = content_len + u32::from(include_start_position);
    let (cols, rows) = grid_dimensions(tiles);

    let full_width = f64::from(cols) * TILE_SIZE;
    let full_height = f64::from(rows) * TILE_SIZE + TOP_MARGIN + BOTTOM_MARGIN;

    let scale = (target.width / full_width).min(target.height / full_height);
    scale.clamp(MIN_SCALE, ctx.ceiling())
}

#[cfg(test)]
#[path = "../../tests/unit/layout/scale.rs"]
mod tests;
