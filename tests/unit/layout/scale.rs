use super::*;

#[test]
fn grid_dimensions_match_the_renderer_rule() {
    assert_eq!(grid_dimensions(1), (1, 1));
    assert_eq!(grid_dimensions(4), (2, 2));
    assert_eq!(grid_dimensions(16), (4, 4));
    // 17 tiles is the canonical 16-beats-plus-start case.
    assert_eq!(grid_dimensions(17), (5, 4));
    assert_eq!(grid_dimensions(0), (1, 1));
}

#[test]
fn sixteen_beats_with_start_fit_into_a_400x300_cell() {
    let scale = compute_scale(Size::new(400.0, 300.0), 16, true, FitContext::PageCell);
    // Grid 5x4: min(400/4750, 300/4150).
    let expected = (400.0 / 4750.0_f64).min(300.0 / 4150.0);
    assert!((scale - expected).abs() < 1e-12);
    assert!((scale - 0.0723).abs() < 1e-3);
}

#[test]
fn scale_clamps_to_the_floor() {
    let scale = compute_scale(Size::new(10.0, 10.0), 64, false, FitContext::PageCell);
    assert_eq!(scale, 0.05);
}

#[test]
fn ceilings_differ_by_context() {
    let huge = Size::new(1e6, 1e6);
    assert_eq!(compute_scale(huge, 4, false, FitContext::PageCell), 1.0);
    assert_eq!(compute_scale(huge, 4, false, FitContext::ReviewPanel), 0.5);
}

#[test]
fn start_position_tile_can_change_the_grid() {
    // 16 tiles fit 4x4; the 17th forces a fifth column.
    assert_eq!(grid_dimensions(16), (4, 4));
    assert_eq!(grid_dimensions(17), (5, 4));
    // Width-bound target, so the extra column lowers the fit.
    let without = compute_scale(Size::new(300.0, 400.0), 16, false, FitContext::PageCell);
    let with = compute_scale(Size::new(300.0, 400.0), 16, true, FitContext::PageCell);
    assert!(with < without);
}
