use super::*;
use crate::engine::preview::PreviewImage;
use crate::fault::JobError;
use crate::foundation::core::ArtifactId;
use crate::notation::artifact::Artifact;
use crate::notation::beat::{Beat, BeatRecord, RawSequence};
use crate::notation::params::GenerationParams;

fn rendered(word: &str) -> Settlement {
    let mut raw = RawSequence::new();
    for letter in word.chars() {
        raw.push(BeatRecord::Beat(Beat {
            letter,
            turns: 0.0,
            reversal: false,
        }));
    }
    Settlement::Rendered {
        artifact: Artifact::new(ArtifactId(word.len() as u64), raw, GenerationParams::default()),
        image: PreviewImage::solid(4, 4, [255; 4]),
    }
}

fn fallback() -> Settlement {
    Settlement::Fallback {
        artifact: None,
        error: JobError::Generation("engine produced nothing".to_owned()),
        image: PreviewImage::solid(8, 8, [0; 4]),
        forced: false,
    }
}

#[test]
fn allocate_creates_exact_pages_and_slots() {
    let layout = PlacementLayout::allocate(7, PageShape { rows: 3, cols: 2 });
    assert_eq!(layout.page_count(), 2);
    assert_eq!(layout.slot_count(), 7);
    assert_eq!(layout.remaining_placeholders(), 7);

    // Final page holds a single slot, not six.
    let last_page: Vec<_> = layout.slots().iter().filter(|s| s.page == 1).collect();
    assert_eq!(last_page.len(), 1);
    assert_eq!((last_page[0].row, last_page[0].col), (0, 0));
}

#[test]
fn allocate_exact_multiple_has_no_spare_page() {
    let layout = PlacementLayout::allocate(12, PageShape { rows: 3, cols: 2 });
    assert_eq!(layout.page_count(), 2);
    assert_eq!(layout.slot_count(), 12);
}

#[test]
fn slots_enumerate_row_major() {
    let layout = PlacementLayout::allocate(5, PageShape { rows: 2, cols: 2 });
    let coords: Vec<_> = layout
        .slots()
        .iter()
        .map(|s| (s.page, s.row, s.col))
        .collect();
    assert_eq!(
        coords,
        vec![(0, 0, 0), (0, 0, 1), (0, 1, 0), (0, 1, 1), (1, 0, 0)]
    );
}

#[test]
fn replace_next_is_fifo_by_slot_not_by_submission() {
    let mut layout = PlacementLayout::allocate(3, PageShape::default());

    // The "third" job settles first: it takes slot 0.
    assert!(layout.replace_next(rendered("CCC")));
    assert!(layout.replace_next(fallback()));
    assert!(layout.replace_next(rendered("AAA")));
    assert!(!layout.replace_next(rendered("XXX")));

    let words: Vec<_> = layout
        .settlements()
        .map(|s| s.artifact().map(|a| a.word().to_owned()))
        .collect();
    assert_eq!(
        words,
        vec![Some("CCC".to_owned()), None, Some("AAA".to_owned())]
    );
    assert_eq!(layout.occupied(), 3);
}

#[test]
fn clear_releases_everything() {
    let mut layout = PlacementLayout::allocate(4, PageShape::default());
    layout.replace_next(rendered("AB"));
    layout.clear();
    assert_eq!(layout.slot_count(), 0);
    assert_eq!(layout.page_count(), 0);
}
