//! Property tests for the fit checker and row compaction.

use blockfall::line_clear::LineClear;
use blockfall::pieces::{PieceKind, KIND_COUNT};
use blockfall::playfield::{Cell, Playfield, FIELD_HEIGHT, FIELD_WIDTH, INTERIOR_COLUMNS};
use proptest::prelude::*;

const INTERIOR_HEIGHT: usize = FIELD_HEIGHT - 1;

fn scattered_field(cells: &[(usize, usize, usize)]) -> Playfield {
    let mut field = Playfield::new();
    for &(x, y, kind) in cells {
        field.set_occupied(x, y, PieceKind::ALL[kind]);
    }
    field
}

fn cells_strategy() -> impl Strategy<Value = Vec<(usize, usize, usize)>> {
    prop::collection::vec(
        (1..FIELD_WIDTH - 1, 0..INTERIOR_HEIGHT, 0..KIND_COUNT),
        0..60,
    )
}

fn band_strategy() -> impl Strategy<Value = LineClear> {
    (1usize..=4).prop_flat_map(|line_count| {
        (line_count - 1..INTERIOR_HEIGHT).prop_map(move |first_full_line| LineClear {
            first_full_line,
            line_count,
        })
    })
}

proptest! {
    #[test]
    fn fits_never_mutates_the_field(
        cells in cells_strategy(),
        queries in prop::collection::vec((0..KIND_COUNT, 0u8..4, -4i32..14, -4i32..20), 1..40),
    ) {
        let field = scattered_field(&cells);
        let snapshot = field.clone();

        for (kind, rotation, x, y) in queries {
            let first = field.fits(PieceKind::ALL[kind], rotation, x, y);
            let second = field.fits(PieceKind::ALL[kind], rotation, x, y);
            prop_assert_eq!(first, second);
        }

        prop_assert_eq!(field, snapshot);
    }

    #[test]
    fn a_fitting_piece_covers_only_empty_interior(
        cells in cells_strategy(),
        kind in 0..KIND_COUNT,
        rotation in 0u8..4,
        x in -4i32..14,
        y in -4i32..20,
    ) {
        let field = scattered_field(&cells);
        let kind = PieceKind::ALL[kind];
        if !field.fits(kind, rotation, x, y) {
            return Ok(());
        }

        for (lx, ly) in kind.mask().cells(rotation) {
            let cx = (x + lx as i32) as usize;
            let cy = (y + ly as i32) as usize;
            prop_assert!(INTERIOR_COLUMNS.contains(&cx));
            prop_assert!(cy < INTERIOR_HEIGHT);
            prop_assert_eq!(field.cell(cx, cy), Cell::Empty);
        }
    }

    #[test]
    fn compaction_shifts_rows_and_drops_only_the_band(
        cells in cells_strategy(),
        clear in band_strategy(),
    ) {
        let mut field = scattered_field(&cells);
        for y in clear.rows() {
            for x in INTERIOR_COLUMNS {
                field.set_occupied(x, y, PieceKind::T);
            }
        }
        let before = field.clone();
        let band_cells = clear.line_count * INTERIOR_COLUMNS.count();

        field.mark_clearing(&clear);
        field.compact(&clear);

        prop_assert_eq!(field.occupied_count(), before.occupied_count() - band_cells);
        for y in 0..FIELD_HEIGHT {
            for x in 0..FIELD_WIDTH {
                let expected = if y > clear.first_full_line || !INTERIOR_COLUMNS.contains(&x) {
                    before.cell(x, y)
                } else if y >= clear.line_count {
                    before.cell(x, y - clear.line_count)
                } else {
                    Cell::Empty
                };
                prop_assert_eq!(field.cell(x, y), expected, "cell ({}, {})", x, y);
            }
        }
    }
}
