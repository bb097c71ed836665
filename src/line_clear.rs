//! Completed-row detection, the transient clearing band, and compaction.

use crate::pieces::MASK_SIZE;
use crate::playfield::{Cell, Playfield, INTERIOR_COLUMNS};

pub const LINE_SCORE: u32 = 100;

/// A contiguous band of full rows whose lowest row is `first_full_line`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LineClear {
    pub first_full_line: usize,
    pub line_count: usize,
}

impl LineClear {
    /// Rows covered by the band, top to bottom.
    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.first_full_line + 1 - self.line_count..=self.first_full_line
    }

    pub fn score(&self) -> u32 {
        score_for_lines(self.line_count as u32)
    }
}

/// Points for clearing `lines` rows at once: quadratic in the run length.
pub fn score_for_lines(lines: u32) -> u32 {
    lines * LINE_SCORE * lines
}

/// Looks for full rows after a lock whose lowest solid row was `bottom_row`.
///
/// Only the lock's own vertical extent (at most four rows upward from
/// `bottom_row`) is searched for the first full row. The run is then counted
/// upward from there and stops at the first row that is not full, so a full
/// row separated from the run by a partial one is left in place.
pub fn detect(field: &Playfield, bottom_row: usize) -> Option<LineClear> {
    let top = bottom_row.saturating_sub(MASK_SIZE - 1);
    let first_full_line = (top..=bottom_row).rev().find(|&y| field.is_row_full(y))?;
    let line_count = (0..=first_full_line)
        .rev()
        .take_while(|&y| field.is_row_full(y))
        .count();
    Some(LineClear {
        first_full_line,
        line_count,
    })
}

impl Playfield {
    /// Turns every interior cell of the band into [`Cell::Clearing`].
    pub fn mark_clearing(&mut self, clear: &LineClear) {
        for y in clear.rows() {
            for x in INTERIOR_COLUMNS {
                self.set_cell(x, y, Cell::Clearing);
            }
        }
    }

    /// Drops everything above the band by `line_count` rows and empties the
    /// rows vacated at the top.
    pub fn compact(&mut self, clear: &LineClear) {
        let shift = clear.line_count;
        for y in (0..=clear.first_full_line).rev() {
            for x in INTERIOR_COLUMNS {
                let cell = if y >= shift {
                    self.cell(x, y - shift)
                } else {
                    Cell::Empty
                };
                self.set_cell(x, y, cell);
            }
        }
    }
}
