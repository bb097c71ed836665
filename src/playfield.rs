//! The bordered grid that holds settled pieces, and the fit checker that
//! guards every move against it.

use std::fmt;

use crate::pieces::{PieceKind, MASK_SIZE};

/// Buffer width including the left and right wall columns.
pub const FIELD_WIDTH: usize = 12;
/// Buffer height including the bottom wall row.
pub const FIELD_HEIGHT: usize = 19;

/// First and last interior columns.
pub const INTERIOR_COLUMNS: std::ops::RangeInclusive<usize> = 1..=FIELD_WIDTH - 2;
/// Interior rows; everything above the bottom wall.
pub const INTERIOR_ROWS: std::ops::Range<usize> = 0..FIELD_HEIGHT - 1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cell {
    Empty,
    Wall,
    Occupied(PieceKind),
    /// Part of a completed row waiting to be compacted away.
    Clearing,
}

impl Cell {
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Wall => '#',
            Cell::Occupied(kind) => kind.letter(),
            Cell::Clearing => '=',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Cell::Empty),
            '#' => Some(Cell::Wall),
            '=' => Some(Cell::Clearing),
            other => PieceKind::from_letter(other).map(Cell::Occupied),
        }
    }
}

pub type Row = [Cell; FIELD_WIDTH];

/// The settled-piece grid. Walls occupy columns 0 and `FIELD_WIDTH - 1` and
/// the bottom row for the life of the field.
///
/// Coordinate arguments must lie inside the buffer; callers establish that
/// with [`Playfield::fits`] before mutating anything.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Playfield {
    cells: [Row; FIELD_HEIGHT],
}

impl Playfield {
    pub fn new() -> Self {
        let mut cells = [[Cell::Empty; FIELD_WIDTH]; FIELD_HEIGHT];
        for (y, row) in cells.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                if x == 0 || x == FIELD_WIDTH - 1 || y == FIELD_HEIGHT - 1 {
                    *cell = Cell::Wall;
                }
            }
        }
        Self { cells }
    }

    /// Builds a field from its text form, one string per row, top first.
    ///
    /// Missing rows are filled from the top with empty interior rows, so a
    /// fixture only needs to spell out the bottom of the stack. Walls are
    /// always restored regardless of what the text says at the border.
    ///
    /// # Panics
    ///
    /// Panics on more than `FIELD_HEIGHT - 1` rows, rows that are not
    /// `FIELD_WIDTH` characters long, unknown symbols, or interior walls.
    pub fn from_rows(rows: &[&str]) -> Self {
        let interior = FIELD_HEIGHT - 1;
        assert!(rows.len() <= interior, "too many rows: {}", rows.len());

        let mut field = Self::new();
        let offset = interior - rows.len();
        for (i, text) in rows.iter().enumerate() {
            let symbols: Vec<char> = text.chars().collect();
            assert_eq!(symbols.len(), FIELD_WIDTH, "bad row width: {text:?}");
            for x in INTERIOR_COLUMNS {
                let cell = Cell::from_symbol(symbols[x])
                    .unwrap_or_else(|| panic!("unknown cell symbol {:?}", symbols[x]));
                assert_ne!(cell, Cell::Wall, "wall inside the interior at ({x}, {})", offset + i);
                field.cells[offset + i][x] = cell;
            }
        }
        field
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[y][x]
    }

    pub fn is_wall(&self, x: usize, y: usize) -> bool {
        self.cells[y][x] == Cell::Wall
    }

    pub fn is_empty(&self, x: usize, y: usize) -> bool {
        self.cells[y][x] == Cell::Empty
    }

    pub fn occupant_kind(&self, x: usize, y: usize) -> Option<PieceKind> {
        match self.cells[y][x] {
            Cell::Occupied(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn set_occupied(&mut self, x: usize, y: usize, kind: PieceKind) {
        debug_assert!(!self.is_wall(x, y), "write into wall at ({x}, {y})");
        self.cells[y][x] = Cell::Occupied(kind);
    }

    pub fn clear_cell(&mut self, x: usize, y: usize) {
        debug_assert!(!self.is_wall(x, y), "clear of wall at ({x}, {y})");
        self.cells[y][x] = Cell::Empty;
    }

    pub(crate) fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        self.cells[y][x] = cell;
    }

    pub fn rows(&self) -> &[Row; FIELD_HEIGHT] {
        &self.cells
    }

    /// A row is full when every interior column holds a settled cell.
    pub fn is_row_full(&self, y: usize) -> bool {
        INTERIOR_COLUMNS.all(|x| matches!(self.cells[y][x], Cell::Occupied(_)))
    }

    pub fn is_row_empty(&self, y: usize) -> bool {
        INTERIOR_COLUMNS.all(|x| self.cells[y][x] == Cell::Empty)
    }

    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| matches!(cell, Cell::Occupied(_)))
            .count()
    }

    /// Whether `kind` at `rotation` with its mask origin at (`anchor_x`,
    /// `anchor_y`) lands every solid cell on an empty cell of the buffer.
    ///
    /// Solid cells outside the buffer, on walls, or on settled cells all
    /// reject the pose.
    pub fn fits(&self, kind: PieceKind, rotation: u8, anchor_x: i32, anchor_y: i32) -> bool {
        let mask = kind.mask();
        for ly in 0..MASK_SIZE {
            for lx in 0..MASK_SIZE {
                if !mask.is_set(lx, ly, rotation) {
                    continue;
                }
                let x = anchor_x + lx as i32;
                let y = anchor_y + ly as i32;
                if x < 0 || y < 0 || x >= FIELD_WIDTH as i32 || y >= FIELD_HEIGHT as i32 {
                    return false;
                }
                if !self.is_empty(x as usize, y as usize) {
                    return false;
                }
            }
        }
        true
    }
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Playfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                write!(f, "{}", cell.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
