//! Piece catalog: the seven shapes, their 4x4 masks and rotation geometry.

use rand::Rng;

pub const KIND_COUNT: usize = 7;

/// Side length of the square mask every piece is drawn in.
pub const MASK_SIZE: usize = 4;

// ============================================================================
// Rotation
// ============================================================================

/// Maps a local mask coordinate to the bit it reads under `rotation`.
///
/// Each quarter turn is a fixed affine transform over the 4x4 local space:
///
/// | rotation | index            |
/// |----------|------------------|
/// | 0        | `4y + x`         |
/// | 1        | `12 + y - 4x`    |
/// | 2        | `15 - x - 4y`    |
/// | 3        | `3 + 4x - y`     |
///
/// `rotation` is taken modulo 4; `x` and `y` must be below [`MASK_SIZE`].
pub fn rotated_index(x: usize, y: usize, rotation: u8) -> usize {
    debug_assert!(x < MASK_SIZE && y < MASK_SIZE);
    match rotation % 4 {
        0 => y * 4 + x,
        1 => 12 + y - 4 * x,
        2 => 15 - x - 4 * y,
        _ => 3 + 4 * x - y,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RotationStyle {
    /// Never rotates.
    Fixed,
    /// Alternates between rotation 0 and 1.
    Toggle,
    /// Cycles through all four rotations.
    Cycle,
}

// ============================================================================
// Shape masks
// ============================================================================

/// A 4x4 occupancy mask, bit `4y + x` set when local cell (x, y) is solid.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct ShapeMask(u16);

impl ShapeMask {
    const fn parse(rows: [&[u8; 4]; 4]) -> Self {
        let mut bits = 0u16;
        let mut y = 0;
        while y < MASK_SIZE {
            let mut x = 0;
            while x < MASK_SIZE {
                if rows[y][x] == b'X' {
                    bits |= 1 << (y * MASK_SIZE + x);
                }
                x += 1;
            }
            y += 1;
        }
        ShapeMask(bits)
    }

    /// Whether local cell (x, y) is solid when the mask is viewed at `rotation`.
    pub fn is_set(self, x: usize, y: usize, rotation: u8) -> bool {
        self.0 & (1 << rotated_index(x, y, rotation)) != 0
    }

    /// Solid local cells at `rotation`, in row-major order.
    pub fn cells(self, rotation: u8) -> impl Iterator<Item = (usize, usize)> {
        (0..MASK_SIZE)
            .flat_map(|y| (0..MASK_SIZE).map(move |x| (x, y)))
            .filter(move |&(x, y)| self.is_set(x, y, rotation))
    }
}

const SHAPES: [ShapeMask; KIND_COUNT] = [
    ShapeMask::parse([b"X...", b"X...", b"X...", b"X..."]),
    ShapeMask::parse([b"X...", b"X...", b"XX..", b"...."]),
    ShapeMask::parse([b".X..", b".X..", b"XX..", b"...."]),
    ShapeMask::parse([b"XXX.", b".X..", b"....", b"...."]),
    ShapeMask::parse([b"XX..", b"XX..", b"....", b"...."]),
    ShapeMask::parse([b"XX..", b".XX.", b"....", b"...."]),
    ShapeMask::parse([b".XX.", b"XX..", b"....", b"...."]),
];

// ============================================================================
// Piece kinds
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum PieceKind {
    I,
    L,
    J,
    T,
    O,
    Z,
    S,
}

impl PieceKind {
    pub const ALL: [PieceKind; KIND_COUNT] = [
        PieceKind::I,
        PieceKind::L,
        PieceKind::J,
        PieceKind::T,
        PieceKind::O,
        PieceKind::Z,
        PieceKind::S,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Letter used in the text form of the field (`A` for I through `G` for S).
    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        if !letter.is_ascii_uppercase() {
            return None;
        }
        Self::from_index((letter as u8 - b'A') as usize)
    }

    pub fn mask(self) -> ShapeMask {
        SHAPES[self.index()]
    }

    pub fn rotation_style(self) -> RotationStyle {
        match self {
            PieceKind::O => RotationStyle::Fixed,
            PieceKind::I | PieceKind::S | PieceKind::Z => RotationStyle::Toggle,
            PieceKind::L | PieceKind::J | PieceKind::T => RotationStyle::Cycle,
        }
    }

    /// Rotation reached by one clockwise step from `rotation`.
    pub fn next_rotation(self, rotation: u8) -> u8 {
        match self.rotation_style() {
            RotationStyle::Fixed => rotation,
            RotationStyle::Toggle => (rotation + 1) % 2,
            RotationStyle::Cycle => (rotation + 1) % 4,
        }
    }

    /// Anchor shift applied before stepping clockwise out of `rotation`.
    ///
    /// Only the T piece needs one: without it the piece would swing around
    /// its mask corner instead of its stem.
    pub fn pivot_correction(self, rotation: u8) -> (i32, i32) {
        if self != PieceKind::T {
            return (0, 0);
        }
        match rotation % 4 {
            0 => (-1, 0),
            1 => (0, -1),
            2 => (1, 0),
            _ => (0, 1),
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..KIND_COUNT)]
    }
}
