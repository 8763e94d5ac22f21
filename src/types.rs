//! Type definitions shared by the rules engine
//!
//! This module provides colors, piece kinds, pieces and squares, together
//! with the conversions between them and their FEN / algebraic text forms.

use std::fmt;
use std::ops::Not;

/// File and rank names for algebraic notation
pub const FILE_NAMES: &[u8; 8] = b"abcdefgh";
pub const RANK_NAMES: &[u8; 8] = b"12345678";

// ============================================================================
// COLOR
// ============================================================================

/// The two sides of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rank step taken by a pawn of this color
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Rank (0-based) this color's pawns start on
    #[inline]
    pub const fn pawn_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Rank (0-based) this color's king and rooks start on
    #[inline]
    pub const fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank (0-based) this color's pawns promote on
    #[inline]
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Side-to-move letter used in FEN
    pub const fn fen_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ============================================================================
// PIECES
// ============================================================================

/// The six piece kinds, each with its own movement rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Kinds a pawn may promote to, in the order moves are listed
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase symbol (p, n, b, r, q, k)
    pub const fn symbol(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// Parse a lowercase piece symbol
    pub fn from_symbol(c: char) -> Option<PieceKind> {
        match c {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Parse the fifth character of a promotion move (b, n, r, q)
    pub fn from_promotion_char(c: char) -> Option<PieceKind> {
        match c {
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            _ => None,
        }
    }

    /// Bishops, rooks and queens move along rays
    pub const fn is_slider(self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)
    }
}

/// A colored piece standing on a square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Piece { kind, color }
    }

    /// FEN character: uppercase for white, lowercase for black
    pub fn to_fen_char(self) -> char {
        let c = self.kind.symbol();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// FEN piece character to piece value
    pub fn from_fen_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_symbol(c.to_ascii_lowercase())?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen_char())
    }
}

// ============================================================================
// SQUARES
// ============================================================================

/// An on-board square, indexed 0=a1, 1=b1, ..., 63=h8.
///
/// Off-board coordinates never become a `Square`; every operation that can
/// walk off the edge returns `None` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square::at(0, 0);
    pub const B1: Square = Square::at(1, 0);
    pub const C1: Square = Square::at(2, 0);
    pub const D1: Square = Square::at(3, 0);
    pub const E1: Square = Square::at(4, 0);
    pub const F1: Square = Square::at(5, 0);
    pub const G1: Square = Square::at(6, 0);
    pub const H1: Square = Square::at(7, 0);
    pub const A8: Square = Square::at(0, 7);
    pub const B8: Square = Square::at(1, 7);
    pub const C8: Square = Square::at(2, 7);
    pub const D8: Square = Square::at(3, 7);
    pub const E8: Square = Square::at(4, 7);
    pub const F8: Square = Square::at(5, 7);
    pub const G8: Square = Square::at(6, 7);
    pub const H8: Square = Square::at(7, 7);

    /// Square from 0-based file and rank; callers keep both below 8
    pub(crate) const fn at(file: u8, rank: u8) -> Square {
        Square(rank * 8 + file)
    }

    /// Square from 0-based file and rank, `None` when off the board
    pub fn new(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 {
            Some(Square::at(file, rank))
        } else {
            None
        }
    }

    pub fn from_index(index: usize) -> Option<Square> {
        if index < 64 {
            Some(Square(index as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 0-based file (a=0)
    #[inline]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    /// 0-based rank (rank 1 = 0)
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    pub fn file_char(self) -> char {
        FILE_NAMES[self.file() as usize] as char
    }

    pub fn rank_char(self) -> char {
        RANK_NAMES[self.rank() as usize] as char
    }

    /// Shift by a file/rank delta, `None` if that leaves the board
    pub fn offset(self, file_delta: i8, rank_delta: i8) -> Option<Square> {
        let file = self.file() as i8 + file_delta;
        let rank = self.rank() as i8 + rank_delta;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square::at(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// Next square in a compass direction
    #[inline]
    pub fn step(self, direction: Direction) -> Option<Square> {
        let (df, dr) = direction.delta();
        self.offset(df, dr)
    }

    /// Dark squares are those of a1's color: `(file + rank)` even
    pub const fn is_dark(self) -> bool {
        (self.file() + self.rank()) % 2 == 0
    }

    /// All 64 squares from a1 to h8
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

/// Convert square index (0-63) to algebraic notation (e.g., "e4")
pub fn square_name(sq: Square) -> String {
    sq.to_string()
}

/// Convert algebraic notation to a square. The name must be exactly
/// a file letter and a rank digit.
pub fn parse_square(name: &str) -> Option<Square> {
    let bytes = name.as_bytes();
    if bytes.len() != 2 {
        return None;
    }

    let file = match bytes[0] {
        b'a'..=b'h' => bytes[0] - b'a',
        _ => return None,
    };

    let rank = match bytes[1] {
        b'1'..=b'8' => bytes[1] - b'1',
        _ => return None,
    };

    Square::new(file, rank)
}

// ============================================================================
// DIRECTIONS
// ============================================================================

/// Compass directions, north being towards rank 8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// (file, rank) step for one move in this direction
    pub const fn delta(self) -> (i8, i8) {
        match self {
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, -1),
            Direction::South => (0, -1),
            Direction::SouthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, 1),
        }
    }
}

pub const ROOK_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

pub const BISHOP_DIRECTIONS: [Direction; 4] = [
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::SouthEast,
    Direction::SouthWest,
];

pub const QUEEN_DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::SouthEast,
    Direction::SouthWest,
];

/// Knight jumps as (file, rank) deltas
pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (1, -2),
    (2, 1),
    (2, -1),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
];

/// King steps as (file, rank) deltas
pub const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_names_round_trip() {
        for sq in Square::all() {
            assert_eq!(parse_square(&square_name(sq)), Some(sq));
        }
        assert_eq!(parse_square("e4"), Square::new(4, 3));
        assert_eq!(Square::E1.to_string(), "e1");
        assert_eq!(Square::H8.index(), 63);
    }

    #[test]
    fn rejects_off_board_names() {
        for name in ["i1", "a9", "a0", "e", "e44", "E4", ""] {
            assert_eq!(parse_square(name), None, "{name}");
        }
    }

    #[test]
    fn stepping_off_the_edge_yields_none() {
        assert_eq!(Square::H1.step(Direction::East), None);
        assert_eq!(Square::A8.step(Direction::NorthWest), None);
        assert_eq!(Square::D1.step(Direction::NorthEast), parse_square("e2"));
        assert_eq!(Square::B1.offset(-2, 1), None);
    }

    #[test]
    fn square_colors() {
        assert!(Square::A1.is_dark());
        assert!(!Square::H1.is_dark());
        assert!(!Square::A8.is_dark());
        assert!(Square::H8.is_dark());
    }

    #[test]
    fn fen_piece_chars() {
        let knight = Piece::from_fen_char('N').unwrap();
        assert_eq!(knight, Piece::new(PieceKind::Knight, Color::White));
        assert_eq!(knight.to_fen_char(), 'N');
        assert_eq!(Piece::from_fen_char('q').unwrap().color, Color::Black);
        assert_eq!(Piece::from_fen_char('x'), None);
        assert_eq!(PieceKind::from_promotion_char('k'), None);
        assert_eq!(PieceKind::from_promotion_char('n'), Some(PieceKind::Knight));
    }
}
