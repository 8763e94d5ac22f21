//! Position Representation Module
//!
//! This module provides the `Position` aggregate (placement, side to move,
//! castling rights, en passant target and move counters) and the `Move`
//! value. It includes FEN parsing and generation, move commit, the text
//! board rendering and the collaborator-facing query surface.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::{FenError, MoveError, MoveResult};
use crate::move_generator::MoveGenerator;
use crate::notation;
use crate::types::*;

/// Starting position FEN
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ============================================================================
// MOVES
// ============================================================================

/// A move in coordinate form: origin, destination and optional promotion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Move {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Parse UCI move text: `[a-h][1-8][a-h][1-8][bnrq]?`.
    ///
    /// Only the shape is checked here; whether a promotion letter belongs on
    /// the move depends on the position and is checked by the legality filter.
    pub fn parse(text: &str) -> MoveResult<Move> {
        let malformed = || MoveError::Malformed(text.to_string());

        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(malformed());
        }

        let from = parse_square(&text[0..2]).ok_or_else(malformed)?;
        let to = parse_square(&text[2..4]).ok_or_else(malformed)?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => Some(PieceKind::from_promotion_char(c).ok_or_else(malformed)?),
        };

        Ok(Move {
            from,
            to,
            promotion,
        })
    }

    /// Convert move to UCI notation (e.g., "e2e4", "e7e8q")
    pub fn to_uci(&self) -> String {
        let mut uci = format!("{}{}", self.from, self.to);
        if let Some(kind) = self.promotion {
            uci.push(kind.symbol());
        }
        uci
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl FromStr for Move {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::parse(s)
    }
}

// ============================================================================
// CASTLING RIGHTS
// ============================================================================

/// The four castling flags, stored as a bitmask (1=K, 2=Q, 4=k, 8=q).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const WHITE_KING_SIDE: u8 = 1;
    pub const WHITE_QUEEN_SIDE: u8 = 2;
    pub const BLACK_KING_SIDE: u8 = 4;
    pub const BLACK_QUEEN_SIDE: u8 = 8;

    const FEN_ORDER: [(char, u8); 4] = [
        ('K', Self::WHITE_KING_SIDE),
        ('Q', Self::WHITE_QUEEN_SIDE),
        ('k', Self::BLACK_KING_SIDE),
        ('q', Self::BLACK_QUEEN_SIDE),
    ];

    pub const fn none() -> Self {
        CastlingRights(0)
    }

    pub const fn all() -> Self {
        CastlingRights(0b1111)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn king_side(self, color: Color) -> bool {
        self.0 & Self::king_side_flag(color) != 0
    }

    pub fn queen_side(self, color: Color) -> bool {
        self.0 & Self::queen_side_flag(color) != 0
    }

    /// Drop both rights of one color
    pub fn clear(&mut self, color: Color) {
        self.0 &= !(Self::king_side_flag(color) | Self::queen_side_flag(color));
    }

    /// Drop the right tied to a rook's home corner, if `sq` is one
    pub fn clear_corner(&mut self, sq: Square) {
        let flag = match sq {
            Square::H1 => Self::WHITE_KING_SIDE,
            Square::A1 => Self::WHITE_QUEEN_SIDE,
            Square::H8 => Self::BLACK_KING_SIDE,
            Square::A8 => Self::BLACK_QUEEN_SIDE,
            _ => return,
        };
        self.0 &= !flag;
    }

    const fn king_side_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_KING_SIDE,
            Color::Black => Self::BLACK_KING_SIDE,
        }
    }

    const fn queen_side_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_QUEEN_SIDE,
            Color::Black => Self::BLACK_QUEEN_SIDE,
        }
    }

    /// Parse `-` or a non-empty ordered subset of `KQkq`
    fn from_fen(field: &str) -> Option<Self> {
        if field == "-" {
            return Some(CastlingRights::none());
        }
        if field.is_empty() {
            return None;
        }

        let mut rights = 0u8;
        let mut order = Self::FEN_ORDER.iter();
        for c in field.chars() {
            // Advance through K, Q, k, q; a letter out of order is never found
            let (_, flag) = order.by_ref().find(|(letter, _)| *letter == c)?;
            rights |= flag;
        }
        Some(CastlingRights(rights))
    }

    fn to_fen(self) -> String {
        if self.0 == 0 {
            return "-".to_string();
        }
        Self::FEN_ORDER
            .iter()
            .filter(|(_, flag)| self.0 & flag != 0)
            .map(|(letter, _)| *letter)
            .collect()
    }
}

// ============================================================================
// POSITION
// ============================================================================

/// Chess position: the complete, serializable game state.
///
/// Cloning is the only copy mechanism; trial applications of a move (self
/// check tests, notation suffixes) run on clones and never touch `self`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// 64-element array representing the board (0=a1, 1=b1, ..., 63=h8)
    squares: [Option<Piece>; 64],
    side_to_move: Color,
    castling_rights: CastlingRights,
    /// Square skipped by the pawn double step just played
    en_passant_square: Option<Square>,
    /// Moves since last pawn move or capture (for 50-move rule)
    halfmove_clock: u32,
    /// Full move counter, incremented after black moves
    fullmove_number: u32,
    /// Cached location of the side-to-move's king
    king_square: Option<Square>,
}

impl Position {
    /// Create a position with the standard starting array
    pub fn new() -> Self {
        Position::empty(Color::White).with_start_array()
    }

    /// Create a position from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Self::parse_fen(fen)
    }

    /// Replace this position with the one described by `fen`.
    ///
    /// The whole string is validated first; on error `self` is unchanged.
    pub fn load(&mut self, fen: &str) -> Result<(), FenError> {
        match Self::parse_fen(fen) {
            Ok(position) => {
                *self = position;
                Ok(())
            }
            Err(err) => {
                debug!(fen, error = %err, "rejected position string");
                Err(err)
            }
        }
    }

    fn empty(side_to_move: Color) -> Self {
        Position {
            squares: [None; 64],
            side_to_move,
            castling_rights: CastlingRights::none(),
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            king_square: None,
        }
    }

    fn with_start_array(mut self) -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for color in [Color::White, Color::Black] {
            for (file, kind) in BACK_RANK.iter().enumerate() {
                let file = file as u8;
                self.squares[Square::at(file, color.back_rank()).index()] =
                    Some(Piece::new(*kind, color));
                self.squares[Square::at(file, color.pawn_rank()).index()] =
                    Some(Piece::new(PieceKind::Pawn, color));
            }
        }
        self.castling_rights = CastlingRights::all();
        self.king_square = self.locate_king(self.side_to_move);
        self
    }

    fn parse_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split(' ').collect();
        if parts.len() != 6 {
            return Err(FenError::FieldCount { found: parts.len() });
        }

        // Active color
        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        let mut position = Position::empty(side_to_move);

        // Piece placement, rank 8 to rank 1, file a to file h
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount { found: ranks.len() });
        }
        for (row, text) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0usize;
            for c in text.chars() {
                let width = match c {
                    '1'..='8' => c as usize - '0' as usize,
                    _ => {
                        let piece =
                            Piece::from_fen_char(c).ok_or(FenError::PlacementChar { found: c })?;
                        if file < 8 {
                            let sq = Square::at(file as u8, rank);
                            position.squares[sq.index()] = Some(piece);
                            if piece.kind == PieceKind::King && piece.color == side_to_move {
                                position.king_square = Some(sq);
                            }
                        }
                        1
                    }
                };
                file += width;
            }
            if file != 8 {
                return Err(FenError::RankWidth {
                    rank: rank as usize + 1,
                    files: file,
                });
            }
        }

        position.castling_rights = CastlingRights::from_fen(parts[2])
            .ok_or_else(|| FenError::CastlingRights(parts[2].to_string()))?;

        // En passant target sits behind a pawn the opponent just pushed:
        // sixth rank with white to move, third rank with black to move
        if parts[3] != "-" {
            let target_rank = match side_to_move {
                Color::White => 5,
                Color::Black => 2,
            };
            let sq = parse_square(parts[3])
                .filter(|sq| sq.rank() == target_rank)
                .ok_or_else(|| FenError::EnPassant(parts[3].to_string()))?;
            position.en_passant_square = Some(sq);
        }

        position.halfmove_clock = parse_counter(parts[4])
            .ok_or_else(|| FenError::HalfmoveClock(parts[4].to_string()))?;
        position.fullmove_number = parse_counter(parts[5])
            .filter(|n| *n > 0)
            .ok_or_else(|| FenError::FullmoveNumber(parts[5].to_string()))?;

        Ok(position)
    }

    /// Generate FEN string from current position
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        // Piece placement
        for rank in (0..8).rev() {
            let mut empty_count = 0;
            for file in 0..8 {
                match self.squares[Square::at(file, rank).index()] {
                    None => empty_count += 1,
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        fen.push(piece.to_fen_char());
                    }
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(self.side_to_move.fen_char());

        fen.push(' ');
        fen.push_str(&self.castling_rights.to_fen());

        fen.push(' ');
        match self.en_passant_square {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));

        fen
    }

    /// Position string of the current state; alias of `to_fen`
    pub fn output_position(&self) -> String {
        self.to_fen()
    }

    /// Text grid from rank 8 down to rank 1: `.` for empty squares,
    /// uppercase for white pieces.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(8);
        for rank in (0..8).rev() {
            let row: Vec<String> = (0..8)
                .map(|file| match self.squares[Square::at(file, rank).index()] {
                    Some(piece) => piece.to_fen_char().to_string(),
                    None => ".".to_string(),
                })
                .collect();
            lines.push(row.join(" "));
        }
        lines.join("\n")
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Cached square of the side-to-move's king
    pub fn king_square(&self) -> Option<Square> {
        self.king_square
    }

    /// Occupied squares with their pieces, a1 to h8
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|piece| (sq, piece)))
    }

    /// Find the king's square for the specified color
    pub fn locate_king(&self, color: Color) -> Option<Square> {
        let king = Piece::new(PieceKind::King, color);
        self.pieces().find(|(_, piece)| *piece == king).map(|(sq, _)| sq)
    }

    // ------------------------------------------------------------------------
    // Move commit
    // ------------------------------------------------------------------------

    /// Commit a move given in UCI text. Nothing changes unless the move is
    /// well formed and legal.
    pub fn make_move(&mut self, uci_move: &str) -> MoveResult<()> {
        let mv = Move::parse(uci_move)?;
        self.play(mv)
    }

    /// Commit a parsed move after checking its legality
    pub fn play(&mut self, mv: Move) -> MoveResult<()> {
        if let Err(err) = MoveGenerator::new().validate(self, mv) {
            debug!(mv = %mv, error = %err, "rejected move");
            return Err(err);
        }
        self.commit(mv);
        Ok(())
    }

    /// Move the pieces for `mv` without any bookkeeping: the mover's piece
    /// (or its promotion), the pawn taken en passant and the castling rook.
    /// The king cache follows the king if it moved.
    pub(crate) fn apply_placement(&mut self, mv: Move) {
        let Some(piece) = self.piece_at(mv.from) else {
            return;
        };
        let file_delta = mv.to.file() as i8 - mv.from.file() as i8;

        if piece.kind == PieceKind::Pawn
            && file_delta != 0
            && self.piece_at(mv.to).is_none()
        {
            // En passant: the captured pawn stands beside the origin
            let victim = Square::at(mv.to.file(), mv.from.rank());
            if self.piece_at(victim) == Some(Piece::new(PieceKind::Pawn, !piece.color)) {
                trace!(square = %victim, "en passant capture");
                self.squares[victim.index()] = None;
            }
        }

        if piece.kind == PieceKind::King && file_delta.abs() == 2 {
            let rank = mv.from.rank();
            let (rook_from, rook_to) = if file_delta > 0 {
                (Square::at(7, rank), Square::at(5, rank))
            } else {
                (Square::at(0, rank), Square::at(3, rank))
            };
            trace!(from = %rook_from, to = %rook_to, "castling rook");
            self.squares[rook_to.index()] = self.squares[rook_from.index()].take();
        }

        let placed = match mv.promotion {
            Some(kind) if piece.kind == PieceKind::Pawn => Piece::new(kind, piece.color),
            _ => piece,
        };
        self.squares[mv.from.index()] = None;
        self.squares[mv.to.index()] = Some(placed);

        if self.king_square == Some(mv.from) {
            self.king_square = Some(mv.to);
        }
    }

    /// Apply a move already known to be legal, updating every derived field
    pub(crate) fn commit(&mut self, mv: Move) {
        let Some(piece) = self.piece_at(mv.from) else {
            return;
        };
        let is_pawn = piece.kind == PieceKind::Pawn;
        let capture = self.piece_at(mv.to).is_some()
            || (is_pawn && mv.from.file() != mv.to.file());

        self.apply_placement(mv);

        // Update castling rights: king moves, rook leaves or is taken on its corner
        if piece.kind == PieceKind::King {
            self.castling_rights.clear(piece.color);
        }
        self.castling_rights.clear_corner(mv.from);
        self.castling_rights.clear_corner(mv.to);

        // Update en passant square
        self.en_passant_square = None;
        if is_pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2 {
            let skipped = (mv.from.rank() + mv.to.rank()) / 2;
            self.en_passant_square = Some(Square::at(mv.from.file(), skipped));
        }

        // Update halfmove clock
        if is_pawn || capture {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        // Update fullmove number
        if self.side_to_move == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        // Switch side to move
        self.side_to_move = !self.side_to_move;
        self.king_square = self.locate_king(self.side_to_move);

        trace!(mv = %mv, fen = %self.to_fen(), "move committed");
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// True when `uci_move` is well formed and legal here
    pub fn is_move_legal(&self, uci_move: &str) -> bool {
        Move::parse(uci_move)
            .map(|mv| MoveGenerator::new().is_legal(self, mv))
            .unwrap_or(false)
    }

    /// Short algebraic notation for a legal move, `None` otherwise.
    /// Does not commit the move.
    pub fn move_notation(&self, uci_move: &str) -> Option<String> {
        let mv = Move::parse(uci_move).ok()?;
        notation::move_notation(self, mv)
    }

    /// All legal moves for the side to move
    pub fn legal_moves(&self) -> Vec<Move> {
        MoveGenerator::new().legal_moves(self)
    }

    pub fn is_check(&self) -> bool {
        MoveGenerator::new().is_check(self)
    }

    pub fn can_move(&self) -> bool {
        MoveGenerator::new().can_move(self)
    }

    pub fn is_checkmate(&self) -> bool {
        MoveGenerator::new().is_checkmate(self)
    }

    pub fn is_stalemate(&self) -> bool {
        MoveGenerator::new().is_stalemate(self)
    }

    /// Check for insufficient material to checkmate.
    ///
    /// Only K v K, a single minor piece against a bare king, and one bishop
    /// each on squares of the same color qualify. K+N+N v K does not.
    pub fn insufficient_material(&self) -> bool {
        let mut minors: Vec<(Square, Piece)> = Vec::new();

        for (sq, piece) in self.pieces() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => minors.push((sq, piece)),
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
            }
        }

        match minors.as_slice() {
            [] | [_] => true,
            [(sq1, b1), (sq2, b2)] => {
                b1.kind == PieceKind::Bishop
                    && b2.kind == PieceKind::Bishop
                    && b1.color != b2.color
                    && sq1.is_dark() == sq2.is_dark()
            }
            _ => false,
        }
    }
}

/// Non-negative decimal counter; digits only, so `+5` is refused
fn parse_counter(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

impl Default for Position {
    fn default() -> Self {
        Position::new()
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
