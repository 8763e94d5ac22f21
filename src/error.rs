//! Error types for the rules engine
//!
//! Two families: a position string that cannot be loaded, and a move that
//! is either malformed text or not permitted in the current position.

use thiserror::Error;

use crate::types::Square;

/// Reasons a FEN string is rejected by `Position::load`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 6 space-separated fields, found {found}")]
    FieldCount { found: usize },

    #[error("expected 8 ranks in piece placement, found {found}")]
    RankCount { found: usize },

    #[error("invalid character {found:?} in piece placement")]
    PlacementChar { found: char },

    #[error("rank {rank} describes {files} files instead of 8")]
    RankWidth { rank: usize, files: usize },

    #[error("invalid side to move {0:?}")]
    SideToMove(String),

    #[error("invalid castling rights {0:?}")]
    CastlingRights(String),

    #[error("invalid en passant square {0:?}")]
    EnPassant(String),

    #[error("invalid halfmove clock {0:?}")]
    HalfmoveClock(String),

    #[error("invalid fullmove number {0:?}")]
    FullmoveNumber(String),
}

/// Reasons a move is refused.
///
/// `Malformed` and `PromotionMismatch` are input-shape errors; the remaining
/// variants describe well-formed moves the rules do not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("malformed move {0:?}, expected e.g. e2e4 or d7d8q")]
    Malformed(String),

    #[error("promotion piece must be given exactly when a pawn reaches the last rank")]
    PromotionMismatch,

    #[error("no piece on {0}")]
    EmptyOrigin(Square),

    #[error("piece on {0} belongs to the side not to move")]
    WrongSide(Square),

    #[error("piece on {from} cannot reach {to}")]
    Unreachable { from: Square, to: Square },

    #[error("move leaves the king in check")]
    LeavesKingInCheck,
}

impl MoveError {
    /// True for errors about the move text itself rather than the position
    pub fn is_malformed(&self) -> bool {
        matches!(self, MoveError::Malformed(_) | MoveError::PromotionMismatch)
    }
}

/// Result type alias for move operations
pub type MoveResult<T> = Result<T, MoveError>;
