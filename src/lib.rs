//! rulechess - Chess Rules Engine
//!
//! A chess rules library written in Rust with support for:
//! - FEN position loading and output
//! - Legal move validation and generation for all pieces
//! - Castling, en passant and promotion
//! - Check, checkmate and stalemate detection
//! - Short algebraic notation with disambiguation
//! - Draw rules with Zobrist position keys
//! - Multi-threaded perft for move generator verification

pub mod types;
pub mod error;
pub mod board;
pub mod move_generator;
pub mod notation;
pub mod hash;
pub mod game;
pub mod perft;

pub use board::{CastlingRights, Move, Position, STARTING_FEN};
pub use error::{FenError, MoveError, MoveResult};
pub use game::{Game, Outcome};
pub use move_generator::MoveGenerator;
pub use perft::{perft, perft_parallel, PerftOptions};
pub use types::{Color, Piece, PieceKind, Square};
