//! Game record
//!
//! A `Game` owns the current position together with what a position alone
//! cannot know: the notation of every move played and the keys of earlier
//! positions, which the repetition and fifty-move draw rules need.

use std::fmt;

use tracing::debug;

use crate::board::{Move, Position};
use crate::error::{FenError, MoveResult};
use crate::hash::ZobristHash;
use crate::move_generator::MoveGenerator;
use crate::notation;
use crate::types::Color;

/// Halfmoves without a capture or pawn move that draw the game
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// Occurrences of one position that draw the game
pub const REPETITION_LIMIT: usize = 3;

/// How a finished game ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoveRule,
}

impl Outcome {
    /// Winning side, `None` for draws
    pub fn winner(&self) -> Option<Color> {
        match self {
            Outcome::Checkmate { winner } => Some(*winner),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate { winner: Color::White } => write!(f, "Checkmate - White Wins"),
            Outcome::Checkmate { winner: Color::Black } => write!(f, "Checkmate - Black Wins"),
            Outcome::Stalemate => write!(f, "Draw - Stalemate"),
            Outcome::InsufficientMaterial => write!(f, "Draw - Insufficient Material"),
            Outcome::ThreefoldRepetition => write!(f, "Draw - Threefold Repetition"),
            Outcome::FiftyMoveRule => write!(f, "Draw - Fifty Move Rule"),
        }
    }
}

/// A position plus the history needed for draw rules
pub struct Game {
    position: Position,
    zobrist: ZobristHash,
    /// Keys since the last irreversible move, current position last
    history: Vec<u64>,
    /// Notation of every move played, in order
    moves: Vec<String>,
}

impl Game {
    /// Start a new game from the standard array
    pub fn new() -> Self {
        Game::from_position(Position::new())
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Game::from_position(Position::from_fen(fen)?))
    }

    pub fn from_position(position: Position) -> Self {
        let zobrist = ZobristHash::new();
        let history = vec![zobrist.hash_position(&position)];
        Game {
            position,
            zobrist,
            history,
            moves: Vec::new(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Notation of the moves played so far
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// Play a move given in UCI text and return its notation
    pub fn play(&mut self, uci_move: &str) -> MoveResult<String> {
        let mv = Move::parse(uci_move)?;
        self.play_move(mv)
    }

    pub fn play_move(&mut self, mv: Move) -> MoveResult<String> {
        let gen = MoveGenerator::new();
        if let Err(err) = gen.validate(&self.position, mv) {
            debug!(mv = %mv, error = %err, "game rejected move");
            return Err(err);
        }

        let san = notation::describe(&gen, &self.position, mv);
        self.position.commit(mv);

        // Positions before a capture or pawn move can never recur
        if self.position.halfmove_clock() == 0 {
            self.history.clear();
        }
        self.history.push(self.zobrist.hash_position(&self.position));
        self.moves.push(san.clone());

        Ok(san)
    }

    /// True once the halfmove clock reaches a hundred plies
    pub fn is_fifty_move_draw(&self) -> bool {
        self.position.halfmove_clock() >= FIFTY_MOVE_PLIES
    }

    /// True if the current position has occurred three times
    pub fn is_threefold_repetition(&self) -> bool {
        let Some(&current) = self.history.last() else {
            return false;
        };
        self.history.iter().filter(|&&key| key == current).count() >= REPETITION_LIMIT
    }

    /// Result of the game, or `None` while it is still running
    pub fn outcome(&self) -> Option<Outcome> {
        let gen = MoveGenerator::new();
        if !gen.can_move(&self.position) {
            return Some(if gen.is_check(&self.position) {
                Outcome::Checkmate {
                    winner: !self.position.side_to_move(),
                }
            } else {
                Outcome::Stalemate
            });
        }
        if self.position.insufficient_material() {
            return Some(Outcome::InsufficientMaterial);
        }
        if self.is_threefold_repetition() {
            return Some(Outcome::ThreefoldRepetition);
        }
        if self.is_fifty_move_draw() {
            return Some(Outcome::FiftyMoveRule);
        }
        None
    }

    /// Replace the game with a fresh one from the standard array
    pub fn reset(&mut self) {
        *self = Game::new();
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("fen", &self.position.to_fen())
            .field("moves", &self.moves)
            .finish()
    }
}

impl From<Position> for Game {
    fn from(position: Position) -> Self {
        Game::from_position(position)
    }
}
