//! Short algebraic notation
//!
//! Converts a legal coordinate move into the compact form used in game
//! records: `Nf3`, `exd5`, `R1xh3`, `O-O-O`, `c8=Q+`, `Qh5#`.

use crate::board::{Move, Position};
use crate::move_generator::MoveGenerator;
use crate::types::*;

/// Notation for `mv` in `position`, or `None` if the move is not legal.
pub fn move_notation(position: &Position, mv: Move) -> Option<String> {
    let gen = MoveGenerator::new();
    gen.validate(position, mv).ok()?;
    Some(describe(&gen, position, mv))
}

/// Notation for a move the caller has already validated
pub(crate) fn describe(gen: &MoveGenerator, position: &Position, mv: Move) -> String {
    let Some(piece) = position.piece_at(mv.from) else {
        return mv.to_uci();
    };
    let file_delta = mv.to.file() as i8 - mv.from.file() as i8;
    let mut san = String::with_capacity(8);

    if piece.kind == PieceKind::King && file_delta.abs() == 2 {
        san.push_str(if file_delta > 0 { "O-O" } else { "O-O-O" });
    } else if piece.kind == PieceKind::Pawn {
        // Any diagonal pawn move captures, en passant included
        if file_delta != 0 {
            san.push(mv.from.file_char());
            san.push('x');
        }
        san.push_str(&mv.to.to_string());
        if let Some(kind) = mv.promotion {
            san.push('=');
            san.push(kind.symbol().to_ascii_uppercase());
        }
    } else {
        san.push(piece.kind.symbol().to_ascii_uppercase());
        san.push_str(&disambiguation(gen, position, piece, mv));
        if position.piece_at(mv.to).is_some() {
            san.push('x');
        }
        san.push_str(&mv.to.to_string());
    }

    let mut after = position.clone();
    after.commit(mv);
    if gen.is_checkmate(&after) {
        san.push('#');
    } else if gen.is_check(&after) {
        san.push('+');
    }

    san
}

/// Origin file and/or rank needed to tell `mv` apart from moves of other
/// same-kind pieces whose generated destinations include the same square.
fn disambiguation(gen: &MoveGenerator, position: &Position, piece: Piece, mv: Move) -> String {
    if piece.kind == PieceKind::King {
        return String::new();
    }

    // Probe outward from the destination as an enemy piece of the same kind:
    // the friendly pieces it lands on are the ones that can reach back.
    let probe = Piece::new(piece.kind, !piece.color);
    let rivals: Vec<Square> = gen
        .destinations(position, probe, mv.to, true)
        .into_iter()
        .filter(|&origin| origin != mv.from && position.piece_at(origin) == Some(piece))
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());

    let mut prefix = String::with_capacity(2);
    if !shares_file || shares_rank {
        prefix.push(mv.from.file_char());
    }
    if shares_file {
        prefix.push(mv.from.rank_char());
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notation(fen: &str, uci: &str) -> Option<String> {
        Position::from_fen(fen).unwrap().move_notation(uci)
    }

    #[test]
    fn knight_disambiguated_by_file() {
        assert_eq!(
            notation(
                "r1bqkb1r/pp2pppp/2p5/3Pn1B1/QnB1P3/2N5/PP2NPPP/R4RK1 b Qkq - 0 1",
                "e5d3"
            )
            .as_deref(),
            Some("Ned3")
        );
    }

    #[test]
    fn rooks_on_one_file_use_the_rank() {
        assert_eq!(
            notation("8/1k6/7r/8/3PPP2/3RK2N/q7/7r b - - 0 1", "h1h3").as_deref(),
            Some("R1xh3#")
        );
    }

    #[test]
    fn pinned_rival_still_counts() {
        // The c3 knight is pinned against the king on e1 by the a5 bishop,
        // but its pattern still reaches e2
        let fen = "4k3/8/8/b7/8/2N5/8/4K1N1 w - - 0 1";
        assert_eq!(notation(fen, "g1e2").as_deref(), Some("Nge2"));
        assert_eq!(notation(fen, "c3e2"), None);
    }

    #[test]
    fn three_queens_need_file_and_rank() {
        let fen = "2k5/8/8/8/Q6Q/8/8/Q3K3 w - - 0 1";
        assert_eq!(notation(fen, "a4d1").as_deref(), Some("Q4d1"));
        assert_eq!(notation(fen, "h4e7").as_deref(), Some("Qe7"));
        let fen = "2k5/8/8/8/Q6Q/8/8/Q6K w - - 0 1";
        assert_eq!(notation(fen, "a4e4").as_deref(), Some("Qae4"));
        assert_eq!(notation(fen, "a4d4").as_deref(), Some("Qa4d4"));
        let fen = "7k/8/8/8/Q3Q3/8/Q7/7K w - - 0 1";
        assert_eq!(notation(fen, "a4c2").as_deref(), Some("Qa4c2"));
    }

    #[test]
    fn illegal_moves_have_no_notation() {
        assert_eq!(notation(crate::board::STARTING_FEN, "e2e5"), None);
        assert_eq!(notation(crate::board::STARTING_FEN, "e7e5"), None);
        assert_eq!(notation(crate::board::STARTING_FEN, "nonsense"), None);
    }
}
