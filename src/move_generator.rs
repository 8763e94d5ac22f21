//! Move Generator Module
//!
//! This module handles pseudo-legal destination generation for every piece
//! kind, the check detector built on top of it, the legality filter and the
//! checkmate / stalemate classification.

use crate::board::{Move, Position};
use crate::error::{MoveError, MoveResult};
use crate::types::*;

/// Probe kinds used by the check detector, each paired with the enemy
/// kinds it detects when it lands on them.
const CHECK_PROBES: [(PieceKind, &[PieceKind]); 5] = [
    (PieceKind::Knight, &[PieceKind::Knight]),
    (PieceKind::Bishop, &[PieceKind::Bishop, PieceKind::Queen]),
    (PieceKind::Rook, &[PieceKind::Rook, PieceKind::Queen]),
    (PieceKind::Pawn, &[PieceKind::Pawn]),
    (PieceKind::King, &[PieceKind::King]),
];

/// Move generator for chess positions
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    /// Create a new move generator
    pub fn new() -> Self {
        MoveGenerator
    }

    /// Pseudo-legal destinations for `piece` standing on `origin`.
    ///
    /// With `captures_only` set, pawn pushes and castling are left out so
    /// only squares the piece attacks remain.
    pub fn destinations(
        &self,
        position: &Position,
        piece: Piece,
        origin: Square,
        captures_only: bool,
    ) -> Vec<Square> {
        let mut targets = Vec::with_capacity(28);
        let color = piece.color;

        match piece.kind {
            PieceKind::Pawn => self.pawn_targets(position, color, origin, captures_only, &mut targets),
            PieceKind::Knight => self.step_targets(position, color, origin, &KNIGHT_OFFSETS, &mut targets),
            PieceKind::Bishop => self.sliding_targets(position, color, origin, &BISHOP_DIRECTIONS, &mut targets),
            PieceKind::Rook => self.sliding_targets(position, color, origin, &ROOK_DIRECTIONS, &mut targets),
            PieceKind::Queen => self.sliding_targets(position, color, origin, &QUEEN_DIRECTIONS, &mut targets),
            PieceKind::King => {
                self.step_targets(position, color, origin, &KING_OFFSETS, &mut targets);
                if !captures_only {
                    self.castling_targets(position, color, origin, &mut targets);
                }
            }
        }

        targets
    }

    /// Pseudo-legal destinations of whatever stands on `origin`
    pub fn destinations_from(&self, position: &Position, origin: Square) -> Vec<Square> {
        match position.piece_at(origin) {
            Some(piece) => self.destinations(position, piece, origin, false),
            None => Vec::new(),
        }
    }

    /// Generate pawn destinations from the given square
    fn pawn_targets(
        &self,
        position: &Position,
        color: Color,
        origin: Square,
        captures_only: bool,
        targets: &mut Vec<Square>,
    ) {
        let forward = color.forward();

        // Single push, then double push from the starting rank over an empty square
        if !captures_only {
            if let Some(single) = origin.offset(0, forward) {
                if position.piece_at(single).is_none() {
                    targets.push(single);
                    if origin.rank() == color.pawn_rank() {
                        if let Some(double) = origin.offset(0, 2 * forward) {
                            if position.piece_at(double).is_none() {
                                targets.push(double);
                            }
                        }
                    }
                }
            }
        }

        // Captures, including en passant against an enemy pawn beside the origin
        let enemy_pawn = Some(Piece::new(PieceKind::Pawn, !color));
        for file_delta in [-1, 1] {
            let Some(target) = origin.offset(file_delta, forward) else {
                continue;
            };
            match position.piece_at(target) {
                Some(victim) if victim.color != color => targets.push(target),
                None if position.en_passant_square() == Some(target)
                    && position.piece_at(Square::at(target.file(), origin.rank())) == enemy_pawn =>
                {
                    targets.push(target)
                }
                _ => {}
            }
        }
    }

    /// Generate knight or king steps from the given square
    fn step_targets(
        &self,
        position: &Position,
        color: Color,
        origin: Square,
        offsets: &[(i8, i8)],
        targets: &mut Vec<Square>,
    ) {
        for &(file_delta, rank_delta) in offsets {
            let Some(target) = origin.offset(file_delta, rank_delta) else {
                continue;
            };
            match position.piece_at(target) {
                Some(occupant) if occupant.color == color => {}
                _ => targets.push(target),
            }
        }
    }

    /// Generate destinations for sliding pieces (bishop, rook, queen)
    fn sliding_targets(
        &self,
        position: &Position,
        color: Color,
        origin: Square,
        directions: &[Direction],
        targets: &mut Vec<Square>,
    ) {
        for &direction in directions {
            let mut current = origin;
            while let Some(next) = current.step(direction) {
                match position.piece_at(next) {
                    None => targets.push(next),
                    Some(occupant) => {
                        if occupant.color != color {
                            targets.push(next);
                        }
                        break;
                    }
                }
                current = next;
            }
        }
    }

    /// Castling destinations for a king on its home square.
    ///
    /// Each side needs its right, its rook in the corner, an empty path
    /// between king and rook, the king out of check, and both the square the
    /// king crosses and the one it lands on free of attack.
    fn castling_targets(
        &self,
        position: &Position,
        color: Color,
        origin: Square,
        targets: &mut Vec<Square>,
    ) {
        let rank = color.back_rank();
        if origin != Square::at(4, rank) || color != position.side_to_move() {
            return;
        }

        let rights = position.castling_rights();
        let rook = Some(Piece::new(PieceKind::Rook, color));
        let empty = |files: &[u8]| {
            files
                .iter()
                .all(|&file| position.piece_at(Square::at(file, rank)).is_none())
        };
        let safe_path = |cross: u8, land: u8| {
            !self.leaves_king_in_check(position, Move::new(origin, Square::at(cross, rank)))
                && !self.leaves_king_in_check(position, Move::new(origin, Square::at(land, rank)))
        };

        let king_side = rights.king_side(color)
            && position.piece_at(Square::at(7, rank)) == rook
            && empty(&[5, 6]);
        let queen_side = rights.queen_side(color)
            && position.piece_at(Square::at(0, rank)) == rook
            && empty(&[1, 2, 3]);

        if !(king_side || queen_side) || self.is_check(position) {
            return;
        }
        if king_side && safe_path(5, 6) {
            targets.push(Square::at(6, rank));
        }
        if queen_side && safe_path(3, 2) {
            targets.push(Square::at(2, rank));
        }
    }

    // ========================================================================
    // CHECK DETECTION
    // ========================================================================

    /// Check if the side to move's king is attacked.
    ///
    /// From the king's square, probe as a knight, bishop, rook, pawn and
    /// king of the king's own color; landing on an enemy piece of a matching
    /// kind means that piece could capture the king.
    pub fn is_check(&self, position: &Position) -> bool {
        match position.king_square() {
            Some(king_sq) => self.is_attacked(position, king_sq, position.side_to_move()),
            None => false,
        }
    }

    /// True if an enemy of `color` attacks `square`
    pub fn is_attacked(&self, position: &Position, square: Square, color: Color) -> bool {
        CHECK_PROBES.iter().any(|&(probe, attackers)| {
            self.destinations(position, Piece::new(probe, color), square, true)
                .into_iter()
                .any(|target| match position.piece_at(target) {
                    Some(piece) => piece.color != color && attackers.contains(&piece.kind),
                    None => false,
                })
        })
    }

    /// Try the move on a clone and report whether the mover is left in check
    pub fn leaves_king_in_check(&self, position: &Position, mv: Move) -> bool {
        let mut trial = position.clone();
        trial.apply_placement(mv);
        self.is_check(&trial)
    }

    // ========================================================================
    // LEGALITY
    // ========================================================================

    /// Run the legality pipeline for a parsed move: origin occupied, piece
    /// owned by the side to move, promotion letter given exactly when a pawn
    /// reaches the last rank, destination generated, king not left in check.
    pub fn validate(&self, position: &Position, mv: Move) -> MoveResult<()> {
        let piece = position
            .piece_at(mv.from)
            .ok_or(MoveError::EmptyOrigin(mv.from))?;

        if piece.color != position.side_to_move() {
            return Err(MoveError::WrongSide(mv.from));
        }

        let promotes =
            piece.kind == PieceKind::Pawn && mv.to.rank() == piece.color.promotion_rank();
        if promotes != mv.promotion.is_some() {
            return Err(MoveError::PromotionMismatch);
        }

        if !self.destinations(position, piece, mv.from, false).contains(&mv.to) {
            return Err(MoveError::Unreachable {
                from: mv.from,
                to: mv.to,
            });
        }

        if self.leaves_king_in_check(position, mv) {
            return Err(MoveError::LeavesKingInCheck);
        }

        Ok(())
    }

    /// Check if a move is legal (doesn't leave own king in check)
    pub fn is_legal(&self, position: &Position, mv: Move) -> bool {
        self.validate(position, mv).is_ok()
    }

    /// Legal destinations for the piece on `origin`, empty if it is not the
    /// side to move's piece
    pub fn legal_destinations(&self, position: &Position, origin: Square) -> Vec<Square> {
        let Some(piece) = position.piece_at(origin) else {
            return Vec::new();
        };
        if piece.color != position.side_to_move() {
            return Vec::new();
        }
        self.destinations(position, piece, origin, false)
            .into_iter()
            .filter(|&to| !self.leaves_king_in_check(position, Move::new(origin, to)))
            .collect()
    }

    /// Generate all legal moves for the current position.
    /// Promotions are listed once per promotion piece.
    pub fn legal_moves(&self, position: &Position) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        let color = position.side_to_move();

        for (origin, piece) in position.pieces().filter(|(_, piece)| piece.color == color) {
            for to in self.legal_destinations(position, origin) {
                if piece.kind == PieceKind::Pawn && to.rank() == color.promotion_rank() {
                    moves.extend(
                        PieceKind::PROMOTIONS
                            .iter()
                            .map(|&kind| Move::with_promotion(origin, to, kind)),
                    );
                } else {
                    moves.push(Move::new(origin, to));
                }
            }
        }

        moves
    }

    /// True if the side to move has at least one legal move
    pub fn can_move(&self, position: &Position) -> bool {
        let color = position.side_to_move();
        position
            .pieces()
            .filter(|(_, piece)| piece.color == color)
            .any(|(origin, piece)| {
                self.destinations(position, piece, origin, false)
                    .into_iter()
                    .any(|to| !self.leaves_king_in_check(position, Move::new(origin, to)))
            })
    }

    /// Check if the current position is checkmate
    pub fn is_checkmate(&self, position: &Position) -> bool {
        self.is_check(position) && !self.can_move(position)
    }

    /// Check if the current position is stalemate
    pub fn is_stalemate(&self, position: &Position) -> bool {
        !self.is_check(position) && !self.can_move(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        parse_square(name).unwrap()
    }

    fn targets(fen: &str, origin: &str) -> Vec<String> {
        let position = Position::from_fen(fen).unwrap();
        let mut names: Vec<String> = MoveGenerator::new()
            .destinations_from(&position, sq(origin))
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        names.sort();
        names
    }

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn bishop_stops_at_first_piece() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 1";
        assert_eq!(targets(fen, "b5"), sorted(&["a6", "c6", "a4", "c4", "d3", "e2", "f1"]));
    }

    #[test]
    fn queen_rays() {
        let fen = "rn1qkb1r/pppbpppp/5n2/3p4/Q1PP4/8/PP2PPPP/RNB1KBNR w KQkq - 0 1";
        assert_eq!(
            targets(fen, "a4"),
            sorted(&["a3", "a5", "a6", "a7", "b3", "b4", "b5", "c6", "d7", "d1", "c2"])
        );
    }

    #[test]
    fn rook_rays() {
        let fen = "2kr1bnr/ppp1pppp/2n5/q6b/3P4/2N2N1P/PPP1BPP1/R1BQK2R b KQkq - 0 1";
        assert_eq!(targets(fen, "d8"), sorted(&["d7", "d6", "d5", "d4", "e8"]));
    }

    #[test]
    fn knight_skips_friendly_squares() {
        let fen = "rnb1kbnr/pppp1ppp/8/4p3/4P2q/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        assert_eq!(targets(fen, "f3"), sorted(&["g1", "h4", "g5", "e5", "d4"]));
    }

    #[test]
    fn king_steps_are_pseudo_legal() {
        let fen = "6k1/p4ppp/8/8/2P5/6P1/P1P1n3/3K4 w - - 0 29";
        assert_eq!(targets(fen, "d1"), sorted(&["c1", "d2", "e2", "e1"]));
    }

    #[test]
    fn pawn_pushes_and_captures() {
        let fen = "rnbqkb1r/pppp2pp/4p2B/4Pp2/3P4/5P1n/PPP1Q1PP/RN2KBNR w KQkq - 2 7";
        assert_eq!(targets(fen, "g2"), sorted(&["g3", "g4", "h3"]));
        let blocked = "rnbqkb1r/pppp2pp/4p2B/4Pp2/3P1n2/5P2/PPP3PP/RN1QKBNR w KQkq f6 0 6";
        assert_eq!(targets(blocked, "e5"), sorted(&["f6"]));
    }

    #[test]
    fn pawn_double_step_needs_clear_path() {
        let fen = "rnbqkbnr/pppp1ppp/8/8/8/4p3/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(targets(fen, "e2"), Vec::<String>::new());
        assert_eq!(targets(fen, "d2"), sorted(&["d3", "d4", "e3"]));
    }

    #[test]
    fn captures_only_skips_pushes_and_castling() {
        let gen = MoveGenerator::new();
        let white_pawn = Piece::new(PieceKind::Pawn, Color::White);
        let targets = Position::from_fen("4k3/8/8/8/8/3r1b2/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(
            gen.destinations(&targets, white_pawn, sq("e2"), true),
            vec![sq("d3"), sq("f3")]
        );
        assert_eq!(gen.destinations(&targets, white_pawn, sq("e2"), false).len(), 4);

        let position = Position::from_fen("r3k2r/8/8/8/8/8/4P3/R3K2R w KQkq - 0 1").unwrap();
        let king = Piece::new(PieceKind::King, Color::White);
        let full = gen.destinations(&position, king, Square::E1, false);
        let attacks = gen.destinations(&position, king, Square::E1, true);
        assert!(full.contains(&Square::G1) && full.contains(&Square::C1));
        assert!(!attacks.contains(&Square::G1) && !attacks.contains(&Square::C1));
    }

    #[test]
    fn castling_both_sides() {
        let fen = "r3k2r/ppp2ppp/5n2/6N1/1bn3b1/2N1P3/PP1B1PPP/R3K2R b KQkq - 7 11";
        assert_eq!(targets(fen, "e8"), sorted(&["e7", "d7", "f8", "g8", "d8", "c8"]));
    }

    #[test]
    fn castling_refused_through_attacked_square() {
        let position =
            Position::from_fen("r3k2r/ppp2pp1/5n1p/6N1/1bn3b1/2N1P3/PP1B1PPP/R3K2R w KQkq - 0 12")
                .unwrap();
        let gen = MoveGenerator::new();
        let mut legal: Vec<String> = gen
            .legal_destinations(&position, Square::E1)
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        legal.sort();
        assert_eq!(legal, sorted(&["f1", "g1"]));

        let position =
            Position::from_fen("2kr3r/ppp2pp1/5n1p/7b/1b6/2N1B3/PP3PPP/R3K1NR w KQ - 3 15").unwrap();
        assert_eq!(gen.legal_destinations(&position, Square::E1), vec![Square::F1]);
    }

    #[test]
    fn castling_needs_rook_and_no_check() {
        let gen = MoveGenerator::new();
        let no_rook = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w KQ - 0 1").unwrap();
        assert_eq!(gen.legal_moves(&no_rook).len(), 5);

        let in_check = Position::from_fen("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1").unwrap();
        let king_moves = gen.legal_destinations(&in_check, Square::E1);
        assert!(!king_moves.contains(&Square::G1));
        assert!(!king_moves.contains(&Square::C1));

        let knight_on_b1 = Position::from_fen("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1").unwrap();
        assert!(!gen.legal_destinations(&knight_on_b1, Square::E1).contains(&Square::C1));
    }

    #[test]
    fn check_detection() {
        let quiet =
            Position::from_fen("r2qk2r/ppp1bppp/2npbn2/4p3/4PP2/1P3N2/PBPP2PP/RN1QKB1R b KQkq - 2 7")
                .unwrap();
        assert!(!MoveGenerator::new().is_check(&quiet));
        let bishop_check =
            Position::from_fen("r1bqkb1r/pppp1Bpp/2n5/4p1N1/4n3/8/PPPP1PPP/RNBQK2R b KQkq - 0 5")
                .unwrap();
        assert!(MoveGenerator::new().is_check(&bishop_check));

        let queen_diagonal = Position::from_fen("4k3/8/8/q7/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(MoveGenerator::new().is_check(&queen_diagonal));
        let blocked = Position::from_fen("4k3/8/8/q7/8/8/3P4/4K3 w - - 0 1").unwrap();
        assert!(!MoveGenerator::new().is_check(&blocked));

        let adjacent_kings = Position::from_fen("8/8/8/8/8/3k4/3K4/8 w - - 0 1").unwrap();
        assert!(MoveGenerator::new().is_check(&adjacent_kings));
        let diagonal_kings = Position::from_fen("8/8/8/8/8/4k3/3K4/8 b - - 0 1").unwrap();
        assert!(MoveGenerator::new().is_check(&diagonal_kings));
    }

    #[test]
    fn pawn_checks_come_from_the_right_direction() {
        let gen = MoveGenerator::new();
        let white_king = Position::from_fen("8/8/8/3p4/4K3/8/8/7k w - - 0 1").unwrap();
        assert!(gen.is_check(&white_king));
        let behind = Position::from_fen("8/8/8/8/4K3/3p4/8/7k w - - 0 1").unwrap();
        assert!(!gen.is_check(&behind));
        let black_king = Position::from_fen("7K/8/8/3k4/4P3/8/8/8 b - - 0 1").unwrap();
        assert!(gen.is_check(&black_king));
    }

    #[test]
    fn pinned_piece_cannot_leave_the_line() {
        let position =
            Position::from_fen("r1bqkbnr/ppp1pppp/2n5/1B1P4/8/8/PPPP1PPP/RNBQK1NR b KQkq - 0 3")
                .unwrap();
        let gen = MoveGenerator::new();
        let mv = Move::new(sq("c6"), sq("d4"));
        assert_eq!(gen.validate(&position, mv), Err(MoveError::LeavesKingInCheck));
    }

    #[test]
    fn en_passant_discovered_check_is_illegal() {
        let position = Position::from_fen("8/8/8/K2pP2r/8/8/8/7k w - d6 0 1").unwrap();
        let gen = MoveGenerator::new();
        assert!(gen.destinations_from(&position, sq("e5")).contains(&sq("d6")));
        assert_eq!(
            gen.validate(&position, Move::new(sq("e5"), sq("d6"))),
            Err(MoveError::LeavesKingInCheck)
        );
    }

    #[test]
    fn legal_moves_from_start() {
        let moves = MoveGenerator::new().legal_moves(&Position::new());
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn promotions_are_expanded() {
        let position = Position::from_fen("8/2KP4/5n2/8/8/8/5kp1/8 w - - 0 1").unwrap();
        let promotions: Vec<Move> = MoveGenerator::new()
            .legal_moves(&position)
            .into_iter()
            .filter(|mv| mv.from == sq("d7"))
            .collect();
        assert_eq!(promotions.len(), 4);
        assert!(promotions.iter().all(|mv| mv.promotion.is_some()));
    }

    #[test]
    fn mate_and_stalemate() {
        let gen = MoveGenerator::new();
        let mate =
            Position::from_fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4")
                .unwrap();
        assert!(gen.is_checkmate(&mate));
        assert!(!gen.is_stalemate(&mate));

        let escape =
            Position::from_fen("r4b1r/ppp3kp/4QBp1/8/8/8/PPP2PPP/RN2K2R b KQ - 2 16").unwrap();
        assert!(!gen.is_checkmate(&escape));

        let stalemate = Position::from_fen("8/8/8/8/8/n1p5/P2k4/K7 w - - 0 1").unwrap();
        assert!(gen.is_stalemate(&stalemate));
        let not_stalemate = Position::from_fen("8/8/8/8/7p/2n5/2k1p2P/K7 w - - 0 1").unwrap();
        assert!(!gen.is_stalemate(&not_stalemate));
    }
}
