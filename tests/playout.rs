use rand::prelude::*;

use rulechess::types::Square;
use rulechess::{Game, MoveGenerator, Position};

const GAMES: u64 = 12;
const MAX_PLIES: usize = 160;

/// Invariants that must hold in every reachable position
fn check_position(gen: &MoveGenerator, position: &Position) {
    let fen = position.to_fen();
    let reloaded = Position::from_fen(&fen).unwrap();
    assert_eq!(reloaded.to_fen(), fen);

    assert_eq!(position.king_square(), position.locate_king(position.side_to_move()));

    for origin in Square::all() {
        let Some(piece) = position.piece_at(origin) else {
            assert!(gen.destinations_from(position, origin).is_empty());
            continue;
        };
        for to in gen.destinations_from(position, origin) {
            let target = position.piece_at(to);
            assert!(
                target.map_or(true, |t| t.color != piece.color),
                "{fen}: {origin}{to} lands on a friendly piece"
            );
        }
    }

    let moves = position.legal_moves();
    for mv in &moves {
        assert!(position.is_move_legal(&mv.to_uci()), "{fen}: {mv} listed but rejected");
        let san = position.move_notation(&mv.to_uci()).unwrap();
        let mut after = position.clone();
        after.play(*mv).unwrap();
        let mover = position.side_to_move();
        let king = after.locate_king(mover).unwrap();
        assert!(!gen.is_attacked(&after, king, mover), "{fen}: {mv} exposes the king");
        assert_eq!(san.ends_with('#'), after.is_checkmate(), "{fen}: {san}");
        assert_eq!(san.ends_with('+'), after.is_check() && !after.is_checkmate(), "{fen}: {san}");
    }
    assert_eq!(moves.is_empty(), !position.can_move());
    assert_eq!(moves.is_empty() && position.is_check(), position.is_checkmate());
}

#[test]
fn random_games_keep_the_rules_consistent() {
    let gen = MoveGenerator::new();
    for seed in 0..GAMES {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::new();

        for _ in 0..MAX_PLIES {
            if game.outcome().is_some() {
                break;
            }
            check_position(&gen, game.position());

            let moves = game.position().legal_moves();
            let Some(&mv) = moves.choose(&mut rng) else {
                break;
            };
            let fullmove = game.position().fullmove_number();
            let san = game.play(&mv.to_uci()).unwrap();
            assert_eq!(game.moves().last(), Some(&san));
            assert!(game.position().fullmove_number() >= fullmove);
        }
    }
}
