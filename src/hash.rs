//! Zobrist hashing
//!
//! Position keys used to recognise repeated positions. Keys come from a
//! fixed-seed generator so hashes are stable across runs.

use rand::prelude::*;

use crate::board::Position;
use crate::types::Color;

const ZOBRIST_SEED: u64 = 0x5EED_C4E5_5000_0001;

pub struct ZobristHash {
    piece_keys: [[[u64; 64]; 6]; 2],
    side_key: u64,
    castling_keys: [u64; 16],
    ep_keys: [u64; 9],
}

impl ZobristHash {
    pub fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

        let mut piece_keys = [[[0u64; 64]; 6]; 2];
        for color in piece_keys.iter_mut() {
            for kind in color.iter_mut() {
                for key in kind.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let side_key = rng.gen();

        let mut castling_keys = [0u64; 16];
        for key in castling_keys.iter_mut() {
            *key = rng.gen();
        }

        // One key per en passant file, the last for "no target"
        let mut ep_keys = [0u64; 9];
        for key in ep_keys.iter_mut() {
            *key = rng.gen();
        }

        ZobristHash {
            piece_keys,
            side_key,
            castling_keys,
            ep_keys,
        }
    }

    /// Key of the placement, side to move, castling rights and en passant
    /// file. Move counters are not part of the key.
    pub fn hash_position(&self, position: &Position) -> u64 {
        let mut h = 0u64;

        for (sq, piece) in position.pieces() {
            h ^= self.piece_keys[piece.color.index()][piece.kind.index()][sq.index()];
        }

        if position.side_to_move() == Color::Black {
            h ^= self.side_key;
        }

        h ^= self.castling_keys[position.castling_rights().bits() as usize];

        let ep_idx = match position.en_passant_square() {
            Some(sq) => sq.file() as usize,
            None => 8,
        };
        h ^= self.ep_keys[ep_idx];

        h
    }
}

impl Default for ZobristHash {
    fn default() -> Self {
        ZobristHash::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpositions_share_a_key() {
        let zobrist = ZobristHash::new();
        let mut a = Position::new();
        let mut b = Position::new();
        for mv in ["g1f3", "g8f6", "b1c3"] {
            a.make_move(mv).unwrap();
        }
        for mv in ["b1c3", "g8f6", "g1f3"] {
            b.make_move(mv).unwrap();
        }
        assert_eq!(zobrist.hash_position(&a), zobrist.hash_position(&b));
        assert_ne!(zobrist.hash_position(&a), zobrist.hash_position(&Position::new()));
    }

    #[test]
    fn side_and_en_passant_change_the_key() {
        let zobrist = ZobristHash::new();
        let white = Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1").unwrap();
        let black = Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - - 0 1").unwrap();
        let ep = Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1").unwrap();
        assert_ne!(zobrist.hash_position(&white), zobrist.hash_position(&black));
        assert_ne!(zobrist.hash_position(&black), zobrist.hash_position(&ep));
        assert_eq!(
            zobrist.hash_position(&black),
            ZobristHash::new().hash_position(&black)
        );
    }
}
