//! Move path enumeration
//!
//! Counts the leaf nodes of the legal move tree to a fixed depth. The counts
//! for well-known positions are published, which makes perft the standard
//! cross-check for a move generator. The parallel driver splits the root
//! moves across worker threads, each owning its own copy of the position.

use std::panic;
use std::thread;

use tracing::debug;

use crate::board::{Move, Position};
use crate::move_generator::MoveGenerator;

/// Options for the parallel driver
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerftOptions {
    /// Worker threads, 0 for one per logical CPU
    pub threads: usize,
}

impl PerftOptions {
    pub fn with_threads(threads: usize) -> Self {
        PerftOptions { threads }
    }

    /// Thread count with the automatic setting resolved
    pub fn resolved_threads(&self) -> usize {
        let threads = if self.threads == 0 { num_cpus::get() } else { self.threads };
        threads.max(1)
    }
}

/// Number of legal move paths of length `depth` from `position`
pub fn perft(position: &Position, depth: u32) -> u64 {
    let gen = MoveGenerator::new();
    count(&gen, position, depth)
}

/// Per-root-move node counts, in generation order
pub fn divide(position: &Position, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    let gen = MoveGenerator::new();
    gen.legal_moves(position)
        .into_iter()
        .map(|mv| (mv, subtree(&gen, position, mv, depth - 1)))
        .collect()
}

/// Same count as [`perft`], with root moves spread over worker threads
pub fn perft_parallel(position: &Position, depth: u32, options: &PerftOptions) -> u64 {
    if depth <= 1 {
        return perft(position, depth);
    }

    let gen = MoveGenerator::new();
    let root_moves = gen.legal_moves(position);
    let num_threads = options.resolved_threads().min(root_moves.len().max(1));

    // Round-robin so each worker gets a similar mix of quiet and busy moves
    let mut shares: Vec<Vec<Move>> = vec![Vec::new(); num_threads];
    for (i, mv) in root_moves.into_iter().enumerate() {
        shares[i % num_threads].push(mv);
    }

    let handles: Vec<_> = shares
        .into_iter()
        .enumerate()
        .map(|(thread_id, share)| {
            let position = position.clone();
            thread::spawn(move || {
                let gen = MoveGenerator::new();
                let nodes: u64 = share
                    .iter()
                    .map(|&mv| subtree(&gen, &position, mv, depth - 1))
                    .sum();
                debug!(thread_id, moves = share.len(), nodes, "perft worker finished");
                nodes
            })
        })
        .collect();

    let mut total = 0;
    for handle in handles {
        match handle.join() {
            Ok(nodes) => total += nodes,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
    total
}

fn subtree(gen: &MoveGenerator, position: &Position, mv: Move, depth: u32) -> u64 {
    let mut child = position.clone();
    child.commit(mv);
    count(gen, &child, depth)
}

fn count(gen: &MoveGenerator, position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = gen.legal_moves(position);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .into_iter()
        .map(|mv| subtree(gen, position, mv, depth - 1))
        .sum()
}
