//! Alpha-beta move search.
//!
//! A fixed-depth negamax search with fail-hard alpha-beta pruning over the
//! [`Game`] contract. Scores come from `Game::score`, which is always from
//! black's point of view; the search flips signs per ply with an XOR mask
//! and negates through bitwise complement, so `i32::MIN + 1` is a safe
//! starting bound and no negation can overflow.
//!
//! The searcher never mutates the caller's game: it clones the position
//! into a private history wrapper and plays/undoes on that, so every probe
//! has a matching undo. Move ordering is the board's enumeration order,
//! which also makes the chosen move deterministic for a given position and
//! depth (first enumerated move achieving the best value wins).

use crate::board::Move;
use crate::game::{Game, GameWithHistory};

/// Alpha-beta move source.
pub struct AlphaBeta {
    /// Maximum search depth in plies; `None` searches until the game ends.
    max_depth: Option<u32>,
    /// Leaf evaluations performed by the last `next_move` call.
    pub explored: u64,
}

impl AlphaBeta {
    /// Create a searcher with the given depth limit.
    pub fn new(max_depth: Option<u32>) -> AlphaBeta {
        AlphaBeta {
            max_depth,
            explored: 0,
        }
    }

    /// Pick a move for the side to move, or `None` if the game is over.
    ///
    /// A depth limit of zero evaluates the position once and falls back to
    /// the first legal move.
    pub fn next_move(&mut self, game: &dyn Game) -> Option<Move> {
        if game.game_over() {
            return None;
        }

        let mut scratch = GameWithHistory::from_board(game.board().clone());
        self.explored = 0;
        let depth = self.max_depth.map_or(-1, |d| d as i32);

        let mut best: Option<Move> = None;
        move_search(
            &mut scratch,
            i32::MIN,
            i32::MAX,
            depth,
            Some(&mut best),
            &mut self.explored,
        );
        if best.is_none() {
            best = scratch.board().legal_moves().first().copied();
        }
        log::debug!(
            "explored {} positions, chose {}",
            self.explored,
            best.map_or("nothing".to_string(), |m| m.to_string())
        );
        best
    }
}

/// Recursive negamax over `g` with fail-hard bounds `[alpha, beta]`.
///
/// Returns the value of the position from black's point of view; `alpha`,
/// `beta` and the internal `best` live in the side-to-move's view, related
/// to black's by bitwise complement when white is to move. A negative depth
/// means unbounded.
fn move_search(
    g: &mut dyn Game,
    alpha: i32,
    beta: i32,
    depth: i32,
    mut root_move: Option<&mut Option<Move>>,
    cnt: &mut u64,
) -> i32 {
    if depth == 0 || g.game_over() {
        *cnt += 1;
        return g.score();
    }

    // 0 while the maximizing player is to move, all ones otherwise
    let res_mask: i32 = if g.max_player() { 0 } else { !0 };
    let mut alpha = alpha;
    let mut best = i32::MIN + 1;

    g.for_each_legal_move(&mut |g, mv| {
        if let Err(e) = g.play(mv) {
            panic!("enumerated move {} was rejected: {}", mv, e);
        }
        let res = move_search(g, !beta, !alpha, depth - 1, None, cnt);
        g.undo();

        // flip the subtree value into this ply's view
        let val = res ^ res_mask;
        if val > best {
            best = val;
            if val > alpha {
                alpha = val;
            }
            if let Some(slot) = root_move.as_deref_mut() {
                *slot = Some(mv);
            }
        }

        // stop expanding once the window closes
        alpha < beta
    });

    best ^ res_mask
}
