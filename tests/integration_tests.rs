//! End-to-end scenarios for the board engine, the searcher and the hash.
//!
//! These cover full capture/ko/pass games, the determinism and clone laws
//! the searcher relies on, and the symmetry invariance of the position
//! hash.

use tengen::board::{Board, Color, IllegalMove, Move, parse_vertex};
use tengen::game::{Game, GameWithHistory, RecordedGame};
use tengen::search::AlphaBeta;
use tengen::sgf;
use tengen::zobrist::ZobristHash;

// =============================================================================
// Helpers
// =============================================================================

/// Play a sequence of vertex strings, alternating colors from black.
/// `"pass"` passes. Panics on an illegal move; checks invariants after each.
fn play_all(board: &mut Board, moves: &[&str]) {
    for mv in moves {
        let m = as_move(board, mv);
        board
            .play(m)
            .unwrap_or_else(|e| panic!("move {} failed: {}", mv, e));
        board.consistency_check();
    }
}

fn as_move(board: &Board, vertex: &str) -> Move {
    let color = board.to_move();
    if vertex.eq_ignore_ascii_case("pass") {
        Move::Pass(color)
    } else {
        let (x, y) = parse_vertex(vertex).expect("bad vertex in test");
        Move::Place(color, x, y)
    }
}

fn board_after(size: u8, moves: &[&str]) -> Board {
    let mut board = Board::new(size, size);
    play_all(&mut board, moves);
    board
}

// =============================================================================
// Captures, ko, passes
// =============================================================================

#[test]
fn simple_capture_scenario() {
    // black A1, white B1, black passes, white A2 takes the corner stone
    let board = board_after(5, &["A1", "B1", "pass", "A2"]);

    assert_eq!(board.tile_at(0, 0), Color::Empty);
    assert_eq!(board.captures(), (0, 1));
    assert_eq!(board.ko(), Some((0, 0)));
    // two white-only empty regions (the corner point and the rest) plus one
    // stone captured by white
    assert_eq!(board.score(), -24);
}

#[test]
fn ko_recapture_is_delayed() {
    // the textbook ko: black jaw around C3, white jaw around C4, white
    // stone on C3; black takes it by playing C4
    let mut board = board_after(
        5,
        &["C2", "B4", "B3", "C5", "D3", "D4", "pass", "C3", "C4"],
    );
    assert_eq!(board.tile_at(2, 2), Color::Empty);
    assert_eq!(board.captures(), (1, 0));
    assert_eq!(board.ko(), Some((2, 2)));

    // immediate recapture is rejected
    assert_eq!(
        board.play(Move::Place(Color::White, 2, 2)),
        Err(IllegalMove::Ko)
    );

    // after an exchange elsewhere the recapture is legal and flips the ko
    play_all(&mut board, &["E1", "A1"]);
    assert_eq!(board.play(Move::Place(Color::White, 2, 2)), Ok(()));
    board.consistency_check();
    assert_eq!(board.tile_at(2, 3), Color::Empty);
    assert_eq!(board.captures(), (1, 1));
    assert_eq!(board.ko(), Some((2, 3)));
}

#[test]
fn capture_overrides_suicide() {
    // white A1-B1-A2 in the 3x3 corner with black wrapped around; black A3
    // would be suicide on its own but takes all three stones
    let mut board = board_after(3, &["B2", "A1", "C1", "B1", "C2", "A2"]);
    assert_eq!(board.play(as_move(&board, "A3")), Ok(()));
    board.consistency_check();

    assert_eq!(board.tile_at(0, 0), Color::Empty);
    assert_eq!(board.tile_at(1, 0), Color::Empty);
    assert_eq!(board.tile_at(0, 1), Color::Empty);
    assert_eq!(board.captures(), (3, 0));
    // three stones captured at once is not a ko
    assert_eq!(board.ko(), None);
}

#[test]
fn two_passes_end_the_game() {
    let mut board = board_after(5, &["A1", "pass", "pass"]);
    assert!(board.game_over());
    // a lone black stone owns the whole board
    assert_eq!(board.score(), 24);
    assert!(board.score() > 0);

    for mv in [Move::Place(Color::White, 2, 2), Move::Pass(Color::White)] {
        assert_eq!(board.play(mv), Err(IllegalMove::GameOver));
    }
}

#[test]
fn one_move_can_take_two_strings() {
    // two separate white stones share their last liberty at B2
    let board = board_after(
        5,
        &[
            "A1", "B1", "C1", "B3", "A3", "pass", "C3", "pass", "B4", "pass", "B2",
        ],
    );
    assert_eq!(board.tile_at(1, 0), Color::Empty);
    assert_eq!(board.tile_at(1, 2), Color::Empty);
    assert_eq!(board.captures(), (2, 0));
    // more than a single stone fell, so there is no ko
    assert_eq!(board.ko(), None);
}

#[test]
fn rectangular_boards_work() {
    let mut board = Board::new(7, 3);
    play_all(&mut board, &["A1", "G3", "B2"]);
    assert_eq!(board.tile_at(6, 2), Color::White);
    assert_eq!(
        board.play(Move::Place(Color::White, 0, 3)),
        Err(IllegalMove::OutOfBounds)
    );
    assert_eq!(board.legal_moves().len(), 7 * 3 - 3 + 1);
}

// =============================================================================
// Facade behavior
// =============================================================================

#[test]
fn enumeration_stops_when_the_visitor_says_so() {
    let mut game = GameWithHistory::from_board(Board::new(5, 5));
    let mut visited = 0;
    game.for_each_legal_move(&mut |_, _| {
        visited += 1;
        visited < 3
    });
    assert_eq!(visited, 3);
}

#[test]
fn undo_restores_the_exact_position() {
    let zh = ZobristHash::new(5);
    let mut game = GameWithHistory::from_board(Board::new(5, 5));
    for mv in ["B1", "A1"] {
        let m = as_move(game.board(), mv);
        game.play(m).unwrap();
    }
    let before = zh.hash(game.board());

    // a capture and its undo, through the history timeline
    game.play(as_move(game.board(), "A2")).unwrap();
    assert_eq!(game.board().captures(), (1, 0));
    game.undo();
    game.consistency_check();
    assert_eq!(zh.hash(game.board()), before);
    assert_eq!(game.board().captures(), (0, 0));
    assert_eq!(game.board().tile_at(0, 0), Color::White);
}

// =============================================================================
// Searcher
// =============================================================================

#[test]
fn depth_zero_search_returns_a_legal_move() {
    let board = Board::new(5, 5);
    let mut search = AlphaBeta::new(Some(0));
    let mv = search.next_move(&board).expect("a move");
    assert!(board.legal_moves().contains(&mv));
    assert_eq!(search.explored, 1);
}

#[test]
fn search_is_deterministic_across_runs() {
    let board = board_after(5, &["C3", "C2", "D2", "B3"]);
    let mut runs = Vec::new();
    for _ in 0..3 {
        let mut search = AlphaBeta::new(Some(2));
        runs.push((search.next_move(&board), search.explored));
    }
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
}

#[test]
fn search_through_history_keeps_game_intact() {
    let mut game = GameWithHistory::from_board(Board::new(5, 5));
    game.play(as_move(game.board(), "C3")).unwrap();

    let mut search = AlphaBeta::new(Some(2));
    let mv = search.next_move(&game).expect("a move");
    assert_eq!(game.turn(), 1);
    game.consistency_check();
    game.play(mv).unwrap();
    assert_eq!(game.turn(), 2);
}

#[test]
fn short_self_play_stays_consistent() {
    let mut game = GameWithHistory::from_board(Board::new(3, 3));
    let mut search = AlphaBeta::new(Some(2));
    for _ in 0..12 {
        let Some(mv) = search.next_move(&game) else {
            break;
        };
        game.play(mv).expect("engine move must be legal");
        game.consistency_check();
    }
}

// =============================================================================
// Clone law
// =============================================================================

#[test]
fn clone_and_play_agree_with_original() {
    let zh = ZobristHash::new(5);
    let board = board_after(5, &["C3", "C2", "D2"]);

    for mv in [
        as_move(&board, "D3"),               // legal
        Move::Place(Color::White, 2, 2),     // occupied
        Move::Place(Color::Black, 1, 1),     // off turn
    ] {
        let mut original = board.clone();
        let mut copy = board.clone();
        let a = original.play(mv);
        let b = copy.play(mv);
        assert_eq!(a, b);
        original.consistency_check();
        copy.consistency_check();
        assert_eq!(original.score(), copy.score());
        assert_eq!(zh.hash(&original), zh.hash(&copy));
    }
}

// =============================================================================
// Hash symmetry
// =============================================================================

/// The eight dihedral images of a coordinate on a square board.
fn dihedral_images(size: u8, x: u8, y: u8) -> Vec<(u8, u8)> {
    let mut images = Vec::new();
    for mirror in [false, true] {
        let (mut cx, mut cy) = if mirror { (size - 1 - x, y) } else { (x, y) };
        for _ in 0..4 {
            images.push((cx, cy));
            let (nx, ny) = (size - 1 - cy, cx);
            (cx, cy) = (nx, ny);
        }
    }
    images
}

#[test]
fn tengen_hash_matches_in_all_sixteen_variants() {
    let zh = ZobristHash::new(5);

    // the eight dihedral images of tengen are tengen itself
    for (x, y) in dihedral_images(5, 2, 2) {
        assert_eq!((x, y), (2, 2));
    }
    let mut black = Board::new(5, 5);
    black.play(Move::Place(Color::Black, 2, 2)).unwrap();
    let reference = zh.hash(&black);

    // the color-swapped position is reached through a leading pass
    let mut white = Board::new(5, 5);
    white.play(Move::Pass(Color::Black)).unwrap();
    white.play(Move::Place(Color::White, 2, 2)).unwrap();
    assert_eq!(zh.hash(&white), reference);
}

#[test]
fn hash_is_invariant_under_all_sixteen_symmetries() {
    let zh = ZobristHash::new(5);
    let moves = [(2u8, 0u8), (3, 1), (1, 3), (0, 2)];

    let reference = {
        let mut board = Board::new(5, 5);
        for &(x, y) in &moves {
            board.play(Move::Place(board.to_move(), x, y)).unwrap();
        }
        zh.hash(&board)
    };

    for mirror in [false, true] {
        for quarter_turns in 0..4 {
            for swap in [false, true] {
                let mut board = Board::new(5, 5);
                if swap {
                    board.play(Move::Pass(Color::Black)).unwrap();
                }
                for &(x, y) in &moves {
                    let (mut cx, mut cy) = if mirror { (4 - x, y) } else { (x, y) };
                    for _ in 0..quarter_turns {
                        let (nx, ny) = (4 - cy, cx);
                        (cx, cy) = (nx, ny);
                    }
                    board.play(Move::Place(board.to_move(), cx, cy)).unwrap();
                }
                assert_eq!(
                    zh.hash(&board),
                    reference,
                    "mirror={} turns={} swap={}",
                    mirror,
                    quarter_turns,
                    swap
                );
            }
        }
    }
}

#[test]
fn hash_tracks_the_ko_point() {
    let zh = ZobristHash::new(5);
    // identical stone arrangements, one reached through a capture that
    // leaves a ko behind
    let with_ko = board_after(5, &["A1", "B1", "pass", "A2"]);
    assert!(with_ko.ko().is_some());

    // the same stones, placed without a capture: white B1 and A2 around an
    // empty corner
    let without_ko = board_after(5, &["pass", "B1", "pass", "A2"]);
    assert!(without_ko.ko().is_none());
    assert_eq!(without_ko.tile_at(1, 0), Color::White);
    assert_eq!(without_ko.tile_at(0, 1), Color::White);

    assert_ne!(zh.hash(&with_ko), zh.hash(&without_ko));
}

// =============================================================================
// SGF round trip
// =============================================================================

#[test]
fn recorded_game_roundtrips_through_sgf() {
    let inner = GameWithHistory::from_board(Board::new(5, 5));
    let mut game = RecordedGame::new(Box::new(inner));
    for mv in ["C3", "C2", "D2", "pass", "B2"] {
        let m = as_move(game.board(), mv);
        game.play(m).unwrap();
    }

    let mut out = Vec::new();
    sgf::write_record(&mut out, game.record(), 5, "tengen", "tengen").unwrap();
    let text = String::from_utf8(out).unwrap();

    let record = sgf::parse(&text, 5, 5).unwrap();
    assert_eq!(record.moves, game.record());

    // replaying the parsed record reproduces the exact position
    let mut replayed = Board::new(5, 5);
    for mv in record.moves {
        replayed.play(mv).unwrap();
    }
    replayed.consistency_check();
    let zh = ZobristHash::new(5);
    assert_eq!(zh.hash(&replayed), zh.hash(game.board()));
    assert_eq!(replayed.score(), game.score());
}
