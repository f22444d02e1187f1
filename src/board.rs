//! Go board representation and move execution.
//!
//! This module provides the core game state for Go, including:
//! - Board state as a 1D tile array with a gray sentinel border
//! - Incremental tracking of strings (maximal chains of same-color stones)
//!   through intrusive circular lists threaded through the tile array
//! - Exact sorted liberty lists for small strings, liberty counts for the rest
//! - Capture resolution, suicide and simple-ko legality, and scoring
//!
//! The border ring means neighbor probes never need a bounds test: every
//! interior cell has four valid neighbor indices, and the border color is a
//! value no playable tile can hold.

use std::fmt;

/// A cell index into the padded 1D tile array.
pub type BoardIdx = u16;

/// Maximum playable width/height.
pub const MAX_BOARD: u8 = 25;

/// Strings with at most this many liberties keep an exact sorted list of
/// them; above it only the count is maintained.
const TRACKED_LIBERTIES: usize = 8;

/// End-of-list marker for the scratch chains threaded through empty tiles.
const LIST_END: BoardIdx = BoardIdx::MAX;

/// "No string" marker for the pool free list and neighbor scans.
const NO_STRING: u16 = u16::MAX;

/// Column labels, skipping 'I' per Go convention.
const COL_LABELS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

// =============================================================================
// Colors and moves
// =============================================================================

/// Contents of a single tile.
///
/// `Gray` is the sentinel color of the border ring; it never appears on a
/// playable tile between moves (the liberty recomputation walk borrows it as
/// a transient mark on empty tiles).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Color {
    Empty,
    Black,
    White,
    Gray,
}

impl Color {
    /// Get the opposing stone color. Non-stone colors are returned unchanged.
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
            other => other,
        }
    }

    /// True for `Black` and `White`.
    #[inline]
    pub fn is_stone(self) -> bool {
        matches!(self, Color::Black | Color::White)
    }

    /// Lowercase name for messages and logs.
    pub fn name(self) -> &'static str {
        match self {
            Color::Empty => "empty",
            Color::Black => "black",
            Color::White => "white",
            Color::Gray => "gray",
        }
    }
}

/// A move submitted to the engine.
///
/// Coordinates are 0-based, `x` from the left edge and `y` from the bottom
/// edge of the playable area.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Move {
    /// Stone placement at `(x, y)`.
    Place(Color, u8, u8),
    /// Pass for the given color.
    Pass(Color),
}

impl Move {
    /// The color making the move.
    #[inline]
    pub fn color(&self) -> Color {
        match *self {
            Move::Place(c, _, _) => c,
            Move::Pass(c) => c,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Move::Place(c, x, y) => write!(f, "{} {}", c.name(), vertex_string(x, y)),
            Move::Pass(c) => write!(f, "{} pass", c.name()),
        }
    }
}

/// Why a move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMove {
    /// Point is not empty
    Occupied,
    /// Move would leave its own string without liberties
    Suicide,
    /// Move retakes the ko
    Ko,
    /// Color does not match the side to move
    OffTurn,
    /// Coordinates outside the playable area
    OutOfBounds,
    /// Two consecutive passes already ended the game
    GameOver,
}

impl fmt::Display for IllegalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            IllegalMove::Occupied => "point is occupied",
            IllegalMove::Suicide => "move is suicide",
            IllegalMove::Ko => "retakes the ko",
            IllegalMove::OffTurn => "wrong color for this turn",
            IllegalMove::OutOfBounds => "point is off the board",
            IllegalMove::GameOver => "the game is already over",
        };
        write!(f, "illegal move: {}", msg)
    }
}

impl std::error::Error for IllegalMove {}

// =============================================================================
// Coordinate helpers
// =============================================================================

/// Parse a vertex string such as `"D4"` into 0-based `(x, y)` coordinates.
///
/// Columns are lettered A-H then J-Z (no 'I'), rows are numbered from 1 at
/// the bottom edge. Returns `None` for anything unparseable; bounds against
/// a concrete board are the caller's concern.
pub fn parse_vertex(s: &str) -> Option<(u8, u8)> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let c = bytes[0].to_ascii_uppercase();
    if c == b'I' {
        return None;
    }
    let col = COL_LABELS.iter().position(|&l| l == c)?;
    let row: u32 = s[1..].parse().ok()?;
    if row == 0 || row > MAX_BOARD as u32 {
        return None;
    }
    Some((col as u8, (row - 1) as u8))
}

/// Convert 0-based `(x, y)` coordinates to a vertex string such as `"D4"`.
pub fn vertex_string(x: u8, y: u8) -> String {
    format!("{}{}", COL_LABELS[x as usize] as char, y as u32 + 1)
}

// =============================================================================
// Tiles and the string pool
// =============================================================================

/// One cell of the padded board.
#[derive(Copy, Clone, Debug)]
struct Tile {
    color: Color,
    /// Identity of the containing string; meaningful only while a stone
    /// stands on the tile.
    string: u16,
    /// Links of the containing string's circular tile list, sorted ascending
    /// by index. Empty tiles reuse `next` as scratch during the liberty
    /// recomputation walk.
    next: BoardIdx,
    prev: BoardIdx,
}

const EMPTY_TILE: Tile = Tile {
    color: Color::Empty,
    string: NO_STRING,
    next: LIST_END,
    prev: LIST_END,
};

/// A maximal chain of connected same-color stones.
#[derive(Copy, Clone, Debug)]
struct StoneString {
    /// Black or white for live strings; `Empty` marks a free pool slot.
    color: Color,
    /// Number of stones in the string.
    size: u16,
    /// Number of distinct empty tiles adjacent to the string.
    liberties: u16,
    /// Smallest tile index of the string (head of the sorted circular list).
    /// While the slot sits on the free list this field holds the next free
    /// slot instead.
    first_tile: BoardIdx,
    /// The liberties in ascending order while `liberties` fits the tracked
    /// range; undefined contents above it.
    liberty_list: [BoardIdx; TRACKED_LIBERTIES],
}

const FREE_STRING: StoneString = StoneString {
    color: Color::Empty,
    size: 0,
    liberties: 0,
    first_tile: NO_STRING,
    liberty_list: [0; TRACKED_LIBERTIES],
};

/// Merge two ascending liberty lists into `dst`, dropping duplicates.
///
/// Returns the full count of distinct entries even when it exceeds the list
/// capacity; the overflowing tail is simply not stored.
fn merge_liberty_lists(
    dst: &mut [BoardIdx; TRACKED_LIBERTIES],
    a: &[BoardIdx],
    b: &[BoardIdx],
) -> u16 {
    let (mut ai, mut bi, mut n) = (0usize, 0usize, 0usize);
    while ai < a.len() && bi < b.len() {
        let v = a[ai].min(b[bi]);
        if n < TRACKED_LIBERTIES {
            dst[n] = v;
        }
        n += 1;
        if a[ai] == v {
            ai += 1;
        }
        if b[bi] == v {
            bi += 1;
        }
    }
    while ai < a.len() {
        if n < TRACKED_LIBERTIES {
            dst[n] = a[ai];
        }
        n += 1;
        ai += 1;
    }
    while bi < b.len() {
        if n < TRACKED_LIBERTIES {
            dst[n] = b[bi];
        }
        n += 1;
        bi += 1;
    }
    n as u16
}

// =============================================================================
// The board
// =============================================================================

/// What the previous move was, for pass bookkeeping and the last-move marker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LastMove {
    None,
    Play(BoardIdx),
    OnePass,
    TwoPasses,
}

/// A Go board of fixed dimensions.
///
/// All tile and string-pool memory is allocated once at construction; move
/// application mutates in place.
#[derive(Clone)]
pub struct Board {
    w: u8,
    h: u8,
    turn: u16,
    last: LastMove,
    ko: Option<BoardIdx>,
    /// Stones captured by black / by white.
    black_caps: u32,
    white_caps: u32,
    tiles: Vec<Tile>,
    strings: Vec<StoneString>,
    free_head: u16,
}

impl Board {
    /// Create an empty board of the given playable dimensions (1..=25 each).
    pub fn new(w: u8, h: u8) -> Board {
        assert!(
            (1..=MAX_BOARD).contains(&w) && (1..=MAX_BOARD).contains(&h),
            "board dimensions {}x{} out of range",
            w,
            h
        );
        let n_tiles = (w as usize + 2) * (h as usize + 2);
        let mut board = Board {
            w,
            h,
            turn: 0,
            last: LastMove::None,
            ko: None,
            black_caps: 0,
            white_caps: 0,
            tiles: vec![EMPTY_TILE; n_tiles],
            strings: vec![FREE_STRING; w as usize * h as usize],
            free_head: NO_STRING,
        };
        board.clear();
        board
    }

    /// Reset to the initial empty position: gray border, empty interior,
    /// every string slot back on the free list.
    pub fn clear(&mut self) {
        let stride = self.stride() as usize;
        let last_row = self.h as usize + 1;
        for (i, t) in self.tiles.iter_mut().enumerate() {
            let (x, y) = (i % stride, i / stride);
            *t = EMPTY_TILE;
            if x == 0 || x == stride - 1 || y == 0 || y == last_row {
                t.color = Color::Gray;
            }
        }
        let n = self.strings.len();
        for (i, s) in self.strings.iter_mut().enumerate() {
            *s = FREE_STRING;
            s.first_tile = if i + 1 < n { (i + 1) as u16 } else { NO_STRING };
        }
        self.free_head = 0;
        self.turn = 0;
        self.last = LastMove::None;
        self.ko = None;
        self.black_caps = 0;
        self.white_caps = 0;
    }

    /// Width of the playable area.
    #[inline]
    pub fn width(&self) -> u8 {
        self.w
    }

    /// Height of the playable area.
    #[inline]
    pub fn height(&self) -> u8 {
        self.h
    }

    /// Current turn number (0 at the start of the game).
    #[inline]
    pub fn turn(&self) -> u16 {
        self.turn
    }

    /// The color whose turn it is. Black plays on even turns.
    #[inline]
    pub fn to_move(&self) -> Color {
        if self.turn % 2 == 0 { Color::Black } else { Color::White }
    }

    /// True while black (the maximizing player) is to move.
    #[inline]
    pub fn max_player(&self) -> bool {
        self.turn % 2 == 0
    }

    /// True once two consecutive passes have ended the game.
    #[inline]
    pub fn game_over(&self) -> bool {
        self.last == LastMove::TwoPasses
    }

    /// True if the previous move was a single (not yet game-ending) pass.
    #[inline]
    pub fn one_pass_pending(&self) -> bool {
        self.last == LastMove::OnePass
    }

    /// The tile contents at 0-based `(x, y)`.
    pub fn tile_at(&self, x: u8, y: u8) -> Color {
        assert!(x < self.w && y < self.h, "tile ({}, {}) out of bounds", x, y);
        self.tiles[self.index(x, y) as usize].color
    }

    /// Coordinates of the current ko point, if any.
    pub fn ko(&self) -> Option<(u8, u8)> {
        self.ko.map(|idx| self.coords_of(idx))
    }

    /// Stones captured so far `(by black, by white)`.
    #[inline]
    pub fn captures(&self) -> (u32, u32) {
        (self.black_caps, self.white_caps)
    }

    #[inline]
    fn stride(&self) -> BoardIdx {
        self.w as BoardIdx + 2
    }

    #[inline]
    fn index(&self, x: u8, y: u8) -> BoardIdx {
        (y as BoardIdx + 1) * self.stride() + (x as BoardIdx + 1)
    }

    #[inline]
    fn coords_of(&self, idx: BoardIdx) -> (u8, u8) {
        let stride = self.stride();
        ((idx % stride - 1) as u8, (idx / stride - 1) as u8)
    }

    /// The four orthogonal neighbors of `idx`, ascending by index.
    ///
    /// Valid for any interior cell thanks to the border ring.
    #[inline]
    fn neighbors(&self, idx: BoardIdx) -> [BoardIdx; 4] {
        let stride = self.stride();
        [idx - stride, idx - 1, idx + 1, idx + stride]
    }

    // =========================================================================
    // Legality
    // =========================================================================

    /// Check whether placing `color` at `idx` would be suicide.
    ///
    /// A placement is suicidal iff no neighbor is empty, no friendly
    /// neighbor string has a spare liberty, and no enemy neighbor string is
    /// down to its last one (a capture overrides the suicide rule).
    fn move_is_suicide(&self, idx: BoardIdx, color: Color) -> bool {
        for n in self.neighbors(idx) {
            let t = self.tiles[n as usize];
            match t.color {
                Color::Empty => return false,
                Color::Gray => {}
                c => {
                    let libs = self.strings[t.string as usize].liberties;
                    if c == color && libs >= 2 {
                        return false;
                    }
                    if c != color && libs == 1 {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Collect the legal moves for the side to move, row-major from the
    /// bottom-left corner, with a final pass. Empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        if self.game_over() {
            return moves;
        }
        let color = self.to_move();
        for y in 0..self.h {
            for x in 0..self.w {
                let idx = self.index(x, y);
                if self.tiles[idx as usize].color == Color::Empty
                    && self.ko != Some(idx)
                    && !self.move_is_suicide(idx, color)
                {
                    moves.push(Move::Place(color, x, y));
                }
            }
        }
        moves.push(Move::Pass(color));
        moves
    }

    /// Play a move.
    ///
    /// Preconditions are checked before anything is mutated, so a rejected
    /// move leaves the board untouched.
    ///
    /// # Errors
    /// - `IllegalMove::GameOver` - two passes already ended the game
    /// - `IllegalMove::OffTurn` - color does not match the side to move
    /// - `IllegalMove::OutOfBounds` - coordinates outside the playable area
    /// - `IllegalMove::Occupied` - target tile is not empty
    /// - `IllegalMove::Ko` - target is the ko point
    /// - `IllegalMove::Suicide` - placement would leave its string dead
    pub fn play(&mut self, mv: Move) -> Result<(), IllegalMove> {
        if self.game_over() {
            return Err(IllegalMove::GameOver);
        }
        match mv {
            Move::Pass(color) => {
                if color != self.to_move() {
                    return Err(IllegalMove::OffTurn);
                }
                self.ko = None;
                self.last = match self.last {
                    LastMove::OnePass => LastMove::TwoPasses,
                    _ => LastMove::OnePass,
                };
                self.turn += 1;
                Ok(())
            }
            Move::Place(color, x, y) => {
                if !color.is_stone() || color != self.to_move() {
                    return Err(IllegalMove::OffTurn);
                }
                if x >= self.w || y >= self.h {
                    return Err(IllegalMove::OutOfBounds);
                }
                let idx = self.index(x, y);
                if self.tiles[idx as usize].color != Color::Empty {
                    return Err(IllegalMove::Occupied);
                }
                if self.ko == Some(idx) {
                    return Err(IllegalMove::Ko);
                }
                if self.move_is_suicide(idx, color) {
                    return Err(IllegalMove::Suicide);
                }
                self.do_play(idx, color);
                #[cfg(debug_assertions)]
                self.consistency_check();
                Ok(())
            }
        }
    }

    // =========================================================================
    // Move execution
    // =========================================================================

    /// Execute a placement whose preconditions already passed.
    fn do_play(&mut self, idx: BoardIdx, color: Color) {
        if log::log_enabled!(log::Level::Trace) {
            let (x, y) = self.coords_of(idx);
            log::trace!("{} plays {}", color.name(), vertex_string(x, y));
        }

        // distinct friendly and enemy strings around the target
        let mut same = [NO_STRING; 4];
        let mut n_same = 0usize;
        let mut opp = [NO_STRING; 4];
        let mut n_opp = 0usize;
        for n in self.neighbors(idx) {
            let t = self.tiles[n as usize];
            if !t.color.is_stone() {
                continue;
            }
            if t.color == color {
                if !same[..n_same].contains(&t.string) {
                    same[n_same] = t.string;
                    n_same += 1;
                }
            } else if !opp[..n_opp].contains(&t.string) {
                opp[n_opp] = t.string;
                n_opp += 1;
            }
        }

        // place the stone: fresh singleton, append, or merge-then-append
        let rep = match n_same {
            0 => self.place_lone_tile(idx, color),
            1 => {
                self.append_string(idx, color, same[0]);
                same[0]
            }
            _ => {
                let rep = same[0];
                for &s in &same[1..n_same] {
                    self.join_strings(rep, s);
                }
                self.append_string(idx, color, rep);
                rep
            }
        };

        // the target is no longer a liberty of anything around it
        if n_same > 0 {
            self.remove_liberty(rep, idx);
        }
        let mut captured: u16 = 0;
        let mut ko_cell: BoardIdx = 0;
        for &o in &opp[..n_opp] {
            self.remove_liberty(o, idx);
            if self.strings[o as usize].liberties == 0 {
                let sz = self.strings[o as usize].size;
                if sz == 1 {
                    ko_cell = self.strings[o as usize].first_tile;
                }
                captured += sz;
                self.erase_string(o);
            }
        }

        // simple ko: a lone placement that took exactly one single stone
        self.ko = if n_same == 0 && captured == 1 {
            Some(ko_cell)
        } else {
            None
        };

        match color {
            Color::Black => self.black_caps += captured as u32,
            _ => self.white_caps += captured as u32,
        }
        self.turn += 1;
        self.last = LastMove::Play(idx);
    }

    fn alloc_string(&mut self) -> u16 {
        let s = self.free_head;
        assert!(s != NO_STRING, "string pool exhausted");
        self.free_head = self.strings[s as usize].first_tile;
        s
    }

    fn free_string(&mut self, s: u16) {
        let head = self.free_head;
        let rec = &mut self.strings[s as usize];
        rec.color = Color::Empty;
        rec.first_tile = head;
        self.free_head = s;
    }

    /// Place a stone with no friendly neighbors as a fresh singleton string.
    fn place_lone_tile(&mut self, idx: BoardIdx, color: Color) -> u16 {
        let s = self.alloc_string();
        let mut list = [0; TRACKED_LIBERTIES];
        let mut count = 0u16;
        for n in self.neighbors(idx) {
            if self.tiles[n as usize].color == Color::Empty {
                list[count as usize] = n;
                count += 1;
            }
        }
        self.strings[s as usize] = StoneString {
            color,
            size: 1,
            liberties: count,
            first_tile: idx,
            liberty_list: list,
        };
        self.tiles[idx as usize] = Tile {
            color,
            string: s,
            next: idx,
            prev: idx,
        };
        s
    }

    /// Splice the tile at `idx` into string `s`, keeping the circular list
    /// sorted and folding the tile's empty neighbors into the liberty set.
    fn append_string(&mut self, idx: BoardIdx, color: Color, s: u16) {
        let first = self.strings[s as usize].first_tile;
        let (prev, next) = if idx < first {
            self.strings[s as usize].first_tile = idx;
            (self.tiles[first as usize].prev, first)
        } else {
            let mut prev;
            let mut tile = first;
            loop {
                prev = tile;
                tile = self.tiles[tile as usize].next;
                if idx < tile || tile == first {
                    break;
                }
            }
            (prev, tile)
        };
        self.tiles[prev as usize].next = idx;
        self.tiles[next as usize].prev = idx;
        self.tiles[idx as usize].next = next;
        self.tiles[idx as usize].prev = prev;

        let libs = self.strings[s as usize].liberties as usize;
        if libs <= TRACKED_LIBERTIES {
            // exact list: merge in whatever empty neighbors the new tile has
            let old = self.strings[s as usize].liberty_list;
            let mut fresh = [0; 4];
            let mut n_fresh = 0usize;
            for n in self.neighbors(idx) {
                if self.tiles[n as usize].color == Color::Empty {
                    fresh[n_fresh] = n;
                    n_fresh += 1;
                }
            }
            let count = merge_liberty_lists(
                &mut self.strings[s as usize].liberty_list,
                &old[..libs],
                &fresh[..n_fresh],
            );
            self.strings[s as usize].liberties = count;
        } else {
            // count only: an empty neighbor is new unless the string already
            // touches it from another side
            for n in self.neighbors(idx) {
                if self.tiles[n as usize].color != Color::Empty {
                    continue;
                }
                let mut new_lib = true;
                for m in self.neighbors(n) {
                    if m == idx {
                        continue;
                    }
                    let t = self.tiles[m as usize];
                    if t.color == color && t.string == s {
                        new_lib = false;
                        break;
                    }
                }
                if new_lib {
                    self.strings[s as usize].liberties += 1;
                }
            }
        }

        self.tiles[idx as usize].color = color;
        self.tiles[idx as usize].string = s;
        self.strings[s as usize].size += 1;
    }

    /// Absorb string `b` into string `a`: splice the sorted circular lists,
    /// relabel `b`'s tiles, combine the liberty sets, free `b`'s slot.
    fn join_strings(&mut self, a: u16, b: u16) {
        log::trace!("joining string {} into {}", b, a);

        let ha = self.strings[a as usize].first_tile;
        let hb = self.strings[b as usize].first_tile;
        let mut rem_a = self.strings[a as usize].size;
        let mut rem_b = self.strings[b as usize].size;
        let head = ha.min(hb);
        let (mut pa, mut pb) = (ha, hb);
        let mut tail = LIST_END;
        while rem_a > 0 || rem_b > 0 {
            let take_a = rem_b == 0 || (rem_a > 0 && pa < pb);
            let cur = if take_a {
                let c = pa;
                pa = self.tiles[c as usize].next;
                rem_a -= 1;
                c
            } else {
                let c = pb;
                pb = self.tiles[c as usize].next;
                rem_b -= 1;
                self.tiles[c as usize].string = a;
                c
            };
            if tail != LIST_END {
                self.tiles[tail as usize].next = cur;
                self.tiles[cur as usize].prev = tail;
            }
            tail = cur;
        }
        self.tiles[tail as usize].next = head;
        self.tiles[head as usize].prev = tail;

        self.strings[a as usize].first_tile = head;
        let b_size = self.strings[b as usize].size;
        self.strings[a as usize].size += b_size;

        let la = self.strings[a as usize].liberties as usize;
        let lb = self.strings[b as usize].liberties as usize;
        if la <= TRACKED_LIBERTIES && lb <= TRACKED_LIBERTIES {
            let own = self.strings[a as usize].liberty_list;
            let other = self.strings[b as usize].liberty_list;
            let count = merge_liberty_lists(
                &mut self.strings[a as usize].liberty_list,
                &own[..la],
                &other[..lb],
            );
            self.strings[a as usize].liberties = count;
            self.free_string(b);
        } else {
            self.free_string(b);
            self.recompute_liberties(a);
        }
    }

    /// Recount a string's liberties by walking its tiles.
    ///
    /// Counted empties are marked gray and chained through their scratch
    /// `next` fields so nothing is counted twice; a second walk undoes the
    /// marks. Rebuilds the exact list whenever the tally fits.
    fn recompute_liberties(&mut self, s: u16) {
        let first = self.strings[s as usize].first_tile;
        let mut count: u16 = 0;
        let mut chain = LIST_END;
        let mut t = first;
        loop {
            for n in self.neighbors(t) {
                if self.tiles[n as usize].color == Color::Empty {
                    self.tiles[n as usize].color = Color::Gray;
                    self.tiles[n as usize].next = chain;
                    chain = n;
                    count += 1;
                }
            }
            t = self.tiles[t as usize].next;
            if t == first {
                break;
            }
        }

        let mut list = [0; TRACKED_LIBERTIES];
        let mut k = 0usize;
        let mut c = chain;
        while c != LIST_END {
            self.tiles[c as usize].color = Color::Empty;
            if (count as usize) <= TRACKED_LIBERTIES {
                list[k] = c;
                k += 1;
            }
            c = self.tiles[c as usize].next;
        }
        if (count as usize) <= TRACKED_LIBERTIES {
            list[..k].sort_unstable();
            self.strings[s as usize].liberty_list = list;
        }
        self.strings[s as usize].liberties = count;
    }

    /// Drop `cell` from a string's liberty set.
    fn remove_liberty(&mut self, s: u16, cell: BoardIdx) {
        let n = self.strings[s as usize].liberties as usize;
        if n <= TRACKED_LIBERTIES {
            let rec = &mut self.strings[s as usize];
            let mut i = 0;
            while rec.liberty_list[i] != cell {
                i += 1;
            }
            while i + 1 < n {
                rec.liberty_list[i] = rec.liberty_list[i + 1];
                i += 1;
            }
            rec.liberties -= 1;
        } else {
            self.strings[s as usize].liberties -= 1;
            // dropping back into the tracked range revalidates the list
            if self.strings[s as usize].liberties as usize == TRACKED_LIBERTIES {
                self.recompute_liberties(s);
            }
        }
    }

    /// Add `cell` to a string's liberty set. The cell must not already be a
    /// liberty of the string (it held a stone until just now).
    fn add_liberty(&mut self, s: u16, cell: BoardIdx) {
        let rec = &mut self.strings[s as usize];
        let n = rec.liberties as usize;
        if n < TRACKED_LIBERTIES {
            let mut i = n;
            while i > 0 && rec.liberty_list[i - 1] > cell {
                rec.liberty_list[i] = rec.liberty_list[i - 1];
                i -= 1;
            }
            rec.liberty_list[i] = cell;
        }
        rec.liberties += 1;
    }

    /// Remove a captured string from the board: every tile goes back to
    /// empty, and each freed cell becomes a liberty of the surviving strings
    /// around it.
    fn erase_string(&mut self, s: u16) {
        let first = self.strings[s as usize].first_tile;
        let size = self.strings[s as usize].size;
        log::trace!("capturing string {} ({} stones)", s, size);

        // clear the stones first, leaving the links intact so the list can
        // be walked once more
        let mut t = first;
        for _ in 0..size {
            self.tiles[t as usize].color = Color::Empty;
            t = self.tiles[t as usize].next;
        }

        let mut t = first;
        for _ in 0..size {
            let mut seen = [NO_STRING; 4];
            let mut n_seen = 0usize;
            for n in self.neighbors(t) {
                let tile = self.tiles[n as usize];
                if tile.color.is_stone() && !seen[..n_seen].contains(&tile.string) {
                    seen[n_seen] = tile.string;
                    n_seen += 1;
                    self.add_liberty(tile.string, t);
                }
            }
            t = self.tiles[t as usize].next;
        }

        self.free_string(s);
    }

    // =========================================================================
    // Scoring
    // =========================================================================

    /// Score the position; positive favors black.
    ///
    /// Empty regions bordered exclusively by one color count for that color,
    /// mixed or unbordered regions count for nobody, and the capture
    /// differential is added on top. The side to move does not affect the
    /// sign.
    pub fn score(&self) -> i32 {
        let n = self.tiles.len();
        let mut parent: Vec<u16> = (0..n as u16).collect();

        fn find(parent: &mut [u16], mut i: u16) -> u16 {
            while parent[i as usize] != i {
                parent[i as usize] = parent[parent[i as usize] as usize];
                i = parent[i as usize];
            }
            i
        }

        // union 4-adjacent empties; right and up cover every adjacency once
        let stride = self.stride();
        for y in 0..self.h {
            for x in 0..self.w {
                let i = self.index(x, y);
                if self.tiles[i as usize].color != Color::Empty {
                    continue;
                }
                for nb in [i + 1, i + stride] {
                    if self.tiles[nb as usize].color == Color::Empty {
                        let (ra, rb) = (find(&mut parent, i), find(&mut parent, nb));
                        if ra != rb {
                            parent[ra as usize] = rb;
                        }
                    }
                }
            }
        }

        // region sizes and the colors each region touches
        let mut size = vec![0i32; n];
        let mut mask = vec![0u8; n];
        for y in 0..self.h {
            for x in 0..self.w {
                let i = self.index(x, y);
                if self.tiles[i as usize].color != Color::Empty {
                    continue;
                }
                let r = find(&mut parent, i) as usize;
                size[r] += 1;
                for nb in self.neighbors(i) {
                    match self.tiles[nb as usize].color {
                        Color::Black => mask[r] |= 1,
                        Color::White => mask[r] |= 2,
                        _ => {}
                    }
                }
            }
        }

        let mut total = 0i32;
        for i in 0..n {
            if size[i] > 0 {
                match mask[i] {
                    1 => total += size[i],
                    2 => total -= size[i],
                    _ => {}
                }
            }
        }
        total + self.black_caps as i32 - self.white_caps as i32
    }

    // =========================================================================
    // Consistency checking
    // =========================================================================

    /// Verify every structural invariant of the position, panicking on the
    /// first violation. Runs after each placement in debug builds and from
    /// the test suites.
    pub fn consistency_check(&self) {
        use std::collections::{HashMap, HashSet};

        let stride = self.stride() as usize;
        let last_row = self.h as usize + 1;
        for (i, t) in self.tiles.iter().enumerate() {
            let (x, y) = (i % stride, i / stride);
            if x == 0 || x == stride - 1 || y == 0 || y == last_row {
                assert!(
                    t.color == Color::Gray,
                    "border tile {} is {}",
                    i,
                    t.color.name()
                );
            } else {
                assert!(t.color != Color::Gray, "interior tile {} is gray", i);
            }
        }

        let mut free: HashSet<u16> = HashSet::new();
        let mut s = self.free_head;
        while s != NO_STRING {
            assert!(free.insert(s), "free list visits string {} twice", s);
            assert!(
                self.strings[s as usize].color == Color::Empty,
                "free string {} still carries a color",
                s
            );
            s = self.strings[s as usize].first_tile;
        }

        let mut owner: HashMap<BoardIdx, u16> = HashMap::new();
        for id in 0..self.strings.len() as u16 {
            if free.contains(&id) {
                continue;
            }
            let rec = &self.strings[id as usize];
            assert!(
                rec.color.is_stone(),
                "live string {} is {}",
                id,
                rec.color.name()
            );
            assert!(rec.size > 0, "live string {} is empty", id);

            let mut t = rec.first_tile;
            let mut prev = LIST_END;
            let mut libs: HashSet<BoardIdx> = HashSet::new();
            for i in 0..rec.size {
                let tile = self.tiles[t as usize];
                assert!(
                    tile.color == rec.color && tile.string == id,
                    "tile {} does not belong to string {}",
                    t,
                    id
                );
                assert!(owner.insert(t, id).is_none(), "tile {} linked twice", t);
                assert!(i == 0 || prev < t, "string {} tile list not sorted", id);
                assert_eq!(
                    self.tiles[tile.next as usize].prev, t,
                    "broken links at tile {}",
                    t
                );
                for n in self.neighbors(t) {
                    if self.tiles[n as usize].color == Color::Empty {
                        libs.insert(n);
                    }
                }
                prev = t;
                t = tile.next;
            }
            assert_eq!(t, rec.first_tile, "string {} list does not close", id);
            assert_eq!(
                rec.liberties as usize,
                libs.len(),
                "string {} liberty count is stale",
                id
            );
            assert!(rec.liberties > 0, "string {} has no liberties", id);
            if libs.len() <= TRACKED_LIBERTIES {
                let mut sorted: Vec<BoardIdx> = libs.into_iter().collect();
                sorted.sort_unstable();
                assert_eq!(
                    &rec.liberty_list[..sorted.len()],
                    &sorted[..],
                    "string {} liberty list is stale",
                    id
                );
            }
        }

        for y in 0..self.h {
            for x in 0..self.w {
                let i = self.index(x, y);
                let tile = self.tiles[i as usize];
                if !tile.color.is_stone() {
                    continue;
                }
                assert_eq!(
                    owner.get(&i),
                    Some(&tile.string),
                    "stone at {} not linked into its string",
                    vertex_string(x, y)
                );
                for n in self.neighbors(i) {
                    let other = self.tiles[n as usize];
                    if other.color == tile.color {
                        assert_eq!(
                            other.string, tile.string,
                            "adjacent {} stones in different strings at {}",
                            tile.color.name(),
                            vertex_string(x, y)
                        );
                    }
                }
            }
        }

        if let Some(k) = self.ko {
            assert!(
                self.tiles[k as usize].color == Color::Empty,
                "ko point is not empty"
            );
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Move: {:<3}   Black: {} caps   White: {} caps",
            self.turn, self.black_caps, self.white_caps
        )?;
        if let Some((x, y)) = self.ko() {
            write!(f, "   ko: {}", vertex_string(x, y))?;
        }
        writeln!(f)?;

        let last = match self.last {
            LastMove::Play(i) => Some(i),
            _ => None,
        };
        for y in (0..self.h).rev() {
            write!(f, " {:>2} ", y as u32 + 1)?;
            for x in 0..self.w {
                let idx = self.index(x, y);
                let ch = match self.tiles[idx as usize].color {
                    Color::Empty => '.',
                    Color::Black => 'X',
                    Color::White => 'O',
                    Color::Gray => ' ',
                };
                let prev = (x > 0).then(|| self.index(x - 1, y));
                if last == Some(idx) {
                    write!(f, "({ch}")?;
                } else if last.is_some() && last == prev {
                    write!(f, "){ch}")?;
                } else {
                    write!(f, " {ch}")?;
                }
            }
            if last == Some(self.index(self.w - 1, y)) {
                write!(f, ")")?;
            }
            writeln!(f)?;
        }

        write!(f, "    ")?;
        for x in 0..self.w {
            write!(f, " {}", COL_LABELS[x as usize] as char)?;
        }
        writeln!(f)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{")?;
        writeln!(
            f,
            "  {}x{}, turn: {}, ko: {:?}, captures: {:?}",
            self.w,
            self.h,
            self.turn,
            self.ko(),
            self.captures()
        )?;
        write!(f, "{}", self)?;
        write!(f, "}}")
    }
}
