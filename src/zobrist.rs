//! Symmetry-invariant Zobrist hashing.
//!
//! A 64-bit Zobrist hash over board positions that is invariant under the
//! 16-element group generated by
//!
//! - `r`: rotation by 90 degrees (`x -> size - y - 1`, `y -> x`),
//! - `m`: mirroring across the vertical axis (`x -> size - x - 1`),
//! - `x`: exchanging the colors (empty stays, black <-> white).
//!
//! Writing a hash as eight bytes `z1..z8` (least significant first), the
//! per-cell table entries are constructed so that
//!
//! ```text
//! Z(r board) = z2 z3 z4 z1  z6 z7 z8 z5    (rotate each 4-byte half)
//! Z(m board) = z4 z3 z2 z1  z8 z7 z6 z5    (reverse each 4-byte half)
//! Z(x board) = z5 z6 z7 z8  z1 z2 z3 z4    (swap the halves)
//! ```
//!
//! Cells on a symmetry axis need restricted entries so the byte
//! permutations fix them:
//!
//! ```text
//! tengen:           z1 z1 z1 z1  z2 z2 z2 z2
//! vertical axis:    z1 z2 z2 z1  z3 z4 z4 z3
//! horizontal axis:  z1 z1 z2 z2  z3 z3 z4 z4
//! diagonal x = y:   z1 z2 z3 z2  z4 z5 z6 z5
//! anti-diagonal:    z1 z2 z1 z3  z4 z5 z4 z6
//! ```
//!
//! One random value is drawn per orbit and the paired coordinate/byte
//! permutations write it into every cell of the orbit; a final aggregation
//! over all 16 group images collapses the raw hash into a canonical value.
//! The construction only works on square boards.

use crate::board::{Board, Color, MAX_BOARD};

/// A position hash value.
pub type ZobHash = u64;

const NUM_STATES: usize = 4;
const STATE_EMPTY: usize = 0;
const STATE_BLACK: usize = 1;
const STATE_WHITE: usize = 2;
const STATE_KO: usize = 3;

/// Odd multiplier for the symmetrizing aggregation.
const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c13;

/// Fixed table seed: a given board size always hashes identically.
const TABLE_SEED: u64 = 0x5eed_1dea_0dd5_ba11;

/// Rotate a hash by 90 degrees: each 4-byte half rotates down a byte.
#[inline]
fn rot(h: ZobHash) -> ZobHash {
    ((h >> 8) & 0x00ff_ffff_00ff_ffff) | ((h << 24) & 0xff00_0000_ff00_0000)
}

/// Mirror a hash: reverse the bytes of each 4-byte half.
#[inline]
fn mir(mut h: ZobHash) -> ZobHash {
    h = ((h << 8) & 0xff00_ff00_ff00_ff00) | ((h >> 8) & 0x00ff_00ff_00ff_00ff);
    ((h << 16) & 0xffff_0000_ffff_0000) | ((h >> 16) & 0x0000_ffff_0000_ffff)
}

/// Exchange the colors of a hash: swap the 4-byte halves.
#[inline]
fn swap_colors(h: ZobHash) -> ZobHash {
    h.rotate_left(32)
}

/// Restrict a random value to the byte pattern its cell's symmetry axes
/// demand. Off-axis cells pass through unchanged.
fn constrain(v: u64, x: u8, y: u8, size: u8) -> u64 {
    let odd = size % 2 == 1;
    let mid = (size - 1) / 2;
    let on_vertical = odd && x == mid;
    let on_horizontal = odd && y == mid;

    if on_vertical && on_horizontal {
        // tengen: repeat the first byte of each half across the whole half
        let v = v & 0x0000_00ff_0000_00ff;
        let v = v | (v << 16);
        v | (v << 8)
    } else if on_vertical {
        // each half palindromic
        (v & 0x00ff_00ff_00ff_00ff)
            | ((v << 24) & 0xff00_0000_ff00_0000)
            | ((v >> 8) & 0x0000_ff00_0000_ff00)
    } else if on_horizontal {
        // adjacent byte pairs match
        let v = v & 0x00ff_00ff_00ff_00ff;
        v | (v << 8)
    } else if x == y {
        // odd-indexed bytes of each half match
        (v & 0x00ff_ffff_00ff_ffff) | ((v << 16) & 0xff00_0000_ff00_0000)
    } else if x as usize + y as usize == size as usize - 1 {
        // even-indexed bytes of each half match
        (v & 0xff00_ffff_ff00_ffff) | ((v << 16) & 0x00ff_0000_00ff_0000)
    } else {
        v
    }
}

/// Collapse a raw hash into a value shared by all 16 group images.
///
/// Visits every image once (four rotations, mirrored and color-swapped)
/// and folds each into a running product with an odd multiplier; the final
/// shift trades the always-set pattern of the low bit for entropy.
pub fn symmetrize(mut h: ZobHash) -> ZobHash {
    let mut res: u64 = 1;
    for _ in 0..2 {
        for _ in 0..2 {
            for _ in 0..4 {
                h = rot(h);
                res = res.wrapping_mul(GOLDEN.wrapping_add(h << 1));
            }
            h = mir(h);
        }
        h = swap_colors(h);
    }
    res >> 1
}

/// The per-size hash function: a randomized table plus four turn tags.
pub struct ZobristHash {
    size: u8,
    /// `size * size * NUM_STATES` entries, indexed by cell and tile state.
    table: Vec<ZobHash>,
    /// Black / white to move, then the same pair with a pass pending.
    turn_tags: [ZobHash; 4],
}

impl ZobristHash {
    /// Build the hash function for square boards of the given size.
    pub fn new(size: u8) -> ZobristHash {
        assert!(
            (1..=MAX_BOARD).contains(&size),
            "board size {} out of range",
            size
        );
        let mut rng = fastrand::Rng::with_seed(TABLE_SEED);
        let table = Self::build_table(size, &mut rng);
        let turn_tags = Self::build_turn_tags(&mut rng);
        ZobristHash {
            size,
            table,
            turn_tags,
        }
    }

    #[inline]
    fn index(size: u8, x: u8, y: u8, state: usize) -> usize {
        NUM_STATES * (x as usize + size as usize * y as usize) + state
    }

    fn build_table(size: u8, rng: &mut fastrand::Rng) -> Vec<ZobHash> {
        let n = size as usize * size as usize * NUM_STATES;
        let mut table = vec![0u64; n];
        let mut filled = vec![false; n];

        // white is derived from black afterwards; empty and ko must be
        // color-swap invariant on their own
        for state in [STATE_EMPTY, STATE_BLACK, STATE_KO] {
            for y in 0..size {
                for x in 0..size {
                    if filled[Self::index(size, x, y, state)] {
                        continue;
                    }
                    let mut v = constrain(rng.u64(..), x, y, size);
                    if state != STATE_BLACK {
                        let lo = v & 0xffff_ffff;
                        v = lo | (lo << 32);
                    }

                    // walk the dihedral orbit, pairing each coordinate map
                    // with its byte permutation
                    let mut hh = v;
                    let (mut cx, mut cy) = (x, y);
                    for _ in 0..2 {
                        for _ in 0..4 {
                            let i = Self::index(size, cx, cy, state);
                            if filled[i] {
                                debug_assert_eq!(table[i], hh, "orbit fill mismatch");
                            } else {
                                table[i] = hh;
                                filled[i] = true;
                            }
                            let (nx, ny) = (size - 1 - cy, cx);
                            (cx, cy) = (nx, ny);
                            hh = rot(hh);
                        }
                        cx = size - 1 - cx;
                        hh = mir(hh);
                    }
                }
            }
        }

        for y in 0..size {
            for x in 0..size {
                table[Self::index(size, x, y, STATE_WHITE)] =
                    swap_colors(table[Self::index(size, x, y, STATE_BLACK)]);
            }
        }
        table
    }

    fn build_turn_tags(rng: &mut fastrand::Rng) -> [ZobHash; 4] {
        let mut tags = [0u64; 4];
        for (black_tag, white_tag) in [(0usize, 1usize), (2, 3)] {
            // tags must survive rotation and mirroring unchanged, so each
            // half is a single repeated byte; the color swap exchanges the
            // paired tags
            let v = rng.u64(..) & 0x0000_00ff_0000_00ff;
            let v = v | (v << 16);
            let v = v | (v << 8);
            tags[black_tag] = v;
            tags[white_tag] = swap_colors(v);
        }
        tags
    }

    /// The board size this function hashes.
    #[inline]
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Hash a position, invariant under the full symmetry group.
    pub fn hash(&self, board: &Board) -> ZobHash {
        assert!(
            board.width() == self.size && board.height() == self.size,
            "hash built for {0}x{0} boards, got {1}x{2}",
            self.size,
            board.width(),
            board.height()
        );
        let ko = board.ko();
        let mut h = 0u64;
        for y in 0..self.size {
            for x in 0..self.size {
                let state = match board.tile_at(x, y) {
                    Color::Black => STATE_BLACK,
                    Color::White => STATE_WHITE,
                    _ if ko == Some((x, y)) => STATE_KO,
                    _ => STATE_EMPTY,
                };
                h ^= self.table[Self::index(self.size, x, y, state)];
            }
        }
        let turn_idx =
            (!board.max_player()) as usize + ((board.one_pass_pending() as usize) << 1);
        h ^= self.turn_tags[turn_idx];
        symmetrize(h)
    }
}
