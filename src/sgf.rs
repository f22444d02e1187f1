//! SGF import and export.
//!
//! The record/replay boundary of the engine. Only the handful of properties
//! the engine cares about are interpreted:
//!
//! - `B[xy]` / `W[xy]` - a move; both coordinates are single lowercase
//!   letters counted from the top-left corner
//! - `B[]` / `W[]` - a pass
//! - `PB[name]` / `PW[name]` - player names
//!
//! Every other tag is ignored. The engine itself numbers rows from the
//! bottom edge, so coordinates are flipped vertically on the way in and out.

use std::io::{self, Write};

use regex::Regex;

use crate::board::{Color, Move};

/// `TAG[value]` property, with the value possibly empty.
const PROP_PATTERN: &str = r"([A-Za-z]+)\[([^\]]*)\]";

/// A parsed game record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SgfRecord {
    pub moves: Vec<Move>,
    pub black_player: Option<String>,
    pub white_player: Option<String>,
}

/// Why an SGF file was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SgfError {
    /// A move tag held an unparseable or out-of-range coordinate.
    BadCoordinate(String),
}

impl std::fmt::Display for SgfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SgfError::BadCoordinate(value) => write!(f, "bad SGF coordinate \"{}\"", value),
        }
    }
}

impl std::error::Error for SgfError {}

fn parse_coordinate(value: &str, width: u8, height: u8) -> Result<(u8, u8), SgfError> {
    let bad = || SgfError::BadCoordinate(value.to_string());
    let bytes = value.as_bytes();
    if bytes.len() != 2 {
        return Err(bad());
    }
    let (cx, cy) = (bytes[0], bytes[1]);
    if !(cx.is_ascii_lowercase() && cy.is_ascii_lowercase()) {
        return Err(bad());
    }
    let x = cx - b'a';
    let sgf_y = cy - b'a';
    if x >= width || sgf_y >= height {
        return Err(bad());
    }
    Ok((x, height - 1 - sgf_y))
}

/// Extract the moves and player names from SGF text.
///
/// The board dimensions are needed to validate coordinates and flip them
/// into bottom-up rows.
pub fn parse(text: &str, width: u8, height: u8) -> Result<SgfRecord, SgfError> {
    let props = Regex::new(PROP_PATTERN).expect("property pattern is valid");
    let mut record = SgfRecord::default();

    for cap in props.captures_iter(text) {
        let tag = &cap[1];
        let value = &cap[2];
        match tag {
            "B" | "W" => {
                let color = if tag == "B" { Color::Black } else { Color::White };
                let mv = if value.is_empty() {
                    Move::Pass(color)
                } else {
                    let (x, y) = parse_coordinate(value, width, height)?;
                    Move::Place(color, x, y)
                };
                record.moves.push(mv);
            }
            "PB" => record.black_player = Some(value.to_string()),
            "PW" => record.white_player = Some(value.to_string()),
            _ => {}
        }
    }
    Ok(record)
}

/// Emit a recorded game as SGF: a small header followed by one node per
/// move.
pub fn write_record(
    out: &mut dyn Write,
    moves: &[Move],
    height: u8,
    black_name: &str,
    white_name: &str,
) -> io::Result<()> {
    let now = time::now();
    writeln!(out, "(;")?;
    writeln!(out, "EV[tengen game]")?;
    writeln!(out, "PB[{}]", black_name)?;
    writeln!(out, "PW[{}]", white_name)?;
    writeln!(
        out,
        "DT[{:02}/{:02}/{} {:02}:{:02}:{:02}]",
        now.tm_mon + 1,
        now.tm_mday,
        now.tm_year + 1900,
        now.tm_hour,
        now.tm_min,
        now.tm_sec
    )?;
    writeln!(out)?;

    for mv in moves {
        match *mv {
            Move::Place(color, x, y) => {
                let letter = if color == Color::Black { 'B' } else { 'W' };
                write!(
                    out,
                    ";{}[{}{}]",
                    letter,
                    (b'a' + x) as char,
                    (b'a' + (height - 1 - y)) as char
                )?;
            }
            Move::Pass(color) => {
                let letter = if color == Color::Black { 'B' } else { 'W' };
                write!(out, ";{}[]", letter)?;
            }
        }
    }
    writeln!(out, ")")?;
    out.flush()
}
