//! Minimal PGN reader and writer.
//!
//! The reader only tokenizes: it strips tag pairs, comments, variations,
//! annotations, move numbers and result markers, and leaves legality to the
//! rules engine.

use crate::types::Color;
use tracing::{debug, instrument};

/// Tag pairs and mainline move tokens of a PGN game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgnGame {
    /// Tag pairs in file order.
    pub tags: Vec<(String, String)>,
    /// Mainline move tokens, annotations removed.
    pub moves: Vec<String>,
}

impl PgnGame {
    /// Looks up a tag value by name (case-sensitive, as PGN tags are).
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Splits PGN text into tag pairs and mainline move tokens.
#[instrument(skip(input), fields(len = input.len()))]
pub fn parse_pgn(input: &str) -> PgnGame {
    let mut game = PgnGame::default();
    let mut chars = input.chars().peekable();
    let mut token = String::new();

    while let Some(c) = chars.next() {
        match c {
            '[' => {
                flush(&mut token, &mut game.moves);
                let mut raw = String::new();
                let mut in_quotes = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' if in_quotes => {
                            if let Some(escaped) = chars.next() {
                                raw.push(escaped);
                            }
                        }
                        '"' => {
                            in_quotes = !in_quotes;
                            raw.push(c);
                        }
                        ']' if !in_quotes => break,
                        _ => raw.push(c),
                    }
                }
                if let Some(tag) = parse_tag(&raw) {
                    game.tags.push(tag);
                }
            }
            '{' => {
                flush(&mut token, &mut game.moves);
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                }
            }
            ';' => {
                flush(&mut token, &mut game.moves);
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' => {
                flush(&mut token, &mut game.moves);
                let mut depth = 1usize;
                for c in chars.by_ref() {
                    match c {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            '$' => {
                flush(&mut token, &mut game.moves);
                while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    chars.next();
                }
            }
            c if c.is_whitespace() => flush(&mut token, &mut game.moves),
            c => token.push(c),
        }
    }
    flush(&mut token, &mut game.moves);

    debug!(tags = game.tags.len(), moves = game.moves.len(), "Parsed PGN");
    game
}

fn parse_tag(raw: &str) -> Option<(String, String)> {
    let raw = raw.trim();
    let (name, rest) = raw.split_once(char::is_whitespace)?;
    let value = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((name.to_string(), value.to_string()))
}

fn flush(token: &mut String, moves: &mut Vec<String>) {
    if token.is_empty() {
        return;
    }
    if let Some(mv) = clean_token(token) {
        moves.push(mv);
    }
    token.clear();
}

/// Strips move numbers and annotation glyphs; drops result markers.
fn clean_token(raw: &str) -> Option<String> {
    if matches!(raw, "1-0" | "0-1" | "1/2-1/2" | "*") {
        return None;
    }
    // "12." / "12..." / "12.e4"
    let digits = raw.chars().take_while(|c| c.is_ascii_digit()).count();
    let rest = if digits > 0 && raw[digits..].starts_with('.') {
        raw[digits..].trim_start_matches('.')
    } else {
        raw
    };
    let rest = rest.trim_end_matches(['!', '?']);
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Renders tag pairs and SAN moves as PGN text.
///
/// `start` is the fullmove number and side to move of the first ply, so games
/// set up from a FEN number their moves correctly.
pub fn write_pgn(
    tags: &[(String, String)],
    start: (u32, Color),
    sans: &[String],
    result: &str,
) -> String {
    let mut out = String::new();
    for (name, value) in tags {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        out.push_str(&format!("[{} \"{}\"]\n", name, escaped));
    }
    if !tags.is_empty() {
        out.push('\n');
    }

    let (mut number, mut turn) = start;
    let mut words = Vec::with_capacity(sans.len() * 3 / 2 + 1);
    for (index, san) in sans.iter().enumerate() {
        match turn {
            Color::White => words.push(format!("{}.", number)),
            Color::Black if index == 0 => words.push(format!("{}...", number)),
            Color::Black => {}
        }
        words.push(san.clone());
        if turn == Color::Black {
            number += 1;
        }
        turn = turn.other();
    }
    words.push(result.to_string());

    let mut line_len = 0;
    for word in words {
        if line_len > 0 && line_len + 1 + word.len() > 79 {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        line_len += word.len();
        out.push_str(&word);
    }
    out.push('\n');
    out
}
