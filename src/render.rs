//! Plain-text board diagram for terminal play.

use crate::types::Color;
use shakmaty::fen::Fen;
use shakmaty::{File, Rank, Square};

/// Draws the position of `fen` as an 8x8 diagram with `bottom` nearest the
/// viewer. Returns `None` if `fen` does not parse.
pub fn render_board(fen: &str, bottom: Color) -> Option<String> {
    let fen: Fen = fen.trim().parse().ok()?;
    let board = &fen.as_setup().board;

    let (ranks, files): (Vec<Rank>, Vec<File>) = match bottom {
        Color::White => (Rank::ALL.into_iter().rev().collect(), File::ALL.to_vec()),
        Color::Black => (Rank::ALL.to_vec(), File::ALL.into_iter().rev().collect()),
    };

    let mut out = String::new();
    for &rank in &ranks {
        out.push(rank.char());
        for &file in &files {
            out.push(' ');
            let square = Square::from_coords(file, rank);
            out.push(board.piece_at(square).map_or('.', |piece| piece.char()));
        }
        out.push('\n');
    }
    out.push(' ');
    for file in files {
        out.push(' ');
        out.push(file.char());
    }
    out.push('\n');
    Some(out)
}
