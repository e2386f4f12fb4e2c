//! Core domain types shared by the console components.

use derive_new::new;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Side of the board.
///
/// Parses from `white`/`black` as well as the rules-engine shorthand `w`/`b`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Color {
    /// White moves first.
    #[default]
    #[strum(to_string = "white", serialize = "w")]
    White,
    /// Black.
    #[strum(to_string = "black", serialize = "b")]
    Black,
}

impl Color {
    /// Returns the opposite color.
    pub fn other(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl From<shakmaty::Color> for Color {
    fn from(color: shakmaty::Color) -> Self {
        match color {
            shakmaty::Color::White => Color::White,
            shakmaty::Color::Black => Color::Black,
        }
    }
}

/// Winner of a finished game; `None` means a draw.
pub type WonColor = Option<Color>;

/// Fixed role of a player in the session, independent of color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Seat {
    /// The primary (human-facing) seat.
    Player,
    /// The other seat.
    Opponent,
}

/// Reference to a seated player as carried by events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct PlayerInfo {
    /// Which seat the player occupies.
    pub seat: Seat,
    /// Display name of the player.
    pub name: String,
    /// Color the seat plays in the current game.
    pub color: Color,
}
