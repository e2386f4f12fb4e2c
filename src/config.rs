//! Game props, effective console configuration, and TOML settings.

use crate::error::ConfigError;
use crate::player::{HumanInput, HumanPlayer, Player, RandomPlayer};
use crate::types::Color;
use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::{debug, info, instrument};

/// Per-call input to `new_game` / `init_game`.
///
/// Unset fields keep the previous effective value. `history` applies only to
/// the call that carries it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[setters(strip_option, into, prefix = "with_")]
pub struct GameProps {
    /// Color of the primary seat.
    pub player_color: Option<Color>,
    /// PGN of a game to resume.
    pub history: Option<String>,
    /// UI language; carried but not interpreted by the console.
    pub locale: Option<String>,
}

/// Effective configuration of a console session.
///
/// Immutable: [`ConsoleConfig::merge`] returns a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ConsoleConfig {
    /// Color of the primary seat; white unless set.
    player_color: Color,
    /// UI language.
    locale: Option<String>,
}

impl ConsoleConfig {
    /// Returns the configuration with `props` applied on top (new keys win).
    pub fn merge(&self, props: &GameProps) -> Self {
        Self {
            player_color: props.player_color.unwrap_or(self.player_color),
            locale: props.locale.clone().or_else(|| self.locale.clone()),
        }
    }
}

/// Kind of agent seated at a console seat.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PlayerKind {
    /// Moves typed in by a person.
    #[default]
    Human,
    /// Uniformly random legal moves.
    Random,
}

/// Settings for one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SeatSettings {
    /// Display name.
    #[serde(default = "default_name")]
    name: String,

    /// Agent kind.
    #[serde(default)]
    kind: PlayerKind,

    /// Delay before a computer player answers, in milliseconds.
    #[serde(default)]
    think_ms: u64,
}

#[instrument]
fn default_name() -> String {
    "Player".to_string()
}

impl SeatSettings {
    /// Creates seat settings.
    pub fn new(name: impl Into<String>, kind: PlayerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            think_ms: 0,
        }
    }

    /// Returns a copy seated with a different agent kind.
    pub fn with_kind(mut self, kind: PlayerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builds the player for this seat. Human seats also return the input
    /// handle the UI types moves into.
    #[instrument(skip(self), fields(name = %self.name, kind = %self.kind))]
    pub fn build(&self, seed: Option<u64>) -> (Box<dyn Player>, Option<HumanInput>) {
        match self.kind {
            PlayerKind::Human => {
                let (player, input) = HumanPlayer::new(self.name.clone());
                (Box::new(player), Some(input))
            }
            PlayerKind::Random => {
                let player = match seed {
                    Some(seed) => RandomPlayer::seeded(self.name.clone(), seed),
                    None => RandomPlayer::new(self.name.clone()),
                }
                .with_think_time(Duration::from_millis(self.think_ms));
                (Box::new(player), None)
            }
        }
    }
}

/// File-based settings for the console binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ConsoleSettings {
    /// Primary seat.
    #[serde(default = "default_player")]
    player: SeatSettings,

    /// Other seat.
    #[serde(default = "default_opponent")]
    opponent: SeatSettings,

    /// Color of the primary seat.
    #[serde(default)]
    player_color: Option<Color>,

    /// UI language.
    #[serde(default)]
    locale: Option<String>,

    /// PGN file to resume from.
    #[serde(default)]
    history_file: Option<PathBuf>,

    /// Seed for computer players.
    #[serde(default)]
    seed: Option<u64>,
}

#[instrument]
fn default_player() -> SeatSettings {
    SeatSettings::new("Player", PlayerKind::Human)
}

#[instrument]
fn default_opponent() -> SeatSettings {
    SeatSettings::new("Computer", PlayerKind::Random)
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            player: default_player(),
            opponent: default_opponent(),
            player_color: None,
            locale: None,
            history_file: None,
            seed: None,
        }
    }
}

impl ConsoleSettings {
    /// Loads settings from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading settings from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read settings file: {}", e)))?;

        let settings: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse settings: {}", e)))?;

        info!(
            player = %settings.player.name,
            opponent = %settings.opponent.name,
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Overrides the primary seat color.
    pub fn set_player_color(&mut self, color: Color) {
        self.player_color = Some(color);
    }

    /// Overrides the opponent agent kind.
    pub fn set_opponent_kind(&mut self, kind: PlayerKind) {
        self.opponent = self.opponent.clone().with_kind(kind);
    }

    /// Overrides the history file.
    pub fn set_history_file(&mut self, path: PathBuf) {
        self.history_file = Some(path);
    }

    /// Overrides the computer-player seed.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
    }

    /// Props for the first game, reading the history file if one is set.
    #[instrument(skip(self))]
    pub fn initial_props(&self) -> Result<GameProps, ConfigError> {
        let mut props = GameProps::default();
        props.player_color = self.player_color;
        props.locale = self.locale.clone();
        if let Some(path) = &self.history_file {
            let pgn = std::fs::read_to_string(path).map_err(|e| {
                ConfigError::new(format!("Failed to read history {}: {}", path.display(), e))
            })?;
            props.history = Some(pgn);
        }
        Ok(props)
    }
}
