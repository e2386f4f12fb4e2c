//! Standard chess rules backed by `shakmaty`.

use super::pgn::{parse_pgn, write_pgn};
use super::{MoveResult, RulesEngine};
use crate::error::InvalidHistoryError;
use crate::types::Color;
use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::uci::UciMove;
use shakmaty::zobrist::Zobrist64;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};
use tracing::{debug, instrument, warn};

/// Half-moves without capture or pawn move after which the game is drawn.
const FIFTY_MOVE_PLIES: u32 = 100;

#[derive(Debug, Clone)]
struct Ply {
    before: Chess,
    hash_after: u64,
}

/// Orthodox chess with draw detection equivalent to chess.js `game_over()`:
/// checkmate, stalemate, insufficient material, fifty-move rule and
/// threefold repetition.
#[derive(Debug, Clone)]
pub struct StandardChess {
    initial: Chess,
    setup_fen: Option<String>,
    position: Chess,
    plies: Vec<Ply>,
    history: Vec<MoveResult>,
}

impl StandardChess {
    /// Creates an engine at the standard starting position.
    #[instrument]
    pub fn new() -> Self {
        Self::with_position(Chess::default(), None)
    }

    /// Creates an engine starting from a FEN position.
    #[instrument]
    pub fn from_fen(fen: &str) -> Result<Self, InvalidHistoryError> {
        let position = parse_fen(fen)?;
        Ok(Self::with_position(position, Some(fen.to_string())))
    }

    fn with_position(position: Chess, setup_fen: Option<String>) -> Self {
        Self {
            initial: position.clone(),
            setup_fen,
            position,
            plies: Vec::new(),
            history: Vec::new(),
        }
    }

    fn parse_token(&self, token: &str, sloppy: bool) -> Option<Move> {
        let token = token.trim().trim_end_matches(['!', '?']);
        if let Ok(san) = token.parse::<SanPlus>() {
            if let Ok(m) = san.san.to_move(&self.position) {
                return Some(m);
            }
        }
        if sloppy {
            if let Ok(uci) = token.parse::<UciMove>() {
                return uci.to_move(&self.position).ok();
            }
        }
        None
    }

    fn play(&mut self, m: Move) -> MoveResult {
        let before = self.position.clone();
        let color = Color::from(before.turn());
        let san = SanPlus::from_move(before.clone(), m).to_string();
        let uci = UciMove::from_move(m, CastlingMode::Standard).to_string();

        self.position.play_unchecked(m);

        let result = MoveResult {
            color,
            san,
            uci,
            from: m.from().map(|sq| sq.to_string()),
            to: m.to().to_string(),
            piece: m.role().char(),
            captured: m.capture().map(|role| role.char()),
            promotion: m.promotion().map(|role| role.char()),
            check: self.position.is_check(),
            checkmate: self.position.is_checkmate(),
        };
        self.plies.push(Ply {
            before,
            hash_after: hash(&self.position),
        });
        self.history.push(result.clone());
        result
    }

    fn is_threefold(&self) -> bool {
        let current = hash(&self.position);
        let earlier = std::iter::once(hash(&self.initial))
            .chain(self.plies.iter().map(|ply| ply.hash_after));
        earlier.filter(|h| *h == current).count() >= 3
    }

    fn result_marker(&self) -> &'static str {
        if self.is_checkmate() {
            match self.turn() {
                Color::White => "0-1",
                Color::Black => "1-0",
            }
        } else if self.is_game_over() {
            "1/2-1/2"
        } else {
            "*"
        }
    }
}

impl Default for StandardChess {
    fn default() -> Self {
        Self::new()
    }
}

fn hash(position: &Chess) -> u64 {
    let Zobrist64(value) = position.zobrist_hash::<Zobrist64>(EnPassantMode::Legal);
    value
}

fn parse_fen(fen: &str) -> Result<Chess, InvalidHistoryError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| InvalidHistoryError::new(format!("bad FEN {:?}: {}", fen, e)))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| InvalidHistoryError::new(format!("impossible FEN {:?}: {}", fen, e)))
}

impl RulesEngine for StandardChess {
    #[instrument(skip(self))]
    fn reset(&mut self) {
        *self = Self::new();
    }

    #[instrument(skip(self, pgn), fields(len = pgn.len()))]
    fn load_pgn(&mut self, pgn: &str, sloppy: bool) -> Result<(), InvalidHistoryError> {
        let game = parse_pgn(pgn);
        let mut loaded = match (game.tag("SetUp"), game.tag("FEN")) {
            (Some("1") | None, Some(fen)) => Self::from_fen(fen)?,
            _ => Self::new(),
        };

        for (ply, token) in game.moves.iter().enumerate() {
            let Some(m) = loaded.parse_token(token, sloppy) else {
                warn!(ply, token = %token, "Rejected history");
                return Err(InvalidHistoryError::at_ply(ply, token));
            };
            loaded.play(m);
        }

        debug!(plies = loaded.history.len(), "History loaded");
        *self = loaded;
        Ok(())
    }

    fn make_move(&mut self, token: &str) -> Option<MoveResult> {
        let m = self.parse_token(token, true)?;
        Some(self.play(m))
    }

    fn undo(&mut self) -> Option<MoveResult> {
        let ply = self.plies.pop()?;
        self.position = ply.before;
        self.history.pop()
    }

    fn turn(&self) -> Color {
        self.position.turn().into()
    }

    fn is_game_over(&self) -> bool {
        self.position.is_game_over()
            || self.position.halfmoves() >= FIFTY_MOVE_PLIES
            || self.is_threefold()
    }

    fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    fn history(&self) -> &[MoveResult] {
        &self.history
    }

    fn legal_moves(&self) -> Vec<String> {
        self.position
            .legal_moves()
            .iter()
            .map(|m| San::from_move(&self.position, *m).to_string())
            .collect()
    }

    fn pgn(&self, tags: &[(String, String)]) -> String {
        let mut tags = tags.to_vec();
        if !tags.iter().any(|(name, _)| name == "Result") {
            tags.push(("Result".to_string(), self.result_marker().to_string()));
        }
        if let Some(fen) = &self.setup_fen {
            tags.push(("SetUp".to_string(), "1".to_string()));
            tags.push(("FEN".to_string(), fen.clone()));
        }
        let start = (self.initial.fullmoves().get(), Color::from(self.initial.turn()));
        let sans: Vec<String> = self.history.iter().map(|r| r.san.clone()).collect();
        write_pgn(&tags, start, &sans, self.result_marker())
    }
}
