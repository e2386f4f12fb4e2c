//! Session facade: wires rules engine, players, state and event bus together
//! and drives the task queue.

use crate::bus::SubscriptionId;
use crate::config::{ConsoleConfig, ConsoleSettings, GameProps};
use crate::error::{ConsoleError, ProtocolViolation};
use crate::events::ConsoleEvent;
use crate::orchestrator::{Task, TurnOrchestrator, TurnState};
use crate::player::{HumanInput, Player, RequestToken};
use crate::rules::RulesEngine;
use crate::state::{GameState, StateSnapshot};
use crate::types::{PlayerInfo, Seat, WonColor};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

/// A chess session between two seated players.
///
/// Single-threaded: all state changes happen while the owner drives
/// [`tick`](Self::tick), [`run_until_idle`](Self::run_until_idle) or
/// [`run`](Self::run). Players may answer from anywhere, their answers wait in
/// the queue until then.
pub struct ChessConsole<R: RulesEngine> {
    orchestrator: TurnOrchestrator<R>,
    tasks: mpsc::UnboundedReceiver<Task>,
}

impl<R: RulesEngine> ChessConsole<R> {
    /// Creates a session. No game is started until
    /// [`init_game`](Self::init_game) or [`new_game`](Self::new_game).
    #[instrument(skip_all)]
    pub fn new(
        engine: R,
        player: Box<dyn Player>,
        opponent: Box<dyn Player>,
        props: GameProps,
    ) -> Self {
        let (tx, tasks) = mpsc::unbounded_channel();
        let config = ConsoleConfig::default().merge(&props);
        info!(player_color = %config.player_color(), "Creating chess console");
        Self {
            orchestrator: TurnOrchestrator::new(engine, player, opponent, config, tx),
            tasks,
        }
    }

    /// Creates a session with the players described by `settings`. Returns
    /// the input handles of human seats.
    #[instrument(skip_all)]
    pub fn from_settings(engine: R, settings: &ConsoleSettings) -> (Self, Vec<(Seat, HumanInput)>) {
        let seed = *settings.seed();
        let (player, player_input) = settings.player().build(seed);
        let (opponent, opponent_input) = settings.opponent().build(seed.map(|s| s.wrapping_add(1)));
        let mut props = GameProps::default();
        props.player_color = *settings.player_color();
        props.locale = settings.locale().clone();

        let console = Self::new(engine, player, opponent, props);
        let inputs = player_input
            .map(|input| (Seat::Player, input))
            .into_iter()
            .chain(opponent_input.map(|input| (Seat::Opponent, input)))
            .collect();
        (console, inputs)
    }

    /// Starts a new game. See [`TurnOrchestrator::new_game`].
    pub fn new_game(&mut self, props: GameProps) -> Result<(), ConsoleError> {
        self.orchestrator.new_game(props)
    }

    /// Initializes a game. See [`TurnOrchestrator::init_game`].
    pub fn init_game(&mut self, props: GameProps) -> Result<(), ConsoleError> {
        self.orchestrator.init_game(props)
    }

    /// Takes back moves. See [`TurnOrchestrator::undo_move`].
    pub fn undo_move(&mut self) -> Result<(), ConsoleError> {
        self.orchestrator.undo_move()
    }

    /// Asks the seat to move again, e.g. after an illegal move.
    pub fn next_move(&mut self) -> Result<RequestToken, ConsoleError> {
        self.orchestrator.next_move()
    }

    /// Whether taking back a move pair makes sense (at least two plies played).
    pub fn can_undo(&self) -> bool {
        self.orchestrator.state().ply_count() >= 2
    }

    /// Subscribes to console events.
    pub fn subscribe(&mut self, callback: impl FnMut(&ConsoleEvent) + 'static) -> SubscriptionId {
        self.orchestrator.bus_mut().subscribe(callback)
    }

    /// Cancels a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.orchestrator.bus_mut().unsubscribe(id)
    }

    /// Logs every event through `tracing`.
    pub fn log_events(&mut self) -> SubscriptionId {
        self.orchestrator.bus_mut().log_events()
    }

    /// Observes game-state mutations.
    pub fn observe(&mut self, observer: impl FnMut(&StateSnapshot) + 'static) {
        self.orchestrator.state_mut().observe(observer);
    }

    /// Game state.
    pub fn state(&self) -> &GameState<R> {
        self.orchestrator.state()
    }

    /// Effective configuration.
    pub fn config(&self) -> &ConsoleConfig {
        self.orchestrator.config()
    }

    /// Phase of the turn loop.
    pub fn turn_state(&self) -> TurnState {
        self.orchestrator.turn_state()
    }

    /// Seat to move, `None` once the game is over.
    pub fn player_to_move(&self) -> Option<Seat> {
        self.orchestrator.player_to_move()
    }

    /// Player playing white.
    pub fn player_white(&self) -> PlayerInfo {
        self.orchestrator.player_info(self.orchestrator.player_white())
    }

    /// Player playing black.
    pub fn player_black(&self) -> PlayerInfo {
        self.orchestrator.player_info(self.orchestrator.player_black())
    }

    /// Moves the history cursor. Returns the clamped cursor.
    pub fn view_ply(&mut self, ply: usize) -> usize {
        self.orchestrator.state_mut().view_ply(ply)
    }

    /// Turns the board around.
    pub fn flip_board(&mut self) {
        let state = self.orchestrator.state_mut();
        let flipped = state.orientation().other();
        state.set_orientation(flipped);
    }

    /// The current game as PGN, with seat names as White and Black.
    pub fn pgn(&self) -> String {
        let tags = vec![
            ("Event".to_string(), "Chess Console game".to_string()),
            ("Site".to_string(), "?".to_string()),
            (
                "Date".to_string(),
                chrono::Local::now().format("%Y.%m.%d").to_string(),
            ),
            ("Round".to_string(), "-".to_string()),
            ("White".to_string(), self.player_white().name),
            ("Black".to_string(), self.player_black().name),
        ];
        self.state().engine().pgn(&tags)
    }

    /// Runs one ready task. Returns `false` if none was ready.
    pub fn tick(&mut self) -> Result<bool, ConsoleError> {
        match self.tasks.try_recv() {
            Ok(task) => {
                self.orchestrator.handle(task)?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Runs ready tasks until the queue is empty. Returns how many ran.
    #[instrument(skip(self))]
    pub fn run_until_idle(&mut self) -> Result<usize, ConsoleError> {
        let mut ran = 0;
        while self.tick()? {
            ran += 1;
        }
        debug!(ran, "Task queue drained");
        Ok(ran)
    }

    /// Waits for the next task and runs it.
    pub async fn wait_tick(&mut self) -> Result<(), ConsoleError> {
        match self.tasks.recv().await {
            Some(task) => self.orchestrator.handle(task),
            None => Err(ProtocolViolation::new("task queue closed").into()),
        }
    }

    /// Runs tasks as they arrive until the game is over.
    ///
    /// Waits indefinitely for a player that never answers.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Protocol`] if no game has been started.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<WonColor, ConsoleError> {
        loop {
            match self.orchestrator.turn_state() {
                TurnState::GameOver { won_color } => return Ok(won_color),
                TurnState::Idle => {
                    return Err(ProtocolViolation::new("run called before a game was started").into());
                }
                TurnState::AwaitingMove { .. } => {}
            }
            self.wait_tick().await?;
        }
    }
}

impl<R: RulesEngine> std::fmt::Debug for ChessConsole<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChessConsole")
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}
