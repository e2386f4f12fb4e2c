//! Integration tests for the turn loop: alternation, illegal moves, undo,
//! game end, deferred delivery and stale replies.

use chess_console::{
    ChessConsole, Color, ConsoleError, ConsoleEvent, GameProps, MoveReply, MoveResult, Player,
    RulesEngine, ScriptedPlayer, Seat, StandardChess, TurnState,
};
use std::cell::RefCell;
use std::rc::Rc;

type EventLog = Rc<RefCell<Vec<ConsoleEvent>>>;

fn record(console: &mut ChessConsole<StandardChess>) -> EventLog {
    let log = EventLog::default();
    let sink = Rc::clone(&log);
    console.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    log
}

fn kinds(log: &EventLog) -> Vec<&'static str> {
    log.borrow().iter().map(ConsoleEvent::kind).collect()
}

fn scripted(player: ScriptedPlayer, opponent: ScriptedPlayer, props: GameProps) -> ChessConsole<StandardChess> {
    ChessConsole::new(StandardChess::new(), Box::new(player), Box::new(opponent), props)
}

/// Requests and results shared between a test and its [`ManualPlayer`].
#[derive(Debug, Clone, Default)]
struct Inbox {
    requests: Rc<RefCell<Vec<(String, MoveReply)>>>,
    results: Rc<RefCell<Vec<(String, bool)>>>,
}

impl Inbox {
    fn last_reply(&self) -> MoveReply {
        self.requests
            .borrow()
            .last()
            .map(|(_, reply)| reply.clone())
            .expect("player was asked to move")
    }
}

/// Player that only records what it is told; the test answers for it.
struct ManualPlayer {
    name: String,
    inbox: Inbox,
}

impl ManualPlayer {
    fn new(name: &str) -> (Self, Inbox) {
        let inbox = Inbox::default();
        (
            Self {
                name: name.to_string(),
                inbox: inbox.clone(),
            },
            inbox,
        )
    }
}

impl Player for ManualPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn move_request(&mut self, fen: &str, reply: MoveReply) {
        self.inbox.requests.borrow_mut().push((fen.to_string(), reply));
    }

    fn move_result(&mut self, mv: &str, result: Option<&MoveResult>) {
        self.inbox
            .results
            .borrow_mut()
            .push((mv.to_string(), result.is_some()));
    }
}

fn manual_console(props: GameProps) -> (ChessConsole<StandardChess>, Inbox, Inbox) {
    let (player, player_inbox) = ManualPlayer::new("Alice");
    let (opponent, opponent_inbox) = ManualPlayer::new("Bob");
    let console = ChessConsole::new(StandardChess::new(), Box::new(player), Box::new(opponent), props);
    (console, player_inbox, opponent_inbox)
}

#[test]
fn test_init_game_defaults_to_white() {
    let (mut console, player, opponent) = manual_console(GameProps::default());
    let events = record(&mut console);

    console.init_game(GameProps::default()).unwrap();

    assert_eq!(*console.config().player_color(), Color::White);
    assert_eq!(console.state().orientation(), Color::White);
    assert_eq!(kinds(&events), vec!["initGame", "moveRequest"]);
    match &events.borrow()[1] {
        ConsoleEvent::MoveRequest { player } => {
            assert_eq!(player.seat, Seat::Player);
            assert_eq!(player.color, Color::White);
            assert_eq!(player.name, "Alice");
        }
        other => panic!("expected moveRequest, got {:?}", other),
    }

    // Delivery waits for the loop.
    assert!(player.requests.borrow().is_empty());
    console.run_until_idle().unwrap();
    assert_eq!(player.requests.borrow().len(), 1);
    assert!(opponent.requests.borrow().is_empty());
}

#[test]
fn test_new_game_announced_before_init() {
    let (mut console, _player, _opponent) = manual_console(GameProps::default());
    let events = record(&mut console);

    console
        .new_game(GameProps::default().with_player_color(Color::Black))
        .unwrap();

    assert_eq!(kinds(&events), vec!["newGame", "initGame", "moveRequest"]);
    assert_eq!(console.state().orientation(), Color::Black);
    assert_eq!(console.player_to_move(), Some(Seat::Opponent));
    assert_eq!(console.player_white().name, "Bob");
    assert_eq!(console.player_black().name, "Alice");
}

#[test]
fn test_players_alternate() {
    let mut console = scripted(
        ScriptedPlayer::new("Alice", ["e4", "Nf3"]),
        ScriptedPlayer::new("Bob", ["e5"]),
        GameProps::default(),
    );
    let events = record(&mut console);

    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();

    assert_eq!(console.state().ply_count(), 3);
    let movers: Vec<(Seat, Color)> = events
        .borrow()
        .iter()
        .filter_map(|event| match event {
            ConsoleEvent::LegalMove { player, .. } => Some((player.seat, player.color)),
            _ => None,
        })
        .collect();
    assert_eq!(
        movers,
        vec![
            (Seat::Player, Color::White),
            (Seat::Opponent, Color::Black),
            (Seat::Player, Color::White),
        ]
    );
    // Bob ran out of moves and is still being waited on.
    assert!(matches!(
        console.turn_state(),
        TurnState::AwaitingMove { seat: Seat::Opponent, .. }
    ));
}

#[test]
fn test_illegal_move_keeps_turn() {
    let alice = ScriptedPlayer::new("Alice", ["Ke2"]);
    let results = alice.results();
    let mut console = scripted(alice, ScriptedPlayer::new("Bob", ["e5"]), GameProps::default());
    let events = record(&mut console);

    console.init_game(GameProps::default()).unwrap();
    let fen_before = console.state().fen();
    console.run_until_idle().unwrap();

    assert_eq!(kinds(&events), vec!["initGame", "moveRequest", "illegalMove"]);
    assert_eq!(results.borrow().as_slice(), &[("Ke2".to_string(), None)]);
    assert_eq!(console.state().ply_count(), 0);
    assert_eq!(console.state().fen(), fen_before);
    assert_eq!(console.player_to_move(), Some(Seat::Player));
    match &events.borrow()[2] {
        ConsoleEvent::IllegalMove { player, mv } => {
            assert_eq!(player.seat, Seat::Player);
            assert_eq!(mv, "Ke2");
        }
        other => panic!("expected illegalMove, got {:?}", other),
    }
}

#[test]
fn test_retry_after_illegal_move_uses_same_request() {
    let alice = ScriptedPlayer::new("Alice", ["Ke2", "e4"]).retry_on_illegal(true);
    let results = alice.results();
    let mut console = scripted(alice, ScriptedPlayer::new("Bob", Vec::<String>::new()), GameProps::default());
    let events = record(&mut console);

    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();

    assert_eq!(console.state().ply_count(), 1);
    assert_eq!(results.borrow().len(), 2);
    assert!(results.borrow()[1].1.is_some());
    assert_eq!(
        kinds(&events),
        vec!["initGame", "moveRequest", "illegalMove", "legalMove", "moveRequest"]
    );
}

#[test]
fn test_checkmate_ends_game_with_winner() {
    let mut console = scripted(
        ScriptedPlayer::new("Alice", ["f3", "g4", "a3"]),
        ScriptedPlayer::new("Bob", ["e5", "Qh4#"]),
        GameProps::default(),
    );
    let events = record(&mut console);

    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();

    assert_eq!(console.state().ply_count(), 4);
    assert_eq!(
        console.turn_state(),
        TurnState::GameOver {
            won_color: Some(Color::Black)
        }
    );
    assert_eq!(console.player_to_move(), None);
    assert_eq!(kinds(&events).last(), Some(&"gameOver"));
    assert_eq!(
        events.borrow().last(),
        Some(&ConsoleEvent::GameOver {
            won_color: Some(Color::Black)
        })
    );

    let err = console.next_move().unwrap_err();
    assert!(matches!(err, ConsoleError::Protocol(_)));
}

#[test]
fn test_stalemate_is_a_draw() {
    let setup = "[SetUp \"1\"]\n[FEN \"7k/8/6K1/8/8/8/8/5Q2 w - - 0 1\"]\n\n*";
    let mut console = scripted(
        ScriptedPlayer::new("Alice", ["Qf7"]),
        ScriptedPlayer::new("Bob", Vec::<String>::new()),
        GameProps::default(),
    );
    let events = record(&mut console);

    console
        .init_game(GameProps::default().with_history(setup))
        .unwrap();
    console.run_until_idle().unwrap();

    assert_eq!(console.turn_state(), TurnState::GameOver { won_color: None });
    assert!(!console.state().engine().is_checkmate());
    assert_eq!(
        events.borrow().last(),
        Some(&ConsoleEvent::GameOver { won_color: None })
    );
}

#[test]
fn test_undo_returns_to_start() {
    let mut console = scripted(
        ScriptedPlayer::new("Alice", ["e4"]),
        ScriptedPlayer::new("Bob", ["e5"]),
        GameProps::default(),
    );
    let start = console.state().fen();
    let events = record(&mut console);

    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();
    assert_eq!(console.state().ply_count(), 2);
    assert!(console.can_undo());

    events.borrow_mut().clear();
    console.undo_move().unwrap();

    assert_eq!(console.state().ply_count(), 0);
    assert_eq!(console.state().fen(), start);
    assert_eq!(console.player_to_move(), Some(Seat::Player));
    assert_eq!(kinds(&events), vec!["moveUndone", "moveRequest"]);
    assert!(!console.can_undo());
}

#[test]
fn test_consecutive_undos_go_back_two_plies_each() {
    let mut console = scripted(
        ScriptedPlayer::new("Alice", ["e4", "d4"]),
        ScriptedPlayer::new("Bob", ["e5", "d5"]),
        GameProps::default(),
    );
    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();
    assert_eq!(console.state().ply_count(), 4);

    console.undo_move().unwrap();
    assert_eq!(console.state().ply_count(), 2);
    assert_eq!(console.state().engine().history()[1].san(), "e5");

    console.undo_move().unwrap();
    assert_eq!(console.state().ply_count(), 0);
}

#[test]
fn test_undo_pops_third_ply_when_player_not_to_move() {
    let mut console = scripted(
        ScriptedPlayer::new("Alice", ["e4", "d4"]),
        ScriptedPlayer::new("Bob", ["e5"]),
        GameProps::default(),
    );
    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();
    assert_eq!(console.state().ply_count(), 3);

    console.undo_move().unwrap();

    assert_eq!(console.state().ply_count(), 0);
    assert_eq!(console.state().engine().turn(), Color::White);
}

#[test]
fn test_undo_as_black() {
    let mut console = scripted(
        ScriptedPlayer::new("Alice", ["e5"]),
        ScriptedPlayer::new("Bob", ["e4", "d4"]),
        GameProps::default().with_player_color(Color::Black),
    );
    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();
    assert_eq!(console.state().ply_count(), 3);

    console.undo_move().unwrap();

    assert_eq!(console.state().ply_count(), 1);
    assert_eq!(console.player_to_move(), Some(Seat::Player));
}

#[test]
fn test_undo_on_empty_history_is_harmless() {
    let (mut console, _player, _opponent) = manual_console(GameProps::default());
    let events = record(&mut console);
    console.init_game(GameProps::default()).unwrap();

    console.undo_move().unwrap();

    assert_eq!(console.state().ply_count(), 0);
    assert_eq!(
        kinds(&events),
        vec!["initGame", "moveRequest", "moveUndone", "moveRequest"]
    );
}

#[test]
fn test_stale_reply_is_dropped_after_new_game() {
    let (mut console, player, _opponent) = manual_console(GameProps::default());
    let events = record(&mut console);

    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();
    let stale = player.last_reply();

    console.new_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();
    let fresh = player.last_reply();
    assert_ne!(stale.token(), fresh.token());
    assert!(!stale.is_current());
    assert!(fresh.is_current());

    assert!(stale.send("e4"));
    console.run_until_idle().unwrap();
    assert_eq!(console.state().ply_count(), 0);
    assert!(player.results.borrow().is_empty());
    assert!(!kinds(&events).contains(&"legalMove"));

    assert!(fresh.send("e4"));
    console.run_until_idle().unwrap();
    assert_eq!(console.state().ply_count(), 1);
    assert_eq!(player.results.borrow().as_slice(), &[("e4".to_string(), true)]);
}

#[test]
fn test_reply_after_move_is_not_replayed() {
    let (mut console, player, opponent) = manual_console(GameProps::default());
    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();

    let reply = player.last_reply();
    assert!(reply.is_current());
    reply.send("e4");
    console.run_until_idle().unwrap();
    assert_eq!(opponent.requests.borrow().len(), 1);
    assert!(!reply.is_current());
    assert!(opponent.last_reply().is_current());

    // Answering the old request again must not move for black.
    reply.send("e5");
    console.run_until_idle().unwrap();
    assert_eq!(console.state().ply_count(), 1);
    assert_eq!(console.state().engine().turn(), Color::Black);
}

#[test]
fn test_request_carries_live_position() {
    let (mut console, player, opponent) = manual_console(GameProps::default());
    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();
    player.last_reply().send("d4");
    console.run_until_idle().unwrap();

    let (fen, _) = opponent.requests.borrow()[0].clone();
    assert_eq!(fen, console.state().fen());
    assert!(fen.contains(" b "));
}

#[test]
fn test_calls_before_init_are_protocol_violations() {
    let (mut console, player, _opponent) = manual_console(GameProps::default());

    assert!(matches!(console.next_move(), Err(ConsoleError::Protocol(_))));
    assert!(matches!(console.undo_move(), Err(ConsoleError::Protocol(_))));
    assert_eq!(console.turn_state(), TurnState::Idle);
    assert_eq!(console.run_until_idle().unwrap(), 0);
    assert!(player.requests.borrow().is_empty());
}

#[test]
fn test_next_move_supersedes_outstanding_request() {
    let (mut console, player, _opponent) = manual_console(GameProps::default());
    console.init_game(GameProps::default()).unwrap();
    let token = console.next_move().unwrap();
    console.run_until_idle().unwrap();

    // Only the latest request reaches the player.
    let requests = player.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1.token(), token);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let (mut console, _player, _opponent) = manual_console(GameProps::default());
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let id = console.subscribe(move |_| *sink.borrow_mut() += 1);

    console.init_game(GameProps::default()).unwrap();
    assert_eq!(*count.borrow(), 2);

    assert!(console.unsubscribe(id));
    assert!(!console.unsubscribe(id));
    console.new_game(GameProps::default()).unwrap();
    assert_eq!(*count.borrow(), 2);
}

#[test]
fn test_panicking_subscriber_does_not_stop_the_game() {
    let mut console = scripted(
        ScriptedPlayer::new("Alice", ["e4"]),
        ScriptedPlayer::new("Bob", ["e5"]),
        GameProps::default(),
    );
    console.subscribe(|event| {
        if let ConsoleEvent::LegalMove { .. } = event {
            panic!("subscriber failure");
        }
    });
    let events = record(&mut console);

    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();

    assert_eq!(console.state().ply_count(), 2);
    assert_eq!(
        kinds(&events).iter().filter(|kind| **kind == "legalMove").count(),
        2
    );
}

#[test]
fn test_events_serialize_with_kind_tag() {
    let mut console = scripted(
        ScriptedPlayer::new("Alice", ["e2e4"]),
        ScriptedPlayer::new("Bob", Vec::<String>::new()),
        GameProps::default(),
    );
    let events = record(&mut console);
    console.init_game(GameProps::default()).unwrap();
    console.run_until_idle().unwrap();

    let legal = events
        .borrow()
        .iter()
        .find(|event| event.kind() == "legalMove")
        .cloned()
        .expect("a legal move was played");
    let json = serde_json::to_value(&legal).unwrap();
    assert_eq!(json["kind"], "legalMove");
    assert_eq!(json["move"], "e2e4");
    assert_eq!(json["moveResult"]["san"], "e4");
    assert_eq!(json["player"]["color"], "white");
    assert_eq!(json["player"]["seat"], "player");

    let undone = serde_json::to_value(ConsoleEvent::MoveUndone).unwrap();
    assert_eq!(undone["kind"], "moveUndone");
}
