use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use set_arbiter::cards::{Card, PlayerId};
use set_arbiter::config::GameConfig;
use set_arbiter::engine::{ClaimOutcome, GameHandle, GameSession, GameSummary};
use set_arbiter::events::{GameEndReason, GameEvent};
use set_arbiter::players::InputHandle;
use set_arbiter::rules::{FeatureRules, SetRules};

/// Accepts exactly the listed groups of card ids.
struct ListedSets(Vec<Vec<u32>>);

impl SetRules for ListedSets {
	fn set_size(&self) -> usize {
		3
	}

	fn is_valid_set(&self, cards: &[Card]) -> bool {
		let mut ids: Vec<u32> = cards.iter().map(|c| c.0).collect();
		ids.sort_unstable();
		self.0.iter().any(|s| *s == ids)
	}
}

/// Never accepts a claim but always claims a set is out there, so the game
/// only ends when stopped.
struct Endless {
	delay: Duration,
}

impl SetRules for Endless {
	fn set_size(&self) -> usize {
		3
	}

	fn is_valid_set(&self, _cards: &[Card]) -> bool {
		thread::sleep(self.delay);
		false
	}

	fn any_set_exists(&self, _cards: &[Card]) -> bool {
		true
	}
}

struct RunningGame {
	_runtime: tokio::runtime::Runtime,
	game: JoinHandle<GameSummary>,
	handle: GameHandle,
	humans: Vec<(PlayerId, InputHandle)>,
}

fn start(config: GameConfig, rules: Arc<dyn SetRules>) -> RunningGame {
	let runtime = tokio::runtime::Runtime::new().unwrap();
	let (mut session, handle) = GameSession::new(config, rules, runtime.handle().clone());
	let humans = session.add_human_players();
	session.add_computer_players();
	let game = thread::spawn(move || session.run());
	RunningGame {
		_runtime: runtime,
		game,
		handle,
		humans,
	}
}

fn human_config(humans: usize, deck_size: u32) -> GameConfig {
	GameConfig {
		deck_size,
		human_players: humans,
		computer_players: 0,
		point_freeze_ms: 0,
		penalty_freeze_ms: 10,
		seed: Some(2024),
		..GameConfig::default()
	}
}

/// Collects events until one satisfies `done`, which is included.
fn wait_for<F: FnMut(&GameEvent) -> bool>(rx: &Receiver<GameEvent>, mut done: F) -> Vec<GameEvent> {
	let deadline = Instant::now() + Duration::from_secs(10);
	let mut seen = Vec::new();
	loop {
		let left = deadline.saturating_duration_since(Instant::now());
		let event = rx.recv_timeout(left).expect("event did not arrive in time");
		let hit = done(&event);
		seen.push(event);
		if hit {
			return seen;
		}
	}
}

fn card_slots(events: &[GameEvent]) -> HashMap<u32, usize> {
	events
		.iter()
		.filter_map(|e| match e {
			GameEvent::CardPlaced { slot, card } => Some((card.0, *slot)),
			_ => None,
		})
		.collect()
}

#[test]
fn test_point_with_exhausted_deck_then_game_over() {
	let running = start(human_config(2, 12), Arc::new(ListedSets(vec![vec![0, 1, 2]])));
	let rx = &running.handle.event_rx;

	let mut placed = 0;
	let dealt = wait_for(rx, |e| {
		if matches!(e, GameEvent::CardPlaced { .. }) {
			placed += 1;
		}
		placed == 12
	});
	let slots = card_slots(&dealt);

	let (p0, presses) = &running.humans[0];
	for card in [0, 1, 2] {
		assert!(presses.press(slots[&card]));
	}

	let events = wait_for(rx, |e| matches!(e, GameEvent::GameEnded { .. }));
	let summary = running.game.join().unwrap();

	assert!(events.contains(&GameEvent::ClaimResolved {
		player: *p0,
		slots: {
			let mut s: Vec<usize> = [0, 1, 2].iter().map(|c| slots[c]).collect();
			s.sort_unstable();
			s
		},
		outcome: ClaimOutcome::Point,
	}));
	assert!(events.contains(&GameEvent::ScoreChanged { player: *p0, score: 1 }));
	for card in [0, 1, 2] {
		assert!(events.contains(&GameEvent::CardRemoved { slot: slots[&card] }));
	}
	// the deck was empty, nothing new was dealt
	assert!(!events.iter().any(|e| matches!(e, GameEvent::CardPlaced { .. })));

	assert_eq!(summary.reason, GameEndReason::NoSetsLeft);
	assert_eq!(summary.scores, vec![1, 0]);
	assert_eq!(summary.winners, vec![*p0]);
}

#[test]
fn test_countdown_expiry_reshuffles_whole_table() {
	let config = GameConfig {
		turn_timeout_ms: 150,
		turn_timeout_warning_ms: 50,
		countdown_tick_ms: 20,
		..human_config(1, 81)
	};
	let running = start(config, Arc::new(Endless { delay: Duration::ZERO }));
	let rx = &running.handle.event_rx;

	let before = wait_for(rx, |e| matches!(e, GameEvent::TableReshuffled { .. }));
	assert!(before.contains(&GameEvent::TableReshuffled { deck_size: 81 }));
	assert_eq!(before.iter().filter(|e| matches!(e, GameEvent::CardRemoved { .. })).count(), 12);
	assert!(before.iter().any(|e| matches!(e, GameEvent::Countdown { warning: true, .. })));
	assert!(before.iter().any(|e| matches!(e, GameEvent::Countdown { warning: false, .. })));

	// and the table is dealt again
	let mut placed = 0;
	wait_for(rx, |e| {
		if matches!(e, GameEvent::CardPlaced { .. }) {
			placed += 1;
		}
		placed == 12
	});

	running.handle.stop();
	let summary = running.game.join().unwrap();
	assert_eq!(summary.reason, GameEndReason::Stopped);
	assert_eq!(summary.scores, vec![0]);
}

#[test]
fn test_stop_releases_players_waiting_on_claims() {
	let running = start(human_config(3, 81), Arc::new(Endless { delay: Duration::from_millis(300) }));
	let rx = &running.handle.event_rx;

	let mut placed = 0;
	wait_for(rx, |e| {
		if matches!(e, GameEvent::CardPlaced { .. }) {
			placed += 1;
		}
		placed == 12
	});

	for (i, (_, presses)) in running.humans.iter().enumerate() {
		for slot in i * 3..i * 3 + 3 {
			assert!(presses.press(slot));
		}
	}
	let mut tokens = 0;
	wait_for(rx, |e| {
		if matches!(e, GameEvent::TokenPlaced { .. }) {
			tokens += 1;
		}
		tokens == 9
	});
	thread::sleep(Duration::from_millis(50));

	running.handle.stop();
	let events = wait_for(rx, |e| matches!(e, GameEvent::GameEnded { .. }));
	let summary = running.game.join().unwrap();

	let outcomes: Vec<ClaimOutcome> = events
		.iter()
		.filter_map(|e| match e {
			GameEvent::ClaimResolved { outcome, .. } => Some(*outcome),
			_ => None,
		})
		.collect();
	assert_eq!(outcomes.len(), 3, "every claim gets an answer: {:?}", outcomes);
	assert!(outcomes.iter().filter(|o| **o == ClaimOutcome::Cancelled).count() >= 2);
	assert!(!outcomes.contains(&ClaimOutcome::Point));
	assert_eq!(summary.reason, GameEndReason::Stopped);
	assert_eq!(summary.winners.len(), 3);
}

#[test]
fn test_computer_players_game_finishes_consistently() {
	let config = GameConfig {
		deck_size: 27,
		feature_count: 3,
		computer_players: 3,
		computer_delay_ms: 1,
		point_freeze_ms: 0,
		penalty_freeze_ms: 5,
		turn_timeout_ms: 400,
		turn_timeout_warning_ms: 100,
		countdown_tick_ms: 50,
		seed: Some(77),
		..GameConfig::default()
	};
	let rules = Arc::new(FeatureRules::new(config.feature_count, config.feature_size as u32));
	let running = start(config, rules);

	let stop_signal = Arc::clone(&running.handle.stop_signal);
	thread::spawn(move || {
		thread::sleep(Duration::from_secs(8));
		stop_signal.send_replace(true);
	});

	let events = wait_for(&running.handle.event_rx, |e| matches!(e, GameEvent::GameEnded { .. }));
	let summary = running.game.join().unwrap();

	let points = events
		.iter()
		.filter(|e| matches!(e, GameEvent::ClaimResolved { outcome: ClaimOutcome::Point, .. }))
		.count();
	assert_eq!(summary.scores.iter().sum::<u32>() as usize, points);
	assert!(points <= 9, "27 cards hold at most 9 disjoint sets");

	let best = summary.scores.iter().copied().max().unwrap();
	for w in &summary.winners {
		assert_eq!(summary.scores[w.0], best);
	}

	// a card never sits in two slots at once
	let mut table: HashMap<usize, Card> = HashMap::new();
	for e in &events {
		match e {
			GameEvent::CardPlaced { slot, card } => {
				assert!(!table.values().any(|c| c == card), "{} dealt twice", card);
				assert!(table.insert(*slot, *card).is_none(), "slot {} already full", slot);
			}
			GameEvent::CardRemoved { slot } => {
				assert!(table.remove(slot).is_some());
			}
			_ => {}
		}
	}
}
