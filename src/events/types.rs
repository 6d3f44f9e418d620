use serde::{Deserialize, Serialize};

use crate::cards::{Card, PlayerId};
use crate::engine::ClaimOutcome;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GameEvent {
	GameStarted {
		players: Vec<PlayerId>,
		slots: usize,
		deck_size: usize,
	},

	CardPlaced {
		slot: usize,
		card: Card,
	},

	CardRemoved {
		slot: usize,
	},

	TokenPlaced {
		player: PlayerId,
		slot: usize,
	},

	TokenRemoved {
		player: PlayerId,
		slot: usize,
	},

	Countdown {
		remaining_ms: u64,
		warning: bool,
	},

	ClaimResolved {
		player: PlayerId,
		slots: Vec<usize>,
		outcome: ClaimOutcome,
	},

	ScoreChanged {
		player: PlayerId,
		score: u32,
	},

	PlayerFrozen {
		player: PlayerId,
		millis: u64,
	},

	TableReshuffled {
		deck_size: usize,
	},

	GameEnded {
		reason: GameEndReason,
		winners: Vec<PlayerId>,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEndReason {
	NoSetsLeft,
	Stopped,
}
