use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::cards::{Card, PlayerId};
use crate::engine::ClaimOutcome;
use crate::events::{GameEndReason, GameEvent};

/// Everything the engine shows. Calls are fire-and-forget: implementations
/// must not block the table or the dealer.
pub trait Display: Send + Sync {
	fn place_card(&self, slot: usize, card: Card);

	fn remove_card(&self, slot: usize);

	fn place_token(&self, player: PlayerId, slot: usize);

	fn remove_token(&self, player: PlayerId, slot: usize);

	fn set_countdown(&self, remaining: Duration, warning: bool);

	fn set_score(&self, player: PlayerId, score: u32);

	fn set_freeze(&self, player: PlayerId, remaining: Duration);

	fn announce_winners(&self, winners: &[PlayerId], reason: GameEndReason);

	fn game_started(&self, _players: &[PlayerId], _slots: usize, _deck_size: usize) {}

	fn claim_resolved(&self, _player: PlayerId, _slots: &[usize], _outcome: ClaimOutcome) {}

	fn table_reshuffled(&self, _deck_size: usize) {}
}

/// Turns every display call into a `GameEvent` on a channel. A dropped
/// receiver just silences the stream.
pub struct ChannelDisplay {
	event_tx: Sender<GameEvent>,
}

impl ChannelDisplay {
	pub fn new(event_tx: Sender<GameEvent>) -> Self {
		Self { event_tx }
	}

	fn emit(&self, event: GameEvent) {
		let _ = self.event_tx.send(event);
	}
}

impl Display for ChannelDisplay {
	fn place_card(&self, slot: usize, card: Card) {
		self.emit(GameEvent::CardPlaced { slot, card });
	}

	fn remove_card(&self, slot: usize) {
		self.emit(GameEvent::CardRemoved { slot });
	}

	fn place_token(&self, player: PlayerId, slot: usize) {
		self.emit(GameEvent::TokenPlaced { player, slot });
	}

	fn remove_token(&self, player: PlayerId, slot: usize) {
		self.emit(GameEvent::TokenRemoved { player, slot });
	}

	fn set_countdown(&self, remaining: Duration, warning: bool) {
		self.emit(GameEvent::Countdown {
			remaining_ms: remaining.as_millis() as u64,
			warning,
		});
	}

	fn set_score(&self, player: PlayerId, score: u32) {
		self.emit(GameEvent::ScoreChanged { player, score });
	}

	fn set_freeze(&self, player: PlayerId, remaining: Duration) {
		self.emit(GameEvent::PlayerFrozen {
			player,
			millis: remaining.as_millis() as u64,
		});
	}

	fn announce_winners(&self, winners: &[PlayerId], reason: GameEndReason) {
		self.emit(GameEvent::GameEnded {
			reason,
			winners: winners.to_vec(),
		});
	}

	fn game_started(&self, players: &[PlayerId], slots: usize, deck_size: usize) {
		self.emit(GameEvent::GameStarted {
			players: players.to_vec(),
			slots,
			deck_size,
		});
	}

	fn claim_resolved(&self, player: PlayerId, slots: &[usize], outcome: ClaimOutcome) {
		self.emit(GameEvent::ClaimResolved {
			player,
			slots: slots.to_vec(),
			outcome,
		});
	}

	fn table_reshuffled(&self, deck_size: usize) {
		self.emit(GameEvent::TableReshuffled { deck_size });
	}
}

pub struct NullDisplay;

impl Display for NullDisplay {
	fn place_card(&self, _slot: usize, _card: Card) {}

	fn remove_card(&self, _slot: usize) {}

	fn place_token(&self, _player: PlayerId, _slot: usize) {}

	fn remove_token(&self, _player: PlayerId, _slot: usize) {}

	fn set_countdown(&self, _remaining: Duration, _warning: bool) {}

	fn set_score(&self, _player: PlayerId, _score: u32) {}

	fn set_freeze(&self, _player: PlayerId, _remaining: Duration) {}

	fn announce_winners(&self, _winners: &[PlayerId], _reason: GameEndReason) {}
}
