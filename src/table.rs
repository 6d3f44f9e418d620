use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cards::{Card, PlayerId};
use crate::display::Display;
use crate::engine::{Claim, SlotPick, lock_mutex};
use crate::error::EngineError;
use crate::logging;

#[derive(Debug, Default)]
struct Slot {
	card: Option<Card>,
	// Bumped on every card change so a claim can tell a re-dealt slot apart.
	epoch: u64,
	tokens: BTreeSet<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenToggle {
	Placed { count: usize },
	Removed { count: usize },
	Rejected,
}

/// The shared grid. Each slot is its own lock; a player's token set is locked
/// only while its slot lock is held, never the other way round.
pub struct Table {
	slots: Vec<Mutex<Slot>>,
	player_tokens: Vec<Mutex<BTreeSet<usize>>>,
	match_size: usize,
	delay: Duration,
	display: Arc<dyn Display>,
}

impl Table {
	pub fn new(slot_count: usize, players: usize, match_size: usize, display: Arc<dyn Display>) -> Self {
		Self {
			slots: (0..slot_count).map(|_| Mutex::new(Slot::default())).collect(),
			player_tokens: (0..players).map(|_| Mutex::new(BTreeSet::new())).collect(),
			match_size,
			delay: Duration::ZERO,
			display,
		}
	}

	/// Pause applied after every card placement or removal.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	pub fn slot_count(&self) -> usize {
		self.slots.len()
	}

	pub fn player_count(&self) -> usize {
		self.player_tokens.len()
	}

	pub fn match_size(&self) -> usize {
		self.match_size
	}

	fn slot(&self, slot: usize) -> Result<&Mutex<Slot>, EngineError> {
		self.slots.get(slot).ok_or(EngineError::SlotOutOfRange(slot))
	}

	fn pause(&self) {
		if !self.delay.is_zero() {
			std::thread::sleep(self.delay);
		}
	}

	pub fn place_card(&self, card: Card, slot: usize) -> Result<(), EngineError> {
		{
			let mut cell = lock_mutex(self.slot(slot)?);
			if cell.card.is_some() {
				return Err(EngineError::SlotOccupied(slot));
			}
			cell.card = Some(card);
			cell.epoch += 1;
			self.display.place_card(slot, card);
		}
		self.pause();
		Ok(())
	}

	/// Clears the slot and every token on it, whoever placed them.
	pub fn remove_card(&self, slot: usize) -> Option<Card> {
		let removed = {
			let mut cell = lock_mutex(self.slots.get(slot)?);
			let card = cell.card.take()?;
			cell.epoch += 1;
			let holders: Vec<PlayerId> = std::mem::take(&mut cell.tokens).into_iter().collect();
			for &player in &holders {
				if let Some(tokens) = self.player_tokens.get(player.0) {
					lock_mutex(tokens).remove(&slot);
				}
				self.display.remove_token(player, slot);
			}
			logging::table::tokens_invalidated(slot, &holders);
			self.display.remove_card(slot);
			card
		};
		self.pause();
		Some(removed)
	}

	pub fn toggle_token(&self, player: PlayerId, slot: usize) -> TokenToggle {
		let (Some(cell), Some(tokens)) = (self.slots.get(slot), self.player_tokens.get(player.0)) else {
			return TokenToggle::Rejected;
		};

		let mut cell = lock_mutex(cell);
		if cell.card.is_none() {
			return TokenToggle::Rejected;
		}
		let mut tokens = lock_mutex(tokens);

		if cell.tokens.remove(&player) {
			tokens.remove(&slot);
			self.display.remove_token(player, slot);
			TokenToggle::Removed { count: tokens.len() }
		} else if tokens.len() < self.match_size {
			cell.tokens.insert(player);
			tokens.insert(slot);
			self.display.place_token(player, slot);
			TokenToggle::Placed { count: tokens.len() }
		} else {
			TokenToggle::Rejected
		}
	}

	pub fn remove_tokens(&self, player: PlayerId, slots: &[usize]) {
		let Some(tokens) = self.player_tokens.get(player.0) else {
			return;
		};
		for &slot in slots {
			let Some(cell) = self.slots.get(slot) else {
				continue;
			};
			let mut cell = lock_mutex(cell);
			if cell.tokens.remove(&player) {
				lock_mutex(tokens).remove(&slot);
				self.display.remove_token(player, slot);
			}
		}
	}

	pub fn remove_cards_and_tokens_in_slots(&self, slots: &[usize]) -> Vec<Card> {
		slots.iter().filter_map(|&slot| self.remove_card(slot)).collect()
	}

	pub fn clear(&self) -> Vec<Card> {
		let all: Vec<usize> = (0..self.slots.len()).collect();
		self.remove_cards_and_tokens_in_slots(&all)
	}

	pub fn card_at(&self, slot: usize) -> Option<Card> {
		self.slots.get(slot).and_then(|cell| lock_mutex(cell).card)
	}

	pub fn cards(&self) -> Vec<Card> {
		self.slots.iter().filter_map(|cell| lock_mutex(cell).card).collect()
	}

	pub fn empty_slots(&self) -> Vec<usize> {
		self.slots
			.iter()
			.enumerate()
			.filter(|(_, cell)| lock_mutex(cell).card.is_none())
			.map(|(i, _)| i)
			.collect()
	}

	pub fn tokens_of(&self, player: PlayerId) -> Vec<usize> {
		self.player_tokens
			.get(player.0)
			.map(|tokens| lock_mutex(tokens).iter().copied().collect())
			.unwrap_or_default()
	}

	pub fn token_holders(&self, slot: usize) -> Vec<PlayerId> {
		self.slots
			.get(slot)
			.map(|cell| lock_mutex(cell).tokens.iter().copied().collect())
			.unwrap_or_default()
	}

	/// Snapshot of the player's full selection. `None` unless the player holds
	/// exactly `match_size` tokens, or when a token vanished between reading the
	/// selection and reading its slots.
	pub fn claim_for(&self, player: PlayerId) -> Option<Claim> {
		let slots = self.tokens_of(player);
		if slots.len() != self.match_size {
			return None;
		}
		let mut picks = Vec::with_capacity(slots.len());
		for slot in slots {
			let cell = lock_mutex(self.slots.get(slot)?);
			if !cell.tokens.contains(&player) {
				return None;
			}
			picks.push(SlotPick {
				slot,
				card: cell.card?,
				epoch: cell.epoch,
			});
		}
		Some(Claim::new(player, picks))
	}

	/// Whether the slot still holds exactly the card the pick saw.
	pub fn is_current(&self, pick: &SlotPick) -> bool {
		self.slots
			.get(pick.slot)
			.map(|cell| {
				let cell = lock_mutex(cell);
				cell.card == Some(pick.card) && cell.epoch == pick.epoch
			})
			.unwrap_or(false)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::display::NullDisplay;
	use std::thread;

	fn make_table(slots: usize, players: usize) -> Table {
		Table::new(slots, players, 3, Arc::new(NullDisplay))
	}

	#[test]
	fn test_place_and_remove_card() {
		let table = make_table(4, 1);
		table.place_card(Card(9), 2).unwrap();
		assert_eq!(table.card_at(2), Some(Card(9)));
		assert_eq!(table.empty_slots(), vec![0, 1, 3]);
		assert_eq!(table.remove_card(2), Some(Card(9)));
		assert_eq!(table.card_at(2), None);
		assert_eq!(table.remove_card(2), None);
	}

	#[test]
	fn test_place_card_on_occupied_slot_fails() {
		let table = make_table(2, 1);
		table.place_card(Card(1), 0).unwrap();
		assert!(matches!(table.place_card(Card(2), 0), Err(EngineError::SlotOccupied(0))));
		assert!(matches!(table.place_card(Card(2), 5), Err(EngineError::SlotOutOfRange(5))));
		assert_eq!(table.card_at(0), Some(Card(1)));
	}

	#[test]
	fn test_token_needs_a_card() {
		let table = make_table(3, 1);
		assert_eq!(table.toggle_token(PlayerId(0), 1), TokenToggle::Rejected);
		table.place_card(Card(4), 1).unwrap();
		assert_eq!(table.toggle_token(PlayerId(0), 1), TokenToggle::Placed { count: 1 });
		assert_eq!(table.toggle_token(PlayerId(0), 1), TokenToggle::Removed { count: 0 });
	}

	#[test]
	fn test_token_count_capped_at_match_size() {
		let table = make_table(5, 1);
		for slot in 0..5 {
			table.place_card(Card(slot as u32), slot).unwrap();
		}
		let p = PlayerId(0);
		assert_eq!(table.toggle_token(p, 0), TokenToggle::Placed { count: 1 });
		assert_eq!(table.toggle_token(p, 1), TokenToggle::Placed { count: 2 });
		assert_eq!(table.toggle_token(p, 2), TokenToggle::Placed { count: 3 });
		assert_eq!(table.toggle_token(p, 3), TokenToggle::Rejected);
		assert_eq!(table.tokens_of(p), vec![0, 1, 2]);
	}

	#[test]
	fn test_remove_card_clears_every_players_token() {
		let table = make_table(2, 3);
		table.place_card(Card(7), 0).unwrap();
		for p in 0..3 {
			table.toggle_token(PlayerId(p), 0);
		}
		assert_eq!(table.token_holders(0).len(), 3);

		table.remove_card(0);
		assert!(table.token_holders(0).is_empty());
		for p in 0..3 {
			assert!(table.tokens_of(PlayerId(p)).is_empty());
		}
	}

	#[test]
	fn test_remove_tokens_only_touches_that_player() {
		let table = make_table(3, 2);
		for slot in 0..3 {
			table.place_card(Card(slot as u32), slot).unwrap();
			table.toggle_token(PlayerId(0), slot);
			table.toggle_token(PlayerId(1), slot);
		}
		table.remove_tokens(PlayerId(0), &[0, 2]);
		assert_eq!(table.tokens_of(PlayerId(0)), vec![1]);
		assert_eq!(table.tokens_of(PlayerId(1)), vec![0, 1, 2]);
	}

	#[test]
	fn test_claim_snapshot_and_staleness() {
		let table = make_table(4, 1);
		for slot in 0..4 {
			table.place_card(Card(10 + slot as u32), slot).unwrap();
		}
		let p = PlayerId(0);
		table.toggle_token(p, 0);
		table.toggle_token(p, 2);
		table.toggle_token(p, 3);

		let claim = table.claim_for(p).unwrap();
		assert_eq!(claim.slots(), vec![0, 2, 3]);
		assert_eq!(claim.cards(), vec![Card(10), Card(12), Card(13)]);
		assert!(claim.picks().iter().all(|pick| table.is_current(pick)));

		// same card dealt back into the same slot is still a different slot state
		let card = table.remove_card(2).unwrap();
		table.place_card(card, 2).unwrap();
		assert!(!table.is_current(&claim.picks()[1]));
		assert!(table.is_current(&claim.picks()[0]));
	}

	#[test]
	fn test_no_claim_once_a_token_is_swept_away() {
		let table = make_table(4, 1);
		for slot in 0..4 {
			table.place_card(Card(slot as u32), slot).unwrap();
		}
		let p = PlayerId(0);
		for slot in 0..3 {
			table.toggle_token(p, slot);
		}
		assert!(table.claim_for(p).is_some());

		table.remove_card(1);
		assert_eq!(table.tokens_of(p), vec![0, 2]);
		assert!(table.claim_for(p).is_none());
	}

	#[test]
	fn test_clear_returns_every_card() {
		let table = make_table(4, 1);
		table.place_card(Card(1), 0).unwrap();
		table.place_card(Card(2), 3).unwrap();
		let mut cards = table.clear();
		cards.sort();
		assert_eq!(cards, vec![Card(1), Card(2)]);
		assert_eq!(table.empty_slots().len(), 4);
	}

	#[test]
	fn test_concurrent_toggles_lose_no_updates() {
		let players = 4;
		let table = Arc::new(Table::new(12, players, 12, Arc::new(NullDisplay)));
		for slot in 0..12 {
			table.place_card(Card(slot as u32), slot).unwrap();
		}

		// each player owns three disjoint slots and toggles slot i (i + 1) times
		let handles: Vec<_> = (0..players)
			.map(|p| {
				let table = Arc::clone(&table);
				thread::spawn(move || {
					for i in 0..3 {
						let slot = p * 3 + i;
						for _ in 0..(i + 1) * 101 {
							table.toggle_token(PlayerId(p), slot);
						}
					}
				})
			})
			.collect();
		for h in handles {
			h.join().unwrap();
		}

		for p in 0..players {
			// 101 and 303 toggles leave a token, 202 does not
			assert_eq!(table.tokens_of(PlayerId(p)), vec![p * 3, p * 3 + 2]);
			assert_eq!(table.token_holders(p * 3 + 1), vec![]);
		}
	}

	#[test]
	fn test_toggle_races_card_removal_without_orphan_tokens() {
		let table = Arc::new(Table::new(1, 2, 3, Arc::new(NullDisplay)));
		let dealer = {
			let table = Arc::clone(&table);
			thread::spawn(move || {
				for round in 0..500u32 {
					let _ = table.place_card(Card(round), 0);
					table.remove_card(0);
				}
			})
		};
		let player = {
			let table = Arc::clone(&table);
			thread::spawn(move || {
				for _ in 0..2000 {
					table.toggle_token(PlayerId(1), 0);
				}
			})
		};
		dealer.join().unwrap();
		player.join().unwrap();

		assert_eq!(table.card_at(0), None);
		assert!(table.token_holders(0).is_empty());
		assert!(table.tokens_of(PlayerId(1)).is_empty());
	}
}
