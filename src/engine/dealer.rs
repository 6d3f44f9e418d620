use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cards::{Deck, PlayerId};
use crate::config::GameConfig;
use crate::display::Display;
use crate::engine::claims::{ClaimOutcome, ClaimQueue, PendingClaim};
use crate::engine::clock::GameClock;
use crate::engine::stopped;
use crate::events::GameEndReason;
use crate::logging;
use crate::rules::SetRules;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
	pub reason: GameEndReason,
	pub scores: Vec<u32>,
	pub winners: Vec<PlayerId>,
}

/// Owns the deck, the scores and the clock, and is the only thing that puts
/// cards on or takes cards off the table.
pub struct Dealer {
	config: GameConfig,
	table: Arc<Table>,
	queue: Arc<ClaimQueue>,
	rules: Arc<dyn SetRules>,
	display: Arc<dyn Display>,
	deck: Deck,
	scores: Vec<u32>,
	clock: GameClock,
	rng: StdRng,
	runtime: Handle,
	stop_tx: Arc<watch::Sender<bool>>,
	stop_rx: watch::Receiver<bool>,
	agents: Vec<JoinHandle<()>>,
}

impl Dealer {
	pub fn new(
		config: &GameConfig,
		table: Arc<Table>,
		queue: Arc<ClaimQueue>,
		rules: Arc<dyn SetRules>,
		display: Arc<dyn Display>,
		runtime: Handle,
		stop_tx: Arc<watch::Sender<bool>>,
	) -> Self {
		let rng = match config.seed {
			Some(s) => StdRng::seed_from_u64(s),
			None => StdRng::from_os_rng(),
		};
		let stop_rx = stop_tx.subscribe();

		Self {
			config: config.clone(),
			deck: Deck::full(config.deck_size),
			scores: vec![0; table.player_count()],
			clock: GameClock::new(
				config.turn_timeout(),
				config.turn_timeout_warning(),
				config.countdown_tick(),
			),
			table,
			queue,
			rules,
			display,
			rng,
			runtime,
			stop_tx,
			stop_rx,
			agents: Vec::new(),
		}
	}

	/// Agent tasks to join, in creation order, when the game ends.
	pub fn set_agents(&mut self, agents: Vec<JoinHandle<()>>) {
		self.agents = agents;
	}

	pub fn deck(&self) -> &Deck {
		&self.deck
	}

	pub fn scores(&self) -> &[u32] {
		&self.scores
	}

	pub fn run(&mut self) -> GameSummary {
		let players: Vec<PlayerId> = (0..self.scores.len()).map(PlayerId).collect();
		self.display.game_started(&players, self.table.slot_count(), self.deck.len());

		while !self.should_finish() {
			self.place_cards_on_table();
			self.timer_loop();
			if self.is_stopped() {
				break;
			}
			self.reshuffle_table("round over");
		}

		self.terminate()
	}

	fn is_stopped(&self) -> bool {
		*self.stop_rx.borrow()
	}

	fn timer_loop(&mut self) {
		while !self.is_stopped() && !self.clock.expired(Instant::now()) {
			self.sleep_until_woken_or_timeout();
			if self.is_stopped() {
				break;
			}
			self.update_countdown();
			self.resolve_pending_claims();
			if !self.any_set_left() {
				break;
			}
		}
	}

	fn sleep_until_woken_or_timeout(&mut self) {
		let wake_at = tokio::time::Instant::from_std(self.clock.next_wake(Instant::now()));
		let queue = Arc::clone(&self.queue);
		let stop_rx = &mut self.stop_rx;
		self.runtime.block_on(async move {
			tokio::select! {
				_ = stopped(stop_rx) => {}
				_ = queue.wait_until(wake_at) => {}
			}
		})
	}

	fn update_countdown(&self) {
		let countdown = self.clock.snapshot(Instant::now());
		self.display.set_countdown(countdown.remaining, countdown.warning);
	}

	fn reset_countdown(&mut self) {
		self.clock.reset(Instant::now());
		self.update_countdown();
	}

	fn should_finish(&self) -> bool {
		self.is_stopped() || !self.any_set_left()
	}

	/// Sets are searched over the table and the deck together.
	pub fn any_set_left(&self) -> bool {
		let mut cards = self.table.cards();
		cards.extend_from_slice(self.deck.cards());
		self.rules.any_set_exists(&cards)
	}

	pub fn place_cards_on_table(&mut self) {
		let empty = self.table.empty_slots();
		self.place_cards(&empty);
		logging::dealer::round_started(self.table.cards().len(), self.deck.len());
	}

	fn place_cards(&mut self, slots: &[usize]) {
		for &slot in slots {
			if self.table.card_at(slot).is_some() {
				continue;
			}
			let Some(card) = self.deck.draw(&mut self.rng) else {
				break;
			};
			match self.table.place_card(card, slot) {
				Ok(()) => logging::dealer::dealt(slot, card),
				Err(e) => {
					logging::dealer::error(&e.to_string());
					self.deck.put_back(card);
				}
			}
		}
		self.reset_countdown();

		if self.config.hints {
			for set in self.rules.find_sets(&self.table.cards(), usize::MAX) {
				logging::dealer::hint(&set);
			}
		}
	}

	/// Resolves every claim waiting right now, oldest first.
	pub fn resolve_pending_claims(&mut self) {
		while let Some(pending) = self.queue.drain_next() {
			self.resolve(pending);
			if self.is_stopped() {
				break;
			}
		}
	}

	fn resolve(&mut self, pending: PendingClaim) {
		let claim = pending.claim();
		let player = claim.player();

		if claim.picks().len() != self.table.match_size()
			|| !claim.picks().iter().all(|pick| self.table.is_current(pick))
		{
			self.finish(pending, ClaimOutcome::Stale);
			return;
		}

		if !self.rules.is_valid_set(&claim.cards()) {
			let freeze = self.config.penalty_freeze();
			self.display.set_freeze(player, freeze);
			self.finish(pending, ClaimOutcome::Penalty);
			return;
		}

		let slots = claim.slots();
		if let Some(score) = self.scores.get_mut(player.0) {
			*score += 1;
			self.display.set_score(player, *score);
		}
		self.table.remove_tokens(player, &slots);
		let overlapping = self.queue.take_overlapping(&slots);

		self.table.remove_cards_and_tokens_in_slots(&slots);
		self.place_cards(&slots);

		let freeze = self.config.point_freeze();
		if !freeze.is_zero() {
			self.display.set_freeze(player, freeze);
		}
		self.finish(pending, ClaimOutcome::Point);

		for other in overlapping {
			self.finish(other, ClaimOutcome::Stale);
		}
	}

	fn finish(&self, pending: PendingClaim, outcome: ClaimOutcome) {
		let claim = pending.resolve(outcome);
		let slots = claim.slots();
		logging::dealer::claim_resolved(claim.player(), &slots, outcome);
		self.display.claim_resolved(claim.player(), &slots, outcome);
	}

	/// Everything on the table goes back to the deck; claims still waiting
	/// point at cards that are gone.
	pub fn reshuffle_table(&mut self, reason: &str) {
		for card in self.table.clear() {
			self.deck.put_back(card);
		}
		for pending in self.queue.take_all() {
			self.finish(pending, ClaimOutcome::Stale);
		}
		logging::dealer::reshuffle(reason, self.deck.len());
		self.display.table_reshuffled(self.deck.len());
	}

	fn terminate(&mut self) -> GameSummary {
		for pending in self.queue.close() {
			self.finish(pending, ClaimOutcome::Cancelled);
		}
		self.stop_tx.send_replace(true);
		for agent in self.agents.drain(..).rev() {
			let _ = self.runtime.block_on(agent);
		}

		let reason = if self.any_set_left() {
			GameEndReason::Stopped
		} else {
			GameEndReason::NoSetsLeft
		};
		let winners = winners(&self.scores);
		logging::dealer::game_ended(&format!("{:?}", reason), &winners);
		self.display.announce_winners(&winners, reason);

		GameSummary {
			reason,
			scores: self.scores.clone(),
			winners,
		}
	}

	#[cfg(test)]
	fn cards_in_play(&self) -> Vec<crate::cards::Card> {
		let mut cards = self.table.cards();
		cards.extend_from_slice(self.deck.cards());
		cards
	}
}

/// Every player tied at the top score.
pub fn winners(scores: &[u32]) -> Vec<PlayerId> {
	let Some(&best) = scores.iter().max() else {
		return Vec::new();
	};
	scores
		.iter()
		.enumerate()
		.filter(|&(_, &s)| s == best)
		.map(|(i, _)| PlayerId(i))
		.collect()
}
