use std::sync::Arc;
use std::sync::mpsc;

use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::cards::PlayerId;
use crate::config::GameConfig;
use crate::display::{ChannelDisplay, Display};
use crate::engine::claims::ClaimQueue;
use crate::engine::dealer::{Dealer, GameSummary};
use crate::events::GameEvent;
use crate::logging;
use crate::players::{ChannelInput, ComputerInput, InputHandle, PlayerAgent, SlotInput};
use crate::rules::SetRules;
use crate::table::Table;

/// Collects players, then builds the table and runs the game to the end.
pub struct GameSession {
	config: GameConfig,
	rules: Arc<dyn SetRules>,
	display: Arc<dyn Display>,
	inputs: Vec<Box<dyn SlotInput>>,
	runtime: Handle,
	stop_signal: Arc<watch::Sender<bool>>,
}

pub struct GameHandle {
	pub event_rx: mpsc::Receiver<GameEvent>,
	pub stop_signal: Arc<watch::Sender<bool>>,
}

impl GameHandle {
	/// Asks the game to end. Blocked players are released with a cancelled
	/// claim and the dealer announces winners as usual.
	pub fn stop(&self) {
		self.stop_signal.send_replace(true);
	}
}

impl GameSession {
	pub fn new(config: GameConfig, rules: Arc<dyn SetRules>, runtime: Handle) -> (Self, GameHandle) {
		let (event_tx, event_rx) = mpsc::channel();
		let (stop_tx, _) = watch::channel(false);
		let stop_signal = Arc::new(stop_tx);

		let session = Self {
			config,
			rules,
			display: Arc::new(ChannelDisplay::new(event_tx)),
			inputs: Vec::new(),
			runtime,
			stop_signal: Arc::clone(&stop_signal),
		};
		let handle = GameHandle {
			event_rx,
			stop_signal,
		};

		(session, handle)
	}

	pub fn config(&self) -> &GameConfig {
		&self.config
	}

	pub fn add_player(&mut self, input: Box<dyn SlotInput>) -> PlayerId {
		self.inputs.push(input);
		PlayerId(self.inputs.len() - 1)
	}

	/// One channel-driven player per configured human, buffered to a single
	/// selection's worth of presses.
	pub fn add_human_players(&mut self) -> Vec<(PlayerId, InputHandle)> {
		(0..self.config.human_players)
			.map(|_| {
				let (input, handle) = ChannelInput::new(self.config.feature_size);
				(self.add_player(Box::new(input)), handle)
			})
			.collect()
	}

	pub fn add_computer_players(&mut self) -> Vec<PlayerId> {
		(0..self.config.computer_players)
			.map(|i| {
				let seed = self.config.seed.map(|s| s.wrapping_add(1 + i as u64));
				let input = ComputerInput::new(self.config.slot_count(), self.config.computer_delay(), seed);
				self.add_player(Box::new(input))
			})
			.collect()
	}

	/// Plays the game on the calling thread. Must not be called from inside
	/// the tokio runtime.
	pub fn run(self) -> GameSummary {
		if self.rules.set_size() != self.config.feature_size {
			logging::dealer::error(&format!(
				"rules expect sets of {} but feature_size is {}",
				self.rules.set_size(),
				self.config.feature_size
			));
		}

		let table = Arc::new(
			Table::new(
				self.config.slot_count(),
				self.inputs.len(),
				self.config.feature_size,
				Arc::clone(&self.display),
			)
			.with_delay(self.config.table_delay()),
		);
		let queue = Arc::new(ClaimQueue::new());

		let mut dealer = Dealer::new(
			&self.config,
			Arc::clone(&table),
			Arc::clone(&queue),
			Arc::clone(&self.rules),
			Arc::clone(&self.display),
			self.runtime.clone(),
			Arc::clone(&self.stop_signal),
		);

		let agents = self
			.inputs
			.into_iter()
			.enumerate()
			.map(|(i, input)| {
				let agent = PlayerAgent::new(
					PlayerId(i),
					input,
					Arc::clone(&table),
					Arc::clone(&queue),
					self.stop_signal.subscribe(),
				)
				.with_freezes(self.config.point_freeze(), self.config.penalty_freeze());
				self.runtime.spawn(agent.run())
			})
			.collect();
		dealer.set_agents(agents);

		dealer.run()
	}
}
