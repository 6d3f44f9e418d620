use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::cards::PlayerId;
use crate::engine::{ClaimOutcome, ClaimQueue, stopped};
use crate::logging;
use crate::players::SlotInput;
use crate::table::{Table, TokenToggle};

/// One player. Turns presses into token toggles and, once it holds a full
/// selection, claims it and waits for the dealer's answer.
pub struct PlayerAgent {
	id: PlayerId,
	input: Box<dyn SlotInput>,
	table: Arc<Table>,
	queue: Arc<ClaimQueue>,
	stop: watch::Receiver<bool>,
	point_freeze: Duration,
	penalty_freeze: Duration,
}

enum Flow {
	Continue,
	Exit(&'static str),
}

impl PlayerAgent {
	pub fn new(
		id: PlayerId,
		input: Box<dyn SlotInput>,
		table: Arc<Table>,
		queue: Arc<ClaimQueue>,
		stop: watch::Receiver<bool>,
	) -> Self {
		Self {
			id,
			input,
			table,
			queue,
			stop,
			point_freeze: Duration::ZERO,
			penalty_freeze: Duration::ZERO,
		}
	}

	pub fn with_freezes(mut self, point: Duration, penalty: Duration) -> Self {
		self.point_freeze = point;
		self.penalty_freeze = penalty;
		self
	}

	pub async fn run(mut self) {
		logging::player::started(self.id);

		let why = loop {
			let press = tokio::select! {
				_ = stopped(&mut self.stop) => break "stop signal",
				press = self.input.next_press() => press,
			};
			let Some(slot) = press else {
				break "input closed";
			};

			if let TokenToggle::Placed { count } = self.table.toggle_token(self.id, slot) {
				if count >= self.table.match_size() {
					if let Flow::Exit(why) = self.claim().await {
						break why;
					}
				}
			}
		};

		logging::player::stopped(self.id, why);
	}

	async fn claim(&mut self) -> Flow {
		let Some(claim) = self.table.claim_for(self.id) else {
			return Flow::Continue;
		};
		logging::player::claimed(self.id, &claim.slots());

		let Ok(ticket) = self.queue.submit(claim) else {
			return Flow::Exit("game over");
		};
		let outcome = tokio::select! {
			_ = stopped(&mut self.stop) => return Flow::Exit("stop signal"),
			outcome = ticket.outcome() => outcome,
		};

		match outcome {
			ClaimOutcome::Point => self.freeze(self.point_freeze).await,
			ClaimOutcome::Penalty => self.freeze(self.penalty_freeze).await,
			ClaimOutcome::Stale => Flow::Continue,
			ClaimOutcome::Cancelled => Flow::Exit("claim cancelled"),
		}
	}

	async fn freeze(&mut self, duration: Duration) -> Flow {
		if duration.is_zero() {
			return Flow::Continue;
		}
		logging::player::frozen(self.id, duration.as_millis() as u64);
		tokio::select! {
			_ = stopped(&mut self.stop) => return Flow::Exit("stop signal"),
			_ = tokio::time::sleep(duration) => {}
		}
		self.input.discard_pending();
		Flow::Continue
	}
}
