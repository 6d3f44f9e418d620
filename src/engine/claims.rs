use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, oneshot};
use tokio::time::{Instant, sleep_until};

use crate::cards::{Card, PlayerId};
use crate::error::EngineError;
use crate::engine::lock_mutex;

/// One slot of a claim as it looked when the claim was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPick {
	pub slot: usize,
	pub card: Card,
	pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
	player: PlayerId,
	picks: Vec<SlotPick>,
}

impl Claim {
	pub fn new(player: PlayerId, picks: Vec<SlotPick>) -> Self {
		Self { player, picks }
	}

	pub fn player(&self) -> PlayerId {
		self.player
	}

	pub fn picks(&self) -> &[SlotPick] {
		&self.picks
	}

	pub fn slots(&self) -> Vec<usize> {
		self.picks.iter().map(|p| p.slot).collect()
	}

	pub fn cards(&self) -> Vec<Card> {
		self.picks.iter().map(|p| p.card).collect()
	}

	pub fn overlaps(&self, slots: &[usize]) -> bool {
		self.picks.iter().any(|p| slots.contains(&p.slot))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimOutcome {
	Point,
	Penalty,
	/// The slots changed after the claim was made. No score effect.
	Stale,
	/// The game stopped before the claim was looked at.
	Cancelled,
}

pub struct PendingClaim {
	claim: Claim,
	reply: oneshot::Sender<ClaimOutcome>,
}

impl PendingClaim {
	pub fn claim(&self) -> &Claim {
		&self.claim
	}

	/// Wakes the submitting agent. An agent that already left is ignored.
	pub fn resolve(self, outcome: ClaimOutcome) -> Claim {
		let _ = self.reply.send(outcome);
		self.claim
	}
}

/// The submitter's side of a claim. Dropping the dealer's side reads as
/// `Cancelled`, so a ticket never waits forever on a dead game.
pub struct ClaimTicket {
	rx: oneshot::Receiver<ClaimOutcome>,
}

impl ClaimTicket {
	pub async fn outcome(self) -> ClaimOutcome {
		self.rx.await.unwrap_or(ClaimOutcome::Cancelled)
	}

	pub fn blocking_outcome(self) -> ClaimOutcome {
		self.rx.blocking_recv().unwrap_or(ClaimOutcome::Cancelled)
	}

	pub fn try_outcome(&mut self) -> Option<ClaimOutcome> {
		match self.rx.try_recv() {
			Ok(outcome) => Some(outcome),
			Err(oneshot::error::TryRecvError::Empty) => None,
			Err(oneshot::error::TryRecvError::Closed) => Some(ClaimOutcome::Cancelled),
		}
	}
}

#[derive(Default)]
struct QueueState {
	pending: VecDeque<PendingClaim>,
	closed: bool,
}

/// Global FIFO of claims. Many agents submit, only the dealer takes.
#[derive(Default)]
pub struct ClaimQueue {
	state: Mutex<QueueState>,
	notify: Notify,
}

impl ClaimQueue {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn submit(&self, claim: Claim) -> Result<ClaimTicket, EngineError> {
		let (reply, rx) = oneshot::channel();
		{
			let mut state = lock_mutex(&self.state);
			if state.closed {
				return Err(EngineError::QueueClosed);
			}
			debug_assert!(
				state.pending.iter().all(|p| p.claim.player != claim.player),
				"{} already has a claim pending",
				claim.player
			);
			state.pending.push_back(PendingClaim { claim, reply });
		}
		self.notify.notify_one();
		Ok(ClaimTicket { rx })
	}

	pub fn drain_next(&self) -> Option<PendingClaim> {
		lock_mutex(&self.state).pending.pop_front()
	}

	pub fn len(&self) -> usize {
		lock_mutex(&self.state).pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn is_closed(&self) -> bool {
		lock_mutex(&self.state).closed
	}

	/// Pulls every pending claim touching any of `slots`, keeping the order of
	/// the rest.
	pub fn take_overlapping(&self, slots: &[usize]) -> Vec<PendingClaim> {
		let mut state = lock_mutex(&self.state);
		let (hit, keep): (VecDeque<_>, VecDeque<_>) = std::mem::take(&mut state.pending)
			.into_iter()
			.partition(|p| p.claim.overlaps(slots));
		state.pending = keep;
		hit.into()
	}

	pub fn take_all(&self) -> Vec<PendingClaim> {
		lock_mutex(&self.state).pending.drain(..).collect()
	}

	/// Refuses further submissions and hands back whatever was still waiting.
	pub fn close(&self) -> Vec<PendingClaim> {
		let drained = {
			let mut state = lock_mutex(&self.state);
			state.closed = true;
			state.pending.drain(..).collect()
		};
		self.notify.notify_one();
		drained
	}

	/// Returns as soon as a claim is pending, or at `deadline`.
	pub async fn wait_until(&self, deadline: Instant) {
		if !self.is_empty() {
			return;
		}
		tokio::select! {
			_ = self.notify.notified() => {}
			_ = sleep_until(deadline) => {}
		}
	}
}
