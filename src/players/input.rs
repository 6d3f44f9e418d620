use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

/// Where a player's slot presses come from.
#[async_trait]
pub trait SlotInput: Send {
	/// The next pressed slot, or `None` once the source has closed.
	async fn next_press(&mut self) -> Option<usize>;

	/// Drops presses that piled up while the player could not act.
	fn discard_pending(&mut self) {}
}

/// Presses pushed in from outside, e.g. a keyboard handler. Holds at most
/// `capacity` presses; more are dropped.
pub struct ChannelInput {
	press_rx: mpsc::Receiver<usize>,
}

#[derive(Clone)]
pub struct InputHandle {
	press_tx: mpsc::Sender<usize>,
}

impl ChannelInput {
	pub fn new(capacity: usize) -> (Self, InputHandle) {
		let (press_tx, press_rx) = mpsc::channel(capacity.max(1));
		(Self { press_rx }, InputHandle { press_tx })
	}
}

impl InputHandle {
	/// False when the press was dropped because the buffer is full or the
	/// player is gone.
	pub fn press(&self, slot: usize) -> bool {
		self.press_tx.try_send(slot).is_ok()
	}
}

#[async_trait]
impl SlotInput for ChannelInput {
	async fn next_press(&mut self) -> Option<usize> {
		self.press_rx.recv().await
	}

	fn discard_pending(&mut self) {
		while self.press_rx.try_recv().is_ok() {}
	}
}

/// A computer player: presses a random slot every `delay`.
pub struct ComputerInput {
	slots: usize,
	delay: Duration,
	rng: StdRng,
}

impl ComputerInput {
	pub fn new(slots: usize, delay: Duration, seed: Option<u64>) -> Self {
		let rng = match seed {
			Some(s) => StdRng::seed_from_u64(s),
			None => StdRng::from_os_rng(),
		};
		Self { slots, delay, rng }
	}
}

#[async_trait]
impl SlotInput for ComputerInput {
	async fn next_press(&mut self) -> Option<usize> {
		if self.slots == 0 {
			return None;
		}
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}
		Some(self.rng.random_range(0..self.slots))
	}
}
