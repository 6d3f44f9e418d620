use std::time::{Duration, Instant};

/// Display refresh rate inside the warning window.
const WARNING_TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
	pub remaining: Duration,
	pub warning: bool,
}

/// The reshuffle deadline. Only the dealer holds one; everyone else sees
/// `Countdown` snapshots.
#[derive(Debug, Clone)]
pub struct GameClock {
	timeout: Duration,
	warning: Duration,
	tick: Duration,
	deadline: Instant,
}

impl GameClock {
	pub fn new(timeout: Duration, warning: Duration, tick: Duration) -> Self {
		Self {
			timeout,
			warning,
			tick,
			deadline: Instant::now() + timeout,
		}
	}

	pub fn reset(&mut self, now: Instant) {
		self.deadline = now + self.timeout;
	}

	pub fn deadline(&self) -> Instant {
		self.deadline
	}

	pub fn remaining(&self, now: Instant) -> Duration {
		self.deadline.saturating_duration_since(now)
	}

	pub fn expired(&self, now: Instant) -> bool {
		now >= self.deadline
	}

	pub fn snapshot(&self, now: Instant) -> Countdown {
		let remaining = self.remaining(now);
		Countdown {
			remaining,
			warning: remaining < self.warning,
		}
	}

	/// When the dealer should next look up: the next display tick, never past
	/// the deadline.
	pub fn next_wake(&self, now: Instant) -> Instant {
		let tick = if self.snapshot(now).warning {
			WARNING_TICK.min(self.tick)
		} else {
			self.tick
		};
		(now + tick).min(self.deadline)
	}
}
