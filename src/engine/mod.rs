mod claims;
mod clock;
mod dealer;
mod session;

pub use claims::{Claim, ClaimOutcome, ClaimQueue, ClaimTicket, PendingClaim, SlotPick};
pub use clock::{Countdown, GameClock};
pub use dealer::{Dealer, GameSummary};
pub use session::{GameHandle, GameSession};

use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

/// Locks through poisoning; a panicked holder leaves the data as it was.
pub(crate) fn lock_mutex<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Resolves once the stop flag is raised or its sender is gone.
pub async fn stopped(stop: &mut watch::Receiver<bool>) {
	let _ = stop.wait_for(|s| *s).await;
}
