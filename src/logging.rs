use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use crate::error::EngineError;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

fn log_file_name() -> String {
	format!("set-{}.log", chrono::Local::now().format("%Y-%m-%d"))
}

/// Installs the file logger under `dir`. Later calls return the path of the
/// logger already installed.
pub fn init(dir: impl AsRef<Path>, level: LevelFilter) -> Result<PathBuf, EngineError> {
	if let Some(path) = LOG_PATH.get() {
		return Ok(path.clone());
	}

	let dir = dir.as_ref();
	fs::create_dir_all(dir).map_err(|e| EngineError::Log(format!("{}: {}", dir.display(), e)))?;
	let path = dir.join(log_file_name());
	let file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(&path)
		.map_err(|e| EngineError::Log(format!("{}: {}", path.display(), e)))?;

	let config = ConfigBuilder::new()
		.set_thread_level(LevelFilter::Off)
		.set_target_level(LevelFilter::Error)
		.build();
	WriteLogger::init(level, config, file).map_err(|e| EngineError::Log(e.to_string()))?;

	Ok(LOG_PATH.get_or_init(|| path).clone())
}

pub mod dealer {
	use crate::cards::{Card, PlayerId};
	use crate::engine::ClaimOutcome;

	pub fn dealt(slot: usize, card: Card) {
		log::debug!(target: "dealer", "dealt {} to slot {}", card, slot);
	}

	pub fn round_started(on_table: usize, in_deck: usize) {
		log::info!(target: "dealer", "round started table={} deck={}", on_table, in_deck);
	}

	pub fn claim_resolved(player: PlayerId, slots: &[usize], outcome: ClaimOutcome) {
		log::info!(target: "dealer", "{} claim {:?} -> {:?}", player, slots, outcome);
	}

	pub fn reshuffle(reason: &str, deck_size: usize) {
		log::info!(target: "dealer", "full reshuffle ({}) deck={}", reason, deck_size);
	}

	pub fn hint(cards: &[Card]) {
		let cards: Vec<String> = cards.iter().map(|c| c.to_string()).collect();
		log::info!(target: "dealer", "hint: {}", cards.join(" "));
	}

	pub fn game_ended(reason: &str, winners: &[PlayerId]) {
		log::info!(target: "dealer", "game ended: {} winners={:?}", reason, winners);
	}

	pub fn error(msg: &str) {
		log::error!(target: "dealer", "{}", msg);
	}
}

pub mod player {
	use crate::cards::PlayerId;

	pub fn started(player: PlayerId) {
		log::info!(target: "player", "{} started", player);
	}

	pub fn claimed(player: PlayerId, slots: &[usize]) {
		log::debug!(target: "player", "{} claims {:?}", player, slots);
	}

	pub fn frozen(player: PlayerId, millis: u64) {
		log::debug!(target: "player", "{} frozen for {}ms", player, millis);
	}

	pub fn stopped(player: PlayerId, why: &str) {
		log::info!(target: "player", "{} stopped: {}", player, why);
	}
}

pub mod table {
	use crate::cards::PlayerId;

	pub fn tokens_invalidated(slot: usize, players: &[PlayerId]) {
		if !players.is_empty() {
			log::debug!(target: "table", "slot {} cleared tokens of {:?}", slot, players);
		}
	}
}
