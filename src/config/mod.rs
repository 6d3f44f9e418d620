use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "game.toml";

fn config_paths(filename: &str) -> Vec<PathBuf> {
	let mut paths = Vec::new();

	if let Some(user_config) = dirs::config_dir() {
		paths.push(user_config.join("set-arbiter").join(filename));
	}

	paths.push(PathBuf::from("config").join(filename));

	paths
}

fn find_config(filename: &str) -> Option<PathBuf> {
	config_paths(filename).into_iter().find(|p| p.exists())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
	#[serde(default = "default_rows")]
	pub rows: usize,
	#[serde(default = "default_columns")]
	pub columns: usize,
	#[serde(default = "default_deck_size")]
	pub deck_size: u32,
	/// Cards per set.
	#[serde(default = "default_feature_size")]
	pub feature_size: usize,
	#[serde(default = "default_feature_count")]
	pub feature_count: u32,

	#[serde(default)]
	pub human_players: usize,
	#[serde(default = "default_computer_players")]
	pub computer_players: usize,

	#[serde(default = "default_turn_timeout")]
	pub turn_timeout_ms: u64,
	#[serde(default = "default_turn_timeout_warning")]
	pub turn_timeout_warning_ms: u64,
	#[serde(default = "default_countdown_tick")]
	pub countdown_tick_ms: u64,
	#[serde(default)]
	pub table_delay_ms: u64,
	#[serde(default = "default_computer_delay")]
	pub computer_delay_ms: u64,
	#[serde(default = "default_point_freeze")]
	pub point_freeze_ms: u64,
	#[serde(default = "default_penalty_freeze")]
	pub penalty_freeze_ms: u64,

	#[serde(default)]
	pub hints: bool,
	#[serde(default)]
	pub seed: Option<u64>,
}

fn default_rows() -> usize { 3 }
fn default_columns() -> usize { 4 }
fn default_deck_size() -> u32 { 81 }
fn default_feature_size() -> usize { 3 }
fn default_feature_count() -> u32 { 4 }
fn default_computer_players() -> usize { 2 }
fn default_turn_timeout() -> u64 { 60_000 }
fn default_turn_timeout_warning() -> u64 { 5_000 }
fn default_countdown_tick() -> u64 { 1_000 }
fn default_computer_delay() -> u64 { 100 }
fn default_point_freeze() -> u64 { 1_000 }
fn default_penalty_freeze() -> u64 { 3_000 }

impl Default for GameConfig {
	fn default() -> Self {
		Self {
			rows: default_rows(),
			columns: default_columns(),
			deck_size: default_deck_size(),
			feature_size: default_feature_size(),
			feature_count: default_feature_count(),
			human_players: 0,
			computer_players: default_computer_players(),
			turn_timeout_ms: default_turn_timeout(),
			turn_timeout_warning_ms: default_turn_timeout_warning(),
			countdown_tick_ms: default_countdown_tick(),
			table_delay_ms: 0,
			computer_delay_ms: default_computer_delay(),
			point_freeze_ms: default_point_freeze(),
			penalty_freeze_ms: default_penalty_freeze(),
			hints: false,
			seed: None,
		}
	}
}

impl GameConfig {
	pub fn slot_count(&self) -> usize {
		self.rows * self.columns
	}

	pub fn player_count(&self) -> usize {
		self.human_players + self.computer_players
	}

	pub fn turn_timeout(&self) -> Duration {
		Duration::from_millis(self.turn_timeout_ms)
	}

	pub fn turn_timeout_warning(&self) -> Duration {
		Duration::from_millis(self.turn_timeout_warning_ms)
	}

	pub fn countdown_tick(&self) -> Duration {
		Duration::from_millis(self.countdown_tick_ms.max(1))
	}

	pub fn table_delay(&self) -> Duration {
		Duration::from_millis(self.table_delay_ms)
	}

	pub fn computer_delay(&self) -> Duration {
		Duration::from_millis(self.computer_delay_ms)
	}

	pub fn point_freeze(&self) -> Duration {
		Duration::from_millis(self.point_freeze_ms)
	}

	pub fn penalty_freeze(&self) -> Duration {
		Duration::from_millis(self.penalty_freeze_ms)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		let invalid = |msg: String| Err(ConfigError::Invalid(msg));

		if self.slot_count() == 0 {
			return invalid(format!("grid {}x{} has no slots", self.rows, self.columns));
		}
		if self.deck_size == 0 {
			return invalid("deck_size must be positive".to_string());
		}
		if self.feature_size < 2 {
			return invalid(format!("feature_size {} is below 2", self.feature_size));
		}
		if self.feature_size > self.slot_count() {
			return invalid(format!(
				"feature_size {} does not fit on {} slots",
				self.feature_size,
				self.slot_count()
			));
		}
		if self.turn_timeout_warning_ms > self.turn_timeout_ms {
			return invalid(format!(
				"warning window {}ms is longer than the turn timeout {}ms",
				self.turn_timeout_warning_ms, self.turn_timeout_ms
			));
		}
		if self.player_count() == 0 {
			return invalid("at least one player is needed".to_string());
		}
		Ok(())
	}
}

pub fn resolve_config(filename: &str) -> Option<PathBuf> {
	find_config(filename)
}

pub fn parse_config(content: &str) -> Result<GameConfig, ConfigError> {
	let config: GameConfig = toml::from_str(content)?;
	config.validate()?;
	Ok(config)
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GameConfig, ConfigError> {
	let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
		path: path.as_ref().to_path_buf(),
		source,
	})?;
	parse_config(&content)
}

/// The first `game.toml` on the search path, or the built-in defaults.
pub fn load_config_auto() -> Result<GameConfig, ConfigError> {
	match resolve_config(CONFIG_FILE) {
		Some(path) => load_config(&path),
		None => Ok(GameConfig::default()),
	}
}
