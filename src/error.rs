use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse game config: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("invalid game config: {0}")]
	Invalid(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
	#[error("claim queue is closed, the game is over")]
	QueueClosed,

	#[error("slot {0} already holds a card")]
	SlotOccupied(usize),

	#[error("slot {0} does not exist on this table")]
	SlotOutOfRange(usize),

	#[error("logger setup failed: {0}")]
	Log(String),
}
