mod types;

pub use types::{GameEndReason, GameEvent};
