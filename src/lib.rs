pub mod cards;
pub mod config;
pub mod defaults;
pub mod display;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod players;
pub mod rules;
pub mod table;
