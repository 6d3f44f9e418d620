mod agent;
mod input;

pub use agent::PlayerAgent;
pub use input::{ChannelInput, ComputerInput, InputHandle, SlotInput};
