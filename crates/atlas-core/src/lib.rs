pub mod actions;
pub mod canvas;
pub mod config;
pub mod highlight;
pub mod intents;
pub mod message;
pub mod notes;
pub mod reducer;
pub mod registry;
pub mod scope;
pub mod signal;
pub mod state;
pub mod targets;

pub use actions::*;
pub use reducer::*;
pub use state::*;
