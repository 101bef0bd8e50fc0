pub mod chat;
pub mod contracts;
pub mod feed;

pub use chat::*;
pub use contracts::*;
pub use feed::*;
