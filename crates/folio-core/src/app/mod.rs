pub mod client;
pub mod domain;
pub mod flows;
pub mod forms;
pub mod runtime;
pub mod store;

pub use client::Client;
pub use domain::{Action, AppState, ChatMessage, Effect};
pub use store::{ChatCommand, Store};
