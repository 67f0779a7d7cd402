pub mod action;
pub mod effect;
pub mod reduce;
pub mod state;

#[cfg(test)]
mod tests;

pub use action::Action;
pub use effect::Effect;
pub use reduce::reduce;
pub use state::{AppState, ChatMessage};
