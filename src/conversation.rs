//! Turn-taking conversation core
//!
//! One user turn always produces exactly one assistant turn, in order.
//! [`ConversationStore`] owns the transcript; [`TurnEngine`] mediates with
//! the response generator.

mod engine;
mod message;
mod state;
mod store;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use engine::{TurnEngine, TurnError};
#[allow(unused_imports)] // Public API re-exports
pub use message::{Message, Role, Transcript};
pub use state::TurnState;
#[allow(unused_imports)] // Public API re-exports
pub use store::{ConversationStore, StoreError};
