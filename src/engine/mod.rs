// src/engine/mod.rs

//! Chain orchestration.
//!
//! The pure state machine lives in [`state`]; the async shell that runs
//! nodes and persists their status is [`chain::ChainExecutor`].

pub mod chain;
pub mod state;

pub use chain::ChainExecutor;
pub use state::ChainState;
