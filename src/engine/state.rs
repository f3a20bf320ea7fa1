// src/engine/state.rs

//! Pure chain state machine.
//!
//! No IO and no Tokio: the executor feeds exit codes in and reads the next
//! node (or the final exit code) out.

use crate::tree::{Branch, MaterializedScriptNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState<'a> {
    NotStarted,
    Running(&'a MaterializedScriptNode),
    Completed(i32),
}

impl<'a> ChainState<'a> {
    pub fn start(root: &'a MaterializedScriptNode) -> Self {
        ChainState::Running(root)
    }

    /// Transition after the running node exited with `exit_code`.
    ///
    /// Exit code 0 follows the success child, anything else the failure
    /// child; without a matching child the chain completes with this code.
    /// `NotStarted` and `Completed` have no outgoing transition on exit.
    pub fn advance(self, exit_code: i32) -> Self {
        match self {
            ChainState::Running(node) => {
                match node.child(Branch::for_exit_code(exit_code)) {
                    Some(child) => ChainState::Running(child),
                    None => ChainState::Completed(exit_code),
                }
            }
            other => other,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ChainState::Completed(_))
    }
}
