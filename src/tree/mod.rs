// src/tree/mod.rs

//! Script trees.
//!
//! - [`node`] holds the in-memory [`ScriptNode`] and its on-disk projection
//!   [`MaterializedScriptNode`], plus the child file naming rules.
//! - [`materialize`] writes trees to a [`crate::fs::FileSystem`] and reads
//!   them back.

pub mod materialize;
pub mod node;

pub use materialize::{read_tree, write_tree};
pub use node::{child_location, script_stem, Branch, MaterializedScriptNode, ScriptNode};
