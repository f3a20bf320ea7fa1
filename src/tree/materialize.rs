// src/tree/materialize.rs

//! Writing script trees to disk and loading them back.
//!
//! There is no manifest: a child exists exactly when its derived file exists.

use std::path::Path;

use tracing::debug;

use crate::errors::{Result, ScriptCiError};
use crate::fs::FileSystem;
use crate::tree::node::{child_location, Branch, MaterializedScriptNode, ScriptNode};

/// Persist `node` at `location`, recursing into its children.
///
/// Child files left over from an earlier, larger tree are removed so the
/// directory always mirrors `node` exactly.
pub fn write_tree(
    fs: &dyn FileSystem,
    node: &ScriptNode,
    location: &Path,
) -> Result<MaterializedScriptNode> {
    fs.write(location, node.code.as_bytes())
        .map_err(ScriptCiError::persistence)?;
    debug!(script = %location.display(), "wrote script");

    let success_child = write_child(fs, node, location, Branch::Success)?;
    let failure_child = write_child(fs, node, location, Branch::Failure)?;

    Ok(MaterializedScriptNode {
        location: location.to_path_buf(),
        code: node.code.clone(),
        success_child,
        failure_child,
    })
}

fn write_child(
    fs: &dyn FileSystem,
    parent: &ScriptNode,
    parent_location: &Path,
    branch: Branch,
) -> Result<Option<Box<MaterializedScriptNode>>> {
    let location = child_location(parent_location, branch);
    match parent.child(branch) {
        Some(child) => Ok(Some(Box::new(write_tree(fs, child, &location)?))),
        None => {
            remove_subtree(fs, &location)?;
            Ok(None)
        }
    }
}

/// Remove the script at `location` and everything derived from it.
fn remove_subtree(fs: &dyn FileSystem, location: &Path) -> Result<()> {
    if !fs.is_file(location) {
        return Ok(());
    }
    remove_subtree(fs, &child_location(location, Branch::Success))?;
    remove_subtree(fs, &child_location(location, Branch::Failure))?;
    fs.remove_file(location).map_err(ScriptCiError::persistence)?;
    debug!(script = %location.display(), "removed stale script");
    Ok(())
}

/// Load the tree rooted at `location`.
pub fn read_tree(fs: &dyn FileSystem, location: &Path) -> Result<MaterializedScriptNode> {
    let code = fs
        .read_to_string(location)
        .map_err(ScriptCiError::persistence)?;

    let success_child = read_child(fs, location, Branch::Success)?;
    let failure_child = read_child(fs, location, Branch::Failure)?;

    Ok(MaterializedScriptNode {
        location: location.to_path_buf(),
        code,
        success_child,
        failure_child,
    })
}

fn read_child(
    fs: &dyn FileSystem,
    parent_location: &Path,
    branch: Branch,
) -> Result<Option<Box<MaterializedScriptNode>>> {
    let location = child_location(parent_location, branch);
    if fs.is_file(&location) {
        Ok(Some(Box::new(read_tree(fs, &location)?)))
    } else {
        Ok(None)
    }
}
