// src/tree/node.rs

//! In-memory script tree types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which edge leads from a node to its child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// Followed when the parent exits with code 0.
    Success,
    /// Followed when the parent exits with any other code.
    Failure,
}

impl Branch {
    pub fn for_exit_code(code: i32) -> Self {
        if code == 0 {
            Branch::Success
        } else {
            Branch::Failure
        }
    }

    /// Marker appended to the parent's file stem to name the child file.
    pub fn file_marker(self) -> &'static str {
        match self {
            Branch::Success => "o",
            Branch::Failure => "e",
        }
    }
}

/// A script plus the optional scripts to run after it.
///
/// The JSON shape matches job definitions:
///
/// ```json
/// {
///   "code": "#!/bin/sh\nmake test",
///   "okScript": { "code": "#!/bin/sh\nmake deploy" },
///   "errorScript": { "code": "#!/bin/sh\necho failed" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptNode {
    pub code: String,

    #[serde(
        rename = "okScript",
        alias = "successChild",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub success_child: Option<Box<ScriptNode>>,

    #[serde(
        rename = "errorScript",
        alias = "failureChild",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub failure_child: Option<Box<ScriptNode>>,
}

impl ScriptNode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            success_child: None,
            failure_child: None,
        }
    }

    pub fn on_success(mut self, child: ScriptNode) -> Self {
        self.success_child = Some(Box::new(child));
        self
    }

    pub fn on_failure(mut self, child: ScriptNode) -> Self {
        self.failure_child = Some(Box::new(child));
        self
    }

    pub fn child(&self, branch: Branch) -> Option<&ScriptNode> {
        match branch {
            Branch::Success => self.success_child.as_deref(),
            Branch::Failure => self.failure_child.as_deref(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.success_child.as_ref().map_or(0, |c| c.node_count())
            + self.failure_child.as_ref().map_or(0, |c| c.node_count())
    }
}

/// A [`ScriptNode`] that has been written to disk.
///
/// Every node knows the file holding its code; child files sit next to it
/// under names derived by [`child_location`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedScriptNode {
    pub location: PathBuf,
    pub code: String,
    pub success_child: Option<Box<MaterializedScriptNode>>,
    pub failure_child: Option<Box<MaterializedScriptNode>>,
}

impl MaterializedScriptNode {
    pub fn child(&self, branch: Branch) -> Option<&MaterializedScriptNode> {
        match branch {
            Branch::Success => self.success_child.as_deref(),
            Branch::Failure => self.failure_child.as_deref(),
        }
    }

    /// File name without the `.sh` suffix; names this node's run artifacts.
    pub fn stem(&self) -> String {
        script_stem(&self.location)
    }

    /// Drop the locations, keeping code and shape.
    pub fn to_script_node(&self) -> ScriptNode {
        ScriptNode {
            code: self.code.clone(),
            success_child: self
                .success_child
                .as_ref()
                .map(|c| Box::new(c.to_script_node())),
            failure_child: self
                .failure_child
                .as_ref()
                .map(|c| Box::new(c.to_script_node())),
        }
    }

    /// Pre-order iterator over this node and all descendants.
    pub fn iter(&self) -> impl Iterator<Item = &MaterializedScriptNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let Some(c) = node.failure_child.as_deref() {
                stack.push(c);
            }
            if let Some(c) = node.success_child.as_deref() {
                stack.push(c);
            }
            Some(node)
        })
    }
}

/// `dir/name.sh` -> `name`; names without `.sh` are returned whole.
pub fn script_stem(location: &Path) -> String {
    let name = location
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(".sh") {
        Some(stem) => stem.to_string(),
        None => name,
    }
}

/// Location of the child reached from `location` over `branch`.
///
/// `jobs/1/scripts/script-o.sh` has its success child at
/// `jobs/1/scripts/script-oo.sh` and its failure child at
/// `jobs/1/scripts/script-oe.sh`.
pub fn child_location(location: &Path, branch: Branch) -> PathBuf {
    let stem = script_stem(location);
    location.with_file_name(format!("{stem}{}.sh", branch.file_marker()))
}
