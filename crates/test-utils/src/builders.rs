#![allow(dead_code)]

use scriptci::job::JobDefinition;
use scriptci::tree::ScriptNode;

/// `/bin/sh` script with the given body.
pub fn sh(body: &str) -> ScriptNode {
    ScriptNode::new(format!("#!/bin/sh\n{body}\n"))
}

/// Script that exits with `code` after echoing `label`.
pub fn exits(label: &str, code: i32) -> ScriptNode {
    sh(&format!("echo {label}\nexit {code}"))
}

/// Builder for `JobDefinition` to simplify test setup.
pub struct JobDefinitionBuilder {
    root: ScriptNode,
}

impl JobDefinitionBuilder {
    pub fn new(root: ScriptNode) -> Self {
        Self { root }
    }

    pub fn on_success(mut self, child: ScriptNode) -> Self {
        self.root = self.root.on_success(child);
        self
    }

    pub fn on_failure(mut self, child: ScriptNode) -> Self {
        self.root = self.root.on_failure(child);
        self
    }

    pub fn build(self) -> JobDefinition {
        JobDefinition::new(self.root)
    }
}
