// src/exec/directive.rs

//! Interpreter directive (`#!...`) parsing.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{Result, ScriptCiError};

/// Program and arguments named on a script's first line.
///
/// `#!/usr/bin/env bash -e` becomes program `/usr/bin/env` with arguments
/// `["bash", "-e"]`; the script path is appended when building the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterDirective {
    pub program: String,
    pub args: Vec<String>,
}

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#!\s*(?P<program>\S+)(?P<args>.*)$").unwrap_or_else(|e| {
            unreachable!("interpreter directive regex is valid: {e}")
        })
    })
}

impl InterpreterDirective {
    /// Parse the directive from the first line of `code`.
    pub fn from_code(code: &str) -> Result<Self> {
        let first = code.lines().next().ok_or_else(|| {
            ScriptCiError::ConfigError("script is empty; expected an interpreter directive".into())
        })?;
        Self::parse_line(first)
    }

    pub fn parse_line(line: &str) -> Result<Self> {
        let line = line.trim_end_matches('\r');
        let caps = directive_regex().captures(line).ok_or_else(|| {
            ScriptCiError::ConfigError(format!(
                "first line must be an interpreter directive like `#!/bin/sh`, got {line:?}"
            ))
        })?;

        let program = caps["program"].to_string();
        let args = caps["args"].split_whitespace().map(str::to_string).collect();
        Ok(Self { program, args })
    }

    /// Full argument vector (after the program) for running `script`.
    pub fn command_args(&self, script: &Path) -> Vec<PathBuf> {
        self.args
            .iter()
            .map(PathBuf::from)
            .chain(std::iter::once(script.to_path_buf()))
            .collect()
    }
}
