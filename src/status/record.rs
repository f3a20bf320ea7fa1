// src/status/record.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tree::Branch;

/// Persisted progress of one node in one run.
///
/// Written once with only `started` before the process launches, then once
/// more with `ended` and `exitCode` after it exits. Never changes after that.
///
/// ```json
/// {"started": "2026-10-19T09:12:03.117Z", "ended": "2026-10-19T09:12:04.002Z", "exitCode": 0}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub started: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl RunStatus {
    pub fn started_at(started: DateTime<Utc>) -> Self {
        Self {
            started,
            ended: None,
            exit_code: None,
        }
    }

    pub fn finished(self, ended: DateTime<Utc>, exit_code: i32) -> Self {
        Self {
            ended: Some(ended),
            exit_code: Some(exit_code),
            ..self
        }
    }

    pub fn is_finished(&self) -> bool {
        self.ended.is_some() && self.exit_code.is_some()
    }
}

/// Status of a node together with the status of the child that ran after it.
///
/// Only the branch that actually executed is ever present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatus {
    #[serde(flatten)]
    pub record: RunStatus,

    /// Merged output of the node, read back from its log file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,

    #[serde(
        rename = "okScriptStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ok_status: Option<Box<ChainStatus>>,

    #[serde(
        rename = "errorScriptStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_status: Option<Box<ChainStatus>>,
}

impl ChainStatus {
    pub fn new(record: RunStatus, log: Option<String>) -> Self {
        Self {
            record,
            log,
            ok_status: None,
            error_status: None,
        }
    }

    pub fn child(&self, branch: Branch) -> Option<&ChainStatus> {
        match branch {
            Branch::Success => self.ok_status.as_deref(),
            Branch::Failure => self.error_status.as_deref(),
        }
    }

    pub fn set_child(&mut self, branch: Branch, child: ChainStatus) {
        match branch {
            Branch::Success => self.ok_status = Some(Box::new(child)),
            Branch::Failure => self.error_status = Some(Box::new(child)),
        }
    }

    /// Records of the executed nodes, root first.
    pub fn path(&self) -> Vec<&ChainStatus> {
        let mut out = vec![self];
        let mut current = self;
        while let Some(next) = current
            .ok_status
            .as_deref()
            .or(current.error_status.as_deref())
        {
            out.push(next);
            current = next;
        }
        out
    }
}
