// src/status/report.rs

//! Assembling the aggregate status of a run from per-node records.

use std::path::Path;

use crate::errors::Result;
use crate::status::record::ChainStatus;
use crate::status::store::StatusStore;
use crate::tree::{Branch, MaterializedScriptNode};

/// Walk the executed path of `root` in `run_dir`.
///
/// Returns `None` when the root has not started. The child to descend into
/// is picked from the recorded exit code, so status files of a sibling
/// branch (e.g. left over from an earlier run) are never reported.
pub fn collect_status(
    store: &dyn StatusStore,
    root: &MaterializedScriptNode,
    run_dir: &Path,
) -> Result<Option<ChainStatus>> {
    let Some(record) = store.read_status(run_dir, &root.location)? else {
        return Ok(None);
    };
    let log = store.read_log(run_dir, &root.location)?;
    let exit_code = record.exit_code;
    let mut status = ChainStatus::new(record, log);

    if let Some(code) = exit_code {
        let branch = Branch::for_exit_code(code);
        if let Some(child) = root.child(branch) {
            if let Some(child_status) = collect_status(store, child, run_dir)? {
                status.set_child(branch, child_status);
            }
        }
    }

    Ok(Some(status))
}
