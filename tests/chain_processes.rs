// tests/chain_processes.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::path::Path;
use std::time::Duration;

use scriptci::engine::ChainExecutor;
use scriptci::exec::SupervisorBackend;
use scriptci::fs::RealFileSystem;
use scriptci::status::{log_file, status_file, FsStatusStore, StatusStore};
use scriptci::tree::{write_tree, MaterializedScriptNode, ScriptNode};
use scriptci_test_utils::builders::{exits, sh};
use tokio::runtime::Handle;

type RealExecutor = ChainExecutor<SupervisorBackend, FsStatusStore<RealFileSystem>>;

fn real_executor() -> RealExecutor {
    ChainExecutor::new(SupervisorBackend::default(), FsStatusStore::new(RealFileSystem))
}

fn materialize(dir: &Path, tree: &ScriptNode) -> MaterializedScriptNode {
    write_tree(&RealFileSystem, tree, &dir.join("scripts/script-o.sh")).unwrap()
}

#[tokio::test]
async fn ok_then_done_reports_nested_success() {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let root = materialize(
            dir.path(),
            &sh("echo ok; exit 0").on_success(sh("echo done; exit 0")),
        );
        let run_dir = dir.path().join("runs/1");
        let exec = real_executor();

        let code = exec.run(&root, &run_dir, &Handle::current()).await.unwrap();
        assert_eq!(code, 0);

        let status = exec.status(&root, &run_dir).unwrap().unwrap();
        assert_eq!(status.record.exit_code, Some(0));
        assert_eq!(status.log.as_deref(), Some("ok\n"));
        let done = status.ok_status.as_deref().unwrap();
        assert_eq!(done.record.exit_code, Some(0));
        assert_eq!(done.log.as_deref(), Some("done\n"));

        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("errorScriptStatus"), "{json}");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["okScriptStatus"]["exitCode"], 0);

        assert!(run_dir.join("script-o-status.json").is_file());
        assert!(run_dir.join("script-oo-out.log").is_file());
    })
    .await
}

#[tokio::test]
async fn launch_failure_takes_the_failure_branch() {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let root = materialize(
            dir.path(),
            &ScriptNode::new("#!/no/such/interpreter\necho never\n")
                .on_success(exits("wrong-branch", 0))
                .on_failure(exits("recovered", 0)),
        );
        let run_dir = dir.path().join("runs/1");
        let exec = real_executor();

        let code = exec.run(&root, &run_dir, &Handle::current()).await.unwrap();
        assert_eq!(code, 0);

        let status = exec.status(&root, &run_dir).unwrap().unwrap();
        assert_eq!(status.record.exit_code, Some(1));
        assert!(status.ok_status.is_none());
        let recovered = status.error_status.as_deref().unwrap();
        assert_eq!(recovered.log.as_deref(), Some("recovered\n"));
        assert!(!status_file(&run_dir, &root.location.with_file_name("script-oo.sh")).exists());
    })
    .await
}

#[tokio::test]
async fn scripts_run_inside_the_run_directory() {
    with_timeout(async {
        let dir = tempfile::tempdir().unwrap();
        let root = materialize(
            dir.path(),
            &sh("echo artifact > built.txt").on_success(sh("cat built.txt")),
        );
        let run_dir = dir.path().join("runs/1");
        let exec = real_executor();

        exec.run(&root, &run_dir, &Handle::current()).await.unwrap();

        let child = root.success_child.as_deref().unwrap();
        let log = std::fs::read_to_string(log_file(&run_dir, &child.location)).unwrap();
        assert_eq!(log, "artifact\n");
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn parent_is_finished_on_disk_while_child_still_runs() {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let root = materialize(
            dir.path(),
            &sh("exit 0").on_success(sh("sleep 1; exit 4")),
        );
        let run_dir = dir.path().join("runs/1");
        let exec = real_executor();
        let child = root.success_child.as_deref().unwrap().location.clone();

        let probe = async {
            let store = FsStatusStore::new(RealFileSystem);
            loop {
                if let Some(child_status) = store.read_status(&run_dir, &child).unwrap() {
                    let parent = store
                        .read_status(&run_dir, &root.location)
                        .unwrap()
                        .unwrap();
                    return (parent, child_status);
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };

        let handle = Handle::current();
        let (code, (parent, child_status)) =
            tokio::join!(exec.run(&root, &run_dir, &handle), probe);

        assert_eq!(code.unwrap(), 4);
        assert!(parent.is_finished());
        assert_eq!(parent.exit_code, Some(0));
        assert!(!child_status.is_finished());
    })
    .await
}
