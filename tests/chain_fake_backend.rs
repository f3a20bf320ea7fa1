// tests/chain_fake_backend.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scriptci::engine::ChainExecutor;
use scriptci::errors::ScriptCiError;
use scriptci::fs::mock::MockFileSystem;
use scriptci::fs::FileSystem;
use scriptci::status::{status_file, FsStatusStore, RunStatus, StatusStore};
use scriptci::tree::{write_tree, MaterializedScriptNode, ScriptNode};
use scriptci_test_utils::builders::{exits, sh};
use scriptci_test_utils::fake_backend::ScriptedBackend;
use scriptci_test_utils::fake_clock::StepClock;
use scriptci_test_utils::slow_fs::SlowFileSystem;
use tokio::runtime::Handle;

const ROOT: &str = "/job/scripts/script-o.sh";
const RUN_DIR: &str = "/job/runs/1";

/// build -> (ok) test -> (error) report
///       -> (error) notify
fn pipeline() -> ScriptNode {
    exits("build", 0)
        .on_success(exits("test", 0).on_failure(exits("report", 0)))
        .on_failure(exits("notify", 0))
}

fn materialize(fs: &MockFileSystem, tree: &ScriptNode) -> MaterializedScriptNode {
    write_tree(fs, tree, Path::new(ROOT)).unwrap()
}

type TestExecutor = ChainExecutor<ScriptedBackend, FsStatusStore<MockFileSystem>, StepClock>;

fn executor(fs: &MockFileSystem, backend: ScriptedBackend) -> TestExecutor {
    ChainExecutor::with_clock(backend, FsStatusStore::new(fs.clone()), StepClock::new())
}

#[tokio::test]
async fn success_path_runs_success_children() {
    with_timeout(async {
        init_tracing();
        let fs = MockFileSystem::new();
        let root = materialize(&fs, &pipeline());
        let backend = ScriptedBackend::new();
        let exec = executor(&fs, backend.clone());

        let code = exec
            .run(&root, Path::new(RUN_DIR), &Handle::current())
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(backend.executed(), vec!["script-o", "script-oo"]);
    })
    .await
}

#[tokio::test]
async fn non_zero_exit_follows_the_failure_child() {
    with_timeout(async {
        init_tracing();
        let fs = MockFileSystem::new();
        let root = materialize(&fs, &pipeline());
        let backend = ScriptedBackend::new()
            .exit_with("script-o", 2)
            .exit_with("script-oe", 5);
        let exec = executor(&fs, backend.clone());

        let code = exec
            .run(&root, Path::new(RUN_DIR), &Handle::current())
            .await
            .unwrap();

        assert_eq!(code, 5);
        assert_eq!(backend.executed(), vec!["script-o", "script-oe"]);
    })
    .await
}

#[tokio::test]
async fn missing_branch_ends_the_chain_with_that_exit_code() {
    with_timeout(async {
        let fs = MockFileSystem::new();
        let root = materialize(&fs, &exits("only", 0).on_success(exits("next", 0)));
        let backend = ScriptedBackend::new().exit_with("script-o", 42);
        let exec = executor(&fs, backend.clone());

        let code = exec
            .run(&root, Path::new(RUN_DIR), &Handle::current())
            .await
            .unwrap();

        assert_eq!(code, 42);
        assert_eq!(backend.executed(), vec!["script-o"]);
    })
    .await
}

#[tokio::test]
async fn status_contains_only_the_executed_path() {
    with_timeout(async {
        let fs = MockFileSystem::new();
        let root = materialize(&fs, &pipeline());
        let backend = ScriptedBackend::new().exit_with("script-oo", 1);
        let exec = executor(&fs, backend);
        let run_dir = Path::new(RUN_DIR);

        assert_eq!(exec.status(&root, run_dir).unwrap(), None);

        let code = exec.run(&root, run_dir, &Handle::current()).await.unwrap();
        assert_eq!(code, 0);

        let status = exec.status(&root, run_dir).unwrap().unwrap();
        assert_eq!(
            status.record,
            RunStatus::started_at(StepClock::at(0)).finished(StepClock::at(1), 0)
        );
        assert!(status.error_status.is_none());

        let test = status.ok_status.as_deref().unwrap();
        assert_eq!(test.record.exit_code, Some(1));
        assert_eq!(test.record.started, StepClock::at(2));
        assert!(test.ok_status.is_none());

        let report = test.error_status.as_deref().unwrap();
        assert_eq!(report.record.exit_code, Some(0));
        assert_eq!(report.record.ended, Some(StepClock::at(5)));
        assert!(report.ok_status.is_none() && report.error_status.is_none());

        assert_eq!(status.path().len(), 3);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["okScriptStatus"]["errorScriptStatus"]["exitCode"], 0);
        assert!(json.get("errorScriptStatus").is_none());
    })
    .await
}

#[tokio::test]
async fn parent_status_is_finished_before_child_starts() {
    with_timeout(async {
        let fs = MockFileSystem::new();
        let root = materialize(&fs, &pipeline());
        let run_dir = PathBuf::from(RUN_DIR);

        let seen: Arc<Mutex<Vec<(String, Option<RunStatus>, Option<RunStatus>)>>> =
            Arc::default();
        let probe_store = FsStatusStore::new(fs.clone());
        let probe_seen = seen.clone();
        let root_location = root.location.clone();
        let backend = ScriptedBackend::new().with_hook(move |req| {
            let own = probe_store.read_status(&req.working_dir, &req.script).unwrap();
            let parent = probe_store
                .read_status(&req.working_dir, &root_location)
                .unwrap();
            let stem = scriptci::tree::script_stem(&req.script);
            probe_seen.lock().unwrap().push((stem, own, parent));
        });

        let exec = executor(&fs, backend);
        exec.run(&root, &run_dir, &Handle::current()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);

        let (stem, own, _) = &seen[0];
        assert_eq!(stem, "script-o");
        let own = own.as_ref().unwrap();
        assert!(!own.is_finished(), "root must be recorded as started only");

        let (stem, own, parent) = &seen[1];
        assert_eq!(stem, "script-oo");
        assert!(!own.as_ref().unwrap().is_finished());
        let parent = parent.as_ref().unwrap();
        assert!(parent.is_finished());
        assert_eq!(parent.exit_code, Some(0));
    })
    .await
}

#[tokio::test]
async fn requests_point_into_the_run_directory() {
    with_timeout(async {
        let fs = MockFileSystem::new();
        let root = materialize(&fs, &sh("true"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let sink = requests.clone();
        let backend = ScriptedBackend::new().with_hook(move |req| {
            sink.lock()
                .unwrap()
                .push((req.working_dir.clone(), req.log_file.clone()));
        });

        executor(&fs, backend)
            .run(&root, Path::new(RUN_DIR), &Handle::current())
            .await
            .unwrap();

        assert_eq!(
            *requests.lock().unwrap(),
            vec![(
                PathBuf::from(RUN_DIR),
                PathBuf::from("/job/runs/1/script-o-out.log")
            )]
        );
        assert!(fs.is_file(&status_file(Path::new(RUN_DIR), Path::new(ROOT))));
    })
    .await
}

#[tokio::test]
async fn failing_status_write_aborts_the_chain() {
    with_timeout(async {
        let fs = MockFileSystem::new();
        let root = materialize(&fs, &pipeline());
        let backend = ScriptedBackend::new();
        let exec = executor(&fs, backend.clone());
        fs.fail_writes(true);

        let err = exec
            .run(&root, Path::new(RUN_DIR), &Handle::current())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptCiError::Persistence(_)), "got {err:?}");
        assert!(backend.executed().is_empty());
    })
    .await
}

#[tokio::test]
async fn broken_directive_anywhere_is_rejected_before_running() {
    with_timeout(async {
        let fs = MockFileSystem::new();
        let tree = exits("build", 0).on_failure(ScriptNode::new("echo no interpreter line"));
        let root = materialize(&fs, &tree);
        let backend = ScriptedBackend::new();
        let exec = executor(&fs, backend.clone());

        let err = exec
            .run(&root, Path::new(RUN_DIR), &Handle::current())
            .await
            .unwrap_err();

        match err {
            ScriptCiError::ConfigError(msg) => assert!(msg.contains("script-oe.sh"), "{msg}"),
            other => panic!("expected ConfigError, got {other:?}"),
        }
        assert!(backend.executed().is_empty());
        assert!(!fs.exists(&status_file(Path::new(RUN_DIR), Path::new(ROOT))));
    })
    .await
}

#[tokio::test]
async fn slow_status_writes_do_not_block_the_runtime() {
    with_timeout(async {
        init_tracing();
        let fs = MockFileSystem::new();
        let root = materialize(&fs, &sh("true"));
        let slow = SlowFileSystem::new(fs.clone(), Duration::from_millis(250));
        let exec = ChainExecutor::with_clock(
            ScriptedBackend::new(),
            FsStatusStore::new(slow),
            StepClock::new(),
        );
        let done = AtomicBool::new(false);

        // Both futures share this single-threaded runtime; the ticker only
        // advances while the chain is parked on an await.
        let chain = async {
            let code = exec.run(&root, Path::new(RUN_DIR), &Handle::current()).await;
            done.store(true, Ordering::SeqCst);
            code
        };
        let ticker = async {
            let mut ticks = 0usize;
            while !done.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(10)).await;
                ticks += 1;
            }
            ticks
        };
        let (code, ticks) = tokio::join!(chain, ticker);

        assert_eq!(code.unwrap(), 0);
        assert!(ticks >= 10, "runtime stalled during status writes: {ticks} ticks");
        assert!(fs.is_file(&status_file(Path::new(RUN_DIR), Path::new(ROOT))));
    })
    .await
}
