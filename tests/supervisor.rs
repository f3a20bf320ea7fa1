// tests/supervisor.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, log_lines, with_timeout, write_script};

use std::collections::HashSet;
use std::time::{Duration, Instant};

use scriptci::errors::ScriptCiError;
use scriptci::exec::{ProcessSupervisor, LAUNCH_FAILURE_EXIT_CODE};

#[tokio::test]
async fn returns_the_script_exit_code_and_logs_both_streams() {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "script-o.sh",
            "#!/bin/sh\necho to-out\necho to-err >&2\nexit 7\n",
        );
        let log = dir.path().join("runs/1/script-o-out.log");

        let code = ProcessSupervisor::new(&script)
            .unwrap()
            .use_directory(dir.path().join("runs/1"))
            .output_to(&log)
            .run()
            .await
            .unwrap();

        assert_eq!(code, 7);
        let lines: HashSet<String> = log_lines(&log).into_iter().collect();
        assert_eq!(
            lines,
            HashSet::from(["to-out".to_string(), "to-err".to_string()])
        );
    })
    .await
}

#[tokio::test]
async fn runs_in_the_working_directory_and_creates_it() {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("does/not/exist/yet");
        let script = write_script(dir.path(), "pwd.sh", "#!/bin/sh\npwd\ntouch marker\n");
        let log = dir.path().join("pwd.log");

        let code = ProcessSupervisor::new(&script)
            .unwrap()
            .use_directory(&work)
            .output_to(&log)
            .run()
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert!(work.join("marker").is_file());
        let printed = std::fs::canonicalize(log_lines(&log)[0].trim()).unwrap();
        assert_eq!(printed, std::fs::canonicalize(&work).unwrap());
    })
    .await
}

#[tokio::test]
async fn a_previous_log_is_replaced_not_appended_to() {
    with_timeout(async {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "s.sh", "#!/bin/sh\necho fresh\n");
        let log = dir.path().join("s-out.log");
        std::fs::write(&log, "stale line\n").unwrap();

        ProcessSupervisor::new(&script)
            .unwrap()
            .output_to(&log)
            .run()
            .await
            .unwrap();

        assert_eq!(log_lines(&log), vec!["fresh".to_string()]);
    })
    .await
}

#[tokio::test]
async fn without_output_file_lines_go_to_the_process_log() {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "s.sh", "#!/bin/sh\necho hello\nexit 0\n");

        let code = ProcessSupervisor::new(&script).unwrap().run().await.unwrap();
        assert_eq!(code, 0);
        assert!(!dir.path().join("s-out.log").exists());
    })
    .await
}

#[tokio::test]
async fn launch_failure_reports_the_sentinel_exit_code() {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "s.sh",
            "#!/definitely/not/an/interpreter\necho never\n",
        );

        let code = ProcessSupervisor::new(&script)
            .unwrap()
            .output_to(dir.path().join("s-out.log"))
            .run()
            .await
            .unwrap();

        assert_eq!(code, LAUNCH_FAILURE_EXIT_CODE);
        assert_eq!(code, 1);
    })
    .await
}

#[tokio::test]
async fn signal_termination_maps_to_128_plus_signal() {
    with_timeout(async {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "s.sh", "#!/bin/sh\nkill -9 $$\n");

        let code = ProcessSupervisor::new(&script).unwrap().run().await.unwrap();
        assert_eq!(code, 128 + 9);
    })
    .await
}

#[test]
fn bad_script_sources_fail_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let no_header = write_script(dir.path(), "a.sh", "echo hi\n");
    let empty = write_script(dir.path(), "b.sh", "");
    let missing = dir.path().join("missing.sh");

    for path in [no_header, empty, missing] {
        match ProcessSupervisor::new(&path) {
            Err(ScriptCiError::ConfigError(_)) => {}
            other => panic!("expected ConfigError for {path:?}, got {other:?}"),
        }
    }
}

const PADDING: &str = "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn heavy_output_on_both_streams_does_not_deadlock() {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        // ~1.3 MB per stream.
        let script = write_script(
            dir.path(),
            "flood.sh",
            &format!(
                "#!/bin/sh\n\
                 i=0\n\
                 while [ $i -lt 20000 ]; do\n\
                 echo \"out-$i-{PADDING}\"\n\
                 echo \"err-$i-{PADDING}\" >&2\n\
                 i=$((i+1))\n\
                 done\n\
                 exit 0\n"
            ),
        );
        let log = dir.path().join("flood-out.log");

        let code = ProcessSupervisor::new(&script)
            .unwrap()
            .output_to(&log)
            .drain_grace(Duration::from_secs(10))
            .run()
            .await
            .unwrap();
        assert_eq!(code, 0);

        let lines: HashSet<String> = log_lines(&log).into_iter().collect();
        assert_eq!(lines.len(), 40_000);
        for i in [0, 9_999, 19_999] {
            assert!(lines.contains(&format!("out-{i}-{PADDING}")));
            assert!(lines.contains(&format!("err-{i}-{PADDING}")));
        }
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lingering_output_pipe_only_delays_by_the_grace_period() {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        // The background sleep inherits stdout, so the pipe stays open long
        // after the script itself has exited.
        let script = write_script(
            dir.path(),
            "linger.sh",
            "#!/bin/sh\n(sleep 5; echo late) &\necho early\nexit 3\n",
        );

        let started = Instant::now();
        let code = ProcessSupervisor::new(&script)
            .unwrap()
            .output_to(dir.path().join("linger-out.log"))
            .drain_grace(Duration::from_millis(200))
            .run()
            .await
            .unwrap();

        assert_eq!(code, 3);
        assert!(
            started.elapsed() < Duration::from_secs(4),
            "run() waited for the lingering pipe: {:?}",
            started.elapsed()
        );
    })
    .await
}

#[tokio::test]
async fn spawn_runs_on_the_given_runtime_handle() {
    with_timeout(async {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "s.sh", "#!/bin/sh\nexit 4\n");

        let code = ProcessSupervisor::new(&script)
            .unwrap()
            .execute_with(tokio::runtime::Handle::current())
            .spawn()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(code, 4);
    })
    .await
}

#[tokio::test]
async fn unwritable_log_location_fails_before_launch() {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let script = write_script(
            dir.path(),
            "s.sh",
            &format!("#!/bin/sh\ntouch {}\n", marker.display()),
        );
        // A regular file where the log directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let result = ProcessSupervisor::new(&script)
            .unwrap()
            .output_to(blocker.join("s-out.log"))
            .run()
            .await;

        assert!(
            matches!(result, Err(ScriptCiError::Persistence(_))),
            "got {result:?}"
        );
        assert!(!marker.exists(), "script must not start without its log");
    })
    .await
}
