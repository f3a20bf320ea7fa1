pub mod builders;
pub mod fake_backend;
pub mod fake_clock;
pub mod slow_fs;

use std::sync::Once;

use scriptci::logging::LOG_ENV_VAR;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test subscriber once per test binary.
///
/// Output goes through `with_test_writer()`, so it only shows up for failing
/// tests (or with `--nocapture`). The filter is read from `SCRIPTCI_LOG` and
/// defaults to `debug` for the crate, which includes the per-node status
/// writes:
///
/// `SCRIPTCI_LOG=trace cargo test --test supervisor`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("info,scriptci=debug"));

        // Another harness may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}
