use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use scriptci::errors::Result;
use scriptci::exec::{ScriptBackend, ScriptRequest};
use scriptci::tree::script_stem;

type Hook = Arc<dyn Fn(&ScriptRequest) + Send + Sync>;

/// A fake backend that:
/// - records the stem of every script it was asked to run
/// - returns the exit code configured for that stem (0 by default)
/// - optionally calls a hook before "running", e.g. to inspect persisted
///   status at the moment a node starts.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    exit_codes: Arc<Mutex<HashMap<String, i32>>>,
    executed: Arc<Mutex<Vec<String>>>,
    hook: Option<Hook>,
}

impl fmt::Debug for ScriptedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedBackend")
            .field("exit_codes", &self.exit_codes)
            .field("executed", &self.executed)
            .finish_non_exhaustive()
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the script with file stem `stem` (e.g. `"script-o"`) exit with `code`.
    pub fn exit_with(self, stem: &str, code: i32) -> Self {
        self.exit_codes
            .lock()
            .unwrap()
            .insert(stem.to_string(), code);
        self
    }

    pub fn with_hook(mut self, hook: impl Fn(&ScriptRequest) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Stems of the scripts run so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl ScriptBackend for ScriptedBackend {
    fn run_script(
        &self,
        request: ScriptRequest,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        Box::pin(async move {
            if let Some(hook) = &self.hook {
                hook(&request);
            }
            let stem = script_stem(&request.script);
            let code = self
                .exit_codes
                .lock()
                .unwrap()
                .get(&stem)
                .copied()
                .unwrap_or(0);
            self.executed.lock().unwrap().push(stem);
            Ok(code)
        })
    }
}
