//! Per-call evaluation context.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::host::{NoHost, ScriptEntry, ScriptHost};

/// Default time limit for a guarded resolution, in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Everything a resolution needs to know about the caller.
///
/// Cheap to clone; a clone travels to the worker thread for bounded
/// resolutions.
#[derive(Clone)]
pub struct TagContext {
    /// Emit fill tracing through [`ScriptHost::debug_tag_fill`].
    pub debug: bool,
    pub entry: ScriptEntry,
    /// Time limit in seconds; zero or negative disables time-boxing.
    pub timeout_secs: f64,
    /// `false` for "does this match" probing: failures stay silent.
    pub show_errors: bool,
    /// Time-box even when `debug` is off.
    pub time_box_when_silent: bool,
    pub host: Arc<dyn ScriptHost>,
}

impl Default for TagContext {
    fn default() -> Self {
        Self {
            debug: false,
            entry: ScriptEntry::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            show_errors: true,
            time_box_when_silent: false,
            host: Arc::new(NoHost),
        }
    }
}

impl fmt::Debug for TagContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagContext")
            .field("debug", &self.debug)
            .field("entry", &self.entry)
            .field("timeout_secs", &self.timeout_secs)
            .field("show_errors", &self.show_errors)
            .field("time_box_when_silent", &self.time_box_when_silent)
            .finish_non_exhaustive()
    }
}

impl TagContext {
    pub fn new(host: Arc<dyn ScriptHost>) -> Self {
        Self { host, ..Self::default() }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_entry(mut self, entry: ScriptEntry) -> Self {
        self.entry = entry;
        self
    }

    pub fn with_timeout(mut self, secs: f64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_time_box_when_silent(mut self, on: bool) -> Self {
        self.time_box_when_silent = on;
        self
    }

    /// A copy that suppresses error output.
    pub fn silent(&self) -> Self {
        Self { show_errors: false, ..self.clone() }
    }

    /// The configured limit, if time-boxing is enabled.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs > 0.0 && self.timeout_secs.is_finite() {
            Some(Duration::from_secs_f64(self.timeout_secs))
        } else {
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
