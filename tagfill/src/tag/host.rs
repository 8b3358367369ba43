//! The boundary between the tag engine and the scripting host around it.
//!
//! Queue scheduling, script-container loading and debug output all live
//! outside this crate.  The engine reaches them only through [`ScriptHost`],
//! whose methods all have inert defaults so a host implements just what it
//! has.
//!
//! [`MemoryHost`] is a self-contained implementation backed by plain maps; the
//! `tagfill` binary and the test suites use it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use super::context::TagContext;
use super::object::ObjectTag;

// ── ScriptEntry ───────────────────────────────────────────────────────────────

/// Handle to the script entry currently executing, used for diagnostics and
/// for the argument-less `<queue>` / `<script>` bases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptEntry {
    pub script: Option<String>,
    pub queue: Option<String>,
    pub line: Option<usize>,
}

impl ScriptEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn in_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for ScriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.script, self.line) {
            (Some(s), Some(l)) => write!(f, "{s}:{l}")?,
            (Some(s), None) => write!(f, "{s}")?,
            (None, _) => write!(f, "<no script>")?,
        }
        if let Some(q) = &self.queue {
            write!(f, " [{q}]")?;
        }
        Ok(())
    }
}

// ── CustomContainer ───────────────────────────────────────────────────────────

/// One link of a custom-object inheritance chain, as loaded by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomContainer {
    pub name: String,
    /// Name of the parent container, if any.
    pub inherit: Option<String>,
    /// Default field values declared on this container.
    pub fields: Vec<(String, String)>,
}

impl CustomContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn inherits(mut self, parent: impl Into<String>) -> Self {
        self.inherit = Some(parent.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

// ── ScriptHost ────────────────────────────────────────────────────────────────

/// Services the engine consumes from its host.
///
/// Every lookup is by name at resolution time; nothing returned here is
/// retained by the engine between calls.
pub trait ScriptHost: Send + Sync {
    fn queue_exists(&self, _id: &str) -> bool {
        false
    }

    fn definition(&self, _queue: &str, _name: &str) -> Option<ObjectTag> {
        None
    }

    fn definition_names(&self, _queue: &str) -> Vec<String> {
        Vec::new()
    }

    fn script_exists(&self, _name: &str) -> bool {
        false
    }

    /// Container type of a script (`"task"`, `"custom"`, …).
    fn script_type(&self, _name: &str) -> Option<String> {
        None
    }

    /// Resolve one link of a custom-object inheritance chain.
    fn custom_container(&self, _name: &str) -> Option<CustomContainer> {
        None
    }

    /// Value for `<context.name>` in the given entry.
    fn context_value(&self, _entry: &ScriptEntry, _name: &str) -> Option<ObjectTag> {
        None
    }

    /// Whether a resolution in `ctx` should run under the time limit.
    fn should_time_box(&self, ctx: &TagContext) -> bool {
        ctx.debug || ctx.time_box_when_silent
    }

    /// Called on the worker thread before a guarded resolution.
    fn pre_tag_execute(&self) {}

    /// Called on the worker thread after a guarded resolution.
    fn post_tag_execute(&self) {}

    fn echo_error(&self, ctx: &TagContext, message: &str) {
        tracing::error!(entry = %ctx.entry, "{message}");
    }

    fn echo_debug(&self, ctx: &TagContext, message: &str) {
        tracing::debug!(entry = %ctx.entry, "{message}");
    }

    fn debug_tag_fill(&self, ctx: &TagContext, tag: &str, filled: &str) {
        tracing::debug!(entry = %ctx.entry, tag, filled, "filled tag");
    }
}

/// A host with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl ScriptHost for NoHost {}

// ── MemoryHost ────────────────────────────────────────────────────────────────

/// Severity of a captured diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Debug,
}

/// A diagnostic line captured by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// In-memory host: queues with definitions, scripts, custom containers and
/// context values.  Diagnostics are forwarded to `tracing` and also kept for
/// inspection.
#[derive(Debug, Default)]
pub struct MemoryHost {
    queues: HashMap<String, Vec<(String, ObjectTag)>>,
    scripts: HashMap<String, String>,
    customs: HashMap<String, CustomContainer>,
    context: HashMap<String, ObjectTag>,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a queue (or extend an existing one) with definitions.
    pub fn with_queue<I, K>(mut self, id: &str, definitions: I) -> Self
    where
        I: IntoIterator<Item = (K, ObjectTag)>,
        K: Into<String>,
    {
        let defs = self.queues.entry(id.to_lowercase()).or_default();
        for (k, v) in definitions {
            defs.push((k.into().to_lowercase(), v));
        }
        self
    }

    pub fn with_script(mut self, name: &str, container_type: &str) -> Self {
        self.scripts.insert(name.to_lowercase(), container_type.to_owned());
        self
    }

    /// Register a custom container; it also becomes a script of type `custom`.
    pub fn with_custom(mut self, container: CustomContainer) -> Self {
        let key = container.name.to_lowercase();
        self.scripts.insert(key.clone(), "custom".to_owned());
        self.customs.insert(key, container);
        self
    }

    pub fn with_context(mut self, name: &str, value: ObjectTag) -> Self {
        self.context.insert(name.to_lowercase(), value);
        self
    }

    /// All diagnostics captured so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock_diagnostics().clone()
    }

    /// Captured error-level messages only.
    pub fn errors(&self) -> Vec<String> {
        self.lock_diagnostics()
            .iter()
            .filter(|d| d.level == Level::Error)
            .map(|d| d.message.clone())
            .collect()
    }

    pub fn clear_diagnostics(&self) {
        self.lock_diagnostics().clear();
    }

    fn lock_diagnostics(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        self.diagnostics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn capture(&self, level: Level, message: &str) {
        self.lock_diagnostics().push(Diagnostic { level, message: message.to_owned() });
    }
}

impl ScriptHost for MemoryHost {
    fn queue_exists(&self, id: &str) -> bool {
        self.queues.contains_key(&id.to_lowercase())
    }

    fn definition(&self, queue: &str, name: &str) -> Option<ObjectTag> {
        let name = name.to_lowercase();
        self.queues
            .get(&queue.to_lowercase())?
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.clone())
    }

    fn definition_names(&self, queue: &str) -> Vec<String> {
        self.queues
            .get(&queue.to_lowercase())
            .map(|defs| defs.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default()
    }

    fn script_exists(&self, name: &str) -> bool {
        self.scripts.contains_key(&name.to_lowercase())
    }

    fn script_type(&self, name: &str) -> Option<String> {
        self.scripts.get(&name.to_lowercase()).cloned()
    }

    fn custom_container(&self, name: &str) -> Option<CustomContainer> {
        self.customs.get(&name.to_lowercase()).cloned()
    }

    fn context_value(&self, _entry: &ScriptEntry, name: &str) -> Option<ObjectTag> {
        self.context.get(&name.to_lowercase()).cloned()
    }

    fn echo_error(&self, ctx: &TagContext, message: &str) {
        tracing::error!(entry = %ctx.entry, "{message}");
        self.capture(Level::Error, message);
    }

    fn echo_debug(&self, ctx: &TagContext, message: &str) {
        tracing::debug!(entry = %ctx.entry, "{message}");
        self.capture(Level::Debug, message);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::types::ElementTag;

    #[test]
    fn entry_display() {
        let e = ScriptEntry::new().in_script("greeter").at_line(4).in_queue("q_1");
        assert_eq!(e.to_string(), "greeter:4 [q_1]");
        assert_eq!(ScriptEntry::new().to_string(), "<no script>");
    }

    #[test]
    fn memory_host_lookups_ignore_case() {
        let host = MemoryHost::new()
            .with_queue("Main", [("Target", ObjectTag::from(ElementTag::new("bob")))])
            .with_script("Greeter", "task");
        assert!(host.queue_exists("main"));
        assert_eq!(
            host.definition("MAIN", "target").map(|v| v.identity()),
            Some("bob".to_owned())
        );
        assert_eq!(host.definition_names("main"), vec!["target"]);
        assert_eq!(host.script_type("greeter").as_deref(), Some("task"));
        assert!(!host.script_exists("nope"));
    }

    #[test]
    fn custom_registers_script() {
        let host = MemoryHost::new().with_custom(CustomContainer::new("Pet").field("name", "rex"));
        assert_eq!(host.script_type("pet").as_deref(), Some("custom"));
        assert_eq!(host.custom_container("PET").map(|c| c.fields.len()), Some(1));
    }

    #[test]
    fn captures_diagnostics() {
        let host = MemoryHost::new();
        let ctx = TagContext::default();
        host.echo_error(&ctx, "bad");
        host.echo_debug(&ctx, "note");
        assert_eq!(host.errors(), vec!["bad"]);
        assert_eq!(host.diagnostics().len(), 2);
        host.clear_diagnostics();
        assert!(host.diagnostics().is_empty());
    }
}
