//! Chain resolution and text filling.
//!
//! A chain moves through `unresolved → root resolved → attribute resolved*`
//! and ends either [`Outcome::Fulfilled`] (every segment consumed) or
//! [`Outcome::Halted`] at the first segment nothing could handle.
//!
//! Lookup order for each segment after the root, given a value of type `T`:
//!
//! 1. `T`'s named attribute
//! 2. `T`'s fallback handler
//! 3. universal attributes (`object_type`, `debug`)
//! 4. element attributes, applied to the value's identity
//!
//! Failures never leave the text operations.  A halted tag is replaced by its
//! `||` alternative when it has one, otherwise by its own `<raw>` text, and
//! the host is told why.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::attribute::{Attribute, TagChain};
use super::cache::ParseCache;
use super::context::TagContext;
use super::error::TagError;
use super::executor::{self, BoundedExecutor, DepthGuard, DEFAULT_WORKERS};
use super::object::{ObjectTag, TagType};
use super::registry::{Arity, AttributeEntry, Registry};
use super::scanner::{Fragment, ParsedText, TagRef};
use super::types::ElementTag;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Where and why a resolution stopped early.
#[derive(Debug, Clone, PartialEq)]
pub struct Halt {
    /// Segments fulfilled before stopping.
    pub index: usize,
    pub total: usize,
    pub last_valid: Option<ObjectTag>,
    pub filled: String,
    pub unfilled: String,
    /// Attribute names that nearly matched the failing segment.
    pub almost: Vec<String>,
    /// A handler failed for lack of a `[parameter]`.
    pub context_failed: bool,
    pub error: TagError,
}

impl Halt {
    /// A halt before anything ran, as for a guarded job that never reported.
    fn at_root(chain: &TagChain, error: TagError) -> Self {
        Halt {
            index: 0,
            total: chain.len(),
            last_valid: None,
            filled: String::new(),
            unfilled: chain.join(0, chain.len()),
            almost: Vec::new(),
            context_failed: false,
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Fulfilled { value: ObjectTag, fulfilled: usize },
    Halted(Halt),
}

impl Outcome {
    pub fn value(&self) -> Option<&ObjectTag> {
        match self {
            Outcome::Fulfilled { value, .. } => Some(value),
            Outcome::Halted(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TagError> {
        match self {
            Outcome::Fulfilled { .. } => None,
            Outcome::Halted(h) => Some(&h.error),
        }
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// The tag engine: registry, parse cache and guarded-execution pool.
///
/// Cheap to clone; clones share all three.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    cache: Arc<ParseCache>,
    executor: Arc<BoundedExecutor>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for an [`Engine`] with a custom registry, cache or pool size.
#[derive(Debug, Default)]
pub struct EngineBuilder {
    registry: Option<Arc<Registry>>,
    cache: Option<Arc<ParseCache>>,
    max_workers: Option<usize>,
}

impl EngineBuilder {
    pub fn registry(mut self, registry: impl Into<Arc<Registry>>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    pub fn cache(mut self, cache: Arc<ParseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.max_workers = Some(n);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            registry: self.registry.unwrap_or_else(Registry::core),
            cache: self.cache.unwrap_or_else(ParseCache::global),
            executor: Arc::new(BoundedExecutor::new(self.max_workers.unwrap_or(DEFAULT_WORKERS))),
        }
    }
}

impl Engine {
    /// An engine over the core registry and the global parse cache.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> &ParseCache {
        &self.cache
    }

    // ── Text operations ──

    pub fn parse_text(&self, text: &str) -> Arc<ParsedText> {
        self.cache.get_or_parse(text)
    }

    /// Fill every tag in `text`.
    ///
    /// Text that is exactly one tag gives that tag's typed value; anything
    /// else gives an element of the filled text.
    pub fn tag_object(&self, text: &str, ctx: &TagContext) -> ObjectTag {
        if text.is_empty() {
            return ObjectTag::default();
        }
        let parsed = self.parse_text(text);
        if let Some(tag) = parsed.single_tag() {
            return self.read_single_tag(tag, ctx);
        }
        if let [Fragment::Literal(s)] = parsed.fragments.as_slice() {
            return ObjectTag::element(s.as_str());
        }
        let mut out = String::with_capacity(text.len());
        for frag in &parsed.fragments {
            match frag {
                Fragment::Literal(s) => out.push_str(s),
                Fragment::Tag(tag) => out.push_str(&self.read_single_tag(tag, ctx).identity()),
                Fragment::Error(issue) => {
                    if ctx.show_errors {
                        ctx.host.echo_error(ctx, &issue.message);
                    }
                    out.push_str(&issue.source);
                }
            }
        }
        ObjectTag::element(out)
    }

    /// Fill every tag in `text` and return the result as a string.
    pub fn tag(&self, text: &str, ctx: &TagContext) -> String {
        self.tag_object(text, ctx).identity()
    }

    /// Resolve one scanned tag, substituting on failure.
    pub fn read_single_tag(&self, tag: &TagRef, ctx: &TagContext) -> ObjectTag {
        match self.resolve(&tag.chain, ctx) {
            Outcome::Fulfilled { value, .. } => {
                if ctx.debug {
                    ctx.host.debug_tag_fill(ctx, &tag.raw, &value.debug_form());
                }
                value
            }
            Outcome::Halted(halt) => {
                if let Some(alt) = tag.chain.alternative() {
                    tracing::trace!(tag = %tag.raw, error = %halt.error, "using alternative");
                    let value = self.tag_object(alt, ctx);
                    if ctx.debug {
                        ctx.host.debug_tag_fill(ctx, &tag.raw, &value.debug_form());
                    }
                    return value;
                }
                if halt.error.is_bounded_failure() {
                    tracing::warn!(tag = %tag.raw, error = %halt.error, "tag resolution cut short");
                }
                if ctx.show_errors {
                    self.report_invalid(tag, &halt, ctx);
                }
                ObjectTag::element(format!("<{}>", tag.raw))
            }
        }
    }

    // ── Resolution ──

    /// Resolve a chain, under the time limit when the context calls for one.
    pub fn resolve(&self, chain: &TagChain, ctx: &TagContext) -> Outcome {
        let limit = match ctx.timeout() {
            Some(limit) if executor::resolution_depth() == 0 && ctx.host.should_time_box(ctx) => {
                limit
            }
            _ => return self.resolve_inline(chain, ctx),
        };

        let engine = self.clone();
        let job_chain = chain.clone();
        let job_ctx = ctx.clone();
        let result = self.executor.run(limit, move || {
            job_ctx.host.pre_tag_execute();
            let outcome = engine.resolve_inline(&job_chain, &job_ctx);
            job_ctx.host.post_tag_execute();
            outcome
        });
        match result {
            Ok(outcome) => outcome,
            Err(error) => Outcome::Halted(Halt::at_root(chain, error)),
        }
    }

    /// Resolve a chain on the calling thread.
    pub fn resolve_inline(&self, chain: &TagChain, ctx: &TagContext) -> Outcome {
        let _depth = DepthGuard::enter();
        let run = panic::catch_unwind(AssertUnwindSafe(|| self.run_chain(chain, ctx)));
        match run {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = executor::panic_message(payload.as_ref());
                Outcome::Halted(Halt::at_root(chain, TagError::WorkerFault(message)))
            }
        }
    }

    fn run_chain(&self, chain: &TagChain, ctx: &TagContext) -> Outcome {
        let mut attr = Attribute::new(chain, self, ctx);
        let root = chain.root();
        tracing::trace!(tag = %chain.origin, base = %root.key, "resolving");

        let Some(base) = self.registry.base(&root.key) else {
            let error = TagError::UnresolvedBase { name: root.key.clone(), registered: false };
            return Outcome::Halted(attr.halt(error, Vec::new()));
        };
        let handler = Arc::clone(&base.handler);
        let produced = handler(&mut attr);
        if let Some(halt) = cancelled(&mut attr) {
            return Outcome::Halted(halt);
        }
        let Some(mut value) = produced else {
            let error = TagError::UnresolvedBase { name: root.key.clone(), registered: true };
            return Outcome::Halted(attr.halt(error, Vec::new()));
        };
        attr.fulfill(1);
        attr.set_last_valid(value.clone());

        while attr.remaining() > 0 {
            if let Some(halt) = cancelled(&mut attr) {
                return Outcome::Halted(halt);
            }
            match self.dispatch(&value, &mut attr) {
                Ok(next) => {
                    if let Some(halt) = cancelled(&mut attr) {
                        return Outcome::Halted(halt);
                    }
                    attr.fulfill(1);
                    attr.set_last_valid(next.clone());
                    value = next;
                }
                Err(halt) => return Outcome::Halted(halt),
            }
        }
        Outcome::Fulfilled { value, fulfilled: attr.fulfilled() }
    }

    /// Apply the current segment to `value`.
    fn dispatch(&self, value: &ObjectTag, attr: &mut Attribute<'_>) -> Result<ObjectTag, Halt> {
        let Some(segment) = attr.current() else {
            return Ok(value.clone());
        };
        let key = segment.key.as_str();
        let ty = value.tag_type();

        if let Some(entry) = self.registry.attribute(ty, key) {
            return self.apply(entry, value, attr, ty);
        }
        if let Some(fallback) = self.registry.fallback(ty) {
            let fallback = Arc::clone(fallback);
            if let Some(next) = fallback(value, attr) {
                return Ok(next);
            }
        }
        if let Some(entry) = self.registry.universal(key) {
            return self.apply(entry, value, attr, ty);
        }
        if ty != TagType::Element {
            if let Some(entry) = self.registry.attribute(TagType::Element, key) {
                let element = ObjectTag::Element(value.as_element());
                return self.apply(entry, &element, attr, ty);
            }
        }
        let near = self.registry.near_misses(ty, key, segment.param.is_some());
        let error = self.unresolved(attr, value);
        Err(attr.halt(error, near))
    }

    fn apply(
        &self,
        entry: &AttributeEntry,
        value: &ObjectTag,
        attr: &mut Attribute<'_>,
        reported: TagType,
    ) -> Result<ObjectTag, Halt> {
        if entry.arity == Arity::Required && !attr.has_param() {
            attr.mark_context_failed();
            attr.record_seeming_success(&entry.name);
            let error = TagError::ArgumentRequired { attribute: entry.name.clone() };
            return Err(attr.halt(error, Vec::new()));
        }
        let handler = Arc::clone(&entry.handler);
        match handler(value, attr) {
            Some(next) => Ok(next),
            None => {
                attr.record_seeming_success(&entry.name);
                let near = self.registry.near_misses(reported, &entry.name, attr.has_param());
                let error = TagError::UnresolvedAttribute {
                    attribute: entry.name.clone(),
                    type_name: reported.object_name(),
                    index: attr.fulfilled(),
                };
                let near = near.into_iter().filter(|n| *n != entry.name).collect();
                Err(attr.halt(error, near))
            }
        }
    }

    fn unresolved(&self, attr: &Attribute<'_>, value: &ObjectTag) -> TagError {
        TagError::UnresolvedAttribute {
            attribute: attr.current().map(|s| s.raw_key.clone()).unwrap_or_default(),
            type_name: value.type_name(),
            index: attr.fulfilled(),
        }
    }

    // ── Diagnostics ──

    fn report_invalid(&self, tag: &TagRef, halt: &Halt, ctx: &TagContext) {
        let host = &ctx.host;
        let mut message = format!("Tag <{}> is invalid! ({})", tag.raw, halt.error);
        if looks_like_type_notation(&tag.raw) {
            message.push_str(
                " Note: ObjectTag notation like <ElementTag> is for documentation, \
                 and is not meant to be used literally.",
            );
        }
        host.echo_error(ctx, &message);

        if halt.index > 0 && !halt.unfilled.is_empty() {
            host.echo_debug(
                ctx,
                &format!("Unfilled or unrecognized sub-tag(s) '{}' for tag <{}>!", halt.unfilled, tag.raw),
            );
        }
        if let Some(last) = &halt.last_valid {
            host.echo_debug(
                ctx,
                &format!(
                    "The returned value from initial tag fragment '{}' was: '{}'.",
                    halt.filled,
                    last.debug_form()
                ),
            );
        }
        if !halt.almost.is_empty() {
            let hint = if halt.context_failed {
                "missing [context] parameter?"
            } else {
                "possibly bad input?"
            };
            host.echo_debug(
                ctx,
                &format!("Almost matched but failed ({hint}): {}", halt.almost.join(", ")),
            );
        }
    }
}

/// Stop with a timeout once the job's token has fired.
fn cancelled(attr: &mut Attribute<'_>) -> Option<Halt> {
    let budget = attr.token().filter(|t| t.is_cancelled())?.budget();
    Some(attr.halt(TagError::Timeout { after: budget }, Vec::new()))
}

/// `<ElementTag.foo>`-style text copied out of documentation.
fn looks_like_type_notation(raw: &str) -> bool {
    static NOTATION: OnceLock<Option<Regex>> = OnceLock::new();
    NOTATION
        .get_or_init(|| Regex::new(r"(?i)<\w+tag[\[.>].*").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(&format!("<{raw}>")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
