//! Tag-base and per-type attribute registries.
//!
//! Handlers are registered once, before the registry is wrapped in an `Arc`
//! and handed to an [`Engine`](super::Engine).  After that it is read-only.
//!
//! Registering a name twice replaces the earlier handler.  The overwrite is
//! logged at `warn`, and [`Registry::validate`] turns it into an error for
//! hosts that want to catch it at startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use super::attribute::Attribute;
use super::object::{ObjectTag, TagType, TagVariant};

// ── Handler types ─────────────────────────────────────────────────────────────

/// Produces the root value of a chain.  The cursor sits on the root segment.
pub type BaseHandler = Arc<dyn Fn(&mut Attribute<'_>) -> Option<ObjectTag> + Send + Sync>;

/// Applies one attribute to a value.  The cursor sits on that attribute.
pub type AttributeHandler =
    Arc<dyn Fn(&ObjectTag, &mut Attribute<'_>) -> Option<ObjectTag> + Send + Sync>;

/// Whether an attribute takes a `[parameter]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Optional,
    Required,
}

impl Arity {
    fn accepts(self, has_param: bool) -> bool {
        match self {
            Arity::None => !has_param,
            Arity::Optional => true,
            Arity::Required => has_param,
        }
    }
}

#[derive(Clone)]
pub struct BaseEntry {
    pub name: String,
    pub return_type: TagType,
    pub handler: BaseHandler,
}

#[derive(Clone)]
pub struct AttributeEntry {
    pub name: String,
    pub arity: Arity,
    pub handler: AttributeHandler,
}

impl fmt::Debug for BaseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseEntry")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for AttributeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeEntry")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate registration: {0}")]
    Duplicate(String),
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Registry {
    bases: HashMap<String, BaseEntry>,
    attributes: HashMap<TagType, HashMap<String, AttributeEntry>>,
    fallbacks: HashMap<TagType, AttributeHandler>,
    universal: HashMap<String, AttributeEntry>,
    duplicates: Vec<String>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("bases", &self.bases.len())
            .field("attributes", &self.attributes.values().map(HashMap::len).sum::<usize>())
            .field("universal", &self.universal.len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in tag bases and types.
    pub fn with_core() -> Self {
        let mut reg = Self::new();
        super::bases::register_core(&mut reg);
        super::types::register_core(&mut reg);
        reg
    }

    /// Shared instance of [`Registry::with_core`].
    pub fn core() -> Arc<Registry> {
        static CORE: OnceLock<Arc<Registry>> = OnceLock::new();
        Arc::clone(CORE.get_or_init(|| Arc::new(Registry::with_core())))
    }

    pub fn register_base<F>(&mut self, name: &str, return_type: TagType, handler: F)
    where
        F: Fn(&mut Attribute<'_>) -> Option<ObjectTag> + Send + Sync + 'static,
    {
        let key = name.to_lowercase();
        let entry = BaseEntry { name: key.clone(), return_type, handler: Arc::new(handler) };
        if self.bases.insert(key.clone(), entry).is_some() {
            self.note_duplicate(format!("tag-base '{key}'"));
        }
    }

    /// Register an attribute on `T` under each of `names`.
    pub fn register<T, F>(&mut self, names: &[&str], arity: Arity, handler: F)
    where
        T: TagVariant,
        F: Fn(&T, &mut Attribute<'_>) -> Option<ObjectTag> + Send + Sync + 'static,
    {
        let handler: AttributeHandler =
            Arc::new(move |obj: &ObjectTag, attr: &mut Attribute<'_>| {
                T::borrow_from(obj).and_then(|v| handler(v, attr))
            });
        for name in names {
            let key = name.to_lowercase();
            let entry = AttributeEntry { name: key.clone(), arity, handler: Arc::clone(&handler) };
            let table = self.attributes.entry(T::TYPE).or_default();
            if table.insert(key.clone(), entry).is_some() {
                self.note_duplicate(format!("{}.{key}", T::TYPE));
            }
        }
    }

    /// Handler tried on `T` when no named attribute matches.
    pub fn register_fallback<T, F>(&mut self, handler: F)
    where
        T: TagVariant,
        F: Fn(&T, &mut Attribute<'_>) -> Option<ObjectTag> + Send + Sync + 'static,
    {
        let handler: AttributeHandler =
            Arc::new(move |obj: &ObjectTag, attr: &mut Attribute<'_>| {
                T::borrow_from(obj).and_then(|v| handler(v, attr))
            });
        if self.fallbacks.insert(T::TYPE, handler).is_some() {
            self.note_duplicate(format!("{} fallback", T::TYPE));
        }
    }

    /// Attribute available on every type.
    pub fn register_universal<F>(&mut self, name: &str, arity: Arity, handler: F)
    where
        F: Fn(&ObjectTag, &mut Attribute<'_>) -> Option<ObjectTag> + Send + Sync + 'static,
    {
        let key = name.to_lowercase();
        let entry = AttributeEntry { name: key.clone(), arity, handler: Arc::new(handler) };
        if self.universal.insert(key.clone(), entry).is_some() {
            self.note_duplicate(format!("universal '{key}'"));
        }
    }

    fn note_duplicate(&mut self, what: String) {
        tracing::warn!("{what} registered twice; the later handler wins");
        self.duplicates.push(what);
    }

    /// Reject a registry in which any name was registered twice.
    pub fn validate(&self) -> Result<(), RegistryError> {
        match self.duplicates.first() {
            Some(first) => Err(RegistryError::Duplicate(first.clone())),
            None => Ok(()),
        }
    }

    // ── Lookups ──

    pub fn base(&self, key: &str) -> Option<&BaseEntry> {
        self.bases.get(key)
    }

    pub fn attribute(&self, ty: TagType, key: &str) -> Option<&AttributeEntry> {
        self.attributes.get(&ty)?.get(key)
    }

    pub fn fallback(&self, ty: TagType) -> Option<&AttributeHandler> {
        self.fallbacks.get(&ty)
    }

    pub fn universal(&self, key: &str) -> Option<&AttributeEntry> {
        self.universal.get(key)
    }

    /// Names on `ty` that look like what `key` may have meant.
    ///
    /// A candidate must accept the same parameter shape and either be within
    /// edit distance 2 or share a prefix or substring with `key`.
    pub fn near_misses(&self, ty: TagType, key: &str, has_param: bool) -> Vec<String> {
        let Some(table) = self.attributes.get(&ty) else {
            return Vec::new();
        };
        let mut found: Vec<String> = table
            .values()
            .filter(|e| e.arity.accepts(has_param))
            .filter(|e| looks_similar(&e.name, key))
            .map(|e| e.name.clone())
            .collect();
        found.sort_unstable();
        found
    }
}

fn looks_similar(candidate: &str, key: &str) -> bool {
    if key.len() >= 3 && (candidate.contains(key) || key.contains(candidate)) {
        return true;
    }
    let shared = candidate.chars().zip(key.chars()).take_while(|(a, b)| a == b).count();
    shared >= 4 || levenshtein(candidate, key) <= 2
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut cur = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        prev = cur;
    }
    prev[b.len()]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
