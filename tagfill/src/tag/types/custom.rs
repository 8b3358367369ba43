//! Custom objects built from script containers.
//!
//! A container may `inherit` another.  Loading walks the chain through the
//! host one link at a time and layers the field defaults, ancestors first, so
//! a child's value for a field wins over its parent's.

use std::collections::HashSet;

use crate::tag::context::TagContext;
use crate::tag::escape::{escape, unescape};
use crate::tag::host::ScriptHost;
use crate::tag::object::ObjectTag;
use crate::tag::registry::{Arity, Registry};

use super::list::strip_prefix_ci;
use super::{ListTag, MapTag, ScriptTag};

#[derive(Debug, Clone, PartialEq)]
pub struct CustomObject {
    container: String,
    fields: MapTag,
}

impl CustomObject {
    pub fn new(container: impl Into<String>) -> Self {
        Self { container: container.into(), fields: MapTag::new() }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn get(&self, field: &str) -> Option<&ObjectTag> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: ObjectTag) {
        self.fields.insert(field, value);
    }

    /// Build an object from container `name` and everything it inherits.
    pub fn load(name: &str, host: &dyn ScriptHost) -> Option<Self> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(name.to_owned());
        while let Some(link) = next.take() {
            if !seen.insert(link.to_lowercase()) {
                tracing::warn!(container = %name, at = %link, "custom inheritance loops");
                break;
            }
            match host.custom_container(&link) {
                Some(container) => {
                    next = container.inherit.clone();
                    chain.push(container);
                }
                None if chain.is_empty() => return None,
                None => {
                    tracing::warn!(container = %name, missing = %link, "inherited container not found");
                }
            }
        }

        let mut object = Self::new(chain[0].name.clone());
        for container in chain.iter().rev() {
            for (key, value) in &container.fields {
                object.set(key.to_lowercase(), ObjectTag::element(value.as_str()));
            }
        }
        Some(object)
    }

    /// Rebuild from `custom@name[k=v;...]` without a host.
    pub fn from_identity(text: &str) -> Option<Self> {
        let body = strip_prefix_ci(text, "custom@")?;
        let (name, fields) = match body.find('[') {
            Some(open) => (&body[..open], MapTag::from_text(&body[open..])?),
            None => (body, MapTag::new()),
        };
        if name.is_empty() {
            return None;
        }
        Some(Self { container: unescape(name), fields })
    }

    pub fn identity(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .entries()
            .map(|(k, v)| format!("{}={}", escape(k), escape(&v.identity())))
            .collect();
        format!("custom@{}[{}]", escape(&self.container), fields.join(";"))
    }

    /// Identity fields override the container's current defaults.
    pub(crate) fn parse_in(text: &str, ctx: &TagContext) -> Option<Self> {
        let Some(stored) = Self::from_identity(text) else {
            return Self::load(text, ctx.host.as_ref());
        };
        let mut object = Self::load(&stored.container, ctx.host.as_ref())
            .unwrap_or_else(|| Self::new(stored.container.clone()));
        for (k, v) in stored.fields.entries() {
            object.set(k, v.clone());
        }
        Some(object)
    }
}

pub(super) fn register(reg: &mut Registry) {
    reg.register::<CustomObject, _>(&["script"], Arity::None, |c, _| {
        Some(ScriptTag::new(c.container.as_str()).into())
    });
    reg.register::<CustomObject, _>(&["fields"], Arity::None, |c, _| {
        let keys = c.fields.entries().map(|(k, _)| ObjectTag::element(k)).collect();
        Some(ListTag::new(keys).into())
    });
    reg.register_fallback::<CustomObject, _>(|c, attr| {
        let key = attr.current()?.key.as_str();
        c.get(key).cloned()
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::host::{CustomContainer, MemoryHost};

    fn host() -> MemoryHost {
        MemoryHost::new()
            .with_custom(CustomContainer::new("animal").field("legs", "4").field("sound", "..."))
            .with_custom(CustomContainer::new("dog").inherits("animal").field("sound", "woof"))
    }

    #[test]
    fn child_overrides_parent() {
        let dog = CustomObject::load("dog", &host()).unwrap();
        assert_eq!(dog.container(), "dog");
        assert_eq!(dog.get("sound").map(ObjectTag::identity), Some("woof".into()));
        assert_eq!(dog.get("LEGS").map(ObjectTag::identity), Some("4".into()));
    }

    #[test]
    fn unknown_container() {
        assert!(CustomObject::load("cat", &host()).is_none());
    }

    #[test]
    fn inheritance_loop_terminates() {
        let h = MemoryHost::new()
            .with_custom(CustomContainer::new("a").inherits("b").field("x", "1"))
            .with_custom(CustomContainer::new("b").inherits("a").field("y", "2"));
        let a = CustomObject::load("a", &h).unwrap();
        assert!(a.get("x").is_some());
        assert!(a.get("y").is_some());
    }

    #[test]
    fn identity_round_trip() {
        let dog = CustomObject::load("dog", &host()).unwrap();
        let id = dog.identity();
        assert!(id.starts_with("custom@dog["));
        assert_eq!(CustomObject::from_identity(&id), Some(dog));
        assert!(CustomObject::from_identity("custom@").is_none());
    }
}
