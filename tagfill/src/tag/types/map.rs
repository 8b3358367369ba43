//! Key/value maps, written `map@[k=v;k2=v2]`.  Keys compare case-insensitively.

use crate::tag::context::TagContext;
use crate::tag::escape::{escape, unescape};
use crate::tag::object::ObjectTag;
use crate::tag::registry::{Arity, Registry};

use super::list::strip_prefix_ci;
use super::{ElementTag, ListTag};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapTag(Vec<(String, ObjectTag)>);

impl MapTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ObjectTag> {
        self.0.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v)
    }

    /// Set `key`, replacing any existing entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: ObjectTag) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ObjectTag)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse `k=v;k2=v2`, optionally wrapped as `map@[...]`.
    pub fn from_text(text: &str) -> Option<Self> {
        let body = strip_prefix_ci(text, "map@").unwrap_or(text);
        let body = body
            .strip_prefix('[')
            .and_then(|b| b.strip_suffix(']'))
            .unwrap_or(body);
        let mut map = Self::new();
        for pair in body.split(';').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=')?;
            map.insert(unescape(k), ObjectTag::from_identity(&unescape(v)));
        }
        Some(map)
    }

    pub fn identity(&self) -> String {
        format!("map@[{}]", self.body(ObjectTag::identity))
    }

    pub fn debug_form(&self) -> String {
        format!("map@[{}]", self.body(ObjectTag::debug_form))
    }

    fn body(&self, render: fn(&ObjectTag) -> String) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", escape(k), escape(&render(v))))
            .collect::<Vec<_>>()
            .join(";")
    }

    pub(crate) fn parse_in(text: &str, _ctx: &TagContext) -> Option<Self> {
        Self::from_text(text)
    }
}

pub(super) fn register(reg: &mut Registry) {
    reg.register::<MapTag, _>(&["size"], Arity::None, |m, _| {
        Some(ElementTag::from(m.len() as i64).into())
    });
    reg.register::<MapTag, _>(&["get"], Arity::Required, |m, attr| {
        let key = attr.param()?.identity();
        m.get(&key).cloned()
    });
    reg.register::<MapTag, _>(&["keys"], Arity::None, |m, _| {
        Some(ListTag::new(m.0.iter().map(|(k, _)| ObjectTag::element(k.as_str())).collect()).into())
    });
    reg.register::<MapTag, _>(&["values"], Arity::None, |m, _| {
        Some(ListTag::new(m.0.iter().map(|(_, v)| v.clone()).collect()).into())
    });
    reg.register::<MapTag, _>(&["contains"], Arity::Required, |m, attr| {
        let key = attr.param()?.identity();
        Some(ElementTag::from(m.get(&key).is_some()).into())
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────
