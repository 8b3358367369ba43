//! Ordered lists, written `li@a|b|c|`.
//!
//! Every item in an identity is closed by a `|`, so `li@` is the empty list
//! and `li@|` is a list holding one empty item.  Hand-written text may leave
//! the final `|` off.

use crate::tag::context::TagContext;
use crate::tag::escape::{escape, unescape};
use crate::tag::object::{ObjectTag, TagVariant};
use crate::tag::registry::{Arity, Registry};

use super::ElementTag;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListTag(Vec<ObjectTag>);

impl ListTag {
    pub fn new(items: Vec<ObjectTag>) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &[ObjectTag] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse `a|b|c`, with or without the `li@` prefix.  A single trailing
    /// `|` closes the last item.
    pub fn from_text(text: &str) -> Self {
        let body = strip_prefix_ci(text, "li@").unwrap_or(text);
        if body.is_empty() {
            return Self::default();
        }
        let body = body.strip_suffix('|').unwrap_or(body);
        Self(body.split('|').map(|item| ObjectTag::from_identity(&unescape(item))).collect())
    }

    pub fn identity(&self) -> String {
        let mut out = String::from("li@");
        for item in &self.0 {
            out.push_str(&escape(&item.identity()));
            out.push('|');
        }
        out
    }

    pub fn debug_form(&self) -> String {
        let items: Vec<String> = self.0.iter().map(ObjectTag::debug_form).collect();
        format!("li@{}", items.join(" | "))
    }

    pub(crate) fn parse_in(text: &str, _ctx: &TagContext) -> Option<Self> {
        Some(Self::from_text(text))
    }

    /// Item at a 1-based index; negative indexes count from the end.
    pub fn get(&self, index: i64) -> Option<&ObjectTag> {
        let len = self.0.len() as i64;
        let pos = if index < 0 { len + index } else { index - 1 };
        if (0..len).contains(&pos) {
            self.0.get(pos as usize)
        } else {
            None
        }
    }
}

pub(crate) fn strip_prefix_ci<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

pub(super) fn register(reg: &mut Registry) {
    reg.register::<ListTag, _>(&["size"], Arity::None, |l, _| {
        Some(ElementTag::from(l.len() as i64).into())
    });
    reg.register::<ListTag, _>(&["get"], Arity::Required, |l, attr| {
        let index = attr.param_as::<ElementTag>()?.as_i64()?;
        l.get(index).cloned()
    });
    reg.register::<ListTag, _>(&["first"], Arity::None, |l, _| l.0.first().cloned());
    reg.register::<ListTag, _>(&["last"], Arity::None, |l, _| l.0.last().cloned());
    reg.register::<ListTag, _>(&["reverse"], Arity::None, |l, _| {
        Some(ListTag(l.0.iter().rev().cloned().collect()).into())
    });
    reg.register::<ListTag, _>(&["contains"], Arity::Required, |l, attr| {
        let needle = attr.param()?.identity();
        let found = l.0.iter().any(|v| v.identity().eq_ignore_ascii_case(&needle));
        Some(ElementTag::from(found).into())
    });
    reg.register::<ListTag, _>(&["separated_by"], Arity::Required, |l, attr| {
        let sep = attr.param()?.identity();
        let items: Vec<String> = l.0.iter().map(ObjectTag::identity).collect();
        Some(ObjectTag::element(items.join(&sep)))
    });
    reg.register::<ListTag, _>(&["include"], Arity::Required, |l, attr| {
        let more = ListTag::convert(&attr.param()?, attr.context())?;
        let mut items = l.0.clone();
        items.extend(more.0);
        Some(ListTag(items).into())
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────
