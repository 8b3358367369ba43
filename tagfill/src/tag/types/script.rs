//! References to script containers, by name.

use crate::tag::context::TagContext;
use crate::tag::object::ObjectTag;
use crate::tag::registry::{Arity, Registry};

use super::list::strip_prefix_ci;
use super::ElementTag;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptTag {
    name: String,
}

impl ScriptTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> String {
        format!("s@{}", self.name)
    }

    pub(crate) fn parse_in(text: &str, ctx: &TagContext) -> Option<Self> {
        match strip_prefix_ci(text, "s@") {
            Some(name) if !name.is_empty() => Some(Self::new(name)),
            Some(_) => None,
            None => ctx.host.script_exists(text).then(|| Self::new(text)),
        }
    }
}

pub(super) fn register(reg: &mut Registry) {
    reg.register::<ScriptTag, _>(&["name"], Arity::None, |s, _| {
        Some(ObjectTag::element(s.name.as_str()))
    });
    reg.register::<ScriptTag, _>(&["exists"], Arity::None, |s, attr| {
        Some(ElementTag::from(attr.context().host.script_exists(&s.name)).into())
    });
    reg.register::<ScriptTag, _>(&["container_type"], Arity::None, |s, attr| {
        attr.context().host.script_type(&s.name).map(ObjectTag::element)
    });
}
