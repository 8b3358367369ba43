//! References to running queues, by id.

use crate::tag::context::TagContext;
use crate::tag::object::ObjectTag;
use crate::tag::registry::{Arity, Registry};

use super::list::strip_prefix_ci;
use super::{ElementTag, ListTag};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueTag {
    id: String,
}

impl QueueTag {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn identity(&self) -> String {
        format!("q@{}", self.id)
    }

    /// `q@id` is taken at its word; a bare id must name a live queue.
    pub(crate) fn parse_in(text: &str, ctx: &TagContext) -> Option<Self> {
        match strip_prefix_ci(text, "q@") {
            Some(id) if !id.is_empty() => Some(Self::new(id)),
            Some(_) => None,
            None => ctx.host.queue_exists(text).then(|| Self::new(text)),
        }
    }
}

pub(super) fn register(reg: &mut Registry) {
    reg.register::<QueueTag, _>(&["id"], Arity::None, |q, _| Some(ObjectTag::element(q.id.as_str())));
    reg.register::<QueueTag, _>(&["exists"], Arity::None, |q, attr| {
        Some(ElementTag::from(attr.context().host.queue_exists(&q.id)).into())
    });
    reg.register::<QueueTag, _>(&["definition"], Arity::Required, |q, attr| {
        let name = attr.param()?.identity();
        attr.context().host.definition(&q.id, &name)
    });
    reg.register::<QueueTag, _>(&["definitions"], Arity::None, |q, attr| {
        let names = attr.context().host.definition_names(&q.id);
        Some(ListTag::new(names.into_iter().map(ObjectTag::element).collect()).into())
    });
}
