//! Built-in tag bases.
//!
//! | Base                              | Gives                               |
//! |-----------------------------------|-------------------------------------|
//! | `element[x]`                      | `x` as text                         |
//! | `list[a\|b]`, `map[k=v]`          | list / map                          |
//! | `duration[5m]`, `time[..]`        | duration / time                     |
//! | `queue`, `queue[id]`              | current or named queue              |
//! | `script`, `script[name]`          | current or named script             |
//! | `custom[name]`                    | custom object from a container      |
//! | `definition[name]`, `[name]`      | a definition of the current queue   |
//! | `context.name`                    | a context value of the current entry|
//! | `tern[c].pass[a].fail[b]`         | `a` if `c` is true, else `b`        |
//! | `util.time_now`                   | the current time                    |
//! | `util.random.int[a].to[b]`        | random integer in `[a, b]`          |
//! | `util.random.decimal`             | random number in `[0, 1)`           |

use rand::Rng;

use super::attribute::Attribute;
use super::object::{ObjectTag, TagType};
use super::registry::Registry;
use super::types::{
    CustomObject, DurationTag, ElementTag, ListTag, MapTag, QueueTag, ScriptTag, TimeTag,
};

pub fn register_core(reg: &mut Registry) {
    reg.register_base("element", TagType::Element, |attr| {
        Some(ObjectTag::Element(attr.param()?.as_element()))
    });
    reg.register_base("list", TagType::List, |attr| {
        attr.param_as::<ListTag>().map(ObjectTag::from)
    });
    reg.register_base("map", TagType::Map, |attr| attr.param_as::<MapTag>().map(ObjectTag::from));
    reg.register_base("duration", TagType::Duration, |attr| {
        attr.param_as::<DurationTag>().map(ObjectTag::from)
    });
    reg.register_base("time", TagType::Time, |attr| attr.param_as::<TimeTag>().map(ObjectTag::from));

    reg.register_base("queue", TagType::Queue, |attr| {
        let queue = match attr.raw_param() {
            Some(_) => attr.param_as::<QueueTag>(),
            None => attr.context().entry.queue.as_deref().map(QueueTag::new),
        };
        queue.map(ObjectTag::from)
    });
    reg.register_base("script", TagType::Script, |attr| {
        let script = match attr.raw_param() {
            Some(_) => attr.param_as::<ScriptTag>(),
            None => attr.context().entry.script.as_deref().map(ScriptTag::new),
        };
        script.map(ObjectTag::from)
    });
    reg.register_base("custom", TagType::Custom, |attr| {
        attr.param_as::<CustomObject>().map(ObjectTag::from)
    });

    reg.register_base("definition", TagType::Element, definition);
    reg.register_base("context", TagType::Element, context);
    reg.register_base("tern", TagType::Element, ternary);
    reg.register_base("util", TagType::Element, util);
}

fn definition(attr: &mut Attribute<'_>) -> Option<ObjectTag> {
    let name = attr.param()?.identity();
    let ctx = attr.context();
    let queue = ctx.entry.queue.as_deref()?;
    ctx.host.definition(queue, &name)
}

/// `<context.name>` consumes the name segment too.
fn context(attr: &mut Attribute<'_>) -> Option<ObjectTag> {
    let name = attr.key_at(1)?;
    let ctx = attr.context();
    let value = ctx.host.context_value(&ctx.entry, name)?;
    attr.fulfill(1);
    Some(value)
}

/// Only the chosen branch is filled.
fn ternary(attr: &mut Attribute<'_>) -> Option<ObjectTag> {
    let shaped = attr.matches(1, "pass")
        && attr.has_param_at(1)
        && attr.matches(2, "fail")
        && attr.has_param_at(2);
    if !shaped {
        attr.mark_context_failed();
        return None;
    }
    let condition = attr.param()?.as_element().as_bool();
    let chosen = attr.param_at(if condition { 1 } else { 2 })?;
    attr.fulfill(2);
    Some(chosen)
}

fn util(attr: &mut Attribute<'_>) -> Option<ObjectTag> {
    match attr.key_at(1)? {
        "time_now" => {
            attr.fulfill(1);
            Some(TimeTag::now().into())
        }
        "random" => match attr.key_at(2)? {
            "int" if attr.matches(3, "to") => {
                let a = attr.param_as_at::<ElementTag>(2)?.as_i64()?;
                let b = attr.param_as_at::<ElementTag>(3)?.as_i64()?;
                let (low, high) = if a <= b { (a, b) } else { (b, a) };
                let n = rand::thread_rng().gen_range(low..=high);
                attr.fulfill(3);
                Some(ElementTag::from(n).into())
            }
            "decimal" => {
                attr.fulfill(2);
                Some(ElementTag::from(rand::thread_rng().gen::<f64>()).into())
            }
            _ => None,
        },
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::tag::host::{CustomContainer, MemoryHost, ScriptEntry};
    use crate::tag::{Engine, ObjectTag, ParseCache, TagContext};

    fn fill(text: &str, ctx: &TagContext) -> String {
        let engine = Engine::builder().cache(Arc::new(ParseCache::new())).build();
        engine.tag(text, ctx)
    }

    fn host_ctx() -> TagContext {
        let host = MemoryHost::new()
            .with_queue("main", [("target", ObjectTag::element("bob")), ("n", ObjectTag::element("3"))])
            .with_script("greeter", "task")
            .with_custom(CustomContainer::new("pet").field("name", "rex"))
            .with_context("message", ObjectTag::element("hi there"));
        TagContext::new(Arc::new(host))
            .with_entry(ScriptEntry::new().in_queue("main").in_script("greeter"))
    }

    #[test]
    fn literal_bases() {
        let ctx = TagContext::default();
        assert_eq!(fill("<element[hello]>", &ctx), "hello");
        assert_eq!(fill("<list[a|b].size>", &ctx), "2");
        assert_eq!(fill("<map[a=1;b=2].get[b]>", &ctx), "2");
        assert_eq!(fill("<duration[2m].in_seconds>", &ctx), "120.0");
    }

    #[test]
    fn definitions_and_shorthand() {
        let ctx = host_ctx();
        assert_eq!(fill("<definition[target]>", &ctx), "bob");
        assert_eq!(fill("<[target].to_uppercase>", &ctx), "BOB");
        assert_eq!(fill("<[n].add[<[n]>]>", &ctx), "6");
    }

    #[test]
    fn queue_and_script_defaults() {
        let ctx = host_ctx();
        assert_eq!(fill("<queue>", &ctx), "q@main");
        assert_eq!(fill("<queue.definitions>", &ctx), "li@target|n|");
        assert_eq!(fill("<script.container_type>", &ctx), "task");
        assert_eq!(fill("<script[greeter].exists>", &ctx), "true");
    }

    #[test]
    fn context_consumes_name() {
        let ctx = host_ctx();
        assert_eq!(fill("<context.message.length>", &ctx), "8");
    }

    #[test]
    fn custom_fields() {
        let ctx = host_ctx();
        assert_eq!(fill("<custom[pet].name>", &ctx), "rex");
        assert_eq!(fill("<custom[pet].script.name>", &ctx), "pet");
    }

    #[test]
    fn ternary_picks_one_branch() {
        let ctx = TagContext::default();
        assert_eq!(fill("<tern[true].pass[yes].fail[no]>", &ctx), "yes");
        assert_eq!(fill("<tern[false].pass[yes].fail[no]>", &ctx), "no");
        assert_eq!(fill("<tern[true].pass[a].fail[<madeup>]>", &ctx.silent()), "a");
    }

    #[test]
    fn random_int_in_range() {
        let ctx = TagContext::default();
        for _ in 0..20 {
            let n: i64 = fill("<util.random.int[5].to[1]>", &ctx).parse().unwrap();
            assert!((1..=5).contains(&n));
        }
    }

    #[test]
    fn time_now_is_a_time() {
        let ctx = TagContext::default();
        assert_eq!(fill("<util.time_now.object_type>", &ctx), "Time");
    }
}
