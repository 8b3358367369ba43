//! End-to-end fills through the public engine API.
//!
//! Each test builds its own engine with a private parse cache so diagnostics
//! and registrations never leak between tests.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tagfill::tag::types::{DurationTag, ElementTag};
use tagfill::tag::{
    Arity, Attribute, CustomContainer, Engine, MemoryHost, ObjectTag, Outcome, ParseCache, Registry,
    ScriptEntry, TagChain, TagContext, TagError, TagType,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn engine_with(registry: Registry) -> Engine {
    Engine::builder()
        .registry(registry)
        .cache(Arc::new(ParseCache::new()))
        .build()
}

fn engine() -> Engine {
    engine_with(Registry::with_core())
}

fn host_and_ctx(host: MemoryHost) -> (Arc<MemoryHost>, TagContext) {
    let host = Arc::new(host);
    let ctx = TagContext::new(host.clone()).with_entry(ScriptEntry::new().in_queue("main"));
    (host, ctx)
}

// ── Filling text ──────────────────────────────────────────────────────────────

#[test]
fn unknown_tag_stays_in_place_with_one_error() {
    let (host, ctx) = host_and_ctx(MemoryHost::new());
    let out = engine().tag("before <madeup.nonsense> after", &ctx);
    assert_eq!(out, "before <madeup.nonsense> after");
    let errors = host.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].starts_with("Tag <madeup.nonsense> is invalid!"), "{}", errors[0]);
}

#[test]
fn silent_context_reports_nothing() {
    let (host, ctx) = host_and_ctx(MemoryHost::new());
    let out = engine().tag("<madeup>", &ctx.silent());
    assert_eq!(out, "<madeup>");
    assert!(host.errors().is_empty());
}

#[test]
fn documentation_notation_gets_a_hint() {
    let (host, ctx) = host_and_ctx(MemoryHost::new());
    engine().tag("<ElementTag.length>", &ctx);
    let errors = host.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("for documentation"), "{}", errors[0]);
}

#[test]
fn fallback_replaces_failed_tag() {
    let (host, ctx) = host_and_ctx(MemoryHost::new());
    assert_eq!(engine().tag("<madeup.thing||nothing here>", &ctx), "nothing here");
    assert!(host.errors().is_empty());
}

#[test]
fn mixed_text_keeps_literals() {
    let (_, ctx) = host_and_ctx(MemoryHost::new().with_queue("main", [("who", ObjectTag::element("ann"))]));
    let out = engine().tag("hi <[who].to_uppercase>, you have <list[a|b|c].size> items", &ctx);
    assert_eq!(out, "hi ANN, you have 3 items");
}

#[test]
fn single_tag_keeps_its_type() {
    let ctx = TagContext::default();
    let value = engine().tag_object("<list[x|y]>", &ctx);
    assert_eq!(value.tag_type(), TagType::List);
    let value = engine().tag_object("two <list[x|y]>", &ctx);
    assert_eq!(value.tag_type(), TagType::Element);
}

// ── Chains ────────────────────────────────────────────────────────────────────

#[test]
fn exact_chain_is_fully_fulfilled() {
    let chain = TagChain::parse("element[hello].to_uppercase.length").unwrap();
    match engine().resolve(&chain, &TagContext::default()) {
        Outcome::Fulfilled { value, fulfilled } => {
            assert_eq!(fulfilled, chain.len());
            assert_eq!(value.identity(), "5");
        }
        Outcome::Halted(halt) => panic!("halted: {}", halt.error),
    }
}

#[test]
fn halt_reports_progress() {
    let chain = TagChain::parse("element[abc].length.bogus_thing").unwrap();
    let Outcome::Halted(halt) = engine().resolve(&chain, &TagContext::default().silent()) else {
        panic!("expected halt");
    };
    assert_eq!(halt.index, 2);
    assert_eq!(halt.total, 3);
    assert_eq!(halt.last_valid.map(|v| v.identity()), Some("3".to_owned()));
    assert!(matches!(halt.error, TagError::UnresolvedAttribute { .. }));
}

#[test]
fn nested_argument_resolves_inner_first() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut reg = Registry::with_core();
    for (name, value) in [("el1", "2"), ("el2", "3")] {
        let log = Arc::clone(&log);
        reg.register_base(name, TagType::Element, move |_| {
            log.lock().unwrap().push(name.to_owned());
            Some(ObjectTag::element(value))
        });
    }
    {
        let log = Arc::clone(&log);
        reg.register::<ElementTag, _>(&["plus"], Arity::Required, move |e, attr| {
            let other = attr.param()?.as_element().as_i64()?;
            log.lock().unwrap().push("plus".to_owned());
            Some(ObjectTag::element((e.as_i64()? + other).to_string()))
        });
    }
    let out = engine_with(reg).tag("<el1.plus[<el2>]>", &TagContext::default());
    assert_eq!(out, "5");
    assert_eq!(*log.lock().unwrap(), vec!["el1", "el2", "plus"]);
}

// ── Bounded resolution ────────────────────────────────────────────────────────

#[test]
fn runaway_handler_times_out() {
    let mut reg = Registry::with_core();
    reg.register_base("spin", TagType::Element, |attr| {
        let give_up = Instant::now() + Duration::from_secs(5);
        while !attr.is_cancelled() && Instant::now() < give_up {
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    });
    let engine = engine_with(reg);
    let (host, ctx) = host_and_ctx(MemoryHost::new());
    let ctx = ctx.with_timeout(0.25).with_time_box_when_silent(true);

    let chain = TagChain::parse("spin").unwrap();
    let started = Instant::now();
    let outcome = engine.resolve(&chain, &ctx);
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    assert!(matches!(outcome.error(), Some(TagError::Timeout { .. })), "{outcome:?}");

    let started = Instant::now();
    assert_eq!(engine.tag("wait <spin> done", &ctx), "wait <spin> done");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(host.errors().len(), 1);
}

#[test]
fn stuck_handler_does_not_starve_later_fills() {
    let mut reg = Registry::with_core();
    reg.register_base("hang", TagType::Element, |_| {
        // Ignores cancellation entirely.
        std::thread::sleep(Duration::from_secs(3));
        None
    });
    let engine = Engine::builder()
        .registry(reg)
        .cache(Arc::new(ParseCache::new()))
        .max_workers(1)
        .build();
    let ctx = TagContext::default().with_timeout(0.2).with_time_box_when_silent(true).silent();

    assert_eq!(engine.tag("<hang>", &ctx), "<hang>");
    let started = Instant::now();
    assert_eq!(engine.tag("<element[ok]>", &ctx), "ok");
    assert!(started.elapsed() < Duration::from_secs(1), "took {:?}", started.elapsed());
}

#[test]
fn nested_tags_inside_a_time_boxed_fill_run_inline() {
    let engine = Engine::builder()
        .cache(Arc::new(ParseCache::new()))
        .max_workers(1)
        .build();
    let ctx = TagContext::default().with_timeout(1.0).with_time_box_when_silent(true).silent();

    let started = Instant::now();
    let out = engine.tag("<element[<element[<element[x]>]>].to_uppercase>", &ctx);
    assert_eq!(out, "X");
    assert!(started.elapsed() < Duration::from_millis(500), "took {:?}", started.elapsed());
}

#[test]
fn untimed_context_runs_inline() {
    let ctx = TagContext::default().with_timeout(0.0);
    assert_eq!(ctx.timeout(), None);
    assert_eq!(engine().tag("<element[a].to_uppercase>", &ctx), "A");
}

#[test]
fn panicking_handler_is_contained() {
    let mut reg = Registry::with_core();
    reg.register_base("boom", TagType::Element, |_: &mut Attribute<'_>| panic!("handler exploded"));
    let engine = engine_with(reg);
    let ctx = TagContext::default().with_timeout(1.0).with_time_box_when_silent(true).silent();

    let outcome = engine.resolve(&TagChain::parse("boom").unwrap(), &ctx);
    assert!(matches!(outcome.error(), Some(TagError::WorkerFault(m)) if m.contains("exploded")));
    // The engine still works afterwards.
    assert_eq!(engine.tag("<element[ok]>", &ctx), "ok");
}

// ── Durations ─────────────────────────────────────────────────────────────────

#[test]
fn duration_text_forms() {
    let secs = |s: &str| DurationTag::value_of(s).map(|d| d.seconds());
    assert_eq!(secs("10s"), Some(10.0));
    assert_eq!(secs("1d"), Some(86400.0));
    assert_eq!(secs("50m"), Some(3000.0));
    assert_eq!(secs("instant"), Some(0.0));
    assert_eq!(secs("infinite"), Some(0.0));
    for text in ["10s-25s", "25s-10s"] {
        let s = secs(text).unwrap();
        assert!((10.0..=25.0).contains(&s), "{text} gave {s}");
    }
}

#[test]
fn duration_formatting_through_tags() {
    let ctx = TagContext::default();
    let e = engine();
    assert_eq!(e.tag("<duration[9030s].formatted>", &ctx), "2h 30m");
    assert_eq!(e.tag("<duration[45s].formatted>", &ctx), "45s");
    assert_eq!(DurationTag::new(0.4).seconds_as_int(), 1);
}

// ── Custom objects ────────────────────────────────────────────────────────────

#[test]
fn custom_objects_inherit_fields() {
    let host = MemoryHost::new()
        .with_custom(CustomContainer::new("vehicle").field("wheels", "4").field("fuel", "gas"))
        .with_custom(CustomContainer::new("bike").inherits("vehicle").field("wheels", "2"));
    let (_, ctx) = host_and_ctx(host);
    let e = engine();
    assert_eq!(e.tag("<custom[bike].wheels>", &ctx), "2");
    assert_eq!(e.tag("<custom[bike].fuel>", &ctx), "gas");
    assert_eq!(e.tag("<custom[bike].object_type>", &ctx), "Custom");
}
