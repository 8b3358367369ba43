use proptest::prelude::*;
use tagfill::tag::scanner::{scan, Fragment};
use tagfill::tag::types::{DurationTag, ListTag};
use tagfill::tag::{Engine, ObjectTag, ParseCache, TagContext};

/// Literal text with no tag delimiters, or a simple tag.
fn piece() -> impl Strategy<Value = String> {
    prop_oneof![
        "[^<>]{0,12}",
        "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}".prop_map(|t| format!("<{t}>")),
    ]
}

proptest! {
    /// Balanced, non-nested text comes back exactly from its fragments.
    #[test]
    fn scan_reconstructs_balanced_text(pieces in prop::collection::vec(piece(), 0..8)) {
        let text: String = pieces.concat();
        let parsed = scan(&text);
        prop_assert_eq!(parsed.reconstruct(), text);
        let tags = parsed.fragments.iter().filter(|f| matches!(f, Fragment::Tag(_))).count();
        prop_assert_eq!(parsed.has_tag, tags > 0);
    }
}

proptest! {
    /// The scanner never panics, whatever the input.
    #[test]
    fn scan_does_not_panic(s in "\\PC*") {
        let _ = scan(&s);
    }

    /// Filling never panics either; failures come back as text.
    #[test]
    fn fill_does_not_panic(s in "[a-z<>\\[\\]|.]{0,24}") {
        let engine = Engine::builder().cache(std::sync::Arc::new(ParseCache::new())).build();
        let _ = engine.tag(&s, &TagContext::default().silent());
    }
}

proptest! {
    /// Parsing a duration's identity gives back the same identity.
    #[test]
    fn duration_identity_is_stable(secs in 0.0f64..1.0e6) {
        let first = DurationTag::new(secs);
        let again = DurationTag::value_of(&first.identity());
        prop_assert_eq!(again.map(|d| d.identity()), Some(first.identity()));
    }

    /// A range picks a whole number of seconds between its ends, in either order.
    #[test]
    fn duration_range_within_bounds(a in 0u32..10_000, b in 0u32..10_000) {
        let picked = DurationTag::value_of(&format!("{a}s-{b}s")).map(|d| d.seconds());
        let (low, high) = (a.min(b) as f64, a.max(b) as f64);
        prop_assert!(picked.is_some_and(|s| (low..=high).contains(&s)), "{picked:?}");
    }

    /// Separator characters inside list items survive the identity form.
    #[test]
    fn list_identity_keeps_items(items in prop::collection::vec("[a-z0-9|;=&]{0,10}", 0..6)) {
        let list = ListTag::new(items.iter().map(|s| ObjectTag::element(s.as_str())).collect());
        let back = ListTag::from_text(&list.identity());
        let texts: Vec<String> = back.items().iter().map(ObjectTag::identity).collect();
        prop_assert_eq!(texts, items);
    }
}
