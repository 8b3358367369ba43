//! The value model: [`ObjectTag`] and its variants.
//!
//! | Variant    | Identity                   | Host needed to rebuild |
//! |------------|----------------------------|------------------------|
//! | `Element`  | the text itself            | no                     |
//! | `List`     | `li@a\|b\|c\|`             | no                     |
//! | `Map`      | `map@[k=v;k2=v2]`          | no                     |
//! | `Duration` | `d@90.0s`                  | no                     |
//! | `Time`     | `time@2024-01-02T03:04:05.000Z` | no                |
//! | `Queue`    | `q@id`                     | yes                    |
//! | `Script`   | `s@name`                   | yes                    |
//! | `Custom`   | `custom@name[k=v]`         | yes                    |
//!
//! Values are plain owned data.  Queue and script variants hold only a name;
//! whether that name still refers to anything is asked of the host at the
//! moment an attribute needs it.

use std::fmt;

use super::context::TagContext;
use super::types::{
    CustomObject, DurationTag, ElementTag, ListTag, MapTag, QueueTag, ScriptTag, TimeTag,
};

// ── TagType ───────────────────────────────────────────────────────────────────

/// Discriminant used as the attribute-registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    Element,
    List,
    Map,
    Duration,
    Time,
    Queue,
    Script,
    Custom,
}

impl TagType {
    /// Short name, as returned by `<x.object_type>`.
    pub fn name(self) -> &'static str {
        match self {
            TagType::Element => "Element",
            TagType::List => "List",
            TagType::Map => "Map",
            TagType::Duration => "Duration",
            TagType::Time => "Time",
            TagType::Queue => "Queue",
            TagType::Script => "Script",
            TagType::Custom => "Custom",
        }
    }

    /// Documentation-style name (`ElementTag`, `ListTag`, …).
    pub fn object_name(self) -> &'static str {
        match self {
            TagType::Element => "ElementTag",
            TagType::List => "ListTag",
            TagType::Map => "MapTag",
            TagType::Duration => "DurationTag",
            TagType::Time => "TimeTag",
            TagType::Queue => "QueueTag",
            TagType::Script => "ScriptTag",
            TagType::Custom => "CustomObject",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.object_name())
    }
}

// ── ObjectTag ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectTag {
    Element(ElementTag),
    List(ListTag),
    Map(MapTag),
    Duration(DurationTag),
    Time(TimeTag),
    Queue(QueueTag),
    Script(ScriptTag),
    Custom(CustomObject),
}

impl ObjectTag {
    /// Shorthand for an element value.
    pub fn element(text: impl Into<String>) -> Self {
        ObjectTag::Element(ElementTag::new(text))
    }

    pub fn tag_type(&self) -> TagType {
        match self {
            ObjectTag::Element(_) => TagType::Element,
            ObjectTag::List(_) => TagType::List,
            ObjectTag::Map(_) => TagType::Map,
            ObjectTag::Duration(_) => TagType::Duration,
            ObjectTag::Time(_) => TagType::Time,
            ObjectTag::Queue(_) => TagType::Queue,
            ObjectTag::Script(_) => TagType::Script,
            ObjectTag::Custom(_) => TagType::Custom,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.tag_type().object_name()
    }

    /// Canonical string form; parsing it back gives an equivalent value.
    pub fn identity(&self) -> String {
        match self {
            ObjectTag::Element(v) => v.identity(),
            ObjectTag::List(v) => v.identity(),
            ObjectTag::Map(v) => v.identity(),
            ObjectTag::Duration(v) => v.identity(),
            ObjectTag::Time(v) => v.identity(),
            ObjectTag::Queue(v) => v.identity(),
            ObjectTag::Script(v) => v.identity(),
            ObjectTag::Custom(v) => v.identity(),
        }
    }

    /// Human-oriented form for debug output.
    pub fn debug_form(&self) -> String {
        match self {
            ObjectTag::Element(v) => v.debug_form(),
            ObjectTag::List(v) => v.debug_form(),
            ObjectTag::Map(v) => v.debug_form(),
            ObjectTag::Duration(v) => v.debug_form(),
            ObjectTag::Time(v) => v.debug_form(),
            ObjectTag::Queue(v) => v.identity(),
            ObjectTag::Script(v) => v.identity(),
            ObjectTag::Custom(v) => v.identity(),
        }
    }

    /// The value as an element: itself if it is one, else its identity.
    pub fn as_element(&self) -> ElementTag {
        match self {
            ObjectTag::Element(e) => e.clone(),
            other => ElementTag::new(other.identity()),
        }
    }

    /// Rebuild a value from its identity without consulting any host.
    ///
    /// Unprefixed text, and prefixed text that does not parse, is an element.
    pub fn from_identity(text: &str) -> ObjectTag {
        let Some(at) = text.find('@') else {
            return ObjectTag::element(text);
        };
        let prefix = text[..at].to_ascii_lowercase();
        let rest = &text[at + 1..];
        let parsed = match prefix.as_str() {
            "d" => DurationTag::value_of(text).map(ObjectTag::Duration),
            "time" => TimeTag::value_of(text).map(ObjectTag::Time),
            "li" => Some(ObjectTag::List(ListTag::from_text(text))),
            "map" => MapTag::from_text(text).map(ObjectTag::Map),
            "q" if !rest.is_empty() => Some(ObjectTag::Queue(QueueTag::new(rest))),
            "s" if !rest.is_empty() => Some(ObjectTag::Script(ScriptTag::new(rest))),
            "custom" => CustomObject::from_identity(text).map(ObjectTag::Custom),
            _ => None,
        };
        parsed.unwrap_or_else(|| ObjectTag::element(text))
    }
}

impl Default for ObjectTag {
    fn default() -> Self {
        ObjectTag::Element(ElementTag::default())
    }
}

impl fmt::Display for ObjectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

macro_rules! variant_conversions {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ObjectTag {
                fn from(v: $ty) -> Self {
                    ObjectTag::$variant(v)
                }
            }

            impl TagVariant for $ty {
                const TYPE: TagType = TagType::$variant;

                fn borrow_from(obj: &ObjectTag) -> Option<&Self> {
                    match obj {
                        ObjectTag::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn parse(text: &str, ctx: &TagContext) -> Option<Self> {
                    <$ty>::parse_in(text, ctx)
                }
            }
        )*
    };
}

variant_conversions! {
    Element => ElementTag,
    List => ListTag,
    Map => MapTag,
    Duration => DurationTag,
    Time => TimeTag,
    Queue => QueueTag,
    Script => ScriptTag,
    Custom => CustomObject,
}

// ── TagVariant ────────────────────────────────────────────────────────────────

/// Ties a concrete value type to its [`ObjectTag`] variant.
///
/// Attribute handlers are registered against a `TagVariant` and receive the
/// unwrapped value; parameters are converted with [`TagVariant::convert`].
pub trait TagVariant: Clone + Send + Sync + 'static {
    const TYPE: TagType;

    fn borrow_from(obj: &ObjectTag) -> Option<&Self>;

    /// Parse from text, consulting the host where the type needs one.
    fn parse(text: &str, ctx: &TagContext) -> Option<Self>;

    /// Take the value as-is when it already has this type, else reparse its
    /// identity.
    fn convert(obj: &ObjectTag, ctx: &TagContext) -> Option<Self> {
        match Self::borrow_from(obj) {
            Some(v) => Some(v.clone()),
            None => Self::parse(&obj.identity(), ctx),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
