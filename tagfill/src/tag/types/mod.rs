//! Built-in value types and their attributes.
//!
//! | Type           | Module      |
//! |----------------|-------------|
//! | `ElementTag`   | [`element`] |
//! | `ListTag`      | [`list`]    |
//! | `MapTag`       | [`map`]     |
//! | `DurationTag`  | [`duration`]|
//! | `TimeTag`      | [`time`]    |
//! | `QueueTag`     | [`queue`]   |
//! | `ScriptTag`    | [`script`]  |
//! | `CustomObject` | [`custom`]  |

pub mod custom;
pub mod duration;
pub mod element;
pub mod list;
pub mod map;
pub mod queue;
pub mod script;
pub mod time;

pub use custom::CustomObject;
pub use duration::DurationTag;
pub use element::{format_number, ElementTag};
pub use list::ListTag;
pub use map::MapTag;
pub use queue::QueueTag;
pub use script::ScriptTag;
pub use time::TimeTag;

use super::object::ObjectTag;
use super::registry::{Arity, Registry};

/// Register every built-in type's attributes plus the universal ones.
pub fn register_core(reg: &mut Registry) {
    element::register(reg);
    list::register(reg);
    map::register(reg);
    duration::register(reg);
    time::register(reg);
    queue::register(reg);
    script::register(reg);
    custom::register(reg);

    reg.register_universal("object_type", Arity::None, |value, _| {
        Some(ObjectTag::element(value.tag_type().name()))
    });
    reg.register_universal("debug", Arity::None, |value, _| {
        Some(ObjectTag::element(value.debug_form()))
    });
}
