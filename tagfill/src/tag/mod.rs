//! Tag resolution: turning `<...>` expressions in script text into values.
//!
//! | Stage          | Module        | Produces                                |
//! |----------------|---------------|-----------------------------------------|
//! | scan           | [`scanner`]   | literal / tag / error fragments         |
//! | memoize        | [`cache`]     | shared fragment lists keyed by text     |
//! | split          | [`attribute`] | a chain of `name[param]` segments       |
//! | resolve        | [`engine`]    | a typed [`ObjectTag`] or a [`Halt`]     |
//! | bound          | [`executor`]  | the same, under a wall-clock limit      |
//!
//! Dispatch goes through a [`Registry`] of tag bases and per-type
//! attributes; [`types`] and [`bases`] supply the built-ins.
//!
//! ```
//! use tagfill::tag::{Engine, TagContext};
//!
//! let engine = Engine::new();
//! let ctx = TagContext::default();
//! assert_eq!(engine.tag("<duration[1m].in_seconds>", &ctx), "60.0");
//! assert_eq!(engine.tag("took <duration[9030s].formatted>", &ctx), "took 2h 30m");
//! ```

pub mod attribute;
pub mod bases;
pub mod cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod escape;
pub mod executor;
pub mod host;
pub mod object;
pub mod registry;
pub mod scanner;
pub mod types;

pub use attribute::{Attribute, Segment, TagChain};
pub use cache::ParseCache;
pub use context::TagContext;
pub use engine::{Engine, EngineBuilder, Halt, Outcome};
pub use error::TagError;
pub use executor::{BoundedExecutor, CancelToken};
pub use host::{CustomContainer, MemoryHost, NoHost, ScriptEntry, ScriptHost};
pub use object::{ObjectTag, TagType, TagVariant};
pub use registry::{Arity, Registry, RegistryError};
pub use scanner::{Fragment, ParsedText, TagRef};
