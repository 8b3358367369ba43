//! tagfill: a tag-resolution engine for text scripts.
//!
//! The engine lives in [`tag`].  [`config`], [`cli`] and [`logging`] back the
//! `tagfill` binary, which fills the tags in its arguments or in stdin lines.

pub mod cli;
pub mod config;
pub mod logging;
pub mod tag;
