//! Error kinds produced while scanning and resolving tags.
//!
//! None of these escape the text-fill operations on [`Engine`](super::Engine):
//! every failure is recovered into a fallback substitution plus a diagnostic.
//! They surface to callers only through [`Outcome::Halted`](super::Outcome).

use std::time::Duration;

use thiserror::Error;

/// A failure while scanning or resolving a single tag.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TagError {
    /// Malformed bracket nesting inside a tag.
    #[error("{0}")]
    Scan(String),

    /// The root segment named no registered tag-base, or its handler
    /// produced nothing.
    #[error("tag-base '{name}' {}", base_reason(.registered))]
    UnresolvedBase { name: String, registered: bool },

    /// A segment after the root was not recognised by the current value.
    #[error("unrecognized attribute '{attribute}' on {type_name} (segment {index})")]
    UnresolvedAttribute {
        attribute: String,
        type_name: &'static str,
        index: usize,
    },

    /// The handler needs a `[bracketed]` argument the input did not provide.
    #[error("attribute '{attribute}' requires a [parameter]")]
    ArgumentRequired { attribute: String },

    /// Bounded resolution exceeded its wall-clock budget.
    #[error("tag filling timed out after {after:?}")]
    Timeout { after: Duration },

    /// The guarded worker failed unexpectedly.
    #[error("tag worker failed: {0}")]
    WorkerFault(String),
}

fn base_reason(registered: &bool) -> &'static str {
    if *registered {
        "returned nothing"
    } else {
        "has no handler"
    }
}

impl TagError {
    /// `true` for the kinds raised at the executor boundary.
    pub fn is_bounded_failure(&self) -> bool {
        matches!(self, TagError::Timeout { .. } | TagError::WorkerFault(_))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
