//! Attribute chains and the resolution cursor.
//!
//! A tag's inner text `a.b[x].c||alt` becomes a [`TagChain`] of three
//! [`Segment`]s with a fallback on the last one.  Splitting happens on `.`
//! only at depth zero of both `[]` and `<>`, so `a.add[<b.c>]` is two
//! segments.  Bracketed parameters stay raw until a handler asks for them.
//!
//! [`Attribute`] is the cursor handed to tag-base and attribute handlers.  It
//! never changes the chain; it only advances `fulfilled`.

use std::fmt;

use super::context::TagContext;
use super::engine::{Engine, Halt};
use super::error::TagError;
use super::executor::{self, CancelToken};
use super::object::{ObjectTag, TagVariant};

// ── Segments ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Lowercased name used for lookups.
    pub key: String,
    /// Name as written.
    pub raw_key: String,
    /// Raw text between the brackets, if any.
    pub param: Option<String>,
    /// Text after a top-level `||`; only ever set on the last segment.
    pub fallback: Option<String>,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_key)?;
        if let Some(p) = &self.param {
            write!(f, "[{p}]")?;
        }
        Ok(())
    }
}

/// A tag split into segments.  Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChain {
    /// The tag's inner text exactly as scanned.
    pub origin: String,
    pub segments: Vec<Segment>,
}

impl TagChain {
    pub fn parse(raw: &str) -> Result<Self, TagError> {
        if raw.is_empty() {
            return Err(TagError::Scan("empty tag".into()));
        }
        let (body, fallback) = split_fallback(raw);
        let mut segments = Vec::new();
        for part in split_segments(body)? {
            segments.push(parse_segment(part)?);
        }
        if let Some(root) = segments.first_mut() {
            // `<[name]>` reads a definition.
            if root.raw_key.is_empty() {
                root.key = "definition".into();
            }
        }
        if let Some(last) = segments.last_mut() {
            last.fallback = fallback.map(str::to_owned);
        }
        Ok(Self { origin: raw.to_owned(), segments })
    }

    pub fn root(&self) -> &Segment {
        &self.segments[0]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The `||` fallback text, if the tag has one.
    pub fn alternative(&self) -> Option<&str> {
        self.segments.last().and_then(|s| s.fallback.as_deref())
    }

    /// Segments `from..to` rejoined with `.`.
    pub fn join(&self, from: usize, to: usize) -> String {
        let to = to.min(self.segments.len());
        let from = from.min(to);
        self.segments[from..to]
            .iter()
            .map(Segment::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Split off the text after the first `||` outside any brackets.
fn split_fallback(raw: &str) -> (&str, Option<&str>) {
    let bytes = raw.as_bytes();
    let (mut square, mut angle) = (0i32, 0i32);
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'[' => square += 1,
            b']' => square -= 1,
            b'<' => angle += 1,
            b'>' => angle -= 1,
            b'|' if square == 0 && angle == 0 && bytes.get(i + 1) == Some(&b'|') => {
                return (&raw[..i], Some(&raw[i + 2..]));
            }
            _ => {}
        }
    }
    (raw, None)
}

fn split_segments(body: &str) -> Result<Vec<&str>, TagError> {
    let mut parts = Vec::new();
    let (mut square, mut angle) = (0usize, 0usize);
    let mut start = 0;
    for (i, b) in body.bytes().enumerate() {
        match b {
            b'[' => square += 1,
            b']' => {
                square = square
                    .checked_sub(1)
                    .ok_or_else(|| TagError::Scan(format!("unexpected ']' in '{body}'")))?;
            }
            b'<' => angle += 1,
            b'>' => angle = angle.saturating_sub(1),
            b'.' if square == 0 && angle == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if square > 0 {
        return Err(TagError::Scan(format!("unclosed '[' in '{body}'")));
    }
    parts.push(&body[start..]);
    if parts.iter().any(|p| p.is_empty()) {
        return Err(TagError::Scan(format!("empty segment in '{body}'")));
    }
    Ok(parts)
}

fn parse_segment(part: &str) -> Result<Segment, TagError> {
    let Some(open) = part.find('[') else {
        return Ok(Segment {
            key: part.to_lowercase(),
            raw_key: part.to_owned(),
            param: None,
            fallback: None,
        });
    };
    let mut depth = 0usize;
    let mut close = None;
    for (i, b) in part.bytes().enumerate().skip(open) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    match close {
        Some(c) if c == part.len() - 1 => {
            let name = &part[..open];
            Ok(Segment {
                key: name.to_lowercase(),
                raw_key: name.to_owned(),
                param: Some(part[open + 1..c].to_owned()),
                fallback: None,
            })
        }
        Some(_) => Err(TagError::Scan(format!("unexpected text after ']' in '{part}'"))),
        None => Err(TagError::Scan(format!("unclosed '[' in '{part}'"))),
    }
}

// ── Attribute cursor ──────────────────────────────────────────────────────────

/// Cursor over a [`TagChain`] during one resolution.
///
/// Offsets passed to the `*_at` accessors are relative to the current
/// segment, which is the first one not yet fulfilled.
pub struct Attribute<'a> {
    chain: &'a TagChain,
    engine: &'a Engine,
    ctx: &'a TagContext,
    token: Option<CancelToken>,
    fulfilled: usize,
    last_valid: Option<ObjectTag>,
    seeming_successes: Vec<String>,
    has_context_failed: bool,
}

impl<'a> Attribute<'a> {
    pub fn new(chain: &'a TagChain, engine: &'a Engine, ctx: &'a TagContext) -> Self {
        Self {
            chain,
            engine,
            ctx,
            token: executor::current_token(),
            fulfilled: 0,
            last_valid: None,
            seeming_successes: Vec::new(),
            has_context_failed: false,
        }
    }

    pub fn chain(&self) -> &'a TagChain {
        self.chain
    }

    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    pub fn context(&self) -> &'a TagContext {
        self.ctx
    }

    pub fn fulfilled(&self) -> usize {
        self.fulfilled
    }

    pub fn remaining(&self) -> usize {
        self.chain.len() - self.fulfilled
    }

    /// Mark `n` more segments as consumed.  Never moves past the end.
    pub fn fulfill(&mut self, n: usize) {
        self.fulfilled = (self.fulfilled + n).min(self.chain.len());
    }

    pub fn segment(&self, offset: usize) -> Option<&'a Segment> {
        self.chain.segments.get(self.fulfilled + offset)
    }

    pub fn current(&self) -> Option<&'a Segment> {
        self.segment(0)
    }

    pub fn key_at(&self, offset: usize) -> Option<&'a str> {
        self.segment(offset).map(|s| s.key.as_str())
    }

    /// Whether the segment at `offset` is named `key`.
    pub fn matches(&self, offset: usize, key: &str) -> bool {
        self.key_at(offset) == Some(key)
    }

    pub fn has_param(&self) -> bool {
        self.has_param_at(0)
    }

    pub fn has_param_at(&self, offset: usize) -> bool {
        self.raw_param_at(offset).is_some()
    }

    pub fn raw_param(&self) -> Option<&'a str> {
        self.raw_param_at(0)
    }

    pub fn raw_param_at(&self, offset: usize) -> Option<&'a str> {
        self.segment(offset).and_then(|s| s.param.as_deref())
    }

    /// Tag-fill the current segment's parameter.
    pub fn param(&self) -> Option<ObjectTag> {
        self.param_at(0)
    }

    pub fn param_at(&self, offset: usize) -> Option<ObjectTag> {
        if self.is_cancelled() {
            return None;
        }
        let raw = self.raw_param_at(offset)?;
        Some(self.engine.tag_object(raw, self.ctx))
    }

    /// The current parameter converted to `T`.
    pub fn param_as<T: TagVariant>(&self) -> Option<T> {
        self.param_as_at(0)
    }

    pub fn param_as_at<T: TagVariant>(&self, offset: usize) -> Option<T> {
        let value = self.param_at(offset)?;
        T::convert(&value, self.ctx)
    }

    /// Set once a bounded resolution has run out of time.
    pub fn is_cancelled(&self) -> bool {
        self.token.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    pub(crate) fn token(&self) -> Option<&CancelToken> {
        self.token.as_ref()
    }

    pub fn last_valid(&self) -> Option<&ObjectTag> {
        self.last_valid.as_ref()
    }

    pub(crate) fn set_last_valid(&mut self, value: ObjectTag) {
        self.last_valid = Some(value);
    }

    /// Note a handler that matched by name but produced nothing.
    pub fn record_seeming_success(&mut self, name: &str) {
        if !self.seeming_successes.iter().any(|n| n == name) {
            self.seeming_successes.push(name.to_owned());
        }
    }

    /// Note that a handler failed for lack of a `[parameter]`.
    pub fn mark_context_failed(&mut self) {
        self.has_context_failed = true;
    }

    /// Segments already consumed, rejoined.
    pub fn filled_string(&self) -> String {
        self.chain.join(0, self.fulfilled)
    }

    /// Segments not yet consumed, rejoined.
    pub fn unfilled_string(&self) -> String {
        self.chain.join(self.fulfilled, self.chain.len())
    }

    /// Stop here and describe where and why.
    pub fn halt(&mut self, error: TagError, near_misses: Vec<String>) -> Halt {
        let mut almost = std::mem::take(&mut self.seeming_successes);
        for name in near_misses {
            if !almost.contains(&name) {
                almost.push(name);
            }
        }
        Halt {
            index: self.fulfilled,
            total: self.chain.len(),
            last_valid: self.last_valid.take(),
            filled: self.filled_string(),
            unfilled: self.unfilled_string(),
            almost,
            context_failed: self.has_context_failed,
            error,
        }
    }
}

impl fmt::Debug for Attribute<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("chain", &self.chain.origin)
            .field("fulfilled", &self.fulfilled)
            .field("last_valid", &self.last_valid)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
