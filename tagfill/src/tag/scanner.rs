//! Tag boundary scanning.
//!
//! Splits raw script text into an ordered list of [`Fragment`]s:
//!
//! | Input            | Fragments                                        |
//! |------------------|--------------------------------------------------|
//! | `hello`          | `Literal("hello")`                               |
//! | `a <b.c> d`      | `Literal("a ")`, `Tag(b.c)`, `Literal(" d")`     |
//! | `<a<b>c>`        | `Tag(a<b>c)` (nested openers raise the depth)    |
//! | `x <- y`         | `Literal("x <- y")` (`<-` is not an opener)      |
//! | `<a> <b`         | `Tag(a)`, `Error(..)`, `Literal(" <b")`          |
//!
//! Scanning is a pure function of the input text.

use super::attribute::TagChain;

// ── Fragments ─────────────────────────────────────────────────────────────────

/// A parsed tag occurrence: its raw inner text and the pre-split chain.
#[derive(Debug, Clone, PartialEq)]
pub struct TagRef {
    /// Text between the outer `<` and `>`.
    pub raw: String,
    pub chain: TagChain,
}

/// An advisory or failed-parse note carried in the fragment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIssue {
    pub message: String,
    /// Text this fragment stands for in the output.  Empty for advisory
    /// notes; the full `<...>` text for a tag that failed to parse.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Literal(String),
    Tag(TagRef),
    Error(ScanIssue),
}

/// The fragment list for one source text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedText {
    pub fragments: Vec<Fragment>,
    /// At least one fragment is a [`Fragment::Tag`].
    pub has_tag: bool,
}

impl ParsedText {
    /// The tag, if the text consists of exactly one tag and nothing else.
    pub fn single_tag(&self) -> Option<&TagRef> {
        match self.fragments.as_slice() {
            [Fragment::Tag(t)] => Some(t),
            _ => None,
        }
    }

    /// Rebuild the source text from the fragments.
    pub fn reconstruct(&self) -> String {
        let mut out = String::new();
        for frag in &self.fragments {
            match frag {
                Fragment::Literal(s) => out.push_str(s),
                Fragment::Tag(t) => {
                    out.push('<');
                    out.push_str(&t.raw);
                    out.push('>');
                }
                Fragment::Error(issue) => out.push_str(&issue.source),
            }
        }
        out
    }
}

// ── Scanning ──────────────────────────────────────────────────────────────────

/// Find the next tag at or after byte offset `from`.
///
/// Returns the byte positions of the opening `<` and its matching `>`.
/// A `<` followed directly by `-` never opens a tag.
pub fn locate_tag(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut search = from;
    loop {
        let first = search + text.get(search..)?.find('<')?;
        if bytes.get(first + 1) == Some(&b'-') {
            search = first + 1;
            continue;
        }
        let mut depth = 1usize;
        for (i, &b) in bytes.iter().enumerate().skip(first + 1) {
            match b {
                b'<' => depth += 1,
                b'>' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((first, i));
                    }
                }
                _ => {}
            }
        }
        return None;
    }
}

/// Split `text` into literal, tag and error fragments.
pub fn scan(text: &str) -> ParsedText {
    if !text.contains('>') || text.len() < 3 {
        return literal_only(text);
    }
    let Some(mut found) = locate_tag(text, 0) else {
        return literal_only(text);
    };

    let mut fragments = Vec::new();
    let mut has_tag = false;
    let mut pre_end = 0;
    loop {
        let (open, close) = found;
        if open > pre_end {
            fragments.push(Fragment::Literal(text[pre_end..open].to_owned()));
        }
        let raw = &text[open + 1..close];
        match TagChain::parse(raw) {
            Ok(chain) => {
                has_tag = true;
                fragments.push(Fragment::Tag(TagRef { raw: raw.to_owned(), chain }));
            }
            Err(e) => {
                tracing::trace!(tag = raw, error = %e, "tag failed to parse");
                fragments.push(Fragment::Error(ScanIssue {
                    message: format!("Tag processing failed: {e}"),
                    source: text[open..=close].to_owned(),
                }));
            }
        }
        pre_end = close + 1;
        match locate_tag(text, pre_end) {
            Some(next) => found = next,
            None => break,
        }
    }

    let rest = &text[pre_end..];
    if rest.contains('<') && !rest.contains(":<-") {
        tracing::trace!(snippet = rest, "inconsistent tag marks");
        fragments.push(Fragment::Error(ScanIssue {
            message: format!(
                "Potential issue: inconsistent tag marks in command! (issue snippet: {rest}; from: {text})"
            ),
            source: String::new(),
        }));
    }
    if !rest.is_empty() {
        fragments.push(Fragment::Literal(rest.to_owned()));
    }
    ParsedText { fragments, has_tag }
}

fn literal_only(text: &str) -> ParsedText {
    ParsedText { fragments: vec![Fragment::Literal(text.to_owned())], has_tag: false }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
