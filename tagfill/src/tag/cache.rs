//! Memo of scanned texts, keyed by exact source text.
//!
//! Entries are never evicted.  A miss scans while holding only the entry's
//! shard, so racing threads all get the one stored result.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use super::scanner::{self, ParsedText};

#[derive(Debug, Default)]
pub struct ParseCache {
    entries: DashMap<String, Arc<ParsedText>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by engines built with default settings.
    pub fn global() -> Arc<ParseCache> {
        static GLOBAL: OnceLock<Arc<ParseCache>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ParseCache::new())))
    }

    pub fn get(&self, text: &str) -> Option<Arc<ParsedText>> {
        self.entries.get(text).map(|hit| Arc::clone(hit.value()))
    }

    pub fn get_or_parse(&self, text: &str) -> Arc<ParsedText> {
        if let Some(hit) = self.get(text) {
            return hit;
        }
        let entry = self
            .entries
            .entry(text.to_owned())
            .or_insert_with(|| Arc::new(scanner::scan(text)));
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
