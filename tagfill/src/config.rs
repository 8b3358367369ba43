//! `tagfill.conf` loader.
//!
//! One `key: value` pair per line; `#` starts a comment line.
//!
//! | Key                         | Type  | Default |
//! |-----------------------------|-------|---------|
//! | `tags.timeout`              | secs  | `10`    |
//! | `tags.timeout_when_silent`  | bool  | `false` |
//! | `tags.workers`              | count | `4`     |
//! | `debug.enabled`             | bool  | `false` |
//! | `debug.show_errors`         | bool  | `true`  |
//! | `definitions.<name>`        | text  |         |
//!
//! A bad line never aborts the load: it is recorded as a [`ConfigError`] and
//! the rest of the file still applies.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::tag::context::{TagContext, DEFAULT_TIMEOUT_SECS};
use crate::tag::executor::DEFAULT_WORKERS;
use crate::tag::host::ScriptHost;

// ── Public types ──────────────────────────────────────────────────────────────

/// Settings read from a config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub tag_timeout: f64,
    pub timeout_when_silent: bool,
    pub workers: usize,
    pub debug: bool,
    pub show_errors: bool,
    /// `definitions.<name>` entries, in file order.
    pub definitions: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_timeout: DEFAULT_TIMEOUT_SECS,
            timeout_when_silent: false,
            workers: DEFAULT_WORKERS,
            debug: false,
            show_errors: true,
            definitions: Vec::new(),
        }
    }
}

/// A non-fatal problem on one config line.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {kind}")]
pub struct ConfigError {
    /// 1-based.
    pub line: usize,
    pub kind: ConfigErrorKind,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigErrorKind {
    #[error("expected `key: value`")]
    MissingColon,
    #[error("unknown key `{0}`")]
    UnknownKey(String),
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
}

// ── Public API ────────────────────────────────────────────────────────────────

impl Config {
    /// Parse config text, returning the settings plus any per-line errors.
    pub fn load_str(src: &str) -> (Self, Vec<ConfigError>) {
        let mut cfg = Self::default();
        let mut errors = Vec::new();

        for (idx, raw) in src.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(kind) = cfg.apply_line(line) {
                errors.push(ConfigError { line: idx + 1, kind });
            }
        }
        (cfg, errors)
    }

    /// Read and parse the file at `path`.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let src = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading config");
        Ok(Self::load_str(&src))
    }

    /// A context carrying these settings, reporting through `host`.
    pub fn context(&self, host: Arc<dyn ScriptHost>) -> TagContext {
        let mut ctx = TagContext::new(host)
            .with_debug(self.debug)
            .with_timeout(self.tag_timeout)
            .with_time_box_when_silent(self.timeout_when_silent);
        ctx.show_errors = self.show_errors;
        ctx
    }

    // ── Line handling ─────────────────────────────────────────────────────────

    fn apply_line(&mut self, line: &str) -> Result<(), ConfigErrorKind> {
        let (key, value) = line.split_once(':').ok_or(ConfigErrorKind::MissingColon)?;
        let key = key.trim();
        let value = value.trim();
        let invalid = || ConfigErrorKind::InvalidValue { key: key.to_owned(), value: value.to_owned() };

        if let Some(name) = key.strip_prefix("definitions.") {
            if name.is_empty() {
                return Err(ConfigErrorKind::UnknownKey(key.to_owned()));
            }
            let name = name.to_lowercase();
            match self.definitions.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value.to_owned(),
                None => self.definitions.push((name, value.to_owned())),
            }
            return Ok(());
        }

        match key {
            "tags.timeout" => {
                self.tag_timeout = value.parse::<f64>().ok().filter(|s| s.is_finite()).ok_or_else(invalid)?;
            }
            "tags.timeout_when_silent" => self.timeout_when_silent = parse_bool(value).ok_or_else(invalid)?,
            "tags.workers" => {
                self.workers = value.parse::<usize>().ok().filter(|&n| n > 0).ok_or_else(invalid)?;
            }
            "debug.enabled" => self.debug = parse_bool(value).ok_or_else(invalid)?,
            "debug.show_errors" => self.show_errors = parse_bool(value).ok_or_else(invalid)?,
            _ => return Err(ConfigErrorKind::UnknownKey(key.to_owned())),
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::host::NoHost;

    #[test]
    fn empty_is_default() {
        let (cfg, errs) = Config::load_str("");
        assert!(errs.is_empty());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn all_keys() {
        let src = "\
# tagfill settings\n\
tags.timeout: 2.5\n\
tags.timeout_when_silent: yes\n\
tags.workers: 8\n\
\n\
debug.enabled: true\n\
debug.show_errors: off\n\
definitions.Target: bob\n";
        let (cfg, errs) = Config::load_str(src);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.tag_timeout, 2.5);
        assert!(cfg.timeout_when_silent);
        assert_eq!(cfg.workers, 8);
        assert!(cfg.debug);
        assert!(!cfg.show_errors);
        assert_eq!(cfg.definitions, vec![("target".to_owned(), "bob".to_owned())]);
    }

    #[test]
    fn definition_value_keeps_colons() {
        let (cfg, errs) = Config::load_str("definitions.when: 12:30");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.definitions[0].1, "12:30");
    }

    #[test]
    fn later_definition_replaces() {
        let (cfg, _) = Config::load_str("definitions.x: 1\ndefinitions.X: 2");
        assert_eq!(cfg.definitions, vec![("x".to_owned(), "2".to_owned())]);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let src = "tags.workers: 0\nbogus line\nnope.key: 1\ntags.timeout: 3";
        let (cfg, errs) = Config::load_str(src);
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[0].line, 1);
        assert!(matches!(errs[0].kind, ConfigErrorKind::InvalidValue { .. }));
        assert_eq!(errs[1].kind, ConfigErrorKind::MissingColon);
        assert_eq!(errs[2].kind, ConfigErrorKind::UnknownKey("nope.key".into()));
        assert_eq!(errs[2].to_string(), "line 3: unknown key `nope.key`");
        // Bad lines don't stop the rest.
        assert_eq!(cfg.tag_timeout, 3.0);
        assert_eq!(cfg.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn context_carries_settings() {
        let (cfg, _) = Config::load_str("tags.timeout: 0\ndebug.show_errors: false\ndebug.enabled: 1");
        let ctx = cfg.context(Arc::new(NoHost));
        assert!(ctx.debug);
        assert!(!ctx.show_errors);
        assert_eq!(ctx.timeout(), None);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"tags.workers: 2\n").unwrap();
        let (cfg, errs) = Config::load_file(file.path()).unwrap();
        assert!(errs.is_empty());
        assert_eq!(cfg.workers, 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_file(&dir.path().join("absent.conf")).is_err());
    }
}
