//! Diagnostic logging setup.
//!
//! Everything goes to stderr so filled text on stdout stays clean.  `RUST_LOG`
//! wins over the command-line level when it is set.

use std::io::IsTerminal;

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Filter directive for the given flags.
pub fn default_directive(debug: bool, verbose: bool) -> &'static str {
    if verbose {
        "tagfill=trace"
    } else if debug {
        "tagfill=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber.  A second call is a no-op.
pub fn init_logging(debug: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug, verbose)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_beats_debug() {
        assert_eq!(default_directive(false, false), "warn");
        assert_eq!(default_directive(true, false), "tagfill=debug");
        assert_eq!(default_directive(true, true), "tagfill=trace");
    }

    #[test]
    fn init_twice_is_harmless() {
        init_logging(false, false);
        init_logging(true, true);
    }
}
