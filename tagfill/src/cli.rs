//! Command-line argument parsing.
//!
//! Usage:
//!   tagfill [-f[<file>]] [-t<secs>] [-dvq] [-e<text>]... [<text>...]

use std::path::PathBuf;

use thiserror::Error;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Config-file specification.
    pub config: ConfigFile,
    /// Time limit override (`-t<secs>`).
    pub timeout: Option<f64>,
    /// Debug fill tracing (`-d`).
    pub debug: bool,
    /// Trace-level logging (`-v`).
    pub verbose: bool,
    /// Suppress invalid-tag reports (`-q`).
    pub quiet: bool,
    /// Texts to fill, from `-e` and positional arguments in order.  Empty
    /// means read stdin.
    pub texts: Vec<String>,
}

/// How to choose the config file.
#[derive(Debug, Default, PartialEq)]
pub enum ConfigFile {
    /// `$TAGFILL_CONFIG`, `./tagfill.conf`, `~/.tagfill.conf` in order (default).
    #[default]
    Search,
    /// `-f` with no file argument: use built-in defaults.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    #[error("-{0} requires an argument")]
    MissingArgument(char),
    #[error("invalid timeout: {0}")]
    BadTimeout(String),
    #[error("unknown option: -{0}")]
    UnknownOption(char),
}

pub const USAGE: &str = "Usage: tagfill [-f[<file>]] [-t<secs>] [-dvq] [-e<text>]... [<text>...]";

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()`.
pub fn parse_args() -> Result<CliArgs, CliError> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    parse_argv(&raw)
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, CliError> {
    let mut args = CliArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        if arg == "--" {
            args.texts.extend(argv[i + 1..].iter().cloned());
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            args.texts.push(arg.to_owned());
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            let flag = chars[j];
            match flag {
                'd' => args.debug = true,
                'v' => args.verbose = true,
                'q' => args.quiet = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else if i + 1 < argv.len() && !argv[i + 1].starts_with('-') {
                        i += 1;
                        args.config = ConfigFile::Explicit(PathBuf::from(&argv[i]));
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // -t<secs>, -e<text>
                't' | 'e' => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(CliError::MissingArgument(flag));
                    };
                    if flag == 't' {
                        let secs: f64 = value.parse().map_err(|_| CliError::BadTimeout(value.clone()))?;
                        if !secs.is_finite() {
                            return Err(CliError::BadTimeout(value));
                        }
                        args.timeout = Some(secs);
                    } else {
                        args.texts.push(value);
                    }
                }

                c => return Err(CliError::UnknownOption(c)),
            }
            j += 1;
        }
        i += 1;
    }

    Ok(args)
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the config file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(p) = std::env::var("TAGFILL_CONFIG") {
        candidates.push(PathBuf::from(p));
    }
    candidates.push(PathBuf::from("./tagfill.conf"));
    if let Ok(home) = std::env::var("HOME") {
        candidates.push(PathBuf::from(home).join(".tagfill.conf"));
    }
    candidates.into_iter().find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
