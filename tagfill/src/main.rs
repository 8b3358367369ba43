use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use tagfill::cli::{self, ConfigFile};
use tagfill::config::Config;
use tagfill::logging;
use tagfill::tag::{Engine, MemoryHost, ObjectTag, ScriptEntry, TagContext};

/// Queue the command line's definitions live in.
const CLI_QUEUE: &str = "cli";

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("tagfill: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    logging::init_logging(args.debug, args.verbose);

    // ── Load config ───────────────────────────────────────────────────────────
    let mut config = match &args.config {
        ConfigFile::Skip => Config::default(),
        ConfigFile::Explicit(path) => load_config(path),
        ConfigFile::Search => match cli::find_user_config() {
            Some(path) => load_config(&path),
            None => Config::default(),
        },
    };
    if let Some(secs) = args.timeout {
        config.tag_timeout = secs;
    }
    if args.debug {
        config.debug = true;
    }
    if args.quiet {
        config.show_errors = false;
    }

    // ── Build engine and context ──────────────────────────────────────────────
    let definitions = config
        .definitions
        .iter()
        .map(|(name, value)| (name.clone(), ObjectTag::element(value.as_str())));
    let host = MemoryHost::new().with_queue(CLI_QUEUE, definitions);
    let ctx: TagContext = config
        .context(Arc::new(host))
        .with_entry(ScriptEntry::new().in_queue(CLI_QUEUE));
    let engine = Engine::builder().max_workers(config.workers).build();
    tracing::debug!(?ctx, workers = config.workers, "engine ready");

    // ── Fill ──────────────────────────────────────────────────────────────────
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = if args.texts.is_empty() {
        fill_lines(&engine, &ctx, io::stdin().lock(), &mut out)
    } else {
        args.texts
            .iter()
            .try_for_each(|text| writeln!(out, "{}", engine.tag(text, &ctx)))
    };
    if let Err(e) = result.and_then(|()| out.flush()) {
        // A closed pipe downstream is a normal way to stop.
        if e.kind() != io::ErrorKind::BrokenPipe {
            eprintln!("tagfill: {e}");
            std::process::exit(1);
        }
    }
}

fn load_config(path: &Path) -> Config {
    match Config::load_file(path) {
        Ok((config, errors)) => {
            for e in errors {
                eprintln!("tagfill: {}: {e}", path.display());
            }
            config
        }
        Err(e) => {
            eprintln!("tagfill: warning: {}: {e}", path.display());
            Config::default()
        }
    }
}

fn fill_lines(engine: &Engine, ctx: &TagContext, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
    for line in input.lines() {
        writeln!(out, "{}", engine.tag(&line?, ctx))?;
    }
    Ok(())
}
