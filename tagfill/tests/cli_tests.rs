//! Run the `tagfill` binary and check what it prints.
//!
//! Every run passes `-f` so a config file on the machine running the tests
//! can't change the results.

use std::io::Write;
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tagfill"));
    cmd.env_remove("RUST_LOG").env_remove("TAGFILL_CONFIG");
    cmd
}

fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = binary()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn tagfill");
    let mut pipe = child.stdin.take().expect("stdin not open");
    // The binary ignores stdin when given texts and may already be gone.
    let _ = pipe.write_all(stdin.as_bytes());
    drop(pipe);
    child.wait_with_output().expect("wait failed")
}

fn stdout_lines(out: &Output) -> Vec<String> {
    String::from_utf8_lossy(&out.stdout).lines().map(str::to_owned).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn fills_arguments_in_order() {
    let out = run(&["-f", "-e", "<element[a].to_uppercase>", "x <list[1|2].size> y"], "");
    assert!(out.status.success());
    assert_eq!(stdout_lines(&out), vec!["A", "x 2 y"]);
}

#[test]
fn fills_stdin_lines() {
    let out = run(&["-f"], "<duration[1m].in_seconds>\nplain\n<duration[9030s].formatted>\n");
    assert!(out.status.success());
    assert_eq!(stdout_lines(&out), vec!["60.0", "plain", "2h 30m"]);
}

#[test]
fn invalid_tag_is_echoed_and_reported() {
    let out = run(&["-f", "-e", "a <madeup> b"], "");
    assert_eq!(stdout_lines(&out), vec!["a <madeup> b"]);
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("Tag <madeup> is invalid!"), "{err}");
}

#[test]
fn quiet_suppresses_reports() {
    let out = run(&["-q", "-f", "-e", "<madeup>"], "");
    assert_eq!(stdout_lines(&out), vec!["<madeup>"]);
    assert!(!String::from_utf8_lossy(&out.stderr).contains("invalid"));
}

#[test]
fn config_definitions_are_visible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tagfill.conf");
    std::fs::write(&path, "# test\ndefinitions.target: world\nbogus: 1\n").unwrap();
    let conf = format!("-f{}", path.display());

    let out = run(&[conf.as_str(), "hello <[target]>"], "");
    assert_eq!(stdout_lines(&out), vec!["hello world"]);
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("line 3: unknown key `bogus`"), "{err}");
}

#[test]
fn bad_option_exits_with_usage() {
    let out = run(&["-z"], "");
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage: tagfill"));
}
