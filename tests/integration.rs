//! Integration tests for the hexclash binary.
//!
//! Spawns the engine process, sends commands via stdin, and checks the
//! replies on stdout.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Sends a sequence of commands to the engine and collects stdout lines.
fn run_engine_with(extra_args: &[&str], commands: &[&str]) -> Vec<String> {
    let exe = env!("CARGO_BIN_EXE_hexclash");
    let mut child = Command::new(exe)
        .args(extra_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start hexclash");

    let mut stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();
    let reader = std::io::BufReader::new(stdout);

    for cmd in commands {
        writeln!(stdin, "{}", cmd).unwrap();
    }
    stdin.flush().unwrap();
    drop(stdin);

    let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
    let status = child.wait().expect("failed to wait on child");
    assert!(status.success());
    lines
}

fn run_engine(commands: &[&str]) -> Vec<String> {
    run_engine_with(&[], commands)
}

fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("match.toml");
    fs::write(&path, body).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn fresh_status() {
    let lines = run_engine(&["status", "quit"]);
    assert_eq!(
        lines,
        vec!["status round 1 phase shopping-p1 gold 20 20 territory 1 1 units 0 0"]
    );
}

#[test]
fn unknown_commands_are_ignored() {
    let lines = run_engine(&["bogus", "", "buy 1", "deploy 0 0 dragon", "status", "quit"]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("status "));
}

#[test]
fn commands_after_quit_are_not_processed() {
    let lines = run_engine(&["quit", "status"]);
    assert!(lines.is_empty());
}

#[test]
fn full_round_one_session() {
    let lines = run_engine(&[
        "buy 0 1",
        "buy 1 0",
        "deploy 0 0 warrior",
        "deploy 0 1 warrior",
        "done",
        "deploy 6 8 knight",
        "done",
        "step",
        "run",
        "done",
        "status",
        "quit",
    ]);

    assert_eq!(lines[0], "ok");
    assert_eq!(lines[1], "illegal territory already bought this round");
    assert_eq!(lines[2], "ok");
    assert_eq!(lines[3], "ok");
    assert_eq!(lines[4], "phase shopping-p2");
    assert_eq!(lines[5], "ok");
    assert_eq!(lines[6], "phase executing-all");
    assert_eq!(lines[7], "action r1 p1#0 warrior 0,0 move 1,0");
    // run resolves p1#1 then p2#0.
    assert!(lines[8].starts_with("action r1 p1#1 warrior 0,1 move"));
    assert!(lines[9].starts_with("action r1 p2#0 knight 6,8 move"));
    assert_eq!(lines[10], "complete");
    assert_eq!(lines[11], "phase shopping-p1");
    // p1: 20 - 3 - 5 - 5 = 7, +0 interest +5 stipend. p2: 20 - 12 = 8, +0 +5.
    assert!(
        lines[12].starts_with("status round 2 phase shopping-p1 gold 12 13 "),
        "{}",
        lines[12]
    );
    assert!(lines[12].ends_with("units 2 1"));
    assert_eq!(lines.len(), 13);
}

#[test]
fn done_refused_while_units_remain() {
    let lines = run_engine(&[
        "deploy 0 0 warrior",
        "done",
        "done",
        "done",
        "step",
        "done",
        "quit",
    ]);
    assert_eq!(lines[1], "phase shopping-p2");
    assert_eq!(lines[2], "phase executing-all");
    assert_eq!(lines[3], "illegal execution still has 1 unit(s) to resolve");
    // Alone on the board, the warrior idles and player 1 wins at once.
    assert_eq!(lines[4], "action r1 p1#0 warrior 0,0 idle");
    assert_eq!(lines[5], "gameover winner p1");
    assert_eq!(lines[6], "illegal the match is over");
}

#[test]
fn round_limit_decides_on_hit_points() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "round_limit = 1\ngold_cap = 100\n");
    let lines = run_engine_with(
        &["--config", &config],
        &[
            "deploy 0 0 warrior",
            "done",
            "deploy 6 8 knight",
            "done",
            "run",
            "done",
            "status",
            "quit",
        ],
    );
    // Both units only close in during round 1.
    assert!(lines[4].starts_with("action r1 p1#0 warrior 0,0 move"));
    assert!(lines[5].starts_with("action r1 p2#0 knight 6,8 move"));
    assert_eq!(lines[6], "complete");
    // 100 hp against 160: no interest is paid on the final round.
    assert_eq!(lines[7], "phase gameover-p2");
    assert_eq!(lines[8], "gameover winner p2");
    assert!(lines[9].starts_with("status round 1 phase gameover-p2 gold 15 8 "));
}

#[test]
fn bad_config_fails_to_start() {
    let dir = tempfile::tempdir().unwrap();
    for body in [
        "round_limit = 0\ngold_cap = 100\n",
        "stipend = 5\n",
        "round_limit = 3\ngold_cap = 100\n[board]\nrows = 8589934592\ncols = 8589934592\n",
    ] {
        let config = write_config(dir.path(), body);
        let status = Command::new(env!("CARGO_BIN_EXE_hexclash"))
            .args(["--config", config.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(!status.success(), "{}", body);
    }
}

#[test]
fn unusable_store_fails_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("taken");
    fs::write(&blocker, "not a directory").unwrap();
    let status = Command::new(env!("CARGO_BIN_EXE_hexclash"))
        .args(["--store", blocker.to_str().unwrap()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn roster_controls_deployable_units() {
    let lines = run_engine(&[
        "roster",
        "enable titan healer",
        "roster",
        "deploy 0 0 warrior",
        "deploy 0 0 healer",
        "catalog",
        "quit",
    ]);
    assert_eq!(
        lines[0],
        "roster warrior guardian healer berserker knight titan"
    );
    assert_eq!(lines[1], "ok");
    assert_eq!(lines[2], "roster healer titan");
    assert_eq!(lines[3], "illegal unit warrior is not enabled");
    assert_eq!(lines[4], "ok");
    assert_eq!(lines[5], "unit healer Healer tier 1 cost 6 hp 90 atk 10 def 3");
    assert_eq!(lines[6], "unit titan Titan tier 3 cost 20 hp 250 atk 40 def 25");
    assert_eq!(lines.len(), 7);
}

#[test]
fn snapshot_is_one_json_line() {
    let lines = run_engine(&["buy 1 0", "snapshot", "quit"]);
    assert_eq!(lines.len(), 2);
    let v: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(v["schema"], 1);
    assert_eq!(v["state"]["round"], 1);
    assert_eq!(v["state"]["players"][0]["gold"], 17);
}

#[test]
fn store_resumes_between_processes() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("saves");
    let store = store.to_str().unwrap();

    let first = run_engine_with(
        &["--store", store],
        &["buy 0 1", "enable knight", "done", "quit"],
    );
    assert_eq!(first, vec!["ok", "ok", "phase shopping-p2"]);

    let second = run_engine_with(&["--store", store], &["status", "roster", "quit"]);
    assert!(second[0].starts_with("status round 1 phase shopping-p2 gold 17 20 territory 2 1"));
    assert_eq!(second[1], "roster knight");

    let third = run_engine_with(&["--store", store], &["newmatch", "quit"]);
    assert_eq!(third, vec!["ok"]);
    let fourth = run_engine_with(&["--store", store], &["status", "quit"]);
    assert!(fourth[0].starts_with("status round 1 phase shopping-p1 gold 20 20"));
}

#[test]
fn stale_snapshot_for_another_board_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("saves");
    let store = store.to_str().unwrap();
    run_engine_with(&["--store", store], &["buy 0 1", "done", "quit"]);

    let config = write_config(
        dir.path(),
        "round_limit = 10\ngold_cap = 100\n[board]\nrows = 5\ncols = 5\np2_home = [4, 4]\n",
    );
    let lines = run_engine_with(&["--config", &config, "--store", store], &["status", "quit"]);
    assert_eq!(
        lines,
        vec!["status round 1 phase shopping-p1 gold 20 20 territory 1 1 units 0 0"]
    );
}
