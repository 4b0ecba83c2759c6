//! Integration tests for top-level CLI behavior.

use std::path::PathBuf;
use std::process::Command;

fn run_harness(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_plugin-harness");
    Command::new(bin)
        .args(args)
        .env_remove("PLUGIN_HARNESS_RESOURCES")
        .env_remove("PLUGIN_HARNESS_CONFIG")
        .output()
        .expect("failed to run plugin-harness binary")
}

fn fixture(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("plugin_harness_cli_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("out/gen")).unwrap();
    std::fs::create_dir_all(dir.join("refs")).unwrap();
    std::fs::write(dir.join("out/gen/Out.txt"), "line one\r\nline two\r\n").unwrap();
    std::fs::write(dir.join("refs/text.txt"), "line one\nline two\n").unwrap();
    std::fs::write(dir.join("refs/other.txt"), "line one\nline 2\n").unwrap();
    dir
}

#[test]
fn canon_prints_collapsed_path() {
    let output = run_harness(&["canon", "source", "a.b", "Foo.txt"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert_eq!(stdout.trim(), "SOURCE/a/b/Foo.txt");
}

#[test]
fn canon_class_appends_kind_extension() {
    let output = run_harness(&["canon-class", "SOURCE_OUTPUT", "a.b.Foo", "--kind", "class"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert_eq!(stdout.trim(), "SOURCE_OUTPUT/a/b/Foo.class");
}

#[test]
fn canon_class_rejects_unknown_kind() {
    let output = run_harness(&["canon-class", "SOURCE_OUTPUT", "a.b.Foo", "--kind", "binary"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unknown file kind"));
}

#[test]
fn compare_text_match_succeeds_with_json() {
    let dir = fixture("match");
    let root = dir.join("out");
    let refs = dir.join("refs");
    let output = run_harness(&[
        "compare",
        "--root",
        root.to_str().unwrap(),
        "gen/Out.txt",
        "--resources",
        refs.to_str().unwrap(),
        "text.txt",
        "--text",
        "--json",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["matched"], true);
    assert_eq!(report["comparison"], "text");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn compare_mismatch_exits_with_failure() {
    let dir = fixture("mismatch");
    let root = dir.join("out");
    let refs = dir.join("refs");
    let output = run_harness(&[
        "compare",
        "--root",
        root.to_str().unwrap(),
        "gen/Out.txt",
        "--resources",
        refs.to_str().unwrap(),
        "other.txt",
        "--text",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("[FAIL]"));
    assert!(stderr.contains("other.txt"));
    assert!(stderr.contains("line 2"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn compare_reads_resource_dir_from_environment() {
    let dir = fixture("env");
    let root = dir.join("out");
    let output = Command::new(env!("CARGO_BIN_EXE_plugin-harness"))
        .args(["compare", "--root", root.to_str().unwrap(), "gen/Out.txt", "text.txt", "--text"])
        .env_remove("PLUGIN_HARNESS_CONFIG")
        .env("PLUGIN_HARNESS_RESOURCES", dir.join("refs"))
        .output()
        .expect("failed to run plugin-harness binary");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unknown_subcommand_fails() {
    let output = run_harness(&["unknown"]);
    assert!(!output.status.success());
}
