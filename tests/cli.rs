//! CLI integration tests for the `lexicrack` binary.
//!
//! Uses `assert_cmd` to spawn the binary as a subprocess and assert on
//! stdout/stderr/exit code. Corpus fixtures are written to the system temp
//! directory per test.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

/// A corpus that knows "hello" and "world" and their sentence contexts.
const CORPUS: &str = "+$ 50\n+hello 100\n+world 80\n+$ 40\n-\n-\n-\n-\n\
+hello 100\n+world 80\n+$ 40\n-\n-\n-\n+world 80\n+$ 40\n-\n-\n+$ 40\n-\n";

fn corpus_file(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    fs::write(&path, CORPUS).unwrap();
    path
}

fn lexicrack_cmd() -> Command {
    Command::cargo_bin("lexicrack").unwrap()
}

// ---------------------------------------------------------------------------
// Basic CLI behavior
// ---------------------------------------------------------------------------

#[test]
fn help_flag() {
    lexicrack_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("weighted word n-gram model"));
}

#[test]
fn version_flag() {
    lexicrack_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lexicrack-cli"));
}

#[test]
fn missing_ciphertext_fails() {
    lexicrack_cmd()
        .args(["--cipher", "simple"])
        .assert()
        .failure();
}

#[test]
fn unknown_cipher_type_fails() {
    lexicrack_cmd()
        .args(["--cipher", "rot13", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown cipher type"));
}

#[test]
fn missing_stats_file_fails() {
    lexicrack_cmd()
        .args([
            "--cipher",
            "simple",
            "--stats",
            "/nonexistent/path/stats.txt",
            "ifmmp",
        ])
        .assert()
        .failure();
}

#[test]
fn unbalanced_stats_file_fails() {
    let path = std::env::temp_dir().join("lexicrack_cli_unbalanced.txt");
    fs::write(&path, "+hello 10\n+world 5\n-\n").unwrap();
    lexicrack_cmd()
        .args(["--cipher", "simple", "--stats", path.to_str().unwrap(), "ifmmp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unbalanced stat file"));
    fs::remove_file(&path).ok();
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[test]
fn simple_cipher_cracks_hello() {
    let path = corpus_file("lexicrack_cli_corpus1.txt");
    lexicrack_cmd()
        .args([
            "--cipher",
            "simple",
            "--stats",
            path.to_str().unwrap(),
            "--low-limit",
            "20",
            "--high-limit",
            "20",
            "--comma-start",
            "--queue-depth",
            "0",
            "ifmmp",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("Task finished"));
    fs::remove_file(&path).ok();
}

#[test]
fn simple_cipher_cracks_two_words() {
    let path = corpus_file("lexicrack_cli_corpus2.txt");
    lexicrack_cmd()
        .args([
            "--cipher",
            "simple",
            "--stats",
            path.to_str().unwrap(),
            "--low-limit",
            "20",
            "--high-limit",
            "20",
            "--comma-start",
            "ifmmpxpsme",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world"));
    fs::remove_file(&path).ok();
}

#[test]
fn no_solution_still_succeeds() {
    let path = corpus_file("lexicrack_cli_corpus3.txt");
    lexicrack_cmd()
        .args([
            "--cipher",
            "simple",
            "--stats",
            path.to_str().unwrap(),
            "--low-limit",
            "20",
            "--high-limit",
            "20",
            "--comma-start",
            // No 3-letter word in the corpus.
            "qqq",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("final 0 result(s)"))
        .stdout(predicate::str::contains("Task finished"));
    fs::remove_file(&path).ok();
}

#[test]
fn multiple_ciphertexts_run_multiple_tasks() {
    let path = corpus_file("lexicrack_cli_corpus4.txt");
    lexicrack_cmd()
        .args([
            "--cipher",
            "simple",
            "--stats",
            path.to_str().unwrap(),
            "--low-limit",
            "20",
            "--high-limit",
            "20",
            "--comma-start",
            "ifmmp",
            "xpsme",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tasks: 2"))
        .stdout(predicate::function(|out: &str| {
            out.matches("Task finished").count() == 2
        }));
    fs::remove_file(&path).ok();
}

#[test]
fn threaded_run_finds_same_solution() {
    let path = corpus_file("lexicrack_cli_corpus5.txt");
    lexicrack_cmd()
        .args([
            "--cipher",
            "simple",
            "--stats",
            path.to_str().unwrap(),
            "--low-limit",
            "20",
            "--high-limit",
            "20",
            "--comma-start",
            "--threads",
            "4",
            "--queue-depth",
            "1",
            "ifmmp",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Threads: 4"))
        .stdout(predicate::str::contains("hello"));
    fs::remove_file(&path).ok();
}

#[test]
fn clear_prefix_constrains_the_search() {
    let path = corpus_file("lexicrack_cli_corpus6.txt");
    // A fixed prefix contradicting every corpus word: no solutions.
    lexicrack_cmd()
        .args([
            "--cipher",
            "simple",
            "--stats",
            path.to_str().unwrap(),
            "--low-limit",
            "20",
            "--high-limit",
            "20",
            "--comma-start",
            "--clear-prefix",
            "z",
            "--queue-depth",
            "0",
            "ifmmp",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("final 0 result(s)"));
    fs::remove_file(&path).ok();
}

#[test]
fn banner_reports_configuration() {
    let path = corpus_file("lexicrack_cli_corpus7.txt");
    lexicrack_cmd()
        .args([
            "--cipher",
            "simple",
            "--stats",
            path.to_str().unwrap(),
            "--comma-start",
            "--queue-depth",
            "0",
            "ifmmp",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cipher type: simple"))
        .stdout(predicate::str::contains("Ciphertext: ifmmp (5)"))
        .stdout(predicate::str::contains("Start comma: yes"))
        .stdout(predicate::str::contains("Odd mode: no"));
    fs::remove_file(&path).ok();
}
