use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("codepp-cli").expect("binary should be built")
}

#[test]
fn detect_reports_line_endings() {
    let dir = tempfile::tempdir().unwrap();
    let unix = dir.path().join("unix.txt");
    let dos = dir.path().join("dos.txt");
    fs::write(&unix, "a\nb\n").unwrap();
    fs::write(&dos, "a\r\nb\r\n").unwrap();

    cli()
        .arg("detect")
        .arg(&unix)
        .arg(&dos)
        .assert()
        .success()
        .stdout(predicate::str::contains("unix.txt: utf-8 | LF"))
        .stdout(predicate::str::contains("dos.txt: utf-8 | CRLF"));
}

#[test]
fn detect_defaults_for_empty_files() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.txt");
    fs::write(&empty, "").unwrap();

    cli()
        .arg("detect")
        .arg(&empty)
        .assert()
        .success()
        .stdout(predicate::str::contains("empty.txt: utf-8 | CRLF"));
}

#[test]
fn normalize_rewrites_to_crlf() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("mixed.txt");
    fs::write(&file, "one\ntwo\r\nthree\n").unwrap();

    cli()
        .arg("normalize")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("normalised"));

    let bytes = fs::read(&file).unwrap();
    assert_eq!(bytes, b"one\r\ntwo\r\nthree\r\n");
}

#[test]
fn normalize_check_flags_pending_files_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("unix.txt");
    fs::write(&file, "one\ntwo\n").unwrap();

    cli()
        .arg("normalize")
        .arg("--check")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("needs normalisation"));

    assert_eq!(fs::read(&file).unwrap(), b"one\ntwo\n");
}

#[test]
fn tree_hides_dot_entries_unless_requested() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), "\n").unwrap();
    fs::write(dir.path().join(".hidden"), "\n").unwrap();

    cli()
        .arg("tree")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("src/"))
        .stdout(predicate::str::contains("lib.rs"))
        .stdout(predicate::str::contains(".hidden").not());

    cli()
        .arg("tree")
        .arg(dir.path())
        .arg("--hidden")
        .assert()
        .success()
        .stdout(predicate::str::contains(".hidden"));
}

#[test]
fn git_status_outside_a_repository_reports_the_fixed_result() {
    let dir = tempfile::tempdir().unwrap();

    cli()
        .arg("git")
        .arg("status")
        .arg("--repo")
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Not a git repository"));
}
