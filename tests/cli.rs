//! Smoke tests of the binary surface.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(path, contents).expect("write");
}

#[test]
fn help_describes_the_packager() {
    Command::cargo_bin("edgepack")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("self-contained deployment"));
}

#[test]
fn invalid_node_version_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::cargo_bin("edgepack")
        .expect("binary")
        .args(["--app-dir", dir.path().to_str().expect("utf8")])
        .args(["--node-version", "latest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --node-version"));
}

#[test]
fn missing_build_output_fails_with_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::cargo_bin("edgepack")
        .expect("binary")
        .args(["--app-dir", dir.path().to_str().expect("utf8")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("static"));
}

#[test]
fn static_only_run_produces_a_package() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = dir.path();
    write(&app.join("dist/static/app.css"), "body {}");
    write(&app.join("dist/html/main/index.html"), "<html></html>");

    Command::cargo_bin("edgepack")
        .expect("binary")
        .args(["--app-dir", app.to_str().expect("utf8")])
        .arg("--static-only")
        .assert()
        .success();

    let out = app.join(".edgepack");
    assert!(out.join("static/app.css").is_file());
    assert!(out.join("main/index.html").is_file());
    assert!(out.join("edgepack.json").is_file());
    assert!(!out.join("node-functions").exists());
}
