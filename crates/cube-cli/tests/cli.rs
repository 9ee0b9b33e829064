//! End-to-end tests running the `cube` binary against temporary projects.

#![allow(clippy::disallowed_methods)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/app.js", "var dep = require('dep');\nrequire('./view.html');\n");
    write(root, "src/view.html", "<p>hi</p>");
    write(root, "node_modules/dep/index.js", "module.exports = 1;");
    write(root, "node_modules/other/index.js", "module.exports = 2;");
    dir
}

fn cube() -> Command {
    let mut cmd = Command::cargo_bin("cube").unwrap();
    cmd.arg("--no-color");
    cmd
}

#[test]
fn help_lists_subcommands() {
    cube()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("bundle"));
}

#[test]
fn full_build_writes_every_file() {
    let project = project();
    let dest = TempDir::new().unwrap();

    cube()
        .arg("build")
        .arg(project.path())
        .arg("--dest")
        .arg(dest.path())
        .assert()
        .success();

    assert!(dest.path().join("src/app.js").is_file());
    assert!(dest.path().join("node_modules/other/index.js").is_file());
    assert!(dest.path().join("cube.js").is_file());
}

#[test]
fn smart_build_skips_unused_packages() {
    let project = project();
    let dest = TempDir::new().unwrap();

    cube()
        .args(["build", "--smart"])
        .arg(project.path())
        .arg("-o")
        .arg(dest.path())
        .assert()
        .success();

    assert!(dest.path().join("node_modules/dep/index.js").is_file());
    assert!(!dest.path().join("node_modules/other/index.js").exists());
    let view = fs::read_to_string(dest.path().join("src/view.html")).unwrap();
    assert!(view.starts_with(r#"Cube("/src/view.html""#));
}

#[test]
fn dest_can_come_from_cube_toml() {
    let project = project();
    write(project.path(), "cube.toml", "dest = \"out\"\nemit = \"bundles\"\n");

    cube()
        .args(["build", "--smart"])
        .arg(project.path())
        .assert()
        .success();

    let out = project.path().join("out");
    assert!(out.join("cube.bundles.json").is_file());
    assert!(out.join("src/app.js").is_file());
}

#[test]
fn build_without_destination_fails() {
    let project = project();

    cube()
        .arg("build")
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No destination directory configured"));
}

#[test]
fn failing_file_makes_the_build_fail() {
    let project = project();
    fs::write(project.path().join("src/broken.js"), [0xffu8, 0xfe]).unwrap();
    let dest = TempDir::new().unwrap();

    cube()
        .arg("build")
        .arg(project.path())
        .arg("--dest")
        .arg(dest.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("src/broken.js"));
}

#[test]
fn check_reports_missing_dest() {
    let project = project();

    cube()
        .arg("check")
        .arg(project.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("no dest configured"));
}

#[test]
fn bundle_prints_dependencies_first() {
    let project = project();

    let output = cube()
        .args(["bundle", "/src/app.js", "--root"])
        .arg(project.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();

    let dep = stdout.find(r#"Cube("/node_modules/dep/index.js""#).unwrap();
    let view = stdout.find(r#"Cube("/src/view.html""#).unwrap();
    let app = stdout.find(r#"Cube("/src/app.js""#).unwrap();
    assert!(dep < app && view < app);
}

#[test]
fn bundle_output_creates_missing_directories() {
    let project = project();
    let target = project.path().join("dist/js/app.bundle.js");

    cube()
        .args(["bundle", "/src/app.js", "--root"])
        .arg(project.path())
        .arg("-o")
        .arg(&target)
        .assert()
        .success();

    let bundle = fs::read_to_string(&target).unwrap();
    assert!(bundle.contains(r#"Cube("/node_modules/dep/index.js""#));
    assert!(bundle.ends_with("});"));
}

#[test]
fn file_without_dest_prints_the_module() {
    let project = project();

    cube()
        .arg("file")
        .arg(project.path().join("src/view.html"))
        .arg("--root")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"module.exports = "<p>hi</p>";"#));
}
