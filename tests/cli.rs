//! Smoke tests for the `flyer-factory` binary.

use std::process::{Command, Output};
use tempfile::TempDir;

fn run(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flyer-factory"))
        .current_dir(dir.path())
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn gen_config_parses_back() {
    let dir = TempDir::new().unwrap();
    let out = run(&dir, &["gen-config"]);
    assert!(out.status.success());
    let parsed = flyer_factory::config::parse_config(&stdout(&out)).unwrap();
    assert_eq!(parsed, flyer_factory::config::FlyerConfig::default());
}

#[test]
fn layouts_lists_the_catalog() {
    let dir = TempDir::new().unwrap();
    let out = run(&dir, &["layouts"]);
    assert!(out.status.success());
    let text = stdout(&out);
    for key in [
        "TwoColumnLayout",
        "LargeLayout",
        "ThreeColumnLayout",
        "FeaturedLayout",
        "PhonebankLayout",
        "TwoUpLayout",
    ] {
        assert!(text.contains(key), "missing {key}:\n{text}");
    }
}

#[test]
fn templates_reports_an_empty_directory() {
    let dir = TempDir::new().unwrap();
    let out = run(&dir, &["templates"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "No templates in flyer-templates");
}

#[test]
fn unknown_layout_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("events.json"), "[]").unwrap();
    let out = run(
        &dir,
        &[
            "build", "-t", "rally", "-l", "NoSuchLayout", "-e", "events.json", "-o", "out.pdf",
        ],
    );
    assert!(!out.status.success());
    assert!(!dir.path().join("out.pdf").exists());
}
