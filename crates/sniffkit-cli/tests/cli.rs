//! Runs the `sniffkit` binary against temporary projects.

use std::path::Path;
use std::process::{Command, Output};

fn sniffkit(args: &[&str], cwd: &Path) -> Output {
    let global = tempfile::tempdir().unwrap();
    Command::new(env!("CARGO_BIN_EXE_sniffkit"))
        .args(args)
        .current_dir(cwd)
        .env("SNIFFKIT_CONFIG_DIR", global.path())
        .output()
        .unwrap()
}

fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::Builder::new().prefix("sniffkit").tempdir().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    dir
}

#[test]
fn check_reports_and_fails() {
    let dir = project(&[("src/a.php", "<?php\n$a = (int)$b;\n")]);
    let output = sniffkit(&["check", ".", "--format", "compact"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[SK006]"), "{stdout}");
    assert!(stdout.contains("(fixable)"), "{stdout}");
}

#[test]
fn check_fix_rewrites_files() {
    let dir = project(&[("src/a.php", "<?php\nif (null === $a) {\n    $b = (int)$a;\n}\n")]);
    let output = sniffkit(&["check", ".", "--fix"], dir.path());

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("src/a.php")).unwrap(),
        "<?php\nif ($a === null) {\n    $b = (int) $a;\n}\n"
    );
}

#[test]
fn project_config_selects_rules() {
    let dir = project(&[
        ("sniffkit.toml", "preset = \"minimal\"\n\n[rules.cast-spacing]\nenabled = false\n"),
        ("a.php", "<?php\n$a = (int)$b;\nif (1 == $a) {}\n"),
    ]);
    let output = sniffkit(&["check", "--format", "json"], dir.path());

    assert_eq!(output.status.code(), Some(0));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["files_checked"], 1);
    assert!(json["violations"].as_array().unwrap().is_empty());
}

#[test]
fn psr4_uses_the_project_manifest_from_a_subdirectory() {
    let dir = project(&[
        ("composer.json", r#"{ "autoload": { "psr-4": { "App\\": "src/" } } }"#),
        ("src/Domain/Order.php", "<?php\nnamespace App\\Domain;\n\nclass Invoice {}\n"),
    ]);
    let output = sniffkit(
        &["check", "Order.php", "--rules", "SK007", "--format", "compact"],
        &dir.path().join("src/Domain"),
    );

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[SK007]"), "{stdout}");
    assert!(stdout.contains("expected name \"App\\Domain\\Order\""), "{stdout}");
    assert!(!String::from_utf8_lossy(&output.stderr).contains("failed"));
}

#[test]
fn list_rules_shows_every_code() {
    let dir = tempfile::tempdir().unwrap();
    let output = sniffkit(&["list-rules"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for code in ["SK001", "SK005", "SK009"] {
        assert!(stdout.contains(code), "{code} missing from {stdout}");
    }
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    assert!(sniffkit(&["init"], dir.path()).status.success());
    assert!(dir.path().join("sniffkit.toml").exists());
    assert!(!sniffkit(&["init"], dir.path()).status.success());
    assert!(sniffkit(&["init", "--force"], dir.path()).status.success());
}
