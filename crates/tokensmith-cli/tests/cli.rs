//! End-to-end tests for the `tokensmith` binary.

mod common;

use common::TestContext;
use predicates::prelude::*;
use serde_json::json;

fn palette() -> serde_json::Value {
    json!({
        "base": { "red": "#f00" },
        "primary": "{base.red}"
    })
}

#[test]
fn test_build_writes_resolved_outputs() {
    let ctx = TestContext::new().with_tokens("color.json", palette());

    ctx.command()
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("from 2 tokens in 1 source"));

    let json: serde_json::Value = serde_json::from_str(&ctx.read_output("color.json")).unwrap();
    assert_eq!(json["primary"], json!("#f00"));
    assert!(ctx.read_output("variables.css").contains("--primary: #f00;"));
    assert!(ctx.output("_color.scss").exists());
}

#[test]
fn test_build_json_report() {
    let ctx = TestContext::new().with_tokens("color.json", palette());

    let output = ctx.command().args(["build", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["tokens"], json!(2));
    assert_eq!(report["sources"], json!(1));
    assert!(report["artifacts"]
        .as_array()
        .unwrap()
        .contains(&json!("color.json")));
}

#[test]
fn test_build_path_overrides() {
    let ctx = TestContext::new();
    std::fs::create_dir_all(ctx.path().join("design")).unwrap();
    std::fs::write(ctx.path().join("design/space.json"), r#"{ "sm": "4px" }"#).unwrap();

    ctx.command()
        .args(["build", "--input", "design", "--output", "public"])
        .assert()
        .success();

    assert!(ctx.path().join("public/space.json").exists());
    assert!(!ctx.output("space.json").exists());
}

#[test]
fn test_quiet_build_prints_nothing() {
    let ctx = TestContext::new().with_tokens("color.json", palette());

    ctx.command()
        .args(["-q", "build"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_check_writes_nothing() {
    let ctx = TestContext::new().with_tokens("color.json", palette());

    ctx.command()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: 2 tokens in 1 source, 0 themes"));

    assert!(!ctx.output("color.json").exists());
}

#[test]
fn test_cycle_exits_with_token_error() {
    let ctx = TestContext::new().with_tokens("loop.json", json!({ "a": "{b}", "b": "{a}" }));

    ctx.command()
        .arg("build")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("error[E003]: cyclic reference"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn test_unresolved_reference_names_both_tokens() {
    let ctx = TestContext::new().with_tokens("color.json", json!({ "bg": "{nowhere}" }));

    ctx.command()
        .arg("check")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("unresolved reference '{nowhere}' in token 'bg'"));
}

#[test]
fn test_missing_input_exits_with_io_error() {
    let ctx = TestContext::new();
    std::fs::remove_dir(ctx.path().join("tokens")).unwrap();

    ctx.command().arg("build").assert().code(3).stderr(predicate::str::contains("error[E002]"));
}

#[test]
fn test_invalid_config_exits_with_config_error() {
    let ctx = TestContext::new()
        .with_tokens("color.json", palette())
        .with_config("unitMultiplier: 0\n");

    ctx.command()
        .arg("build")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unitMultiplier must be a positive number"));
}

#[test]
fn test_config_init_then_show() {
    let ctx = TestContext::new();

    ctx.command()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tokensmith.yaml"));
    assert!(ctx.config_path().exists());

    ctx.command()
        .args(["config", "init"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));

    ctx.command()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keepServiceFields: all"));
}

#[test]
fn test_config_show_json() {
    let ctx = TestContext::new().with_config("pretty: false\n");

    let output = ctx.command().args(["config", "show", "--format", "json"]).output().unwrap();
    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["pretty"], json!(false));
}

#[test]
fn test_explicit_config_path() {
    let ctx = TestContext::new().with_tokens("color.json", palette());
    std::fs::create_dir_all(ctx.path().join("conf")).unwrap();
    std::fs::write(
        ctx.path().join("conf/tokens.yaml"),
        "paths:\n  input: ../tokens\n  output: ../out\nscss:\n  enabled: false\n",
    )
    .unwrap();

    ctx.command()
        .args(["--config", "conf/tokens.yaml", "build"])
        .assert()
        .success();

    assert!(ctx.path().join("out/color.json").exists());
    assert!(!ctx.path().join("out/_color.scss").exists());
}

#[test]
fn test_completions() {
    TestContext::new()
        .command()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tokensmith"));
}
