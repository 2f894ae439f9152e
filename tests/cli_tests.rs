#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use clap::Parser;
use common::workspace::Workspace;
use common::WIDGET_COLLECTION;
use opforge::cli::{run_cli, validate_order, Cli};

fn run(args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["opforge"];
    argv.extend_from_slice(args);
    run_cli(Cli::try_parse_from(argv)?)
}

#[test]
fn test_validate_prints_generation_order() {
    let ws = Workspace::new();
    let path = ws.write("workload.yaml", WIDGET_COLLECTION);
    let order = validate_order(&path).unwrap();
    assert_eq!(
        order,
        [
            "gadget (apps/v1, Kind=Gadget)",
            "widget (apps/v1, Kind=Widget)"
        ]
    );
    run(&["validate", "-w", path.to_str().unwrap()]).unwrap();
}

#[test]
fn test_validate_reports_unknown_dependency() {
    let ws = Workspace::new();
    let path = ws.write(
        "workload.yaml",
        &WIDGET_COLLECTION.replace("- { name: gadget }", "- { name: sprocket }"),
    );
    let err = validate_order(&path).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("failed validation"), "{chain}");
    assert!(chain.contains("unknown resource 'sprocket'"), "{chain}");
}

#[test]
fn test_lint_fail_on_error() {
    let ws = Workspace::new();
    let path = ws.write(
        "workload.yaml",
        &WIDGET_COLLECTION.replace("kind: Widget }", "kind: web_server }"),
    );
    let path = path.to_str().unwrap();
    run(&["lint", "-w", path]).unwrap();
    assert!(run(&["lint", "-w", path, "--fail-on-error"]).is_err());
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let ws = Workspace::new();
    let path = ws.write("workload.yaml", WIDGET_COLLECTION);
    let err = run(&[
        "create-api",
        "-w",
        path.to_str().unwrap(),
        "--config",
        ws.path().join("nope.toml").to_str().unwrap(),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[cfg(unix)]
#[test]
fn test_create_api_reads_project_config() {
    let ws = Workspace::new();
    let path = ws.write("workload.yaml", WIDGET_COLLECTION);
    common::controller_gen::recording(ws.path());
    ws.write("header.txt", "// Copyright Acme.\n");
    ws.write(
        "opforge.toml",
        "output = \"out\"\nboilerplate = \"header.txt\"\ncontroller_gen = \"bin/controller-gen\"\ngenerate_manifests = false\n",
    );

    run(&["create-api", "-w", path.to_str().unwrap()]).unwrap();

    let types = ws.read_out("apis/apps/v1/widget_types.go");
    assert!(types.starts_with("// Copyright Acme.\n"));
    let header = std::fs::canonicalize(ws.path()).unwrap().join("header.txt");
    let log = ws.read_out("controller-gen.log");
    assert_eq!(
        log.lines().collect::<Vec<_>>(),
        [format!("object:headerFile={} paths=./...", header.display())]
    );
}

#[cfg(unix)]
#[test]
fn test_flags_override_project_config() {
    let ws = Workspace::new();
    let path = ws.write("workload.yaml", WIDGET_COLLECTION);
    common::controller_gen::recording(ws.path());
    ws.write(
        "opforge.toml",
        "output = \"elsewhere\"\ncontroller_gen = \"bin/controller-gen\"\ngenerate_manifests = false\n",
    );
    let out = ws.out();

    run(&[
        "create-api",
        "-w",
        path.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
        "--generate-manifests",
        "true",
        "--generate-deep-copy",
        "false",
    ])
    .unwrap();

    assert!(!ws.path().join("elsewhere").exists());
    let log = ws.read_out("controller-gen.log");
    assert_eq!(log.lines().count(), 1);
    assert!(log.starts_with("rbac:roleName=manager-role crd"));
}
