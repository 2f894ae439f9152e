#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Unit tests for the workload linter

use crate::linter::{fail_if_errors, lint_workload, LintIssue, LintSeverity};
use std::io::Write;
use tempfile::NamedTempFile;

/// Helper to create a temp file with YAML content and run lint_workload on it
fn lint_yaml(content: &str) -> Vec<LintIssue> {
    let mut temp = NamedTempFile::with_suffix(".yaml").expect("create temp file");
    temp.write_all(content.as_bytes()).expect("write workload");
    temp.flush().expect("flush");
    lint_workload(temp.path()).expect("lint workload")
}

fn of_kind<'a>(issues: &'a [LintIssue], kind: &str) -> Vec<&'a LintIssue> {
    issues.iter().filter(|i| i.kind == kind).collect()
}

#[test]
fn test_clean_workload() {
    let issues = lint_yaml(
        r#"
apiVersion: opforge.dev/v1alpha1
kind: StandaloneWorkload
name: widget
spec:
  repository: github.com/acme/widget-operator
  api: { group: apps, version: v1, kind: Widget }
  fields:
    - { name: replicas, type: int, description: Desired replicas. }
"#,
    );
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn test_kind_casing() {
    let issues = lint_yaml(
        r#"
apiVersion: opforge.dev/v1alpha1
kind: StandaloneWorkload
name: widget
spec:
  repository: github.com/acme/widget-operator
  api: { group: apps, version: v1, kind: web_server }
"#,
    );
    let found = of_kind(&issues, "kind_casing");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].severity, LintSeverity::Error);
    assert_eq!(found[0].suggestion.as_deref(), Some("Use 'WebServer'"));
    assert!(fail_if_errors(&issues).is_err());
}

#[test]
fn test_group_and_version_format() {
    let issues = lint_yaml(
        r#"
apiVersion: opforge.dev/v1alpha1
kind: StandaloneWorkload
name: widget
spec:
  repository: github.com/acme/widget-operator
  api: { group: My_Apps, version: version1, kind: Widget }
"#,
    );
    assert_eq!(of_kind(&issues, "group_format").len(), 1);
    assert_eq!(of_kind(&issues, "version_format").len(), 1);
}

#[test]
fn test_field_warnings_and_infos() {
    let issues = lint_yaml(
        r#"
apiVersion: opforge.dev/v1alpha1
kind: StandaloneWorkload
name: widget
spec:
  repository: github.com/acme/widget-operator
  api: { group: apps, version: v1, kind: Widget }
  fields:
    - { name: max_size, type: int, description: Limit. }
    - { name: image, type: string, required: true, default: nginx, description: Image. }
    - name: tls
      type: object
      description: TLS settings.
      fields:
        - { name: secretName, type: string }
"#,
    );
    let casing = of_kind(&issues, "field_casing");
    assert_eq!(casing.len(), 1);
    assert_eq!(casing[0].location, "widget.spec.fields.max_size");
    assert_eq!(casing[0].suggestion.as_deref(), Some("Use 'maxSize'"));

    let defaults = of_kind(&issues, "required_with_default");
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].severity, LintSeverity::Warning);

    let missing = of_kind(&issues, "missing_description");
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].location, "widget.spec.fields.tls.secretName");
    assert!(fail_if_errors(&issues).is_ok());
}

#[test]
fn test_companion_overriding_group_version() {
    let issues = lint_yaml(
        r#"
apiVersion: opforge.dev/v1alpha1
kind: WorkloadCollection
name: widget
spec:
  repository: github.com/acme/widget-operator
  api: { group: apps, version: v1, kind: Widget }
  components:
    - apiVersion: opforge.dev/v1alpha1
      kind: ComponentWorkload
      name: gadget
      spec:
        api: { group: tools, kind: Gadget }
"#,
    );
    let found = of_kind(&issues, "companion_group_version");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].location, "gadget");
    assert_eq!(found[0].severity, LintSeverity::Info);
}

#[test]
fn test_unparseable_document_is_an_error() {
    let mut temp = NamedTempFile::with_suffix(".yaml").unwrap();
    temp.write_all(b"apiVersion: opforge.dev/v9\nkind: StandaloneWorkload\n")
        .unwrap();
    assert!(lint_workload(temp.path()).is_err());
}
