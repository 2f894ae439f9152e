//! # Workload Linter Module
//!
//! Advisory checks over a workload document, beyond what generation itself
//! requires.
//!
//! ## Checks Performed
//!
//! 1. **Kind casing** - kinds must be UpperCamelCase (error)
//! 2. **Group shape** - groups must be lowercase DNS labels (error)
//! 3. **Version shape** - versions must look like `v1`, `v1alpha1`, `v2beta3` (error)
//! 4. **Field casing** - field names should be lowerCamelCase (warning)
//! 5. **Required with default** - a default on a required field is never used (warning)
//! 6. **Descriptions** - fields should carry a description (info)
//! 7. **Companion group/version** - companions overriding their parent's group or version (info)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use opforge::linter::{lint_workload, print_lint_issues};
//!
//! let issues = lint_workload(Path::new("workload.yaml"))?;
//! print_lint_issues(&issues);
//! ```

use std::path::Path;

use crate::spec::naming::{
    is_dns_label, is_kube_version, is_lower_camel, is_upper_camel, to_lower_camel,
    to_upper_camel,
};
use crate::spec::{self, Field, ResourceNode, WorkloadSpec};

#[cfg(test)]
mod tests;

/// Severity level for lint issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Error - generation will be rejected
    Error,
    /// Warning - generates, but probably not what was meant
    Warning,
    /// Info - Best practice suggestion
    Info,
}

/// A lint issue found in a workload document
#[derive(Debug, Clone)]
pub struct LintIssue {
    /// Where the issue occurred (e.g. "widget", "widget.spec.fields.replicas")
    pub location: String,
    pub severity: LintSeverity,
    /// Type of lint issue (e.g. "kind_casing", "missing_description")
    pub kind: String,
    /// Human-readable description of the problem
    pub message: String,
    /// Optional suggestion for how to fix it
    pub suggestion: Option<String>,
}

impl LintIssue {
    pub fn new(
        location: impl Into<String>,
        severity: LintSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LintIssue {
            location: location.into(),
            severity,
            kind: kind.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion for fixing the issue
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Lint a workload document and all of its companions.
///
/// Documents that cannot be parsed at all are returned as an error.
pub fn lint_workload(path: &Path) -> anyhow::Result<Vec<LintIssue>> {
    let spec = spec::parse(path)?;
    Ok(lint_spec(&spec))
}

/// Lint an already parsed workload.
pub fn lint_spec(spec: &WorkloadSpec) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    for resource in &spec.resources {
        lint_resource(spec, &mut issues, resource);
    }
    issues
}

fn lint_resource(spec: &WorkloadSpec, issues: &mut Vec<LintIssue>, resource: &ResourceNode) {
    let location = resource.name.as_str();

    if !is_upper_camel(&resource.kind) {
        issues.push(
            LintIssue::new(
                location,
                LintSeverity::Error,
                "kind_casing",
                format!("kind '{}' is not UpperCamelCase", resource.kind),
            )
            .with_suggestion(format!("Use '{}'", to_upper_camel(&resource.kind))),
        );
    }

    if !resource.group.split('.').all(is_dns_label) {
        issues.push(
            LintIssue::new(
                location,
                LintSeverity::Error,
                "group_format",
                format!("group '{}' is not a lowercase DNS label", resource.group),
            )
            .with_suggestion("Use lowercase letters, digits and '-' only"),
        );
    }

    if !is_kube_version(&resource.version) {
        issues.push(
            LintIssue::new(
                location,
                LintSeverity::Error,
                "version_format",
                format!("version '{}' is not a Kubernetes API version", resource.version),
            )
            .with_suggestion("Use v<N>, v<N>alpha<M> or v<N>beta<M>"),
        );
    }

    if let Some(parent) = resource
        .parent
        .as_deref()
        .filter(|_| resource.overrides_group_version)
        .and_then(|p| spec.resource(p))
    {
        if parent.group != resource.group || parent.version != resource.version {
            issues.push(LintIssue::new(
                location,
                LintSeverity::Info,
                "companion_group_version",
                format!(
                    "companion uses {}/{} while its parent '{}' uses {}/{}",
                    resource.group, resource.version, parent.name, parent.group, parent.version
                ),
            ));
        }
    }

    let prefix = format!("{location}.spec.fields");
    for field in &resource.fields {
        lint_field(issues, &prefix, field);
    }
}

fn lint_field(issues: &mut Vec<LintIssue>, prefix: &str, field: &Field) {
    let location = format!("{prefix}.{}", field.name);

    if !is_lower_camel(&field.name) {
        issues.push(
            LintIssue::new(
                &location,
                LintSeverity::Warning,
                "field_casing",
                format!("field '{}' is not lowerCamelCase", field.name),
            )
            .with_suggestion(format!("Use '{}'", to_lower_camel(&field.name))),
        );
    }

    if field.required && field.default.is_some() {
        issues.push(
            LintIssue::new(
                &location,
                LintSeverity::Warning,
                "required_with_default",
                "required field declares a default that can never apply",
            )
            .with_suggestion("Drop the default or make the field optional"),
        );
    }

    if field.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
        issues.push(LintIssue::new(
            &location,
            LintSeverity::Info,
            "missing_description",
            "field has no description",
        ));
    }

    for child in &field.fields {
        lint_field(issues, &location, child);
    }
}

/// Print lint issues grouped by severity
pub fn print_lint_issues(issues: &[LintIssue]) {
    if issues.is_empty() {
        println!("✅ No lint issues found!");
        return;
    }

    let by = |severity: LintSeverity| -> Vec<&LintIssue> {
        issues.iter().filter(|i| i.severity == severity).collect()
    };
    let errors = by(LintSeverity::Error);
    let warnings = by(LintSeverity::Warning);
    let infos = by(LintSeverity::Info);

    println!("\n📋 Lint Results:");
    println!(
        "   {} error(s), {} warning(s), {} info(s)\n",
        errors.len(),
        warnings.len(),
        infos.len()
    );

    for (title, group) in [
        ("❌ Errors (must fix):", errors),
        ("⚠️  Warnings (should fix):", warnings),
        ("ℹ️  Info (best practices):", infos),
    ] {
        if group.is_empty() {
            continue;
        }
        println!("{title}");
        for issue in group {
            println!("   [{}] {}", issue.kind, issue.location);
            println!("      {}", issue.message);
            if let Some(suggestion) = &issue.suggestion {
                println!("      💡 Suggestion: {suggestion}");
            }
        }
        println!();
    }
}

/// Fail if there are any error-level lint issues
pub fn fail_if_errors(issues: &[LintIssue]) -> anyhow::Result<()> {
    let errors = issues
        .iter()
        .filter(|i| i.severity == LintSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("{errors} lint error(s) found");
    }
    Ok(())
}
