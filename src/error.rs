//! Error taxonomy for the workload compiler.
//!
//! Each pipeline stage owns one error enum. Parse and validation errors are
//! raised before anything touches the output tree; scaffold errors are scoped
//! to a single artifact; finalize errors aggregate external generator failures.

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error returned by the create-api pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The workload document (or one of its companions) could not be loaded.
    #[error(transparent)]
    Parse(#[from] SpecParseError),

    /// The workload model violates a structural invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An artifact of `resource` could not be scaffolded.
    #[error("scaffolding {resource} failed: {source}")]
    Scaffold {
        resource: String,
        #[source]
        source: ScaffoldError,
    },

    /// One or more post-scaffold generators failed.
    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    /// A subcommand phase ran before the phase that prepares its inputs.
    #[error("phase '{0}' ran before its inputs were prepared")]
    PhaseOrder(&'static str),
}

impl Error {
    /// Wrap a scaffold error with the identity of the resource being emitted.
    pub fn scaffold(resource: impl Into<String>, source: ScaffoldError) -> Self {
        Self::Scaffold {
            resource: resource.into(),
            source,
        }
    }
}

/// Malformed or unreadable workload specification input.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpecParseError {
    #[error("unable to read workload document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workload document {path} is not valid YAML: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("workload document {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{document}: unsupported apiVersion '{found}' (expected '{expected}')")]
    UnsupportedSchemaVersion {
        document: String,
        found: String,
        expected: &'static str,
    },

    #[error("{document}: unknown workload kind '{found}'")]
    UnknownWorkloadKind { document: String, found: String },

    #[error("{document}: {reason}")]
    InvalidWorkloadKind { document: String, reason: String },

    #[error("{document}: missing required field '{field}'")]
    MissingRequiredField { document: String, field: String },

    #[error("{document}: field '{field}' declares unknown type '{declared}'")]
    UnknownFieldType {
        document: String,
        field: String,
        declared: String,
    },

    #[error("{document}: default for field '{field}' is invalid: {reason}")]
    InvalidDefault {
        document: String,
        field: String,
        reason: String,
    },

    #[error("{document}: invalid value for '{field}': {reason}")]
    InvalidValue {
        document: String,
        field: String,
        reason: String,
    },

    #[error("circular companion reference: {}", display_paths(.cycle))]
    CircularReference { cycle: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Structural violations detected while building the resource graph.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("duplicate resource {gvk}: declared by both '{first}' and '{second}'")]
    DuplicateGvk {
        gvk: String,
        first: String,
        second: String,
    },

    #[error("resources '{first}' and '{second}' both resolve to name '{name}' in {group_version}")]
    NamingCollision {
        group_version: String,
        name: String,
        first: String,
        second: String,
    },

    #[error("resource name '{name}' is declared in both {first} and {second}")]
    DuplicateResourceName {
        name: String,
        first: String,
        second: String,
    },

    #[error("resource '{resource}' depends on unknown resource '{target}'")]
    UnknownDependency { resource: String, target: String },

    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("resource '{resource}' declares marker '{marker}' more than once or shadows a generated marker")]
    DuplicateMarker { resource: String, marker: String },

    #[error("resource '{resource}' has an invalid {attribute}: '{value}'")]
    InvalidIdentity {
        resource: String,
        attribute: &'static str,
        value: String,
    },

    #[error("resources '{first}' and '{second}' would both be scaffolded to {path}")]
    ArtifactCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("readiness predicate '{predicate}' is defined for both {first} and {second}")]
    DuplicateReadiness {
        predicate: String,
        first: String,
        second: String,
    },
}

/// Malformed marker pairing in a scanned document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkerError {
    #[error("line {line}: marker region '{name}' is never closed")]
    Unclosed { name: String, line: usize },

    #[error("line {line}: end marker '{name}' has no matching begin")]
    UnexpectedEnd { name: String, line: usize },

    #[error("line {line}: end marker '{found}' does not close open region '{open}'")]
    MismatchedEnd {
        open: String,
        found: String,
        line: usize,
    },

    #[error("line {line}: region '{name}' opens as {begin} but closes as {end}")]
    ScopeMismatch {
        name: String,
        begin: String,
        end: String,
        line: usize,
    },

    #[error("line {line}: region '{inner}' is nested inside '{outer}'")]
    Nested {
        outer: String,
        inner: String,
        line: usize,
    },

    #[error("line {line}: marker region '{name}' appears more than once")]
    Duplicate { name: String, line: usize },
}

/// Failure to scaffold one artifact. Previously written artifacts are untouched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScaffoldError {
    #[error("unknown template '{id}'")]
    TemplateResolution { id: String },

    #[error("template '{id}' failed to render: {source}")]
    Render {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("template '{id}' produced malformed markers: {source}")]
    InvalidTemplate {
        id: String,
        #[source]
        source: MarkerError,
    },

    #[error("{path} already exists (use --force to overwrite)")]
    DestinationExists { path: PathBuf },

    #[error("cannot merge into {path}: {source}")]
    MergeConflict {
        path: PathBuf,
        #[source]
        source: MarkerError,
    },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to record project metadata in {path}: {reason}")]
    Project { path: PathBuf, reason: String },
}

impl ScaffoldError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A single external generator step that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// Which post-scaffold step failed.
    pub step: String,
    /// Exit status, or `None` when the process could not be spawned.
    pub status: Option<i32>,
    /// Captured stdout/stderr or the spawn error.
    pub diagnostics: String,
}

impl StepFailure {
    pub(crate) fn exited(step: impl Into<String>, status: ExitStatus, diagnostics: String) -> Self {
        Self {
            step: step.into(),
            status: status.code(),
            diagnostics,
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "{} exited with status {}", self.step, code)?,
            None => write!(f, "{} could not be run", self.step)?,
        }
        let diagnostics = self.diagnostics.trim();
        if !diagnostics.is_empty() {
            write!(f, ":\n{diagnostics}")?;
        }
        Ok(())
    }
}

/// Composite error for the post-scaffold coordinator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{} post-scaffold step(s) failed:\n{}", .failures.len(), display_failures(.failures))]
pub struct FinalizeError {
    pub failures: Vec<StepFailure>,
}

fn display_failures(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  - {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}
