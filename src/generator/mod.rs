//! # Generator Module
//!
//! Turns a validated [`WorkloadSpec`](crate::spec::WorkloadSpec) into an
//! operator source tree.
//!
//! ## Architecture
//!
//! ```text
//! ordered resources → RenderContext → TemplateRegistry → marker merge → atomic write
//!                                                                      └→ PROJECT
//! ```
//!
//! Each resource yields a fixed set of [`Artifact`]s. An artifact names a
//! template id, a destination derived from the resource identity, and a
//! [`MutationPolicy`] that decides what happens when the destination exists:
//!
//! | Artifact | Destination | Policy |
//! |---|---|---|
//! | API types | `apis/<group>/<version>/<kind>_types.go` | always overwritten |
//! | manifest set | `config/manifests/<group>_<version>_<kind>.yaml` | merged |
//! | sample | `config/samples/<group>_<version>_<kind>.yaml` | written once |
//! | dependency check | `internal/dependencies/<kind>.go` | written once |
//! | controller | `controllers/<group>/<kind>_controller.go` | needs `--force` to overwrite |
//!
//! Each group-version additionally gets `apis/<group>/<version>/groupversion_info.go`.
//!
//! ## Marker regions
//!
//! Merged files carry regions delimited by `+opforge:<static|dynamic>:<begin|end>:<name>`
//! comment lines; see [`markers`] for the merge rules.
//!
//! ## Post-scaffold
//!
//! [`finalize`] runs controller-gen for deep-copy methods and CRD/RBAC
//! manifests once every artifact has been written.

pub mod artifact;
pub mod finalize;
pub mod markers;
mod project;
pub mod schema;
mod templates;
mod write;

pub use artifact::{Artifact, ArtifactKind, MutationPolicy, ResourceIdentity};
pub use finalize::{finalize, FinalizeOptions, GeneratorStep, DEFAULT_CONTROLLER_GEN};
pub use project::*;
pub use templates::{
    DependencyRef, RenderContext, RenderError, RenderFn, TemplateRegistry,
};
pub use write::{write_atomic, Scaffolded, Scaffolder, WriteOutcome};

/// Marker regions the manifest set template renders itself; custom markers
/// may not reuse these names.
pub const MANIFEST_MARKERS: &[&str] = &["role-labels", "dependency-rules", "crd-annotations"];
