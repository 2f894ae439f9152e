//! # Workload Specification
//!
//! Loads a workload document (and every companion document it links) into a
//! typed, fully-linked [`WorkloadSpec`].
//!
//! ```text
//! workload.yaml ──load──▶ RawDocument tree ──build──▶ WorkloadSpec
//!      └─ componentFiles: [gadget.yaml, ...]   (recursive, cycle-checked)
//! ```
//!
//! ## Document schema (`opforge.dev/v1alpha1`)
//!
//! ```yaml
//! apiVersion: opforge.dev/v1alpha1
//! kind: WorkloadCollection        # or StandaloneWorkload / ComponentWorkload
//! name: widget
//! spec:
//!   repository: github.com/acme/widget-operator
//!   domain: acme.io
//!   api: { group: apps, version: v1, kind: Widget, plural: widgets, namespaced: true }
//!   fields:
//!     - { name: replicas, type: int, default: 1, description: Desired replicas. }
//!   dependencies:
//!     - { name: gadget, readiness: GadgetCheckReady }
//!   markers:
//!     - { name: extra-labels, scope: static, default: "team: platform" }
//!   componentFiles: [gadget.yaml]
//! ```
//!
//! Companions inherit the group and version of the resource that declares
//! them unless they set their own.

mod build;
mod load;
pub mod naming;
mod types;

pub use load::parse;
pub use types::*;
