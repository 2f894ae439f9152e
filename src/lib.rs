//! # opforge
//!
//! **opforge** compiles a declarative workload specification into the source
//! tree of a Kubernetes operator: Go API types, RBAC and CRD manifests,
//! readiness predicates and reconciler stubs, then runs `controller-gen` over
//! the result.
//!
//! ## Architecture
//!
//! - **[`spec`]** - parses workload documents and their companions into a [`spec::WorkloadSpec`]
//! - **[`graph`]** - validates names and dependencies, rejects cycles, orders resources
//! - **[`generator`]** - renders artifacts and writes them under mutation policies,
//!   merging preserved marker regions; runs the post-scaffold generators
//! - **[`pipeline`]** - the ordered phases behind `opforge create-api`
//! - **[`linter`]** - advisory checks over workload documents
//! - **[`cli`]** - the `opforge` command surface
//!
//! ### Generation flow
//!
//! ```text
//! workload.yaml ─► spec::parse ─► graph::validate ─► generator::scaffold_workload ─► generator::finalize
//!                  (companions)    (cycle check,      (per resource, in order:       (controller-gen
//!                                   topo order)        types, manifests, sample,       object / rbac+crd)
//!                                                      dependencies, controller)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! opforge validate --workload-config workload.yaml
//! opforge create-api --workload-config workload.yaml --output my-operator
//! ```
//!
//! ```rust,ignore
//! use opforge::pipeline::{run_phases, CreateApi, CreateApiOptions};
//!
//! let mut command = CreateApi::new(CreateApiOptions::new("workload.yaml", "my-operator"));
//! run_phases(&mut command)?;
//! ```
//!
//! ## Regenerating
//!
//! Re-running `create-api` is safe: API types are rewritten, manifests are
//! merged so hand edits inside `+opforge:` marker regions survive, samples and
//! dependency checks are left alone once they exist, and controller stubs are
//! only replaced with `--force`.

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod graph;
pub mod linter;
pub mod logging;
pub mod pipeline;
pub mod runtime_config;
pub mod spec;

pub use error::{Error, Result};
