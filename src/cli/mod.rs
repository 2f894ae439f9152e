//! # CLI Module
//!
//! Command-line surface of the `opforge` binary.
//!
//! ## Commands
//!
//! ### `create-api`
//!
//! Scaffold every resource of a workload into an operator project:
//!
//! ```bash
//! opforge create-api --workload-config workload.yaml --output my-operator
//! ```
//!
//! Options:
//! - `--workload-config <FILE>` - Workload document (required)
//! - `--output <DIR>` - Project root (default: `output` from opforge.toml, else `.`)
//! - `--force` - Overwrite existing controller stubs
//! - `--dry-run` - Report outcomes without writing
//! - `--only <PARTS>` - api, controller, dependencies, manifests, samples
//! - `--generate-deep-copy <BOOL>` / `--generate-manifests <BOOL>` - toggle controller-gen steps
//! - `--plural <NAME>` / `--namespaced <BOOL>` - reshape the root resource
//! - `--config <FILE>` - opforge.toml (auto-detected next to the workload)
//!
//! ### `validate`
//!
//! Parse and validate a workload, printing the generation order:
//!
//! ```bash
//! opforge validate --workload-config workload.yaml
//! ```
//!
//! ### `lint`
//!
//! ```bash
//! opforge lint --workload-config workload.yaml --fail-on-error
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use opforge::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;


pub use commands::{run_cli, validate_order, Cli, Commands, OnlyPart};
