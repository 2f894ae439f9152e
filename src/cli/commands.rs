use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::{load_project_config, resolve_config_path, ProjectConfig};
use crate::generator::{FinalizeOptions, GenerationScope, ScaffoldReport, WriteOutcome};
use crate::linter::{self, LintSeverity};
use crate::pipeline::{run_phases, CreateApi, CreateApiOptions};
use crate::runtime_config::RuntimeConfig;
use crate::{graph, spec};

/// Command-line interface for opforge
///
/// Compiles workload documents into Kubernetes operator source trees.
#[derive(Debug, Parser)]
#[command(name = "opforge")]
#[command(about = "Scaffold Kubernetes operators from workload specifications", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scaffold API types, manifests, dependency checks and controllers
    CreateApi {
        /// Path to the workload document (YAML or JSON)
        #[arg(short = 'w', long)]
        workload_config: PathBuf,

        /// Root of the operator project (default: `output` from opforge.toml, else ".")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing controller stubs
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Show what would change without writing files
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Limit scaffolding to specific parts (comma-separated or repeated)
        #[arg(long, value_enum, num_args = 1.., value_delimiter = ',')]
        only: Option<Vec<OnlyPart>>,

        /// Run controller-gen to produce DeepCopy methods
        #[arg(long)]
        generate_deep_copy: Option<bool>,

        /// Run controller-gen to produce CRD and RBAC manifests
        #[arg(long)]
        generate_manifests: Option<bool>,

        /// controller-gen binary (overrides opforge.toml and OPFORGE_CONTROLLER_GEN_BIN)
        #[arg(long)]
        controller_gen: Option<PathBuf>,

        /// Plural resource name for the root resource
        #[arg(long)]
        plural: Option<String>,

        /// Whether the root resource is namespaced
        #[arg(long)]
        namespaced: Option<bool>,

        /// Boilerplate header used when the project has no hack/boilerplate.go.txt
        #[arg(long)]
        boilerplate: Option<PathBuf>,

        /// Path to opforge.toml
        ///
        /// If not provided, looks for opforge.toml next to the workload document.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Parse and validate a workload, then print the generation order
    Validate {
        #[arg(short = 'w', long)]
        workload_config: PathBuf,
    },
    /// Lint a workload document for naming and documentation issues
    Lint {
        /// Path to the workload document
        #[arg(short = 'w', long)]
        workload_config: PathBuf,

        /// Exit with error code if any errors are found
        #[arg(long, default_value_t = false)]
        fail_on_error: bool,

        /// Only show errors (hide warnings and info)
        #[arg(long, default_value_t = false)]
        errors_only: bool,
    },
}

/// Parts of the operator tree that can be scaffolded selectively
///
/// Used with the `--only` flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OnlyPart {
    /// Go API types and group-version registration
    Api,
    /// Reconciler stubs
    Controller,
    /// Readiness predicates
    Dependencies,
    /// RBAC and CRD manifest sets
    Manifests,
    /// Sample custom resources
    Samples,
}

/// Execute the parsed command.
///
/// # Errors
///
/// Returns the first failing stage's error with context describing the
/// command that was running.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::CreateApi {
            workload_config,
            output,
            force,
            dry_run,
            only,
            generate_deep_copy,
            generate_manifests,
            controller_gen,
            plural,
            namespaced,
            boilerplate,
            config,
        } => {
            let config_path = resolve_config_path(config.as_deref(), &workload_config)?;
            let project = match &config_path {
                Some(path) => load_project_config(path)?.unwrap_or_default(),
                None => ProjectConfig::default(),
            };
            let runtime = RuntimeConfig::from_env();

            let output = output
                .or_else(|| project.output.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let mut options = CreateApiOptions::new(&workload_config, output);
            options.scaffold.force = force;
            options.scaffold.dry_run = dry_run;
            options.scaffold.scope = map_only_to_scope(only.as_deref());
            options.scaffold.boilerplate = boilerplate.or_else(|| project.boilerplate.clone());
            options.finalize = finalize_options(
                &project,
                &runtime,
                generate_deep_copy,
                generate_manifests,
                controller_gen,
            );
            options.plural = plural;
            options.namespaced = namespaced;

            let mut command = CreateApi::new(options);
            run_phases(&mut command).with_context(|| {
                format!("create-api failed for {}", workload_config.display())
            })?;
            if let Some(report) = command.report() {
                print_report(report, dry_run);
            }
            Ok(())
        }
        Commands::Validate { workload_config } => {
            let order = validate_order(&workload_config)?;
            println!("✅ {} is valid", workload_config.display());
            println!("Generation order:");
            for (i, line) in order.iter().enumerate() {
                println!("  {}. {line}", i + 1);
            }
            Ok(())
        }
        Commands::Lint {
            workload_config,
            fail_on_error,
            errors_only,
        } => {
            let mut issues = linter::lint_workload(&workload_config)?;
            if errors_only {
                issues.retain(|i| i.severity == LintSeverity::Error);
            }
            linter::print_lint_issues(&issues);
            if fail_on_error {
                linter::fail_if_errors(&issues)?;
            }
            Ok(())
        }
    }
}

/// Parse and validate a workload, returning one `name (group/version, Kind=...)`
/// line per resource in generation order.
pub fn validate_order(workload_config: &Path) -> anyhow::Result<Vec<String>> {
    let spec = spec::parse(workload_config)
        .with_context(|| format!("Failed to parse {}", workload_config.display()))?;
    let order = graph::validate(&spec)
        .with_context(|| format!("{} failed validation", workload_config.display()))?;
    Ok(order
        .iter()
        .map(|r| format!("{} ({})", r.name, r.gvk()))
        .collect())
}

/// Flag > opforge.toml > environment > default.
pub(crate) fn finalize_options(
    project: &ProjectConfig,
    runtime: &RuntimeConfig,
    generate_deep_copy: Option<bool>,
    generate_manifests: Option<bool>,
    controller_gen: Option<PathBuf>,
) -> FinalizeOptions {
    let defaults = FinalizeOptions::default();
    FinalizeOptions {
        generate_deep_copy: generate_deep_copy
            .or(project.generate_deep_copy)
            .unwrap_or(defaults.generate_deep_copy),
        generate_manifests: generate_manifests
            .or(project.generate_manifests)
            .unwrap_or(defaults.generate_manifests),
        controller_gen: controller_gen
            .or_else(|| project.controller_gen.clone())
            .unwrap_or_else(|| runtime.controller_gen.clone()),
        ..defaults
    }
}

fn print_report(report: &ScaffoldReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    for record in &report.records {
        println!(
            "{prefix}{:<9} {}",
            record.outcome.as_str(),
            record.path.display()
        );
    }
    println!(
        "{prefix}{} created, {} updated, {} unchanged, {} skipped",
        report.count(WriteOutcome::Created),
        report.count(WriteOutcome::Updated),
        report.count(WriteOutcome::Unchanged),
        report.count(WriteOutcome::Skipped)
    );
}

/// Convert CLI `--only` parts to a [`GenerationScope`]
///
/// If `only` is `None`, all parts are enabled. If `only` is provided,
/// only the specified parts are enabled.
pub(crate) fn map_only_to_scope(only: Option<&[OnlyPart]>) -> GenerationScope {
    let Some(parts) = only else {
        return GenerationScope::all();
    };
    let mut scope = GenerationScope::none();
    for part in parts {
        match part {
            OnlyPart::Api => scope.api = true,
            OnlyPart::Controller => scope.controllers = true,
            OnlyPart::Dependencies => scope.dependencies = true,
            OnlyPart::Manifests => scope.manifests = true,
            OnlyPart::Samples => scope.samples = true,
        }
    }
    scope
}

