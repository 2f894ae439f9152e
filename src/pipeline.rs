//! Ordered subcommand phases.
//!
//! A subcommand runs as five phases in a fixed order:
//!
//! ```text
//! inject_config → inject_resource → pre_scaffold → scaffold → post_scaffold
//! ```
//!
//! [`CreateApi`] is the phase implementation behind `opforge create-api`.

use std::path::PathBuf;

use tracing::info;

use crate::error::{Error, Result};
use crate::generator::{
    check_destinations, finalize, scaffold_workload, FinalizeOptions, GenerationScope,
    ScaffoldOptions, ScaffoldReport, TemplateRegistry,
};
use crate::graph;
use crate::spec::{self, WorkloadSpec};

/// Phase interface every subcommand implements.
pub trait Subcommand {
    /// Load and check the inputs the subcommand works from.
    fn inject_config(&mut self) -> Result<()>;
    /// Apply command-line overrides to the loaded resources and resolve their order.
    fn inject_resource(&mut self) -> Result<()>;
    /// Checks that must pass before anything is written.
    fn pre_scaffold(&mut self) -> Result<()>;
    fn scaffold(&mut self) -> Result<()>;
    fn post_scaffold(&mut self) -> Result<()>;
}

/// Run every phase of `command` in order, stopping at the first error.
pub fn run_phases<S: Subcommand + ?Sized>(command: &mut S) -> Result<()> {
    command.inject_config()?;
    command.inject_resource()?;
    command.pre_scaffold()?;
    command.scaffold()?;
    command.post_scaffold()
}

/// Resolved options for `create-api`.
#[derive(Debug, Clone)]
pub struct CreateApiOptions {
    pub workload_config: PathBuf,
    pub scaffold: ScaffoldOptions,
    pub finalize: FinalizeOptions,
    /// Replaces the root resource's plural.
    pub plural: Option<String>,
    /// Replaces the root resource's scope.
    pub namespaced: Option<bool>,
}

impl CreateApiOptions {
    pub fn new(workload_config: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            workload_config: workload_config.into(),
            scaffold: ScaffoldOptions::new(output),
            finalize: FinalizeOptions::default(),
            plural: None,
            namespaced: None,
        }
    }
}

/// `create-api`: parse a workload, scaffold its resources and run the
/// external generators.
#[derive(Debug)]
pub struct CreateApi {
    options: CreateApiOptions,
    registry: TemplateRegistry,
    spec: Option<WorkloadSpec>,
    /// Resource names in generation order.
    order: Vec<String>,
    report: Option<ScaffoldReport>,
}

impl CreateApi {
    pub fn new(options: CreateApiOptions) -> Self {
        Self::with_registry(options, TemplateRegistry::builtin())
    }

    pub fn with_registry(options: CreateApiOptions, registry: TemplateRegistry) -> Self {
        Self {
            options,
            registry,
            spec: None,
            order: Vec::new(),
            report: None,
        }
    }

    pub fn spec(&self) -> Option<&WorkloadSpec> {
        self.spec.as_ref()
    }

    /// Resource names in the order they were scaffolded.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn report(&self) -> Option<&ScaffoldReport> {
        self.report.as_ref()
    }

    pub fn into_report(self) -> Option<ScaffoldReport> {
        self.report
    }

    fn loaded(&self, phase: &'static str) -> Result<&WorkloadSpec> {
        self.spec.as_ref().ok_or(Error::PhaseOrder(phase))
    }

    fn ordered(&self, phase: &'static str) -> Result<(&WorkloadSpec, Vec<&spec::ResourceNode>)> {
        let spec = self.loaded(phase)?;
        let order = self
            .order
            .iter()
            .filter_map(|name| spec.resource(name))
            .collect();
        Ok((spec, order))
    }

    fn scope(&self) -> GenerationScope {
        self.options.scaffold.scope
    }
}

impl Subcommand for CreateApi {
    fn inject_config(&mut self) -> Result<()> {
        let spec = spec::parse(&self.options.workload_config)?;
        info!(
            workload = %spec.name,
            resources = spec.resources.len(),
            "loaded workload specification"
        );
        self.spec = Some(spec);
        Ok(())
    }

    fn inject_resource(&mut self) -> Result<()> {
        let spec = self.spec.as_mut().ok_or(Error::PhaseOrder("inject_resource"))?;
        let root = spec.root_mut();
        if let Some(plural) = &self.options.plural {
            root.plural = plural.clone();
        }
        if let Some(namespaced) = self.options.namespaced {
            root.namespaced = namespaced;
        }

        let order = graph::validate(spec)?;
        self.order = order.iter().map(|r| r.name.clone()).collect();
        Ok(())
    }

    fn pre_scaffold(&mut self) -> Result<()> {
        let (spec, order) = self.ordered("pre_scaffold")?;
        check_destinations(spec, &order, &self.options.scaffold)
    }

    fn scaffold(&mut self) -> Result<()> {
        let (spec, order) = self.ordered("scaffold")?;
        let report = scaffold_workload(spec, &order, &self.registry, &self.options.scaffold)?;
        self.report = Some(report);
        Ok(())
    }

    fn post_scaffold(&mut self) -> Result<()> {
        if self.report.is_none() {
            return Err(Error::PhaseOrder("post_scaffold"));
        }
        if self.options.scaffold.dry_run {
            info!("dry run, skipping post-scaffold generators");
            return Ok(());
        }
        if !self.scope().api {
            info!("API types were not scaffolded, skipping post-scaffold generators");
            return Ok(());
        }
        let mut options = self.options.finalize.clone();
        if options.boilerplate.is_none() {
            options.boilerplate = self.options.scaffold.boilerplate.clone();
        }
        finalize(&self.options.scaffold.output, &options)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const WORKLOAD: &str = r#"
apiVersion: opforge.dev/v1alpha1
kind: StandaloneWorkload
name: widget
spec:
  repository: github.com/acme/widget-operator
  api: { group: apps, version: v1, kind: Widget }
"#;

    fn options(dir: &std::path::Path) -> CreateApiOptions {
        let path = dir.join("workload.yaml");
        fs::write(&path, WORKLOAD).unwrap();
        let mut options = CreateApiOptions::new(path, dir.join("out"));
        options.finalize.generate_deep_copy = false;
        options.finalize.generate_manifests = false;
        options
    }

    #[test]
    fn test_phases_out_of_order_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut command = CreateApi::new(options(dir.path()));
        assert!(matches!(
            command.scaffold(),
            Err(Error::PhaseOrder("scaffold"))
        ));
    }

    #[test]
    fn test_overrides_apply_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.plural = Some("widgetry".into());
        opts.namespaced = Some(false);
        let mut command = CreateApi::new(opts);
        run_phases(&mut command).unwrap();

        let root = command.spec().unwrap().root();
        assert_eq!(root.plural, "widgetry");
        assert!(!root.namespaced);
        let types = fs::read_to_string(dir.path().join("out/apis/apps/v1/widget_types.go")).unwrap();
        assert!(types.contains("path=widgetry,scope=Cluster"));
    }

    #[test]
    fn test_invalid_plural_override_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.plural = Some("Widgets".into());
        let mut command = CreateApi::new(opts);
        assert!(matches!(run_phases(&mut command), Err(Error::Validation(_))));
        assert!(!dir.path().join("out").exists());
    }
}
