use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::project_file::{check_project_version, record_resources};
use crate::error::{Error, ScaffoldError};
use crate::generator::artifact::{Artifact, ArtifactKind, ResourceIdentity};
use crate::generator::templates::{RenderContext, TemplateRegistry};
use crate::generator::write::{Scaffolded, Scaffolder, WriteOutcome};
use crate::spec::{ResourceNode, WorkloadSpec};

/// Boilerplate looked up under the output root.
pub const BOILERPLATE_PATH: &str = "hack/boilerplate.go.txt";

/// Which artifact kinds a run emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationScope {
    /// API types and group-version registration
    pub api: bool,
    pub manifests: bool,
    pub samples: bool,
    pub dependencies: bool,
    pub controllers: bool,
}

impl Default for GenerationScope {
    fn default() -> Self {
        Self::all()
    }
}

impl GenerationScope {
    pub fn all() -> Self {
        Self {
            api: true,
            manifests: true,
            samples: true,
            dependencies: true,
            controllers: true,
        }
    }

    pub fn none() -> Self {
        Self {
            api: false,
            manifests: false,
            samples: false,
            dependencies: false,
            controllers: false,
        }
    }

    pub fn includes(&self, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::GroupVersionInfo | ArtifactKind::ApiTypes => self.api,
            ArtifactKind::ManifestSet => self.manifests,
            ArtifactKind::Sample => self.samples,
            ArtifactKind::DependencyCheck => self.dependencies,
            ArtifactKind::Controller => self.controllers,
        }
    }
}

/// Options for one scaffolding run.
#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    /// Root of the generated project.
    pub output: PathBuf,
    /// Overwrite existing controller stubs.
    pub force: bool,
    /// Render and merge but write nothing.
    pub dry_run: bool,
    pub scope: GenerationScope,
    /// Boilerplate file used when the project has no `hack/boilerplate.go.txt`.
    pub boilerplate: Option<PathBuf>,
}

impl ScaffoldOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            force: false,
            dry_run: false,
            scope: GenerationScope::all(),
            boilerplate: None,
        }
    }
}

/// One scaffolded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldRecord {
    /// Resource name the artifact belongs to.
    pub resource: String,
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

/// Everything a scaffolding run touched, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub records: Vec<ScaffoldRecord>,
}

impl ScaffoldReport {
    pub fn count(&self, outcome: WriteOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn outcome_of(&self, path: &Path) -> Option<WriteOutcome> {
        self.records
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.outcome)
    }
}

/// Boilerplate header for Go artifacts.
///
/// `hack/boilerplate.go.txt` under `root` wins, then `configured`, then a
/// built-in notice naming the module.
pub fn resolve_boilerplate(
    root: &Path,
    configured: Option<&Path>,
    repository: &str,
) -> Result<String, ScaffoldError> {
    let in_project = root.join(BOILERPLATE_PATH);
    let source = if in_project.is_file() {
        Some(in_project)
    } else {
        configured.map(Path::to_path_buf)
    };
    match source {
        Some(path) => {
            let text = fs::read_to_string(&path).map_err(|e| ScaffoldError::io(&path, e))?;
            debug!(path = %path.display(), "using boilerplate file");
            Ok(text.trim_end().to_string())
        }
        None => Ok(format!("// Scaffolded by opforge for {repository}.")),
    }
}

/// Fail before any write if a controller stub would be overwritten without
/// `force`, or if the existing `PROJECT` has an unsupported version.
pub fn check_destinations(
    spec: &WorkloadSpec,
    order: &[&ResourceNode],
    options: &ScaffoldOptions,
) -> Result<(), Error> {
    if options.scope.api {
        check_project_version(&options.output).map_err(|e| Error::scaffold("PROJECT", e))?;
    }
    if options.force || !options.scope.controllers {
        return Ok(());
    }
    for resource in order {
        let identity = ResourceIdentity::new(spec, resource);
        let artifact = Artifact::new(&options.output, &identity, ArtifactKind::Controller);
        if artifact.destination.exists() {
            return Err(Error::scaffold(
                resource.gvk().to_string(),
                ScaffoldError::DestinationExists {
                    path: artifact.destination,
                },
            ));
        }
    }
    Ok(())
}

/// Scaffold every resource of `spec` in `order`.
///
/// Dependencies come before dependents; per resource the artifacts follow
/// [`ArtifactKind::PER_RESOURCE`]. The first failure stops the run, leaving
/// artifacts already written in place.
pub fn scaffold_workload(
    spec: &WorkloadSpec,
    order: &[&ResourceNode],
    registry: &TemplateRegistry,
    options: &ScaffoldOptions,
) -> Result<ScaffoldReport, Error> {
    check_destinations(spec, order, options)?;

    let boilerplate = resolve_boilerplate(
        &options.output,
        options.boilerplate.as_deref(),
        &spec.repository,
    )
    .map_err(|e| Error::scaffold(&spec.name, e))?;

    let scaffolder = Scaffolder::new(registry, options.force, options.dry_run);
    let mut report = ScaffoldReport::default();
    let mut registered: HashSet<(String, String)> = HashSet::new();

    for resource in order {
        let label = resource.gvk().to_string();
        let ctx = RenderContext::new(spec, resource, &boilerplate);
        info!(resource = %label, "scaffolding resource");

        let mut kinds = Vec::with_capacity(ArtifactKind::PER_RESOURCE.len() + 1);
        if options.scope.api
            && registered.insert((resource.group.clone(), resource.version.clone()))
        {
            kinds.push(ArtifactKind::GroupVersionInfo);
        }
        kinds.extend(
            ArtifactKind::PER_RESOURCE
                .into_iter()
                .filter(|k| options.scope.includes(*k)),
        );

        for kind in kinds {
            let artifact = Artifact::new(&options.output, &ctx.resource, kind);
            let Scaffolded { path, outcome } = scaffolder
                .scaffold(&artifact, &ctx)
                .map_err(|e| Error::scaffold(&label, e))?;
            if kind == ArtifactKind::DependencyCheck && outcome == WriteOutcome::Skipped {
                warn_missing_predicates(&path, &ctx.predicates);
            }
            report.records.push(ScaffoldRecord {
                resource: resource.name.clone(),
                kind,
                path,
                outcome,
            });
        }
    }

    if options.scope.api && !options.dry_run {
        record_resources(&options.output, spec, order, options.scope.controllers)
            .map_err(|e| Error::scaffold("PROJECT", e))?;
    }

    info!(
        created = report.count(WriteOutcome::Created),
        updated = report.count(WriteOutcome::Updated),
        unchanged = report.count(WriteOutcome::Unchanged),
        skipped = report.count(WriteOutcome::Skipped),
        "scaffolding complete"
    );
    Ok(report)
}

fn warn_missing_predicates(path: &Path, predicates: &[String]) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot inspect dependency file");
            return;
        }
    };
    for predicate in predicates {
        if !source.contains(&format!("func {predicate}(")) {
            warn!(
                path = %path.display(),
                predicate = %predicate,
                "dependency file exists but does not define a readiness predicate a dependent calls"
            );
        }
    }
}
