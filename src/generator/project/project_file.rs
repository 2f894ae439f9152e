use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PLUGIN;
use crate::error::ScaffoldError;
use crate::generator::write::{write_atomic, WriteOutcome};
use crate::spec::{ResourceNode, WorkloadSpec};

/// Name of the project metadata file at the output root.
pub const PROJECT_FILE: &str = "PROJECT";

const HEADER: &str = "# Code generated by opforge. DO NOT EDIT.\n# This file records the resources scaffolded into this project.\n";

/// The `PROJECT` file: project-wide metadata plus one entry per resource.
///
/// Keys this crate does not manage are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layout: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub resources: Vec<ProjectResource>,
    #[serde(default = "default_project_version")]
    pub version: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_project_version() -> String {
    "3".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ProjectApi>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub controller: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub group: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectApi {
    pub crd_version: String,
    #[serde(default)]
    pub namespaced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PluginConfig {
    workload_config_path: String,
}

impl ProjectFile {
    /// Load `PROJECT` from `root`; `None` if the project has none yet.
    pub fn load(root: &Path) -> Result<Option<Self>, ScaffoldError> {
        let path = root.join(PROJECT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| ScaffoldError::io(&path, e))?;
        let project = serde_yaml::from_str(&text).map_err(|e| ScaffoldError::Project {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(project))
    }

    /// Insert `resource`, or refresh the entry with the same group/version/kind.
    ///
    /// A controller recorded earlier stays recorded.
    pub fn upsert(&mut self, resource: ProjectResource) {
        let same = |r: &ProjectResource| {
            r.group == resource.group && r.version == resource.version && r.kind == resource.kind
        };
        match self.resources.iter_mut().find(|r| same(r)) {
            Some(existing) => {
                let controller = existing.controller || resource.controller;
                *existing = resource;
                existing.controller = controller;
            }
            None => self.resources.push(resource),
        }
        self.resources.sort_by(|a, b| {
            (&a.group, &a.version, &a.kind).cmp(&(&b.group, &b.version, &b.kind))
        });
    }

    pub fn render(&self) -> Result<String, ScaffoldError> {
        let body = serde_yaml::to_string(self).map_err(|e| ScaffoldError::Project {
            path: PROJECT_FILE.into(),
            reason: e.to_string(),
        })?;
        Ok(format!("{HEADER}{body}"))
    }
}

/// Fail if `root` holds a `PROJECT` file whose version this plugin cannot
/// record resources in. Returns the loaded file.
pub fn check_project_version(root: &Path) -> Result<Option<ProjectFile>, ScaffoldError> {
    let existing = ProjectFile::load(root)?;
    if let Some(project) = &existing {
        if !PLUGIN.supports(&project.version) {
            return Err(ScaffoldError::Project {
                path: root.join(PROJECT_FILE),
                reason: format!(
                    "project version '{}' is not supported by {} (supported: {})",
                    project.version,
                    PLUGIN.key(),
                    PLUGIN.supported_project_versions.join(", ")
                ),
            });
        }
    }
    Ok(existing)
}

/// Record every resource of `spec` in the project's `PROJECT` file.
pub fn record_resources(
    root: &Path,
    spec: &WorkloadSpec,
    order: &[&ResourceNode],
    controllers: bool,
) -> Result<WriteOutcome, ScaffoldError> {
    let path = root.join(PROJECT_FILE);
    let existing = check_project_version(root)?;
    let mut project = existing.clone().unwrap_or_default();

    project.repo = spec.repository.clone();
    if project.domain.is_none() {
        project.domain = spec.options.domain.clone();
    }
    if project.version.is_empty() {
        project.version = default_project_version();
    }
    if project.project_name.is_none() {
        project.project_name = Some(spec.name.clone());
    }
    let key = PLUGIN.key();
    if !project.layout.contains(&key) {
        project.layout.push(key.clone());
    }
    let plugin = PluginConfig {
        workload_config_path: workload_config_path(root, &spec.source),
    };
    let plugin = serde_yaml::to_value(plugin).map_err(|e| ScaffoldError::Project {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    project.plugins.insert(key, plugin);

    for resource in order {
        project.upsert(ProjectResource {
            api: Some(ProjectApi {
                crd_version: "v1".to_string(),
                namespaced: resource.namespaced,
            }),
            controller: controllers,
            domain: spec.options.domain.clone(),
            group: resource.group.clone(),
            kind: resource.kind.clone(),
            path: Some(format!(
                "{}/apis/{}/{}",
                spec.repository, resource.group, resource.version
            )),
            plural: Some(resource.plural.clone()),
            version: resource.version.clone(),
        });
    }

    if existing.as_ref() == Some(&project) {
        debug!(path = %path.display(), "PROJECT unchanged");
        return Ok(WriteOutcome::Unchanged);
    }
    write_atomic(&path, project.render()?.as_bytes())?;
    info!(path = %path.display(), resources = project.resources.len(), "recorded resources in PROJECT");
    Ok(if existing.is_some() {
        WriteOutcome::Updated
    } else {
        WriteOutcome::Created
    })
}

/// The workload config path as recorded in `PROJECT`: relative to the
/// project root when it lives inside it.
fn workload_config_path(root: &Path, source: &Path) -> String {
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    source
        .strip_prefix(&root)
        .unwrap_or(source)
        .display()
        .to_string()
}
