//! Plugin metadata and the optional `opforge.toml` project configuration.
//!
//! `opforge.toml` sits next to the workload document (or is passed with
//! `--config`) and supplies defaults for flags the project always wants:
//!
//! ```toml
//! boilerplate = "hack/boilerplate.go.txt"
//! controller_gen = "bin/controller-gen"
//! generate_deep_copy = true
//! generate_manifests = false
//! ```
//!
//! Relative paths resolve against the directory holding the config file, and
//! come out absolute.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up next to the workload document.
pub const CONFIG_FILE_NAME: &str = "opforge.toml";

/// Static identity of the scaffolding plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginMetadata {
    pub name: &'static str,
    pub version: u32,
    pub supported_project_versions: &'static [&'static str],
}

impl PluginMetadata {
    /// Key used in the `PROJECT` layout and plugin tables (`name/vN`).
    pub fn key(&self) -> String {
        format!("{}/v{}", self.name, self.version)
    }

    pub fn supports(&self, project_version: &str) -> bool {
        self.supported_project_versions.contains(&project_version)
    }
}

pub const PLUGIN: PluginMetadata = PluginMetadata {
    name: "workload.opforge.dev",
    version: 2,
    supported_project_versions: &["3"],
};

/// Contents of `opforge.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Boilerplate header used when the project has no `hack/boilerplate.go.txt`.
    pub boilerplate: Option<PathBuf>,
    /// controller-gen binary.
    pub controller_gen: Option<PathBuf>,
    pub generate_deep_copy: Option<bool>,
    pub generate_manifests: Option<bool>,
    /// Default output root.
    pub output: Option<PathBuf>,
}

impl ProjectConfig {
    fn resolve_relative(mut self, base: &Path) -> Self {
        let join = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.boilerplate = self.boilerplate.map(join);
        self.output = self.output.map(join);
        // a bare program name is looked up on PATH
        self.controller_gen = self.controller_gen.map(|p| {
            if p.components().count() > 1 {
                join(p)
            } else {
                p
            }
        });
        self
    }
}

/// Load `opforge.toml`.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but
/// cannot be read or parsed.
pub fn load_project_config(config_path: &Path) -> anyhow::Result<Option<ProjectConfig>> {
    if !config_path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config: ProjectConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    Ok(Some(config.resolve_relative(&config_dir(config_path)?)))
}

/// Absolute directory of `config_path`, so paths taken from the file stay
/// valid whatever directory they are later used from.
fn config_dir(config_path: &Path) -> anyhow::Result<PathBuf> {
    let dir = match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::canonicalize(dir).with_context(|| format!("Failed to resolve {}", dir.display()))
}

/// `opforge.toml` next to the workload document, if there is one.
pub fn auto_detect_config_path(workload_path: &Path) -> Option<PathBuf> {
    let config_path = workload_path.parent()?.join(CONFIG_FILE_NAME);
    config_path.exists().then_some(config_path)
}

/// Resolve the config to load.
///
/// Priority:
/// 1. Explicitly provided path (via CLI); it must exist
/// 2. Auto-detected alongside the workload document
/// 3. None
pub fn resolve_config_path(
    explicit_path: Option<&Path>,
    workload_path: &Path,
) -> anyhow::Result<Option<PathBuf>> {
    match explicit_path {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => anyhow::bail!("config file {} does not exist", path.display()),
        None => Ok(auto_detect_config_path(workload_path)),
    }
}
