use super::build::build_workload;
use super::types::WorkloadSpec;
use crate::error::SpecParseError;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A workload document exactly as written. Every key is optional here so that
/// missing keys can be reported with their full path instead of a serde message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct RawDocument {
    pub api_version: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub spec: Option<RawWorkloadSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct RawWorkloadSpec {
    pub repository: Option<String>,
    pub domain: Option<String>,
    pub namespaced: Option<bool>,
    pub api: Option<RawApi>,
    #[serde(default)]
    pub fields: Vec<RawField>,
    #[serde(default)]
    pub dependencies: Vec<RawDependency>,
    #[serde(default)]
    pub markers: Vec<RawMarker>,
    #[serde(default)]
    pub component_files: Vec<String>,
    #[serde(default)]
    pub components: Vec<RawDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct RawApi {
    pub group: Option<String>,
    pub version: Option<String>,
    pub kind: Option<String>,
    pub plural: Option<String>,
    pub namespaced: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct RawField {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub default: Option<Value>,
    pub required: Option<bool>,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct RawDependency {
    pub name: Option<String>,
    pub readiness: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct RawMarker {
    pub name: Option<String>,
    pub scope: Option<String>,
    pub default: Option<String>,
}

/// A document plus its recursively loaded companions.
#[derive(Debug, Clone)]
pub(crate) struct LoadedDocument {
    /// Identity used in diagnostics (`gadget.yaml` or `collection.yaml#components[0]`).
    pub label: String,
    pub raw: RawDocument,
    pub companions: Vec<LoadedDocument>,
}

/// Parse a workload specification rooted at `path`.
///
/// Companion documents referenced through `componentFiles` are loaded
/// recursively relative to the document that names them. Filesystem reads are
/// the only side effect.
///
/// # Errors
///
/// Returns a [`SpecParseError`] for unreadable or malformed documents, missing
/// required keys, unknown field types, invalid defaults and circular includes.
pub fn parse(path: &Path) -> Result<WorkloadSpec, SpecParseError> {
    let mut loader = Loader::default();
    let root = loader.load_file(path)?;
    let source = canonical(path)?;
    build_workload(root, source)
}

#[derive(Default)]
struct Loader {
    /// Canonical paths of the documents currently being loaded, outermost first.
    stack: Vec<PathBuf>,
}

impl Loader {
    fn load_file(&mut self, path: &Path) -> Result<LoadedDocument, SpecParseError> {
        let canon = canonical(path)?;
        if let Some(pos) = self.stack.iter().position(|p| p == &canon) {
            let mut cycle = self.stack[pos..].to_vec();
            cycle.push(canon);
            return Err(SpecParseError::CircularReference { cycle });
        }

        debug!(path = %canon.display(), "loading workload document");
        let mut raw = read_document(&canon)?;
        self.stack.push(canon.clone());
        let label = canon.display().to_string();
        let companions = self.load_companions(&canon, &label, &mut raw);
        self.stack.pop();

        Ok(LoadedDocument {
            label,
            raw,
            companions: companions?,
        })
    }

    fn load_inline(
        &mut self,
        declared_in: &Path,
        label: String,
        mut raw: RawDocument,
    ) -> Result<LoadedDocument, SpecParseError> {
        let companions = self.load_companions(declared_in, &label, &mut raw)?;
        Ok(LoadedDocument {
            label,
            raw,
            companions,
        })
    }

    fn load_companions(
        &mut self,
        declared_in: &Path,
        label: &str,
        raw: &mut RawDocument,
    ) -> Result<Vec<LoadedDocument>, SpecParseError> {
        let Some(spec) = raw.spec.as_mut() else {
            return Ok(Vec::new());
        };
        let files = std::mem::take(&mut spec.component_files);
        let inline = std::mem::take(&mut spec.components);
        let base = declared_in.parent().unwrap_or_else(|| Path::new("."));

        let mut companions = Vec::with_capacity(files.len() + inline.len());
        for file in &files {
            companions.push(self.load_file(&base.join(file))?);
        }
        for (i, doc) in inline.into_iter().enumerate() {
            let inline_label = format!("{label}#components[{i}]");
            companions.push(self.load_inline(declared_in, inline_label, doc)?);
        }
        Ok(companions)
    }
}

fn canonical(path: &Path) -> Result<PathBuf, SpecParseError> {
    std::fs::canonicalize(path).map_err(|source| SpecParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_document(path: &Path) -> Result<RawDocument, SpecParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| SpecParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = path
        .extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false);
    if is_yaml {
        serde_yaml::from_str(&content).map_err(|source| SpecParseError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&content).map_err(|source| SpecParseError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
