//! Normalizes loaded documents into the typed [`WorkloadSpec`] model.

use super::load::{LoadedDocument, RawDependency, RawField, RawMarker, RawWorkloadSpec};
use super::naming::{is_upper_camel, regular_plural, to_upper_camel};
use super::types::{
    DependencyEdge, Field, FieldKind, GlobalOptions, Marker, MarkerScope, ResourceNode,
    WorkloadKind, WorkloadSpec, SCHEMA_VERSION,
};
use crate::error::SpecParseError;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::PathBuf;

struct PendingEdge {
    from: String,
    to: String,
    readiness: Option<String>,
}

struct Builder<'a> {
    options: &'a GlobalOptions,
    resources: Vec<ResourceNode>,
    edges: Vec<PendingEdge>,
}

/// Parent identity a companion inherits from.
struct Inherited<'a> {
    name: &'a str,
    group: &'a str,
    version: &'a str,
}

pub(crate) fn build_workload(
    root: LoadedDocument,
    source: PathBuf,
) -> Result<WorkloadSpec, SpecParseError> {
    let doc = root.label.as_str();
    let kind = document_kind(&root)?;
    match kind {
        WorkloadKind::ComponentWorkload => {
            return Err(SpecParseError::InvalidWorkloadKind {
                document: doc.to_string(),
                reason: "a ComponentWorkload can only be loaded as a companion".to_string(),
            })
        }
        WorkloadKind::StandaloneWorkload if !root.companions.is_empty() => {
            return Err(SpecParseError::InvalidWorkloadKind {
                document: doc.to_string(),
                reason: "a StandaloneWorkload cannot declare companions".to_string(),
            })
        }
        _ => {}
    }

    let name = required(doc, "name", root.raw.name.as_deref())?;
    let spec = spec_of(&root)?;
    let repository = required(doc, "spec.repository", spec.repository.as_deref())?;
    let api = spec.api.as_ref().ok_or_else(|| missing(doc, "spec.api"))?;
    let options = GlobalOptions {
        group: required(doc, "spec.api.group", api.group.as_deref())?,
        version: required(doc, "spec.api.version", api.version.as_deref())?,
        domain: spec.domain.clone().filter(|d| !d.trim().is_empty()),
        namespaced: spec.namespaced.unwrap_or(true),
    };

    let mut builder = Builder {
        options: &options,
        resources: Vec::new(),
        edges: Vec::new(),
    };
    builder.add_resource(&root, kind, None)?;
    let Builder {
        resources, edges, ..
    } = builder;
    let dependencies = resolve_edges(&resources, edges);

    Ok(WorkloadSpec {
        name,
        source,
        repository,
        options,
        resources,
        dependencies,
    })
}

impl Builder<'_> {
    fn add_resource(
        &mut self,
        loaded: &LoadedDocument,
        workload_kind: WorkloadKind,
        parent: Option<Inherited<'_>>,
    ) -> Result<(), SpecParseError> {
        let doc = loaded.label.as_str();
        let spec = spec_of(loaded)?;
        if parent.is_some() && spec.repository.is_some() {
            return Err(SpecParseError::InvalidValue {
                document: doc.to_string(),
                field: "spec.repository".to_string(),
                reason: "only the root document may set the repository".to_string(),
            });
        }

        let name = required(doc, "name", loaded.raw.name.as_deref())?;
        let api = spec.api.as_ref().ok_or_else(|| missing(doc, "spec.api"))?;
        let kind = required(doc, "spec.api.kind", api.kind.as_deref())?;

        let (group, version, overrides) = match &parent {
            Some(p) => (
                api.group.clone().unwrap_or_else(|| p.group.to_string()),
                api.version.clone().unwrap_or_else(|| p.version.to_string()),
                api.group.is_some() || api.version.is_some(),
            ),
            None => (self.options.group.clone(), self.options.version.clone(), false),
        };

        let fields = normalize_fields(doc, "spec.fields", &spec.fields)?;
        let markers = spec
            .markers
            .iter()
            .enumerate()
            .map(|(i, m)| normalize_marker(doc, i, m))
            .collect::<Result<Vec<_>, _>>()?;
        for (i, dep) in spec.dependencies.iter().enumerate() {
            self.edges.push(pending_edge(doc, i, &name, dep)?);
        }

        let index = self.resources.len();
        self.resources.push(ResourceNode {
            name: name.clone(),
            workload_kind,
            group: group.clone(),
            version: version.clone(),
            plural: api
                .plural
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| regular_plural(&kind)),
            kind,
            namespaced: api
                .namespaced
                .or(spec.namespaced)
                .unwrap_or(self.options.namespaced),
            fields,
            markers,
            companions: BTreeSet::new(),
            parent: parent.as_ref().map(|p| p.name.to_string()),
            overrides_group_version: overrides,
            source: doc.to_string(),
        });

        for companion in &loaded.companions {
            let companion_kind = document_kind(companion)?;
            if companion_kind != WorkloadKind::ComponentWorkload {
                return Err(SpecParseError::InvalidWorkloadKind {
                    document: companion.label.clone(),
                    reason: format!(
                        "companion documents must be ComponentWorkload, found {companion_kind}"
                    ),
                });
            }
            let companion_name = required(
                companion.label.as_str(),
                "name",
                companion.raw.name.as_deref(),
            )?;
            self.resources[index].companions.insert(companion_name);
            self.add_resource(
                companion,
                companion_kind,
                Some(Inherited {
                    name: &name,
                    group: &group,
                    version: &version,
                }),
            )?;
        }
        Ok(())
    }
}

fn document_kind(loaded: &LoadedDocument) -> Result<WorkloadKind, SpecParseError> {
    let doc = loaded.label.as_str();
    let api_version = required(doc, "apiVersion", loaded.raw.api_version.as_deref())?;
    if api_version != SCHEMA_VERSION {
        return Err(SpecParseError::UnsupportedSchemaVersion {
            document: doc.to_string(),
            found: api_version,
            expected: SCHEMA_VERSION,
        });
    }
    let kind = required(doc, "kind", loaded.raw.kind.as_deref())?;
    WorkloadKind::parse(&kind).ok_or_else(|| SpecParseError::UnknownWorkloadKind {
        document: doc.to_string(),
        found: kind,
    })
}

fn spec_of(loaded: &LoadedDocument) -> Result<&RawWorkloadSpec, SpecParseError> {
    loaded
        .raw
        .spec
        .as_ref()
        .ok_or_else(|| missing(&loaded.label, "spec"))
}

fn missing(document: &str, field: &str) -> SpecParseError {
    SpecParseError::MissingRequiredField {
        document: document.to_string(),
        field: field.to_string(),
    }
}

fn required(document: &str, field: &str, value: Option<&str>) -> Result<String, SpecParseError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(missing(document, field)),
    }
}

/// Normalize one field list. Names must be unique, and so must the Go
/// struct field each name renders to (`max-size` and `maxSize` clash).
fn normalize_fields(doc: &str, path: &str, raw: &[RawField]) -> Result<Vec<Field>, SpecParseError> {
    let mut fields: Vec<Field> = Vec::with_capacity(raw.len());
    for (i, f) in raw.iter().enumerate() {
        let field = normalize_field(doc, format!("{path}[{i}]"), f)?;
        let go_name = to_upper_camel(&field.name);
        if let Some(first) = fields
            .iter()
            .find(|prev| prev.name == field.name || to_upper_camel(&prev.name) == go_name)
        {
            return Err(SpecParseError::InvalidValue {
                document: doc.to_string(),
                field: format!("{path}[{i}].name"),
                reason: format!(
                    "'{}' clashes with field '{}' (both render as Go field {go_name})",
                    field.name, first.name
                ),
            });
        }
        fields.push(field);
    }
    Ok(fields)
}

fn normalize_field(doc: &str, path: String, raw: &RawField) -> Result<Field, SpecParseError> {
    let name = required(doc, &format!("{path}.name"), raw.name.as_deref())?;
    let declared = required(doc, &format!("{path}.type"), raw.ty.as_deref())?;
    let kind = FieldKind::parse(&declared).ok_or_else(|| SpecParseError::UnknownFieldType {
        document: doc.to_string(),
        field: name.clone(),
        declared: declared.clone(),
    })?;

    if kind != FieldKind::Object && !raw.fields.is_empty() {
        return Err(SpecParseError::InvalidValue {
            document: doc.to_string(),
            field: format!("{path}.fields"),
            reason: format!("only object fields may declare nested fields, '{name}' is {kind}"),
        });
    }
    let fields = normalize_fields(doc, &format!("{path}.fields"), &raw.fields)?;

    let required = raw.required.unwrap_or(false);
    let default = match &raw.default {
        Some(value) if !kind.accepts(value) => {
            return Err(SpecParseError::InvalidDefault {
                document: doc.to_string(),
                field: name,
                reason: format!("{value} is not a valid {kind}"),
            })
        }
        Some(value) => Some(value.clone()),
        None if required => None,
        None => Some(zero_value(kind, &fields)),
    };

    Ok(Field {
        name,
        kind,
        default,
        required,
        description: raw
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        fields,
    })
}

/// Default materialized for an optional field declared without one.
fn zero_value(kind: FieldKind, children: &[Field]) -> Value {
    match kind {
        FieldKind::String => Value::String(String::new()),
        FieldKind::Int => Value::from(0),
        FieldKind::Bool => Value::Bool(false),
        FieldKind::Map => Value::Object(Map::new()),
        FieldKind::Object => Value::Object(
            children
                .iter()
                .filter_map(|c| c.default.clone().map(|d| (c.name.clone(), d)))
                .collect(),
        ),
    }
}

fn normalize_marker(doc: &str, index: usize, raw: &RawMarker) -> Result<Marker, SpecParseError> {
    let path = format!("spec.markers[{index}]");
    let name = required(doc, &format!("{path}.name"), raw.name.as_deref())?;
    let scope = match raw.scope.as_deref() {
        None => MarkerScope::Static,
        Some(s) => MarkerScope::parse(s).ok_or_else(|| SpecParseError::InvalidValue {
            document: doc.to_string(),
            field: format!("{path}.scope"),
            reason: format!("'{s}' is not one of static, dynamic"),
        })?,
    };
    let valid_name = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphanumeric())
        .unwrap_or(false)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !valid_name {
        return Err(SpecParseError::InvalidValue {
            document: doc.to_string(),
            field: format!("{path}.name"),
            reason: format!("'{name}' is not a valid marker name"),
        });
    }
    Ok(Marker {
        name,
        scope,
        default: raw.default.clone().unwrap_or_default(),
    })
}

fn pending_edge(
    doc: &str,
    index: usize,
    from: &str,
    raw: &RawDependency,
) -> Result<PendingEdge, SpecParseError> {
    let path = format!("spec.dependencies[{index}]");
    let to = required(doc, &format!("{path}.name"), raw.name.as_deref())?;
    let readiness = raw
        .readiness
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);
    if let Some(r) = &readiness {
        if !is_upper_camel(r) {
            return Err(SpecParseError::InvalidValue {
                document: doc.to_string(),
                field: format!("{path}.readiness"),
                reason: format!("'{r}' is not an exported Go identifier"),
            });
        }
    }
    Ok(PendingEdge {
        from: from.to_string(),
        to,
        readiness,
    })
}

fn resolve_edges(resources: &[ResourceNode], edges: Vec<PendingEdge>) -> Vec<DependencyEdge> {
    edges
        .into_iter()
        .map(|e| {
            let readiness = e.readiness.unwrap_or_else(|| {
                let kind = resources
                    .iter()
                    .find(|r| r.name == e.to)
                    .map(|r| r.kind.clone())
                    .unwrap_or_else(|| to_upper_camel(&e.to));
                format!("{kind}CheckReady")
            });
            DependencyEdge {
                from: e.from,
                to: e.to,
                readiness,
            }
        })
        .collect()
}
