use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Schema version every workload document must declare in `apiVersion`.
pub const SCHEMA_VERSION: &str = "opforge.dev/v1alpha1";

/// The shape of a workload document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkloadKind {
    /// A single resource with no companions.
    StandaloneWorkload,
    /// A root resource that declares companion resources.
    WorkloadCollection,
    /// A companion resource, only loadable from a collection.
    ComponentWorkload,
}

impl WorkloadKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "StandaloneWorkload" => Some(Self::StandaloneWorkload),
            "WorkloadCollection" => Some(Self::WorkloadCollection),
            "ComponentWorkload" => Some(Self::ComponentWorkload),
            _ => None,
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkloadKind::StandaloneWorkload => "StandaloneWorkload",
            WorkloadKind::WorkloadCollection => "WorkloadCollection",
            WorkloadKind::ComponentWorkload => "ComponentWorkload",
        };
        write!(f, "{s}")
    }
}

/// Group/version/kind triple identifying a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}

/// Closed set of semantic field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Int,
    Bool,
    Map,
    Object,
}

impl FieldKind {
    /// Normalize a declared type name. Returns `None` for unknown types.
    pub fn parse(declared: &str) -> Option<Self> {
        match declared.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Some(Self::String),
            "int" | "integer" | "int32" | "int64" => Some(Self::Int),
            "bool" | "boolean" => Some(Self::Bool),
            "map" | "map[string]string" => Some(Self::Map),
            "object" | "struct" => Some(Self::Object),
            _ => None,
        }
    }

    /// Whether `value` is an acceptable default for this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Int => value.is_i64() || value.is_u64(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Map => value
                .as_object()
                .map(|m| m.values().all(Value::is_string))
                .unwrap_or(false),
            FieldKind::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::String => "string",
            FieldKind::Int => "int",
            FieldKind::Bool => "bool",
            FieldKind::Map => "map",
            FieldKind::Object => "object",
        };
        write!(f, "{s}")
    }
}

/// One field of a resource's spec.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    /// Materialized default. `None` only for required fields declared without one.
    pub default: Option<Value>,
    pub required: bool,
    pub description: Option<String>,
    /// Nested fields, only populated for [`FieldKind::Object`].
    pub fields: Vec<Field>,
}

/// How a marker region is resolved on regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerScope {
    /// Default written once; on-disk content wins afterwards.
    Static,
    /// On-disk content kept and missing template lines re-added every run.
    Dynamic,
}

impl MarkerScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "static" => Some(Self::Static),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerScope::Static => "static",
            MarkerScope::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for MarkerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-declared preserved region rendered into a resource's manifest set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub name: String,
    pub scope: MarkerScope,
    pub default: String,
}

/// One custom resource definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    /// Document name; dependency references use it.
    pub name: String,
    pub workload_kind: WorkloadKind,
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub namespaced: bool,
    pub fields: Vec<Field>,
    pub markers: Vec<Marker>,
    /// Names of companions declared by this resource.
    pub companions: BTreeSet<String>,
    /// Name of the declaring resource for companions.
    pub parent: Option<String>,
    /// True when a companion set its own group or version.
    pub overrides_group_version: bool,
    /// Document the resource was declared in (with `#components[i]` for inline ones).
    pub source: String,
}

impl ResourceNode {
    pub fn gvk(&self) -> Gvk {
        Gvk {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: self.kind.clone(),
        }
    }

    /// Lower-case singular resource name (`Widget` → `widget`).
    pub fn singular(&self) -> String {
        self.kind.to_lowercase()
    }
}

/// Directed edge: `from` must wait for `to` to be ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    /// Readiness predicate `from`'s controller calls before reconciling.
    pub readiness: String,
}

/// Options shared by every resource in the workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    pub group: String,
    pub version: String,
    pub domain: Option<String>,
    pub namespaced: bool,
}

/// Parsed, linked workload specification. Read-only after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSpec {
    pub name: String,
    /// Canonical path of the root document.
    pub source: PathBuf,
    /// Go module path of the generated project.
    pub repository: String,
    pub options: GlobalOptions,
    /// Root first, then companions depth-first in declaration order.
    pub resources: Vec<ResourceNode>,
    pub dependencies: Vec<DependencyEdge>,
}

impl WorkloadSpec {
    pub fn root(&self) -> &ResourceNode {
        &self.resources[0]
    }

    pub fn root_mut(&mut self) -> &mut ResourceNode {
        &mut self.resources[0]
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceNode> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn companions_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ResourceNode> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.parent.as_deref() == Some(name))
    }

    /// Edges leaving `name`, in declaration order.
    pub fn dependencies_of<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.dependencies.iter().filter(move |e| e.from == name)
    }

    /// Edges pointing at `name`, in declaration order.
    pub fn dependents_of<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.dependencies.iter().filter(move |e| e.to == name)
    }

    /// API group including the domain suffix (`apps` + `acme.io` → `apps.acme.io`).
    pub fn full_group(&self, resource: &ResourceNode) -> String {
        match &self.options.domain {
            Some(domain) if !domain.is_empty() => format!("{}.{}", resource.group, domain),
            _ => resource.group.clone(),
        }
    }
}
