use std::fmt;
use std::path::{Path, PathBuf};

use crate::spec::naming::to_snake_case;
use crate::spec::{ResourceNode, WorkloadSpec};

/// The kinds of file emitted for every resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Package registration shared by every resource of a group-version.
    GroupVersionInfo,
    ApiTypes,
    ManifestSet,
    Sample,
    DependencyCheck,
    Controller,
}

/// How an artifact treats a file already present at its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Regenerated on every run.
    AlwaysOverwrite,
    /// Written once, user-owned afterwards.
    SkipIfExists,
    /// Written once; regenerating requires `force`.
    OverwriteErrorUnlessForced,
    /// Regenerated with marker regions carried over from the existing file.
    Merge,
}

impl ArtifactKind {
    /// Per-resource artifacts in emission order.
    pub const PER_RESOURCE: [ArtifactKind; 5] = [
        ArtifactKind::ApiTypes,
        ArtifactKind::ManifestSet,
        ArtifactKind::Sample,
        ArtifactKind::DependencyCheck,
        ArtifactKind::Controller,
    ];

    pub fn template_id(&self) -> &'static str {
        match self {
            ArtifactKind::GroupVersionInfo => "api/groupversion",
            ArtifactKind::ApiTypes => "api/types",
            ArtifactKind::ManifestSet => "config/manifests",
            ArtifactKind::Sample => "config/sample",
            ArtifactKind::DependencyCheck => "dependencies/check",
            ArtifactKind::Controller => "controllers/reconciler",
        }
    }

    pub fn policy(&self) -> MutationPolicy {
        match self {
            ArtifactKind::GroupVersionInfo | ArtifactKind::ApiTypes => {
                MutationPolicy::AlwaysOverwrite
            }
            ArtifactKind::ManifestSet => MutationPolicy::Merge,
            ArtifactKind::Sample | ArtifactKind::DependencyCheck => MutationPolicy::SkipIfExists,
            ArtifactKind::Controller => MutationPolicy::OverwriteErrorUnlessForced,
        }
    }

    /// Destination relative to the output root.
    pub fn relative_path(&self, identity: &ResourceIdentity) -> PathBuf {
        let group = &identity.group;
        let version = &identity.version;
        let file = to_snake_case(&identity.kind);
        match self {
            ArtifactKind::GroupVersionInfo => Path::new("apis")
                .join(group)
                .join(version)
                .join("groupversion_info.go"),
            ArtifactKind::ApiTypes => Path::new("apis")
                .join(group)
                .join(version)
                .join(format!("{file}_types.go")),
            ArtifactKind::ManifestSet => Path::new("config")
                .join("manifests")
                .join(format!("{group}_{version}_{file}.yaml")),
            ArtifactKind::Sample => Path::new("config")
                .join("samples")
                .join(format!("{group}_{version}_{file}.yaml")),
            ArtifactKind::DependencyCheck => Path::new("internal")
                .join("dependencies")
                .join(format!("{file}.go")),
            ArtifactKind::Controller => Path::new("controllers")
                .join(group)
                .join(format!("{file}_controller.go")),
        }
    }

    /// Name used on the command line and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::GroupVersionInfo => "groupversion",
            ArtifactKind::ApiTypes => "api",
            ArtifactKind::ManifestSet => "manifests",
            ArtifactKind::Sample => "samples",
            ArtifactKind::DependencyCheck => "dependencies",
            ArtifactKind::Controller => "controller",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity attributes every path and template is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub name: String,
    pub group: String,
    /// Group with the domain suffix, as it appears in the API server.
    pub full_group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub namespaced: bool,
}

impl ResourceIdentity {
    pub fn new(spec: &WorkloadSpec, resource: &ResourceNode) -> Self {
        Self {
            name: resource.name.clone(),
            group: resource.group.clone(),
            full_group: spec.full_group(resource),
            version: resource.version.clone(),
            kind: resource.kind.clone(),
            plural: resource.plural.clone(),
            namespaced: resource.namespaced,
        }
    }

    pub fn singular(&self) -> String {
        self.kind.to_lowercase()
    }

    /// Go package name of the controller directory (`my-apps` → `myapps`).
    pub fn group_package(&self) -> String {
        self.group
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_lowercase()
    }

    /// Import alias of the API package (`apps` + `v1` → `appsv1`).
    pub fn api_alias(&self) -> String {
        format!("{}{}", self.group_package(), self.version)
    }

    /// CRD scope keyword.
    pub fn scope(&self) -> &'static str {
        if self.namespaced {
            "Namespaced"
        } else {
            "Cluster"
        }
    }
}

/// A concrete file to produce: template, destination and mutation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub template: String,
    pub destination: PathBuf,
    pub policy: MutationPolicy,
}

impl Artifact {
    /// The artifact of `kind` for `identity`, rooted at `root`.
    pub fn new(root: &Path, identity: &ResourceIdentity, kind: ArtifactKind) -> Self {
        Self {
            kind,
            template: kind.template_id().to_string(),
            destination: root.join(kind.relative_path(identity)),
            policy: kind.policy(),
        }
    }
}
