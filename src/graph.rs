//! # Resource Graph
//!
//! Builds the dependency graph over a workload's resources, enforces the
//! structural invariants, and produces the order artifacts are emitted in.
//!
//! Checks run in a fixed order so the first violation reported for a given
//! document is always the same:
//!
//! 1. `(group, version, kind)` uniqueness
//! 2. resource name uniqueness and singular/plural collisions per group/version
//! 3. identity shape (kind, plural) and custom marker names
//! 4. no two resources scaffold to the same file
//! 5. dependency targets exist
//! 6. each readiness predicate is defined for exactly one resource
//! 7. acyclicity (depth-first search; the reported cycle is the full path)
//!
//! The resulting order places every dependency before its dependents; ties
//! are broken by kind name, then group and version.

use crate::error::ValidationError;
use crate::generator::{ArtifactKind, ResourceIdentity, MANIFEST_MARKERS};
use crate::spec::naming::is_upper_camel;
use crate::spec::{Gvk, ResourceNode, WorkloadSpec};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use tracing::debug;

#[cfg(test)]
mod tests;

/// Dependency graph over the resources of one workload.
#[derive(Debug)]
pub struct ResourceGraph<'a> {
    spec: &'a WorkloadSpec,
    /// `edges[i]` holds the indices resource `i` depends on, deduplicated.
    edges: Vec<BTreeSet<usize>>,
}

/// Validate `spec` and return its resources in generation order.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found; see the module docs for the
/// order checks run in.
pub fn validate(spec: &WorkloadSpec) -> Result<Vec<&ResourceNode>, ValidationError> {
    let graph = ResourceGraph::build(spec)?;
    graph.check_acyclic()?;
    let order = graph.topological_order();
    debug!(
        order = ?order.iter().map(|r| r.kind.as_str()).collect::<Vec<_>>(),
        "resolved generation order"
    );
    Ok(order)
}

impl<'a> ResourceGraph<'a> {
    /// Run the identity checks and link dependency edges.
    pub fn build(spec: &'a WorkloadSpec) -> Result<Self, ValidationError> {
        check_unique_gvk(spec)?;
        check_naming(spec)?;
        check_identity(spec)?;
        check_markers(spec)?;
        check_artifact_paths(spec)?;

        let index: HashMap<&str, usize> = spec
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.as_str(), i))
            .collect();

        let mut edges = vec![BTreeSet::new(); spec.resources.len()];
        for edge in &spec.dependencies {
            let from = index.get(edge.from.as_str()).copied().ok_or_else(|| {
                ValidationError::UnknownDependency {
                    resource: edge.from.clone(),
                    target: edge.to.clone(),
                }
            })?;
            let to = index.get(edge.to.as_str()).copied().ok_or_else(|| {
                ValidationError::UnknownDependency {
                    resource: edge.from.clone(),
                    target: edge.to.clone(),
                }
            })?;
            edges[from].insert(to);
        }
        check_readiness(spec)?;
        Ok(Self { spec, edges })
    }

    /// Resources `name` depends on directly.
    pub fn dependencies_of(&self, name: &str) -> Vec<&'a ResourceNode> {
        let spec = self.spec;
        spec.resources
            .iter()
            .position(|r| r.name == name)
            .map(|i| self.edges[i].iter().map(|&j| &spec.resources[j]).collect())
            .unwrap_or_default()
    }

    /// Depth-first cycle detection.
    ///
    /// Roots are visited in kind order so the reported cycle is stable.
    pub fn check_acyclic(&self) -> Result<(), ValidationError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let n = self.spec.resources.len();
        let mut marks = vec![Mark::Unvisited; n];
        let mut roots: Vec<usize> = (0..n).collect();
        roots.sort_by(|&a, &b| self.sort_key(a).cmp(&self.sort_key(b)));

        for root in roots {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            // Explicit stack of (node, remaining neighbours) keeps deep graphs off the call stack.
            let mut path: Vec<usize> = vec![root];
            let mut stack: Vec<std::collections::btree_set::Iter<'_, usize>> =
                vec![self.edges[root].iter()];
            marks[root] = Mark::InProgress;

            while let Some(neighbours) = stack.last_mut() {
                match neighbours.next() {
                    Some(&next) => match marks[next] {
                        Mark::InProgress => {
                            let start = path.iter().position(|&p| p == next).unwrap_or(0);
                            let mut cycle: Vec<String> = path[start..]
                                .iter()
                                .map(|&i| self.spec.resources[i].name.clone())
                                .collect();
                            cycle.push(self.spec.resources[next].name.clone());
                            return Err(ValidationError::CyclicDependency { cycle });
                        }
                        Mark::Unvisited => {
                            marks[next] = Mark::InProgress;
                            path.push(next);
                            stack.push(self.edges[next].iter());
                        }
                        Mark::Done => {}
                    },
                    None => {
                        stack.pop();
                        if let Some(done) = path.pop() {
                            marks[done] = Mark::Done;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Kahn's algorithm with a kind-ordered ready set.
    ///
    /// Only meaningful on an acyclic graph; nodes caught in a cycle are left out.
    pub fn topological_order(&self) -> Vec<&'a ResourceNode> {
        let n = self.spec.resources.len();
        let mut remaining: Vec<usize> = self.edges.iter().map(BTreeSet::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (from, deps) in self.edges.iter().enumerate() {
            for &to in deps {
                dependents[to].push(from);
            }
        }

        let mut ready: BTreeSet<(String, String, String, usize)> = (0..n)
            .filter(|&i| remaining[i] == 0)
            .map(|i| self.sort_key(i))
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(key) = ready.pop_first() {
            let i = key.3;
            order.push(&self.spec.resources[i]);
            for &d in &dependents[i] {
                remaining[d] -= 1;
                if remaining[d] == 0 {
                    ready.insert(self.sort_key(d));
                }
            }
        }
        order
    }

    fn sort_key(&self, i: usize) -> (String, String, String, usize) {
        let r = &self.spec.resources[i];
        (r.kind.clone(), r.group.clone(), r.version.clone(), i)
    }
}

fn check_unique_gvk(spec: &WorkloadSpec) -> Result<(), ValidationError> {
    let mut seen: HashMap<Gvk, &str> = HashMap::new();
    for resource in &spec.resources {
        let gvk = resource.gvk();
        if let Some(first) = seen.get(&gvk) {
            return Err(ValidationError::DuplicateGvk {
                gvk: gvk.to_string(),
                first: (*first).to_string(),
                second: resource.name.clone(),
            });
        }
        seen.insert(gvk, &resource.name);
    }
    Ok(())
}

fn check_naming(spec: &WorkloadSpec) -> Result<(), ValidationError> {
    let mut names: HashMap<&str, &str> = HashMap::new();
    for resource in &spec.resources {
        if let Some(first) = names.insert(&resource.name, &resource.source) {
            return Err(ValidationError::DuplicateResourceName {
                name: resource.name.clone(),
                first: first.to_string(),
                second: resource.source.clone(),
            });
        }
    }

    // (group, version, singular-or-plural) → resource name
    let mut claimed: HashMap<(String, String, String), &str> = HashMap::new();
    for resource in &spec.resources {
        let forms: HashSet<String> = [resource.singular(), resource.plural.to_lowercase()]
            .into_iter()
            .collect();
        let mut forms: Vec<String> = forms.into_iter().collect();
        forms.sort();
        for form in forms {
            let key = (resource.group.clone(), resource.version.clone(), form.clone());
            if let Some(first) = claimed.get(&key) {
                return Err(ValidationError::NamingCollision {
                    group_version: format!("{}/{}", resource.group, resource.version),
                    name: form,
                    first: (*first).to_string(),
                    second: resource.name.clone(),
                });
            }
            claimed.insert(key, &resource.name);
        }
    }
    Ok(())
}

fn check_identity(spec: &WorkloadSpec) -> Result<(), ValidationError> {
    for resource in &spec.resources {
        if !is_upper_camel(&resource.kind) {
            return Err(ValidationError::InvalidIdentity {
                resource: resource.name.clone(),
                attribute: "kind",
                value: resource.kind.clone(),
            });
        }
        let plural_ok = resource
            .plural
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !resource.plural.is_empty();
        if !plural_ok {
            return Err(ValidationError::InvalidIdentity {
                resource: resource.name.clone(),
                attribute: "plural",
                value: resource.plural.clone(),
            });
        }
        let group_ok = !resource.group.is_empty()
            && resource
                .group
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
        if !group_ok {
            return Err(ValidationError::InvalidIdentity {
                resource: resource.name.clone(),
                attribute: "group",
                value: resource.group.clone(),
            });
        }
        if !crate::spec::naming::is_kube_version(&resource.version) {
            return Err(ValidationError::InvalidIdentity {
                resource: resource.name.clone(),
                attribute: "version",
                value: resource.version.clone(),
            });
        }
    }
    Ok(())
}

fn check_markers(spec: &WorkloadSpec) -> Result<(), ValidationError> {
    for resource in &spec.resources {
        let mut seen: HashSet<&str> = MANIFEST_MARKERS.iter().copied().collect();
        for marker in &resource.markers {
            if !seen.insert(marker.name.as_str()) {
                return Err(ValidationError::DuplicateMarker {
                    resource: resource.name.clone(),
                    marker: marker.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_artifact_paths(spec: &WorkloadSpec) -> Result<(), ValidationError> {
    let mut claimed: HashMap<PathBuf, &str> = HashMap::new();
    for resource in &spec.resources {
        let identity = ResourceIdentity::new(spec, resource);
        for kind in ArtifactKind::PER_RESOURCE {
            let path = kind.relative_path(&identity);
            if let Some(first) = claimed.get(&path) {
                return Err(ValidationError::ArtifactCollision {
                    path,
                    first: (*first).to_string(),
                    second: resource.name.clone(),
                });
            }
            claimed.insert(path, &resource.name);
        }
    }
    Ok(())
}

/// Every predicate lands in the one `dependencies` Go package, so a name may
/// only be defined by one target's dependency file.
fn check_readiness(spec: &WorkloadSpec) -> Result<(), ValidationError> {
    // predicate → (defining resource, where it came from)
    let mut defined: HashMap<String, (&str, String)> = HashMap::new();
    let builtin = spec
        .resources
        .iter()
        .map(|r| (format!("{}CheckReady", r.kind), r.name.as_str(), format!("'{}'", r.name)));
    let custom = spec.dependencies.iter().map(|e| {
        (
            e.readiness.clone(),
            e.to.as_str(),
            format!("'{}' -> '{}'", e.from, e.to),
        )
    });
    for (predicate, target, origin) in builtin.chain(custom) {
        match defined.get(&predicate) {
            Some((owner, first)) if *owner != target => {
                return Err(ValidationError::DuplicateReadiness {
                    predicate,
                    first: first.clone(),
                    second: origin,
                });
            }
            Some(_) => {}
            None => {
                defined.insert(predicate, (target, origin));
            }
        }
    }
    Ok(())
}
