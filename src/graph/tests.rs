#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Unit tests for graph validation and ordering

use super::*;
use crate::spec::{
    DependencyEdge, GlobalOptions, Marker, MarkerScope, ResourceNode, WorkloadKind, WorkloadSpec,
};
use std::path::PathBuf;

fn resource(name: &str, kind: &str) -> ResourceNode {
    ResourceNode {
        name: name.to_string(),
        workload_kind: WorkloadKind::ComponentWorkload,
        group: "apps".to_string(),
        version: "v1".to_string(),
        kind: kind.to_string(),
        plural: crate::spec::naming::regular_plural(kind),
        namespaced: true,
        fields: Vec::new(),
        markers: Vec::new(),
        companions: Default::default(),
        parent: None,
        overrides_group_version: false,
        source: format!("{name}.yaml"),
    }
}

fn edge(from: &str, to: &str) -> DependencyEdge {
    DependencyEdge {
        from: from.to_string(),
        to: to.to_string(),
        readiness: format!("{}CheckReady", crate::spec::naming::to_upper_camel(to)),
    }
}

fn workload(resources: Vec<ResourceNode>, dependencies: Vec<DependencyEdge>) -> WorkloadSpec {
    WorkloadSpec {
        name: "test".to_string(),
        source: PathBuf::from("workload.yaml"),
        repository: "github.com/acme/test".to_string(),
        options: GlobalOptions {
            group: "apps".to_string(),
            version: "v1".to_string(),
            domain: None,
            namespaced: true,
        },
        resources,
        dependencies,
    }
}

fn kinds(order: &[&ResourceNode]) -> Vec<String> {
    order.iter().map(|r| r.kind.clone()).collect()
}

#[test]
fn test_duplicate_gvk_names_both_resources() {
    let spec = workload(
        vec![resource("gadget", "Gadget"), resource("gadget-two", "Gadget")],
        vec![],
    );
    let err = validate(&spec).unwrap_err();
    assert_eq!(
        err,
        ValidationError::DuplicateGvk {
            gvk: "apps/v1, Kind=Gadget".to_string(),
            first: "gadget".to_string(),
            second: "gadget-two".to_string(),
        }
    );
}

#[test]
fn test_same_kind_in_other_version_collides_on_shared_files() {
    let mut v2 = resource("gadget-v2", "Gadget");
    v2.version = "v2".to_string();
    let spec = workload(vec![resource("gadget", "Gadget"), v2], vec![]);
    assert_eq!(
        validate(&spec).unwrap_err(),
        ValidationError::ArtifactCollision {
            path: PathBuf::from("internal/dependencies/gadget.go"),
            first: "gadget".to_string(),
            second: "gadget-v2".to_string(),
        }
    );
}

#[test]
fn test_same_kind_in_other_group_collides() {
    let mut tools = resource("gadget-tools", "Gadget");
    tools.group = "tools".to_string();
    let spec = workload(vec![resource("gadget", "Gadget"), tools], vec![]);
    assert!(matches!(
        validate(&spec).unwrap_err(),
        ValidationError::ArtifactCollision { first, second, .. }
            if first == "gadget" && second == "gadget-tools"
    ));
}

#[test]
fn test_custom_readiness_shared_by_two_targets() {
    let mut to_gadget = edge("widget", "gadget");
    to_gadget.readiness = "IsReady".to_string();
    let mut to_cache = edge("widget", "cache");
    to_cache.readiness = "IsReady".to_string();
    let spec = workload(
        vec![
            resource("widget", "Widget"),
            resource("gadget", "Gadget"),
            resource("cache", "Cache"),
        ],
        vec![to_gadget, to_cache],
    );
    assert_eq!(
        validate(&spec).unwrap_err(),
        ValidationError::DuplicateReadiness {
            predicate: "IsReady".to_string(),
            first: "'widget' -> 'gadget'".to_string(),
            second: "'widget' -> 'cache'".to_string(),
        }
    );
}

#[test]
fn test_custom_readiness_cannot_reuse_another_kinds_predicate() {
    let mut custom = edge("widget", "gadget");
    custom.readiness = "CacheCheckReady".to_string();
    let spec = workload(
        vec![
            resource("widget", "Widget"),
            resource("gadget", "Gadget"),
            resource("cache", "Cache"),
        ],
        vec![custom],
    );
    assert!(matches!(
        validate(&spec).unwrap_err(),
        ValidationError::DuplicateReadiness { predicate, first, .. }
            if predicate == "CacheCheckReady" && first == "'cache'"
    ));
}

#[test]
fn test_two_dependents_may_share_a_readiness_name_for_one_target() {
    let mut a = edge("widget", "gadget");
    a.readiness = "GadgetServing".to_string();
    let mut b = edge("cache", "gadget");
    b.readiness = "GadgetServing".to_string();
    let spec = workload(
        vec![
            resource("widget", "Widget"),
            resource("gadget", "Gadget"),
            resource("cache", "Cache"),
        ],
        vec![a, b],
    );
    assert_eq!(validate(&spec).unwrap().len(), 3);
}

#[test]
fn test_plural_collides_with_other_singular() {
    // `Data` pluralises to `datas`; force a collision through an explicit plural.
    let mut a = resource("a", "Datum");
    a.plural = "data".to_string();
    let b = resource("b", "Data");
    let spec = workload(vec![a, b], vec![]);
    match validate(&spec).unwrap_err() {
        ValidationError::NamingCollision {
            group_version,
            name,
            first,
            second,
        } => {
            assert_eq!(group_version, "apps/v1");
            assert_eq!(name, "data");
            assert_eq!(first, "a");
            assert_eq!(second, "b");
        }
        other => panic!("expected NamingCollision, got {other:?}"),
    }
}

#[test]
fn test_duplicate_resource_name() {
    let spec = workload(
        vec![resource("gadget", "Gadget"), resource("gadget", "Widget")],
        vec![],
    );
    assert!(matches!(
        validate(&spec).unwrap_err(),
        ValidationError::DuplicateResourceName { .. }
    ));
}

#[test]
fn test_unknown_dependency() {
    let spec = workload(vec![resource("widget", "Widget")], vec![edge("widget", "ghost")]);
    assert_eq!(
        validate(&spec).unwrap_err(),
        ValidationError::UnknownDependency {
            resource: "widget".to_string(),
            target: "ghost".to_string(),
        }
    );
}

#[test]
fn test_two_node_cycle_is_reported_with_full_path() {
    let spec = workload(
        vec![resource("a", "Alpha"), resource("b", "Beta")],
        vec![edge("a", "b"), edge("b", "a")],
    );
    assert_eq!(
        validate(&spec).unwrap_err(),
        ValidationError::CyclicDependency {
            cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        }
    );
}

#[test]
fn test_longer_cycle_reachable_from_acyclic_prefix() {
    // entry -> x -> y -> z -> x
    let spec = workload(
        vec![
            resource("entry", "Aaa"),
            resource("x", "Xray"),
            resource("y", "Yankee"),
            resource("z", "Zulu"),
        ],
        vec![
            edge("entry", "x"),
            edge("x", "y"),
            edge("y", "z"),
            edge("z", "x"),
        ],
    );
    match validate(&spec).unwrap_err() {
        ValidationError::CyclicDependency { cycle } => {
            assert_eq!(cycle, ["x", "y", "z", "x"]);
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let spec = workload(vec![resource("a", "Alpha")], vec![edge("a", "a")]);
    assert_eq!(
        validate(&spec).unwrap_err(),
        ValidationError::CyclicDependency {
            cycle: vec!["a".to_string(), "a".to_string()],
        }
    );
}

#[test]
fn test_dependencies_precede_dependents() {
    let spec = workload(
        vec![
            resource("widget", "Widget"),
            resource("gadget", "Gadget"),
            resource("cache", "Cache"),
            resource("zeta", "Zeta"),
        ],
        vec![
            edge("widget", "gadget"),
            edge("gadget", "zeta"),
            edge("widget", "cache"),
        ],
    );
    let order = validate(&spec).unwrap();
    assert_eq!(kinds(&order), ["Cache", "Zeta", "Gadget", "Widget"]);

    for e in &spec.dependencies {
        let from = order.iter().position(|r| r.name == e.from).unwrap();
        let to = order.iter().position(|r| r.name == e.to).unwrap();
        assert!(to < from, "{} must precede {}", e.to, e.from);
    }
}

#[test]
fn test_independent_resources_are_ordered_by_kind() {
    let spec = workload(
        vec![
            resource("w", "Widget"),
            resource("b", "Bolt"),
            resource("g", "Gadget"),
        ],
        vec![],
    );
    assert_eq!(kinds(&validate(&spec).unwrap()), ["Bolt", "Gadget", "Widget"]);
}

#[test]
fn test_duplicate_edges_do_not_block_ordering() {
    let spec = workload(
        vec![resource("widget", "Widget"), resource("gadget", "Gadget")],
        vec![edge("widget", "gadget"), edge("widget", "gadget")],
    );
    assert_eq!(kinds(&validate(&spec).unwrap()), ["Gadget", "Widget"]);
}

#[test]
fn test_custom_marker_cannot_shadow_generated_marker() {
    let mut widget = resource("widget", "Widget");
    widget.markers.push(Marker {
        name: MANIFEST_MARKERS[0].to_string(),
        scope: MarkerScope::Static,
        default: String::new(),
    });
    let spec = workload(vec![widget], vec![]);
    assert!(matches!(
        validate(&spec).unwrap_err(),
        ValidationError::DuplicateMarker { .. }
    ));
}

#[test]
fn test_invalid_kind_is_rejected() {
    let spec = workload(vec![resource("widget", "widget")], vec![]);
    assert!(matches!(
        validate(&spec).unwrap_err(),
        ValidationError::InvalidIdentity {
            attribute: "kind",
            ..
        }
    ));
}

#[test]
fn test_dependencies_of() {
    let spec = workload(
        vec![resource("widget", "Widget"), resource("gadget", "Gadget")],
        vec![edge("widget", "gadget")],
    );
    let graph = ResourceGraph::build(&spec).unwrap();
    let deps: Vec<_> = graph
        .dependencies_of("widget")
        .iter()
        .map(|r| r.kind.clone())
        .collect();
    assert_eq!(deps, ["Gadget"]);
    assert!(graph.dependencies_of("gadget").is_empty());
}
