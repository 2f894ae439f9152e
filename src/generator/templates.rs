use std::collections::HashMap;

use askama::Template;

use super::artifact::ResourceIdentity;
use super::schema::{go_types, openapi_schema, sample_spec, yaml_block, TypeDefinition};
use crate::error::ScaffoldError;
use crate::spec::{Field, Marker, ResourceNode, WorkloadSpec};

/// Error type template render functions return.
pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// Render function bound to a template id.
pub type RenderFn = fn(&RenderContext) -> Result<String, RenderError>;

/// A dependency as seen from the resource that waits on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    pub name: String,
    pub kind: String,
    pub full_group: String,
    pub plural: String,
    /// Predicate the dependent's controller calls.
    pub readiness: String,
}

/// Everything a template may read about one resource.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub boilerplate: String,
    /// Go module path of the generated project
    pub repository: String,
    pub resource: ResourceIdentity,
    pub fields: Vec<Field>,
    pub markers: Vec<Marker>,
    /// Resources this one waits on, in declaration order.
    pub dependencies: Vec<DependencyRef>,
    /// Readiness predicates this resource's dependency file must define:
    /// `<Kind>CheckReady` first, then custom ones named by dependents.
    pub predicates: Vec<String>,
}

impl RenderContext {
    pub fn new(spec: &WorkloadSpec, resource: &ResourceNode, boilerplate: &str) -> Self {
        let mut dependencies: Vec<DependencyRef> = Vec::new();
        for edge in spec.dependencies_of(&resource.name) {
            let Some(target) = spec.resource(&edge.to) else {
                continue;
            };
            let dep = DependencyRef {
                name: target.name.clone(),
                kind: target.kind.clone(),
                full_group: spec.full_group(target),
                plural: target.plural.clone(),
                readiness: edge.readiness.clone(),
            };
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }

        let mut predicates = vec![format!("{}CheckReady", resource.kind)];
        for edge in spec.dependents_of(&resource.name) {
            if !predicates.contains(&edge.readiness) {
                predicates.push(edge.readiness.clone());
            }
        }

        Self {
            boilerplate: boilerplate.trim_end().to_string(),
            repository: spec.repository.clone(),
            resource: ResourceIdentity::new(spec, resource),
            fields: resource.fields.clone(),
            markers: resource.markers.clone(),
            dependencies,
            predicates,
        }
    }
}

/// Template for `apis/<group>/<version>/groupversion_info.go`
#[derive(Template)]
#[template(path = "groupversion_info.go.txt", escape = "none")]
pub struct GroupVersionTemplate<'a> {
    pub boilerplate: &'a str,
    pub group: &'a str,
    pub full_group: &'a str,
    pub version: &'a str,
}

/// Template for `apis/<group>/<version>/<kind>_types.go`
#[derive(Template)]
#[template(path = "api_types.go.txt", escape = "none")]
pub struct ApiTypesTemplate<'a> {
    pub boilerplate: &'a str,
    pub version: &'a str,
    pub kind: &'a str,
    pub plural: &'a str,
    pub scope: &'a str,
    pub types: Vec<TypeDefinition>,
}

/// Template for the per-resource manifest set (RBAC role and CRD patch)
#[derive(Template)]
#[template(path = "manifests.yaml.txt", escape = "none")]
pub struct ManifestSetTemplate<'a> {
    pub kind: &'a str,
    pub singular: String,
    pub plural: &'a str,
    pub full_group: &'a str,
    pub version: &'a str,
    pub scope: &'a str,
    pub dependencies: &'a [DependencyRef],
    pub schema: String,
    pub markers: Vec<MarkerBlock>,
}

/// A custom marker region as rendered into the manifest set.
#[derive(Debug, Clone)]
pub struct MarkerBlock {
    pub name: String,
    pub scope: String,
    pub default: String,
}

#[derive(Template)]
#[template(path = "sample.yaml.txt", escape = "none")]
pub struct SampleTemplate<'a> {
    pub kind: &'a str,
    pub singular: String,
    pub full_group: &'a str,
    pub version: &'a str,
    pub spec: String,
}

/// Template for `internal/dependencies/<kind>.go`
#[derive(Template)]
#[template(path = "dependency.go.txt", escape = "none")]
pub struct DependencyCheckTemplate<'a> {
    pub boilerplate: &'a str,
    pub kind: &'a str,
    pub predicates: &'a [String],
}

/// Template for `controllers/<group>/<kind>_controller.go`
#[derive(Template)]
#[template(path = "controller.go.txt", escape = "none")]
pub struct ControllerTemplate<'a> {
    pub boilerplate: &'a str,
    pub repository: &'a str,
    pub package: String,
    pub api_alias: String,
    pub group: &'a str,
    pub full_group: &'a str,
    pub version: &'a str,
    pub kind: &'a str,
    pub plural: &'a str,
    pub dependencies: &'a [DependencyRef],
}

fn render_group_version(ctx: &RenderContext) -> Result<String, RenderError> {
    let r = &ctx.resource;
    Ok(GroupVersionTemplate {
        boilerplate: &ctx.boilerplate,
        group: &r.group,
        full_group: &r.full_group,
        version: &r.version,
    }
    .render()?)
}

fn render_api_types(ctx: &RenderContext) -> Result<String, RenderError> {
    let r = &ctx.resource;
    Ok(ApiTypesTemplate {
        boilerplate: &ctx.boilerplate,
        version: &r.version,
        kind: &r.kind,
        plural: &r.plural,
        scope: r.scope(),
        types: go_types(&r.kind, &ctx.fields),
    }
    .render()?)
}

fn render_manifests(ctx: &RenderContext) -> Result<String, RenderError> {
    let r = &ctx.resource;
    let markers = ctx
        .markers
        .iter()
        .map(|m| MarkerBlock {
            name: m.name.clone(),
            scope: m.scope.to_string(),
            default: m.default.trim_end().to_string(),
        })
        .collect();
    Ok(ManifestSetTemplate {
        kind: &r.kind,
        singular: r.singular(),
        plural: &r.plural,
        full_group: &r.full_group,
        version: &r.version,
        scope: r.scope(),
        dependencies: &ctx.dependencies,
        schema: yaml_block(&openapi_schema(&ctx.fields), 10)?,
        markers,
    }
    .render()?)
}

fn render_sample(ctx: &RenderContext) -> Result<String, RenderError> {
    let r = &ctx.resource;
    let values = sample_spec(&ctx.fields);
    let spec = match values.as_object() {
        Some(map) if !map.is_empty() => format!("\n{}", yaml_block(&values, 2)?),
        _ => " {}".to_string(),
    };
    Ok(SampleTemplate {
        kind: &r.kind,
        singular: r.singular(),
        full_group: &r.full_group,
        version: &r.version,
        spec,
    }
    .render()?)
}

fn render_dependency_check(ctx: &RenderContext) -> Result<String, RenderError> {
    Ok(DependencyCheckTemplate {
        boilerplate: &ctx.boilerplate,
        kind: &ctx.resource.kind,
        predicates: &ctx.predicates,
    }
    .render()?)
}

fn render_controller(ctx: &RenderContext) -> Result<String, RenderError> {
    let r = &ctx.resource;
    Ok(ControllerTemplate {
        boilerplate: &ctx.boilerplate,
        repository: &ctx.repository,
        package: r.group_package(),
        api_alias: r.api_alias(),
        group: &r.group,
        full_group: &r.full_group,
        version: &r.version,
        kind: &r.kind,
        plural: &r.plural,
        dependencies: &ctx.dependencies,
    }
    .render()?)
}

/// Maps template ids to render functions.
///
/// [`TemplateRegistry::builtin`] carries the templates compiled into the
/// binary; callers may register more (or replace one) under any id.
#[derive(Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, RenderFn>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateRegistry {
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("api/groupversion", render_group_version);
        registry.register("api/types", render_api_types);
        registry.register("config/manifests", render_manifests);
        registry.register("config/sample", render_sample);
        registry.register("dependencies/check", render_dependency_check);
        registry.register("controllers/reconciler", render_controller);
        registry
    }

    pub fn register(&mut self, id: impl Into<String>, render: RenderFn) {
        self.templates.insert(id.into(), render);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Render template `id`; output always ends with exactly one newline.
    pub fn render(&self, id: &str, ctx: &RenderContext) -> Result<String, ScaffoldError> {
        let render = self
            .templates
            .get(id)
            .ok_or_else(|| ScaffoldError::TemplateResolution { id: id.to_string() })?;
        let out = render(ctx).map_err(|source| ScaffoldError::Render {
            id: id.to_string(),
            source,
        })?;
        Ok(normalize_newline(&out))
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.templates.keys().collect();
        ids.sort();
        f.debug_struct("TemplateRegistry").field("templates", &ids).finish()
    }
}

fn normalize_newline(text: &str) -> String {
    let mut out = text.trim_end_matches(['\n', '\r', ' ', '\t']).to_string();
    out.push('\n');
    out
}
