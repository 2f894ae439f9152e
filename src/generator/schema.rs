use serde_json::{json, Map, Value};

use crate::spec::naming::to_upper_camel;
use crate::spec::{Field, FieldKind};

/// A Go struct generated from a resource's field list.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    /// Exported struct name (e.g. `WidgetSpec`, `WidgetTls`)
    pub name: String,
    pub doc: String,
    pub fields: Vec<FieldDef>,
}

/// One field of a generated Go struct.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Exported Go field name
    pub name: String,
    /// Go type (`string`, `int`, `map[string]string`, a nested struct)
    pub ty: String,
    /// Content of the `json:"..."` tag
    pub json_tag: String,
    /// Comment lines rendered above the field, without the `// ` leader
    pub comments: Vec<String>,
}

/// Go types for a resource spec: `<Kind>Spec` first, then nested object
/// structs depth-first in declaration order.
pub fn go_types(kind: &str, fields: &[Field]) -> Vec<TypeDefinition> {
    let mut out = Vec::new();
    collect_struct(
        &format!("{kind}Spec"),
        kind,
        &format!("defines the desired state of {kind}."),
        fields,
        &mut out,
    );
    out
}

fn collect_struct(
    name: &str,
    prefix: &str,
    doc: &str,
    fields: &[Field],
    out: &mut Vec<TypeDefinition>,
) {
    let index = out.len();
    out.push(TypeDefinition {
        name: name.to_string(),
        doc: doc.to_string(),
        fields: Vec::new(),
    });

    let mut defs = Vec::with_capacity(fields.len());
    for field in fields {
        let go_name = to_upper_camel(&field.name);
        let ty = match field.kind {
            FieldKind::String => "string".to_string(),
            FieldKind::Int => "int".to_string(),
            FieldKind::Bool => "bool".to_string(),
            FieldKind::Map => "map[string]string".to_string(),
            FieldKind::Object => {
                let nested = format!("{prefix}{go_name}");
                collect_struct(
                    &nested,
                    &nested,
                    &format!("is the {} section of {prefix}.", field.name),
                    &field.fields,
                    out,
                );
                nested
            }
        };
        defs.push(FieldDef {
            name: go_name,
            ty,
            json_tag: json_tag(field),
            comments: field_comments(field),
        });
    }
    out[index].fields = defs;
}

fn json_tag(field: &Field) -> String {
    if field.required {
        field.name.clone()
    } else {
        format!("{},omitempty", field.name)
    }
}

fn field_comments(field: &Field) -> Vec<String> {
    let mut comments: Vec<String> = field
        .description
        .iter()
        .flat_map(|d| d.lines())
        .map(|l| l.trim_end().to_string())
        .collect();
    comments.push(if field.required {
        "+kubebuilder:validation:Required".to_string()
    } else {
        "+kubebuilder:validation:Optional".to_string()
    });
    if let Some(default) = field.default.as_ref().filter(|d| !is_empty_container(d)) {
        comments.push(format!("+kubebuilder:default={default}"));
    }
    comments
}

fn is_empty_container(value: &Value) -> bool {
    value.as_object().map(Map::is_empty).unwrap_or(false)
}

/// OpenAPI v3 schema of the whole custom resource.
pub fn openapi_schema(fields: &[Field]) -> Value {
    json!({
        "type": "object",
        "properties": {
            "apiVersion": { "type": "string" },
            "kind": { "type": "string" },
            "metadata": { "type": "object" },
            "spec": object_schema(fields),
            "status": {
                "type": "object",
                "x-kubernetes-preserve-unknown-fields": true,
            },
        },
    })
}

fn object_schema(fields: &[Field]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.clone(), field_schema(field));
        if field.required {
            required.push(Value::String(field.name.clone()));
        }
    }
    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    schema
}

fn field_schema(field: &Field) -> Value {
    let mut schema = match field.kind {
        FieldKind::String => json!({ "type": "string" }),
        FieldKind::Int => json!({ "type": "integer" }),
        FieldKind::Bool => json!({ "type": "boolean" }),
        FieldKind::Map => json!({
            "type": "object",
            "additionalProperties": { "type": "string" },
        }),
        FieldKind::Object => object_schema(&field.fields),
    };
    if let Some(description) = &field.description {
        schema["description"] = Value::String(description.clone());
    }
    if let Some(default) = field.default.as_ref().filter(|d| !is_empty_container(d)) {
        schema["default"] = default.clone();
    }
    schema
}

/// Example `spec` for a sample custom resource.
///
/// Uses each field's default; required fields without one get a zero value.
pub fn sample_spec(fields: &[Field]) -> Value {
    let mut spec = Map::new();
    for field in fields {
        let value = match (&field.default, field.kind) {
            (Some(default), _) => default.clone(),
            (None, FieldKind::Object) => sample_spec(&field.fields),
            (None, FieldKind::String) => Value::String(String::new()),
            (None, FieldKind::Int) => json!(0),
            (None, FieldKind::Bool) => Value::Bool(false),
            (None, FieldKind::Map) => json!({}),
        };
        spec.insert(field.name.clone(), value);
    }
    Value::Object(spec)
}

/// Serialise `value` as block YAML, every line indented by `indent` spaces,
/// without a trailing newline.
pub fn yaml_block(value: &Value, indent: usize) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(value)?;
    let pad = " ".repeat(indent);
    Ok(yaml
        .lines()
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n"))
}
