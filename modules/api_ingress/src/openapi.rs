//! Renders the collected operations and component schemas as an OpenAPI 3.0
//! document.

use std::collections::BTreeMap;

use modkit::api::{OperationSpec, ParamLocation, ResponseBody};
use serde_json::{json, Map, Value};
use utoipa::openapi::{schema::Schema, RefOr};

pub type Components = BTreeMap<String, RefOr<Schema>>;

const JSON: &str = "application/json";
const PROBLEM_JSON: &str = "application/problem+json";

#[derive(serde::Serialize)]
pub struct Document {
    openapi: &'static str,
    info: Value,
    paths: BTreeMap<String, Map<String, Value>>,
    components: Value,
}

fn reference(components: &Components, name: Option<&str>) -> Value {
    match name {
        Some(n) if components.contains_key(n) => json!({ "$ref": format!("#/components/schemas/{n}") }),
        _ => json!({ "type": "object" }),
    }
}

fn media(content_type: &str, schema: Value) -> Value {
    let mut content = Map::new();
    content.insert(content_type.to_string(), json!({ "schema": schema }));
    Value::Object(content)
}

fn response(body: &ResponseBody, components: &Components) -> Option<Value> {
    match body {
        ResponseBody::Empty => None,
        ResponseBody::Json { schema, array } => {
            let item = reference(components, schema.as_deref());
            let schema = if *array { json!({ "type": "array", "items": item }) } else { item };
            Some(media(JSON, schema))
        }
        ResponseBody::Problem { schema } => {
            Some(media(PROBLEM_JSON, reference(components, Some(schema))))
        }
    }
}

fn operation(spec: &OperationSpec, components: &Components) -> Value {
    let doc = &spec.doc;
    let mut op = Map::new();
    op.insert(
        "operationId".into(),
        json!(doc.id.as_deref().unwrap_or(&spec.handler_id)),
    );
    if let Some(s) = &doc.summary {
        op.insert("summary".into(), json!(s));
    }
    if let Some(d) = &doc.description {
        op.insert("description".into(), json!(d));
    }
    if !doc.tags.is_empty() {
        op.insert("tags".into(), json!(doc.tags));
    }

    let params: Vec<Value> = spec
        .params
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "in": match p.location {
                    ParamLocation::Path => "path",
                    ParamLocation::Query => "query",
                },
                "required": p.required,
                "description": p.description,
                "schema": { "type": p.kind.json_type() },
            })
        })
        .collect();
    if !params.is_empty() {
        op.insert("parameters".into(), Value::Array(params));
    }

    if let Some(body) = &spec.body {
        op.insert(
            "requestBody".into(),
            json!({
                "required": true,
                "description": body.description,
                "content": media(JSON, reference(components, Some(&body.schema))),
            }),
        );
    }

    let responses: Map<String, Value> = spec
        .responses
        .iter()
        .map(|r| {
            let mut obj = json!({ "description": r.description });
            if let Some(content) = response(&r.body, components) {
                obj["content"] = content;
            }
            (r.status.to_string(), obj)
        })
        .collect();
    op.insert("responses".into(), Value::Object(responses));

    Value::Object(op)
}

/// One path item per route, keyed by lowercase method.
pub fn build_document<'a>(
    specs: impl IntoIterator<Item = &'a OperationSpec>,
    components: &Components,
) -> anyhow::Result<Document> {
    let mut paths: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    for spec in specs {
        paths
            .entry(spec.path.clone())
            .or_default()
            .insert(spec.method.as_str().to_lowercase(), operation(spec, components));
    }

    let mut schemas = Map::new();
    for (name, schema) in components {
        schemas.insert(name.clone(), serde_json::to_value(schema)?);
    }
    tracing::info!(paths = paths.len(), schemas = schemas.len(), "Built OpenAPI document");

    Ok(Document {
        openapi: "3.0.3",
        info: json!({
            "title": "ImobPrime API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Real estate registry",
        }),
        paths,
        components: json!({ "schemas": schemas }),
    })
}
