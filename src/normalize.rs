//! Converts an already-parsed OpenAPI 3 / Swagger 2 document tree (`serde_json::Value`)
//! into the [`Specification`] model.

use crate::model::{
    BuildError, HttpMethod, Operation, OperationKey, Parameter, ParameterLocation, PrimitiveType,
    Response, Schema, SchemaId, SchemaKind, Specification, SpecificationBuilder,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Produces a [`Specification`] from a source document representation.
pub trait Transformer<S: ?Sized> {
    fn transform(&self, source: &S) -> Result<Specification, TransformError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("document root is not an object")]
    NotAnObject,
    #[error("document declares neither an 'openapi' nor a 'swagger' version")]
    UnknownFormat,
    #[error("unresolved reference '{0}'")]
    UnresolvedRef(String),
    #[error("invalid parameter in {operation}: {message}")]
    InvalidParameter { operation: String, message: String },
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Read a JSON or YAML document from disk. Files ending in `.json` are parsed as JSON,
/// everything else as YAML.
pub fn load_document(path: &Path) -> Result<Value, TransformError> {
    let content = std::fs::read_to_string(path).map_err(|source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| TransformError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Transformer for OpenAPI 3.x and Swagger 2.0 documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApiTransformer;

impl Transformer<Value> for OpenApiTransformer {
    fn transform(&self, source: &Value) -> Result<Specification, TransformError> {
        normalize_document(source)
    }
}

pub fn normalize_document(document: &Value) -> Result<Specification, TransformError> {
    let root = document.as_object().ok_or(TransformError::NotAnObject)?;
    if !root.contains_key("openapi") && !root.contains_key("swagger") {
        return Err(TransformError::UnknownFormat);
    }

    let mut normalizer = Normalizer {
        document,
        builder: Specification::builder(),
    };

    let named = document
        .pointer("/components/schemas")
        .or_else(|| document.pointer("/definitions"))
        .and_then(Value::as_object);
    for (name, schema) in named.into_iter().flatten() {
        let id = normalizer.normalize_schema(schema);
        normalizer.builder.name_schema(name.as_str(), id)?;
    }

    if let Some(paths) = root.get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            normalizer.normalize_path_item(path, item)?;
        }
    }

    Ok(normalizer.builder.build())
}

struct Normalizer<'d> {
    document: &'d Value,
    builder: SpecificationBuilder,
}

impl<'d> Normalizer<'d> {
    /// Follow a local `$ref` (`#/...`) if `value` is a reference object.
    fn deref(&self, value: &'d Value) -> Result<&'d Value, TransformError> {
        let mut current = value;
        // Chains longer than this are treated as reference cycles.
        for _ in 0..32 {
            let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
                return Ok(current);
            };
            current = reference
                .strip_prefix('#')
                .and_then(|pointer| self.document.pointer(pointer))
                .ok_or_else(|| TransformError::UnresolvedRef(reference.to_string()))?;
        }
        Err(TransformError::UnresolvedRef(
            value
                .get("$ref")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ))
    }

    fn normalize_path_item(&mut self, path: &str, item: &'d Value) -> Result<(), TransformError> {
        let item = self.deref(item)?;
        let Some(item) = item.as_object() else {
            return Ok(());
        };
        let shared_parameters = item.get("parameters");

        for (method_name, operation) in item {
            let Some(method) = HttpMethod::from_name(method_name) else {
                continue;
            };
            let op = self.normalize_operation(
                OperationKey::new(method, path),
                operation,
                shared_parameters,
            )?;
            self.builder.add_operation(op)?;
        }
        Ok(())
    }

    fn normalize_operation(
        &mut self,
        key: OperationKey,
        operation: &'d Value,
        shared_parameters: Option<&'d Value>,
    ) -> Result<Operation, TransformError> {
        let mut op = Operation::new(key);
        op.deprecated = operation
            .get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        op.description = operation
            .get("description")
            .or_else(|| operation.get("summary"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let declared = shared_parameters
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .chain(
                operation
                    .get("parameters")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten(),
            );
        for raw in declared {
            let parameter = self.normalize_parameter(&op.key, raw)?;
            // Operation-level declarations override path-level ones with the same identity.
            op.parameters
                .retain(|p| !(p.name == parameter.name && p.location == parameter.location));
            op.parameters.push(parameter);
        }

        if let Some(body) = operation.get("requestBody") {
            let body = self.deref(body)?;
            let schema = self.media_schema(body.get("content"))?;
            op.parameters.push(Parameter {
                name: "body".to_string(),
                location: ParameterLocation::Body,
                required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
                schema,
            });
        }

        if let Some(responses) = operation.get("responses").and_then(Value::as_object) {
            for (status, response) in responses {
                let response = self.deref(response)?;
                let schema = match response.get("schema") {
                    Some(schema) => Some(self.normalize_schema(schema)),
                    None => self.media_schema(response.get("content"))?,
                };
                op.responses.insert(
                    status.clone(),
                    Response {
                        status: status.clone(),
                        schema,
                    },
                );
            }
        }

        Ok(op)
    }

    fn normalize_parameter(
        &mut self,
        key: &OperationKey,
        raw: &'d Value,
    ) -> Result<Parameter, TransformError> {
        let raw = self.deref(raw)?;
        let invalid = |message: &str| TransformError::InvalidParameter {
            operation: key.to_string(),
            message: message.to_string(),
        };

        let name = raw
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing 'name'"))?;
        let location_name = raw
            .get("in")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing 'in'"))?;
        let location = ParameterLocation::from_name(location_name)
            .ok_or_else(|| invalid(&format!("unknown location '{location_name}'")))?;
        let required = location == ParameterLocation::Path
            || raw.get("required").and_then(Value::as_bool).unwrap_or(false);

        // Swagger 2 declares non-body parameter types inline on the parameter itself.
        let schema = match raw.get("schema") {
            Some(schema) => self.normalize_schema(schema),
            None => self.normalize_schema(raw),
        };

        Ok(Parameter {
            name: name.to_string(),
            location,
            required,
            schema: Some(schema),
        })
    }

    /// Schema of the preferred media type of an OpenAPI 3 `content` map.
    fn media_schema(
        &mut self,
        content: Option<&'d Value>,
    ) -> Result<Option<SchemaId>, TransformError> {
        let Some(content) = content.and_then(Value::as_object) else {
            return Ok(None);
        };
        let media = content
            .get("application/json")
            .or_else(|| {
                content
                    .iter()
                    .find(|(media_type, _)| media_type.contains("json"))
                    .map(|(_, media)| media)
            })
            .or_else(|| content.values().next());
        let Some(media) = media else {
            return Ok(None);
        };
        let media = self.deref(media)?;
        Ok(media.get("schema").map(|schema| self.normalize_schema(schema)))
    }

    fn normalize_schema(&mut self, value: &'d Value) -> SchemaId {
        let Some(object) = value.as_object() else {
            return self.builder.add_schema(Schema::new(SchemaKind::Any));
        };

        if let Some(reference) = object.get("$ref").and_then(Value::as_str) {
            return self
                .builder
                .add_schema(Schema::new(SchemaKind::Ref(schema_ref_name(reference))));
        }

        let all_of = object.get("allOf").and_then(Value::as_array);
        if let Some([single]) = all_of.map(Vec::as_slice) {
            return self.normalize_schema(single);
        }

        let (type_name, nullable_type) = declared_type(object);
        let kind = match all_of {
            Some(members) => self.normalize_all_of(object, members),
            None => self.normalize_kind(object, type_name),
        };

        let mut schema = Schema::new(kind);
        schema.enum_values = object
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(Value::to_string).collect())
            .unwrap_or_default();
        schema.nullable = nullable_type
            || ["nullable", "x-nullable"]
                .iter()
                .any(|key| object.get(*key).and_then(Value::as_bool).unwrap_or(false));
        schema.format = object
            .get("format")
            .and_then(Value::as_str)
            .map(str::to_string);
        schema.description = object
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.builder.add_schema(schema)
    }

    fn normalize_kind(
        &mut self,
        object: &'d Map<String, Value>,
        type_name: Option<&str>,
    ) -> SchemaKind {
        match type_name {
            Some("object") => self.normalize_object(object),
            Some("array") => self.normalize_array(object),
            Some(other) => PrimitiveType::from_name(other)
                .map(SchemaKind::Primitive)
                .unwrap_or(SchemaKind::Any),
            None if object.contains_key("properties") => self.normalize_object(object),
            None if object.contains_key("items") => self.normalize_array(object),
            None => SchemaKind::Any,
        }
    }

    fn normalize_object(&mut self, object: &'d Map<String, Value>) -> SchemaKind {
        let mut properties = BTreeMap::new();
        let mut required = BTreeSet::new();
        self.merge_object(object, &mut properties, &mut required);
        SchemaKind::Object {
            properties,
            required,
        }
    }

    fn merge_object(
        &mut self,
        object: &'d Map<String, Value>,
        properties: &mut BTreeMap<String, SchemaId>,
        required: &mut BTreeSet<String>,
    ) {
        for (name, property) in object
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
        {
            properties.insert(name.clone(), self.normalize_schema(property));
        }
        required.extend(
            object
                .get("required")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(str::to_string),
        );
    }

    /// Flattens an `allOf` composition into a single object whose properties and
    /// required names are the union over all members, `$ref` members included.
    /// Later members override earlier declarations of the same property.
    fn normalize_all_of(
        &mut self,
        object: &'d Map<String, Value>,
        members: &'d [Value],
    ) -> SchemaKind {
        let mut parts = Vec::new();
        self.collect_all_of(members, &mut Vec::new(), &mut parts);
        parts.push(object);

        if !parts.iter().any(|part| is_object_like(part)) {
            // e.g. `allOf: [{type: string}, {maxLength: 8}]`
            let typed = parts
                .iter()
                .copied()
                .find_map(|part| declared_type(part).0.map(|name| (part, name)));
            return match typed {
                Some((part, type_name)) => self.normalize_kind(part, Some(type_name)),
                None => SchemaKind::Any,
            };
        }

        let mut properties = BTreeMap::new();
        let mut required = BTreeSet::new();
        for part in parts {
            self.merge_object(part, &mut properties, &mut required);
        }
        SchemaKind::Object {
            properties,
            required,
        }
    }

    fn collect_all_of(
        &self,
        members: &'d [Value],
        visiting: &mut Vec<&'d str>,
        parts: &mut Vec<&'d Map<String, Value>>,
    ) {
        for member in members {
            let reference = member.get("$ref").and_then(Value::as_str);
            if reference.is_some_and(|reference| visiting.contains(&reference)) {
                continue;
            }
            // Unresolvable members contribute nothing.
            let Some(part) = self.deref(member).ok().and_then(Value::as_object) else {
                continue;
            };
            if let Some(nested) = part.get("allOf").and_then(Value::as_array) {
                visiting.extend(reference);
                self.collect_all_of(nested, visiting, parts);
                if reference.is_some() {
                    visiting.pop();
                }
            }
            parts.push(part);
        }
    }

    fn normalize_array(&mut self, object: &'d Map<String, Value>) -> SchemaKind {
        let items = match object.get("items") {
            Some(items) => self.normalize_schema(items),
            None => self.builder.add_schema(Schema::new(SchemaKind::Any)),
        };
        SchemaKind::Array(items)
    }
}

/// The `type` keyword, accepting the OpenAPI 3.1 list form (`["string", "null"]`).
fn declared_type(object: &Map<String, Value>) -> (Option<&str>, bool) {
    match object.get("type") {
        Some(Value::String(name)) => (Some(name.as_str()), false),
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            let nullable = names.contains(&"null");
            (names.into_iter().find(|name| *name != "null"), nullable)
        }
        _ => (None, false),
    }
}

fn is_object_like(object: &Map<String, Value>) -> bool {
    declared_type(object).0 == Some("object") || object.contains_key("properties")
}

/// Component name of a local schema reference; other references are kept verbatim.
fn schema_ref_name(reference: &str) -> String {
    ["#/components/schemas/", "#/definitions/"]
        .iter()
        .find_map(|prefix| reference.strip_prefix(prefix))
        .map(|name| name.replace("~1", "/").replace("~0", "~"))
        .unwrap_or_else(|| reference.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_openapi3_document() {
        let document = json!({
            "openapi": "3.0.1",
            "paths": {
                "/users/{id}": {
                    "parameters": [
                        { "name": "id", "in": "path", "schema": { "type": "string" } }
                    ],
                    "get": {
                        "parameters": [
                            { "$ref": "#/components/parameters/Verbose" }
                        ],
                        "responses": {
                            "200": {
                                "description": "ok",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/User" }
                                    }
                                }
                            },
                            "404": { "description": "missing" }
                        }
                    }
                }
            },
            "components": {
                "parameters": {
                    "Verbose": { "name": "verbose", "in": "query", "schema": { "type": "boolean" } }
                },
                "schemas": {
                    "User": {
                        "type": "object",
                        "required": ["id"],
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "role": { "type": "string", "enum": ["ADMIN", "USER"] },
                            "manager": { "$ref": "#/components/schemas/User" }
                        }
                    }
                }
            }
        });

        let spec = OpenApiTransformer.transform(&document).unwrap();
        let op = spec
            .operation(&OperationKey::new(HttpMethod::Get, "/users/{id}"))
            .unwrap();

        let names: Vec<&str> = op.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "verbose"]);
        assert!(op.parameter("id", ParameterLocation::Path).unwrap().required);
        assert!(!op.parameter("verbose", ParameterLocation::Query).unwrap().required);
        assert!(op.responses["404"].schema.is_none());

        let (_, user) = spec.resolve(op.responses["200"].schema.unwrap()).unwrap();
        let properties = user.properties().unwrap();
        assert_eq!(properties.len(), 3);
        let role = spec.schema(properties["role"]).unwrap();
        assert_eq!(role.enum_values, vec!["\"ADMIN\"", "\"USER\""]);
        let id = spec.schema(properties["id"]).unwrap();
        assert_eq!(id.format.as_deref(), Some("int64"));
    }

    #[test]
    fn test_swagger2_document() {
        let document = json!({
            "swagger": "2.0",
            "paths": {
                "/pets": {
                    "post": {
                        "parameters": [
                            { "name": "pet", "in": "body", "required": true,
                              "schema": { "$ref": "#/definitions/Pet" } },
                            { "name": "dryRun", "in": "query", "type": "boolean" }
                        ],
                        "responses": {
                            "201": { "description": "created", "schema": { "$ref": "#/definitions/Pet" } }
                        }
                    }
                }
            },
            "definitions": {
                "Pet": { "type": "object", "properties": { "name": { "type": "string", "x-nullable": true } } }
            }
        });

        let spec = OpenApiTransformer.transform(&document).unwrap();
        let op = spec
            .operation(&OperationKey::new(HttpMethod::Post, "/pets"))
            .unwrap();
        let body = op.request_body().unwrap();
        assert_eq!(body.name, "pet");
        assert!(body.required);

        let dry_run = op.parameter("dryRun", ParameterLocation::Query).unwrap();
        let (_, schema) = spec.resolve(dry_run.schema.unwrap()).unwrap();
        assert_eq!(schema.kind, SchemaKind::Primitive(PrimitiveType::Boolean));

        let (_, pet) = spec.resolve(op.responses["201"].schema.unwrap()).unwrap();
        let name = spec.schema(pet.properties().unwrap()["name"]).unwrap();
        assert!(name.nullable);
    }

    #[test]
    fn test_openapi31_nullable_type_list() {
        let document = json!({
            "openapi": "3.1.0",
            "components": { "schemas": { "Tag": { "type": ["string", "null"] } } }
        });
        let spec = OpenApiTransformer.transform(&document).unwrap();
        let (_, tag) = spec.resolve(spec.named_schema("Tag").unwrap()).unwrap();
        assert_eq!(tag.kind, SchemaKind::Primitive(PrimitiveType::String));
        assert!(tag.nullable);
    }

    #[test]
    fn test_all_of_members_are_merged() {
        let document = json!({
            "openapi": "3.0.3",
            "components": {
                "schemas": {
                    "Named": {
                        "type": "object",
                        "required": ["name"],
                        "properties": { "name": { "type": "string" } }
                    },
                    "Base": {
                        "allOf": [
                            { "$ref": "#/components/schemas/Named" },
                            { "$ref": "#/components/schemas/Base" },
                            { "properties": { "id": { "type": "integer" } } }
                        ]
                    },
                    "User": {
                        "description": "a user",
                        "required": ["email"],
                        "allOf": [
                            { "$ref": "#/components/schemas/Base" },
                            {
                                "type": "object",
                                "properties": {
                                    "email": { "type": "string" },
                                    "id": { "type": "string" }
                                }
                            }
                        ]
                    },
                    "Code": { "allOf": [ { "type": "string" }, { "maxLength": 8 } ] },
                    "Pet": { "oneOf": [ { "type": "string" }, { "type": "integer" } ] }
                }
            }
        });

        let spec = OpenApiTransformer.transform(&document).unwrap();
        let (_, user) = spec.resolve(spec.named_schema("User").unwrap()).unwrap();
        let SchemaKind::Object {
            properties,
            required,
        } = &user.kind
        else {
            panic!("allOf did not become an object: {:?}", user.kind);
        };
        assert_eq!(
            properties.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["email", "id", "name"]
        );
        assert_eq!(
            required.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["email", "name"]
        );
        assert_eq!(user.description.as_deref(), Some("a user"));
        // The inline member declared last wins over the base definition.
        let (_, id) = spec.resolve(properties["id"]).unwrap();
        assert_eq!(id.kind, SchemaKind::Primitive(PrimitiveType::String));

        let (_, code) = spec.resolve(spec.named_schema("Code").unwrap()).unwrap();
        assert_eq!(code.kind, SchemaKind::Primitive(PrimitiveType::String));
        let (_, pet) = spec.resolve(spec.named_schema("Pet").unwrap()).unwrap();
        assert_eq!(pet.kind, SchemaKind::Any);
    }

    #[test]
    fn test_rejects_unknown_documents() {
        assert!(matches!(
            OpenApiTransformer.transform(&json!([])),
            Err(TransformError::NotAnObject)
        ));
        assert!(matches!(
            OpenApiTransformer.transform(&json!({ "paths": {} })),
            Err(TransformError::UnknownFormat)
        ));
        let dangling = json!({
            "openapi": "3.0.0",
            "paths": { "/a": { "get": { "parameters": [ { "$ref": "#/components/parameters/Nope" } ] } } }
        });
        assert!(matches!(
            OpenApiTransformer.transform(&dangling),
            Err(TransformError::UnresolvedRef(_))
        ));
    }

    #[test]
    fn test_schema_ref_name() {
        assert_eq!(schema_ref_name("#/components/schemas/User"), "User");
        assert_eq!(schema_ref_name("#/definitions/a~1b"), "a/b");
        assert_eq!(schema_ref_name("other.yaml#/User"), "other.yaml#/User");
    }
}
