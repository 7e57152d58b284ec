//! The normalized, parser-agnostic representation of one API version.
//!
//! A [`Specification`] is built once (through [`SpecificationBuilder`]) and only read afterwards.
//! Schemas are stored in an arena owned by the specification; nodes refer to each other through
//! [`SchemaId`] indices, and named component schemas are reached through [`SchemaKind::Ref`],
//! which keeps self- and mutually-referential schemas representable without nested ownership.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

//==============================================================================
// Operations
//==============================================================================

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Parse a method from its (case-insensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "put" => Some(HttpMethod::Put),
            "post" => Some(HttpMethod::Post),
            "delete" => Some(HttpMethod::Delete),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "patch" => Some(HttpMethod::Patch),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The stable join key used to correlate operations across two specifications.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationKey {
    pub path: String,
    pub method: HttpMethod,
}

impl OperationKey {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A single operation (path + method) of the API.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Operation {
    pub key: OperationKey,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip)]
    pub description: Option<String>,
}

impl Operation {
    pub fn new(key: OperationKey) -> Self {
        Self {
            key,
            parameters: Vec::new(),
            responses: BTreeMap::new(),
            deprecated: false,
            description: None,
        }
    }

    /// Find a parameter by its identity within the operation.
    pub fn parameter(&self, name: &str, location: ParameterLocation) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }

    /// The request body, modelled as the parameter located in `body`.
    pub fn request_body(&self) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.location == ParameterLocation::Body)
    }
}

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            "body" | "formData" => Some(ParameterLocation::Body),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaId>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Response {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaId>,
}

//==============================================================================
// Schemas
//==============================================================================

/// Index of a schema node in the owning specification's arena.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct SchemaId(pub usize);

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Boolean => "boolean",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" | "file" => Some(PrimitiveType::String),
            "number" => Some(PrimitiveType::Number),
            "integer" => Some(PrimitiveType::Integer),
            "boolean" => Some(PrimitiveType::Boolean),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Primitive(PrimitiveType),
    Object {
        properties: BTreeMap<String, SchemaId>,
        required: BTreeSet<String>,
    },
    Array(SchemaId),
    /// Reference to a named schema, resolved through [`Specification::named_schema`].
    Ref(String),
    /// Unconstrained, or a composition this model does not break down.
    Any,
}

impl SchemaKind {
    /// Short human-readable name of the kind, used in messages.
    pub fn type_name(&self) -> &str {
        match self {
            SchemaKind::Primitive(p) => p.as_str(),
            SchemaKind::Object { .. } => "object",
            SchemaKind::Array(_) => "array",
            SchemaKind::Ref(name) => name,
            SchemaKind::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    /// Allowed values as JSON literals (e.g. `"\"ACTIVE\""`, `"3"`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip)]
    pub description: Option<String>,
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            enum_values: Vec::new(),
            nullable: false,
            format: None,
            description: None,
        }
    }

    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self::new(SchemaKind::Primitive(primitive))
    }

    pub fn properties(&self) -> Option<&BTreeMap<String, SchemaId>> {
        match &self.kind {
            SchemaKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    pub fn required_fields(&self) -> Option<&BTreeSet<String>> {
        match &self.kind {
            SchemaKind::Object { required, .. } => Some(required),
            _ => None,
        }
    }
}

//==============================================================================
// Specification
//==============================================================================

/// One API version: operations plus the schema arena they point into.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Specification {
    #[serde(serialize_with = "serialize_operations")]
    operations: BTreeMap<OperationKey, Operation>,
    schemas: Vec<Schema>,
    named_schemas: BTreeMap<String, SchemaId>,
}

impl Specification {
    pub fn builder() -> SpecificationBuilder {
        SpecificationBuilder::default()
    }

    /// Operations in key order (path, then method).
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    pub fn operation(&self, key: &OperationKey) -> Option<&Operation> {
        self.operations.get(key)
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn schema(&self, id: SchemaId) -> Option<&Schema> {
        self.schemas.get(id.0)
    }

    pub fn named_schema(&self, name: &str) -> Option<SchemaId> {
        self.named_schemas.get(name).copied()
    }

    /// Follow `Ref` nodes until a concrete schema is reached.
    ///
    /// Returns `None` for a dangling reference or a cycle made only of references.
    pub fn resolve(&self, id: SchemaId) -> Option<(SchemaId, &Schema)> {
        let mut current = id;
        let mut seen = HashSet::new();
        loop {
            if !seen.insert(current) {
                return None;
            }
            let schema = self.schema(current)?;
            match &schema.kind {
                SchemaKind::Ref(name) => current = self.named_schema(name)?,
                _ => return Some((current, schema)),
            }
        }
    }

    /// Operations present in both specifications, in key order of `self`.
    pub fn shared_operations<'a>(
        &'a self,
        other: &'a Specification,
    ) -> impl Iterator<Item = (&'a Operation, &'a Operation)> {
        self.operations
            .iter()
            .filter_map(move |(key, op)| other.operations.get(key).map(|o| (op, o)))
    }
}

// Operations carry their own key, and JSON map keys must be strings.
fn serialize_operations<S: Serializer>(
    operations: &BTreeMap<OperationKey, Operation>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(operations.values())
}

/// Error raised while assembling a [`Specification`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("duplicate operation {0}")]
    DuplicateOperation(OperationKey),
    #[error("duplicate named schema '{0}'")]
    DuplicateSchema(String),
}

/// Assembles an immutable [`Specification`].
#[derive(Debug, Default)]
pub struct SpecificationBuilder {
    spec: Specification,
}

impl SpecificationBuilder {
    /// Store a schema node in the arena and return its id.
    pub fn add_schema(&mut self, schema: Schema) -> SchemaId {
        let id = SchemaId(self.spec.schemas.len());
        self.spec.schemas.push(schema);
        id
    }

    /// Store a schema node and register it under a component name.
    pub fn add_named_schema(
        &mut self,
        name: impl Into<String>,
        schema: Schema,
    ) -> Result<SchemaId, BuildError> {
        let name = name.into();
        if self.spec.named_schemas.contains_key(&name) {
            return Err(BuildError::DuplicateSchema(name));
        }
        let id = self.add_schema(schema);
        self.spec.named_schemas.insert(name, id);
        Ok(id)
    }

    /// Register a name for an already stored node (used for forward references).
    pub fn name_schema(&mut self, name: impl Into<String>, id: SchemaId) -> Result<(), BuildError> {
        let name = name.into();
        if self.spec.named_schemas.contains_key(&name) {
            return Err(BuildError::DuplicateSchema(name));
        }
        self.spec.named_schemas.insert(name, id);
        Ok(())
    }

    /// Replace a node previously reserved with a placeholder.
    pub fn set_schema(&mut self, id: SchemaId, schema: Schema) {
        if let Some(slot) = self.spec.schemas.get_mut(id.0) {
            *slot = schema;
        }
    }

    pub fn add_operation(&mut self, operation: Operation) -> Result<(), BuildError> {
        if self.spec.operations.contains_key(&operation.key) {
            return Err(BuildError::DuplicateOperation(operation.key));
        }
        self.spec.operations.insert(operation.key.clone(), operation);
        Ok(())
    }

    pub fn build(self) -> Specification {
        self.spec
    }
}
