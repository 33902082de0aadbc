use serde::{Deserialize, Serialize};

use crate::constraints::FieldConstraints;

/// Top-level model graph handed over by the schema discoverer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelGraph {
    /// Contract version for this graph format.
    pub schema_version: String,
    /// Models in discovery order.
    pub models: Vec<ModelDecl>,
}

impl ModelGraph {
    pub fn new(models: Vec<ModelDecl>) -> Self {
        Self {
            schema_version: crate::SCHEMA_VERSION.to_string(),
            models,
        }
    }

    /// Look up a model by id.
    pub fn model(&self, id: &str) -> Option<&ModelDecl> {
        self.models.iter().find(|model| model.id == id)
    }
}

/// A single model declaration with its fields in declaration order.
///
/// Field order is a determinism invariant: generation walks fields
/// exactly in this order, never in hash order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDecl {
    pub id: String,
    pub fields: Vec<FieldDecl>,
}

/// One field of a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default)]
    pub constraints: FieldConstraints,
    /// Whether `null`/absence is a legal value for this field.
    #[serde(default)]
    pub nullable: bool,
    /// Schema-declared default, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl FieldDecl {
    pub fn new(name: &str, ty: FieldType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            constraints: FieldConstraints::default(),
            nullable: false,
            default: None,
        }
    }

    pub fn with_constraints(mut self, constraints: FieldConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Closed set of logical field types.
///
/// Dynamic annotations from the source schema are normalized into
/// these tags by the discoverer; anything it cannot classify arrives
/// as `Unknown` and is handled through mapping errors or fallback,
/// never through open-ended runtime inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    String,
    Int,
    Float,
    Decimal,
    Bool,
    Date,
    Time,
    DateTime,
    Uuid,
    Email,
    Url,
    /// Closed set of string members.
    Enum { members: Vec<String> },
    /// A single fixed value.
    Literal { value: serde_json::Value },
    /// One of several member types.
    Union { members: Vec<FieldType> },
    List { item: Box<FieldType> },
    Map {
        key: Box<FieldType>,
        value: Box<FieldType>,
    },
    /// Reference to another model in the graph.
    Model { id: String },
    Unknown,
}

impl FieldType {
    /// Stable identifier used for provider lookup and audit output.
    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::DateTime => "datetime",
            FieldType::Uuid => "uuid",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Enum { .. } => "enum",
            FieldType::Literal { .. } => "literal",
            FieldType::Union { .. } => "union",
            FieldType::List { .. } => "list",
            FieldType::Map { .. } => "map",
            FieldType::Model { .. } => "model",
            FieldType::Unknown => "unknown",
        }
    }

    /// True for scalar leaf types that resolve straight to a provider.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            FieldType::Enum { .. }
                | FieldType::Literal { .. }
                | FieldType::Union { .. }
                | FieldType::List { .. }
                | FieldType::Map { .. }
                | FieldType::Model { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_serde_uses_kind_tag() {
        let ty = FieldType::Model {
            id: "app.User".to_string(),
        };
        let json = serde_json::to_value(&ty).expect("serialize");
        assert_eq!(json["kind"], "model");
        assert_eq!(json["id"], "app.User");

        let back: FieldType = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, ty);
    }

    #[test]
    fn graph_lookup_finds_models_by_id() {
        let graph = ModelGraph::new(vec![ModelDecl {
            id: "app.User".to_string(),
            fields: vec![FieldDecl::new("id", FieldType::Int)],
        }]);
        assert!(graph.model("app.User").is_some());
        assert!(graph.model("app.Order").is_none());
    }
}
