use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type TypeId = String;
pub type FieldId = String;
pub type DataSourceId = String;
pub type PageId = String;

/// Transient in-memory handle for a component in the host document tree.
pub type ComponentId = String;

/// Stable component identifier that survives serialization/reload.
pub type PersistentId = String;

/// Type id of the sentinel used when resolution cannot name a real type.
pub const UNKNOWN_TYPE_ID: &str = "unknown";

/// Declared shape of a type or field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Scalar,
    Object,
    List,
}

/// A schema type exposed by a data source, or one of the built-in scalars.
///
/// Invariant: a non-built-in type always carries the id of the data source
/// that defined it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    pub id: TypeId,
    pub label: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<DataSourceId>,
}

impl Type {
    pub fn scalar(id: impl Into<TypeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: TypeKind::Scalar,
            fields: Vec::new(),
            data_source_id: None,
        }
    }
}

/// A named argument accepted by a field (rendered into query syntax by the
/// connector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldArgument {
    pub name: String,
    pub type_id: TypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

/// The resolved, type-annotated result of evaluating a token against its
/// predecessor. Distinct from a schema [`Type`].
///
/// `type_ids` is plural: a field's declared type may be satisfiable by more
/// than one schema type, and resolution considers all candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: FieldId,
    pub label: String,
    #[serde(default)]
    pub type_ids: Vec<TypeId>,
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<DataSourceId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<FieldArgument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_index: Option<usize>,
}

impl Field {
    /// Sentinel substituted when a type or field lookup fails during the
    /// tolerant resolution path.
    pub fn unknown() -> Self {
        Self {
            id: UNKNOWN_TYPE_ID.to_string(),
            label: "Unknown".to_string(),
            type_ids: vec![UNKNOWN_TYPE_ID.to_string()],
            kind: TypeKind::Scalar,
            data_source_id: None,
            arguments: Vec::new(),
            preview_index: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_TYPE_ID
    }
}

/// The built-in scalar types available without any connected data source.
pub fn builtin_scalars() -> Vec<Type> {
    vec![
        Type::scalar("string", "String"),
        Type::scalar("number", "Number"),
        Type::scalar("boolean", "Boolean"),
        Type::scalar("date", "Date"),
        Type::scalar(UNKNOWN_TYPE_ID, "Unknown"),
    ]
}

pub fn is_builtin_type(id: &str) -> bool {
    matches!(id, "string" | "number" | "boolean" | "date" | "unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scalars_have_no_data_source() {
        for ty in builtin_scalars() {
            assert!(ty.data_source_id.is_none());
            assert_eq!(ty.kind, TypeKind::Scalar);
            assert!(is_builtin_type(&ty.id));
        }
    }

    #[test]
    fn test_unknown_field_sentinel() {
        let field = Field::unknown();
        assert!(field.is_unknown());
        assert_eq!(field.type_ids, vec![UNKNOWN_TYPE_ID.to_string()]);
    }

    #[test]
    fn test_type_kind_serde_lowercase() {
        assert_eq!(
            serde_json::to_value(TypeKind::List).unwrap(),
            serde_json::json!("list")
        );
    }
}
