use crate::types::{DataSourceId, FieldId, PersistentId, TypeId, TypeKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reserved field id marking a fixed/literal property token. Its
/// `options["value"]` holds the user-typed constant, and type resolution
/// short-circuits to a built-in `string` field regardless of chain position.
pub const FIXED_VALUE_FIELD_ID: &str = "__fixed_value__";

/// Option values attached to tokens (filter arguments, field arguments,
/// literal values). `BTreeMap` keeps iteration deterministic for signature
/// building and query rendering.
pub type OptionMap = BTreeMap<String, Value>;

/// What a property token points at: a root type or a field of the previous
/// step's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyTarget {
    Type,
    Field,
}

/// A schema-bound step of an expression.
///
/// Tokens carry enough information to be resolved standalone: they are
/// persisted as plain data and later rehydrated against the live registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyToken {
    #[serde(rename = "propType")]
    pub prop_target: PropertyTarget,
    pub field_id: FieldId,
    #[serde(default)]
    pub type_ids: Vec<TypeId>,
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<DataSourceId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: OptionMap,
    /// Transient per-row loop index. Request-scoped state, never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_index: Option<usize>,
}

impl PropertyToken {
    pub fn is_fixed(&self) -> bool {
        self.field_id == FIXED_VALUE_FIELD_ID
    }

    /// The stored literal of a fixed-value token.
    pub fn fixed_value(&self) -> Option<&Value> {
        if self.is_fixed() {
            self.options.get("value")
        } else {
            None
        }
    }

    /// Joined type-id signature used when matching tree fragments.
    pub fn type_signature(&self) -> String {
        self.type_ids.join(",")
    }
}

/// Stored form of a filter application. Only `id` and `options` persist; the
/// behavior is rehydrated by looking the id up in the live filter registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterToken {
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: OptionMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_index: Option<usize>,
}

/// A back-reference to state declared on an ancestor (or the same)
/// component, addressed by the component's persistent id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateToken {
    pub stored_state_id: String,
    /// Persistent id of the owning component, not a transient handle.
    pub component_id: PersistentId,
    pub exposed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_kind: Option<TypeKind>,
}

/// One step of an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Token {
    Property(PropertyToken),
    Filter(FilterToken),
    State(StateToken),
}

impl Token {
    pub fn preview_index(&self) -> Option<usize> {
        match self {
            Token::Property(t) => t.preview_index,
            Token::Filter(t) => t.preview_index,
            Token::State(t) => t.preview_index,
        }
    }

    pub fn set_preview_index(&mut self, index: Option<usize>) {
        match self {
            Token::Property(t) => t.preview_index = index,
            Token::Filter(t) => t.preview_index = index,
            Token::State(t) => t.preview_index = index,
        }
    }
}

/// An ordered sequence of tokens describing how to derive a value or a query
/// selection. The type of token `i` depends on the resolved type of tokens
/// `0..i-1`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression(pub Vec<Token>);

impl Expression {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }

    /// Parse a loose JSON value as an expression. A value is a valid
    /// expression iff it is an array of well-formed tokens; anything else is
    /// an ordinary static value, not an error.
    pub fn parse(value: &Value) -> Option<Self> {
        if !value.is_array() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.0.iter()
    }
}

impl From<Vec<Token>> for Expression {
    fn from(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }
}

impl IntoIterator for Expression {
    type Item = Token;
    type IntoIter = std::vec::IntoIter<Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn property_json() -> Value {
        json!({
            "type": "property",
            "propType": "field",
            "fieldId": "name",
            "typeIds": ["string"],
            "kind": "scalar",
            "dataSourceId": "store"
        })
    }

    #[test]
    fn test_parse_valid_expression() {
        let value = json!([property_json()]);
        let expr = Expression::parse(&value).expect("should parse");
        assert_eq!(expr.len(), 1);
        match &expr.tokens()[0] {
            Token::Property(p) => {
                assert_eq!(p.field_id, "name");
                assert_eq!(p.prop_target, PropertyTarget::Field);
                assert_eq!(p.data_source_id.as_deref(), Some("store"));
            }
            other => panic!("expected property token, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_static_string_is_not_expression() {
        assert!(Expression::parse(&json!("just text")).is_none());
        assert!(Expression::parse(&json!({"type": "property"})).is_none());
        assert!(Expression::parse(&json!([{"no": "tag"}])).is_none());
    }

    #[test]
    fn test_parse_empty_array_is_empty_expression() {
        let expr = Expression::parse(&json!([])).expect("empty array parses");
        assert!(expr.is_empty());
    }

    #[test]
    fn test_filter_token_round_trip() {
        let value = json!([{
            "type": "filter",
            "id": "where",
            "options": {"key": "category", "value": "books"}
        }]);
        let expr = Expression::parse(&value).unwrap();
        let encoded = serde_json::to_value(&expr).unwrap();
        assert_eq!(encoded, value);
    }

    #[test]
    fn test_state_token_parses() {
        let value = json!([{
            "type": "state",
            "storedStateId": "row",
            "componentId": "persistent-42",
            "exposed": true,
            "forceKind": "list"
        }]);
        let expr = Expression::parse(&value).unwrap();
        match &expr.tokens()[0] {
            Token::State(s) => {
                assert_eq!(s.stored_state_id, "row");
                assert_eq!(s.force_kind, Some(TypeKind::List));
            }
            other => panic!("expected state token, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_value_token() {
        let token = PropertyToken {
            prop_target: PropertyTarget::Field,
            field_id: FIXED_VALUE_FIELD_ID.to_string(),
            type_ids: vec!["string".to_string()],
            kind: TypeKind::Scalar,
            data_source_id: None,
            options: OptionMap::from([("value".to_string(), json!("hello"))]),
            preview_index: None,
        };
        assert!(token.is_fixed());
        assert_eq!(token.fixed_value(), Some(&json!("hello")));
    }

    #[test]
    fn test_preview_index_not_serialized_when_absent() {
        let expr = Expression::parse(&json!([property_json()])).unwrap();
        let encoded = serde_json::to_value(&expr).unwrap();
        assert!(encoded[0].get("previewIndex").is_none());
    }
}
