//! End-to-end compilation tests: document expressions through tree
//! building, merging, and connector rendering.

use serde_json::json;
use std::sync::Arc;
use weave_ast::{
    Expression, Field, OptionMap, PropertyTarget, PropertyToken, StateToken, Token, Type,
    TypeKind,
};
use weave_datasource::{DataSource, FakeDataSource};
use weave_document::{InMemoryDocument, StateNamespace, StateRecord};
use weave_query::{QueryCompiler, QueryError};
use weave_schema::TypeRegistry;

fn schema_field(id: &str, type_ids: &[&str], kind: TypeKind) -> Field {
    Field {
        id: id.to_string(),
        label: id.to_string(),
        type_ids: type_ids.iter().map(|s| s.to_string()).collect(),
        kind,
        data_source_id: Some("store".to_string()),
        arguments: Vec::new(),
        preview_index: None,
    }
}

fn store_types() -> Vec<Type> {
    vec![
        Type {
            id: "Item".to_string(),
            label: "Item".to_string(),
            kind: TypeKind::Object,
            fields: vec![
                schema_field("name", &["string"], TypeKind::Scalar),
                schema_field("price", &["number"], TypeKind::Scalar),
                schema_field("category", &["Category"], TypeKind::Object),
            ],
            data_source_id: Some("store".to_string()),
        },
        Type {
            id: "Category".to_string(),
            label: "Category".to_string(),
            kind: TypeKind::Object,
            fields: vec![schema_field("title", &["string"], TypeKind::Scalar)],
            data_source_id: Some("store".to_string()),
        },
    ]
}

fn queryables() -> Vec<Field> {
    vec![schema_field("items", &["Item"], TypeKind::List)]
}

fn property(field_id: &str, type_ids: &[&str], kind: TypeKind) -> Token {
    property_with_options(field_id, type_ids, kind, &[])
}

fn property_with_options(
    field_id: &str,
    type_ids: &[&str],
    kind: TypeKind,
    options: &[(&str, serde_json::Value)],
) -> Token {
    Token::Property(PropertyToken {
        prop_target: PropertyTarget::Field,
        field_id: field_id.to_string(),
        type_ids: type_ids.iter().map(|s| s.to_string()).collect(),
        kind,
        data_source_id: Some("store".to_string()),
        options: options
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        preview_index: None,
    })
}

fn registry_for(sources: &[&FakeDataSource]) -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    for source in sources {
        registry.set_source_types(source.id().to_string(), source.get_types());
    }
    registry
}

#[tokio::test]
async fn test_page_query_merges_expressions_into_one_query() {
    let store = Arc::new(
        FakeDataSource::new("store", store_types(), queryables()).with_values(json!({})),
    );
    store.connect().await.unwrap();

    let mut doc = InMemoryDocument::new();
    let root = doc.add_page("home", "p-root");
    let list = doc.add_child(&root, "p-list").unwrap();
    let card = doc.add_child(&list, "p-card").unwrap();

    // The list binds its rows once...
    doc.set_state(
        &root,
        StateNamespace::Exposed,
        "rows",
        StateRecord {
            label: "Rows".to_string(),
            expression: Expression::new(vec![property("items", &["Item"], TypeKind::List)]),
        },
    )
    .unwrap();
    // ...the card reads a column through the state binding...
    doc.set_attribute(
        &list,
        "text",
        serde_json::to_value(Expression::new(vec![
            Token::State(StateToken {
                stored_state_id: "rows".to_string(),
                component_id: "p-root".to_string(),
                exposed: true,
                preview_index: None,
                force_kind: None,
            }),
            property("name", &["string"], TypeKind::Scalar),
        ]))
        .unwrap(),
    )
    .unwrap();
    // ...and another binding reaches deeper into the same root field.
    doc.set_attribute(
        &card,
        "label",
        serde_json::to_value(Expression::new(vec![
            property("items", &["Item"], TypeKind::List),
            property("category", &["Category"], TypeKind::Object),
            property("title", &["string"], TypeKind::Scalar),
        ]))
        .unwrap(),
    )
    .unwrap();

    let registry = registry_for(&[&store]);
    let compiler = QueryCompiler::new(&registry, &doc);
    let sources: Vec<Arc<dyn DataSource>> = vec![store.clone()];

    let queries = compiler.build_page_query(&root, &sources).unwrap();
    assert_eq!(
        queries.get("store").map(String::as_str),
        Some("query {\n  items {\n    name\n    category {\n      title\n    }\n  }\n}")
    );
}

#[tokio::test]
async fn test_disconnected_source_is_skipped() {
    let store = Arc::new(FakeDataSource::new("store", store_types(), queryables()));
    // never connected

    let mut doc = InMemoryDocument::new();
    let root = doc.add_page("home", "p-root");
    doc.set_attribute(
        &root,
        "text",
        serde_json::to_value(Expression::new(vec![property(
            "items",
            &["Item"],
            TypeKind::List,
        )]))
        .unwrap(),
    )
    .unwrap();

    let registry = registry_for(&[&store]);
    let compiler = QueryCompiler::new(&registry, &doc);
    let sources: Vec<Arc<dyn DataSource>> = vec![store];

    let queries = compiler.build_page_query(&root, &sources).unwrap();
    assert!(queries.is_empty());
}

#[tokio::test]
async fn test_expressions_for_other_sources_are_filtered_out() {
    let store = Arc::new(FakeDataSource::new("store", store_types(), queryables()));
    store.connect().await.unwrap();

    let mut doc = InMemoryDocument::new();
    let root = doc.add_page("home", "p-root");
    // Token targets a "cms" source that is not part of this compile.
    let token = PropertyToken {
        prop_target: PropertyTarget::Field,
        field_id: "posts".to_string(),
        type_ids: vec!["Post".to_string()],
        kind: TypeKind::List,
        data_source_id: Some("cms".to_string()),
        options: OptionMap::new(),
        preview_index: None,
    };
    doc.set_attribute(
        &root,
        "text",
        serde_json::to_value(Expression::new(vec![Token::Property(token)])).unwrap(),
    )
    .unwrap();

    let registry = registry_for(&[&store]);
    let compiler = QueryCompiler::new(&registry, &doc);
    let sources: Vec<Arc<dyn DataSource>> = vec![store];

    let queries = compiler.build_page_query(&root, &sources).unwrap();
    assert!(queries.is_empty());
}

#[tokio::test]
async fn test_conflicting_arguments_surface_as_error() {
    let store = Arc::new(FakeDataSource::new("store", store_types(), queryables()));
    store.connect().await.unwrap();

    let mut doc = InMemoryDocument::new();
    let root = doc.add_page("home", "p-root");
    doc.set_attribute(
        &root,
        "first",
        serde_json::to_value(Expression::new(vec![property_with_options(
            "items",
            &["Item"],
            TypeKind::List,
            &[("first", json!("10"))],
        )]))
        .unwrap(),
    )
    .unwrap();
    doc.set_attribute(
        &root,
        "second",
        serde_json::to_value(Expression::new(vec![property_with_options(
            "items",
            &["Item"],
            TypeKind::List,
            &[("first", json!("20"))],
        )]))
        .unwrap(),
    )
    .unwrap();

    let registry = registry_for(&[&store]);
    let compiler = QueryCompiler::new(&registry, &doc);
    let sources: Vec<Arc<dyn DataSource>> = vec![store];

    let err = compiler.build_page_query(&root, &sources).unwrap_err();
    assert!(matches!(err, QueryError::MergeConflict { .. }));
}

#[tokio::test]
async fn test_document_queries_fan_out_per_page() {
    let store = Arc::new(FakeDataSource::new("store", store_types(), queryables()));
    store.connect().await.unwrap();

    let mut doc = InMemoryDocument::new();
    let home = doc.add_page("home", "p-home");
    let _about = doc.add_page("about", "p-about");
    doc.set_attribute(
        &home,
        "text",
        serde_json::to_value(Expression::new(vec![
            property("items", &["Item"], TypeKind::List),
            property("name", &["string"], TypeKind::Scalar),
        ]))
        .unwrap(),
    )
    .unwrap();

    let registry = registry_for(&[&store]);
    let compiler = QueryCompiler::new(&registry, &doc);
    let sources: Vec<Arc<dyn DataSource>> = vec![store];

    let pages = doc.pages().to_vec();
    let queries = compiler.build_document_queries(&pages, &sources).unwrap();
    assert_eq!(queries.len(), 2);
    assert!(queries["home"].contains_key("store"));
    assert!(queries["about"].is_empty());
}
