//! Per-page, per-data-source query compilation.
//!
//! For each connected data source: filter the page's collected expressions
//! to that source, build and group-merge their trees, and let the
//! connector render its own query syntax. The merger never sees wire
//! syntax; turning an IR tree into a query string is the connector's job.

use crate::builder::{build_trees, TreeContext};
use crate::error::QueryResult;
use crate::merge::merge_tree_group;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use weave_ast::{ComponentId, DataSourceId, PageId, Token};
use weave_datasource::DataSource;
use weave_document::DocumentHost;
use weave_expr::{collect_expressions, resolve_state_tokens};
use weave_schema::TypeRegistry;

pub struct QueryCompiler<'a> {
    pub registry: &'a TypeRegistry,
    pub host: &'a dyn DocumentHost,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(registry: &'a TypeRegistry, host: &'a dyn DocumentHost) -> Self {
        Self { registry, host }
    }

    /// Compile one page's expressions into one query string per connected
    /// data source. Sources with no applicable expressions are absent from
    /// the result; disconnected sources are skipped with a diagnostic.
    pub fn build_page_query(
        &self,
        page_root: &ComponentId,
        sources: &[Arc<dyn DataSource>],
    ) -> QueryResult<HashMap<DataSourceId, String>> {
        let collected = collect_expressions(self.host, page_root);
        let mut queries = HashMap::new();

        for source in sources {
            if !source.is_connected() {
                warn!(data_source = source.id(), "skipping disconnected data source");
                continue;
            }
            let data_source_id = source.id();
            let ctx = TreeContext {
                registry: self.registry,
                host: self.host,
            };

            let mut trees = Vec::new();
            for item in &collected {
                // State bindings are flattened before building so every
                // tree fragment carries concrete schema references.
                let tokens =
                    resolve_state_tokens(&item.expression, self.host, &item.component)?;
                let Some(Token::Property(first)) = tokens.first() else {
                    continue;
                };
                if first.data_source_id.as_deref() != Some(data_source_id) {
                    continue;
                }
                trees.extend(build_trees(&tokens, &ctx, &item.component, data_source_id)?);
            }

            let merged = merge_tree_group(trees)?;
            if merged.is_empty() {
                debug!(data_source = data_source_id, "no applicable expressions");
                continue;
            }
            queries.insert(data_source_id.to_string(), source.get_query(&merged));
        }
        Ok(queries)
    }

    /// Per-page fan-out of [`Self::build_page_query`]; pages share no
    /// state.
    pub fn build_document_queries(
        &self,
        pages: &[(PageId, ComponentId)],
        sources: &[Arc<dyn DataSource>],
    ) -> QueryResult<HashMap<PageId, HashMap<DataSourceId, String>>> {
        let mut result = HashMap::new();
        for (page_id, root) in pages {
            result.insert(page_id.clone(), self.build_page_query(root, sources)?);
        }
        Ok(result)
    }
}
