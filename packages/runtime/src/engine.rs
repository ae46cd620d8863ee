use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use weave_ast::{ComponentId, DataSourceId, Expression, PageId};
use weave_common::ListenerId;
use weave_datasource::{DataSource, DataSourceEvent};
use weave_document::DocumentHost;
use weave_expr::{evaluate, EvalContext, FilterCapability, FilterRegistry};
use weave_preview::{LoadOutcome, PreviewLoader};
use weave_query::QueryCompiler;
use weave_schema::TypeRegistry;

/// The engine context: single shared instance reachable by construction,
/// not by ambient globals. Create once at startup, pass to entry points,
/// and [`teardown`](Self::teardown) when the host shuts the document down.
pub struct BindingEngine {
    registry: Arc<Mutex<TypeRegistry>>,
    filters: FilterRegistry,
    sources: Vec<Arc<dyn DataSource>>,
    loader: PreviewLoader,
    subscriptions: Vec<(DataSourceId, ListenerId)>,
}

impl BindingEngine {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(TypeRegistry::new())),
            filters: FilterRegistry::new(),
            sources: Vec::new(),
            loader: PreviewLoader::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Register a connector. Ready/changed events refresh the registry's
    /// types for that source, so schema changes re-trigger cached type
    /// recomputation automatically.
    pub fn register_data_source(&mut self, source: Arc<dyn DataSource>) {
        if source.is_connected() {
            self.registry
                .lock()
                .expect("type registry lock poisoned")
                .set_source_types(source.id().to_string(), source.get_types());
        }

        let registry = Arc::clone(&self.registry);
        let event_source = Arc::clone(&source);
        let listener = source.events().on(Box::new(move |event| match event {
            DataSourceEvent::Ready | DataSourceEvent::Changed => {
                info!(data_source = event_source.id(), "refreshing schema types");
                registry
                    .lock()
                    .expect("type registry lock poisoned")
                    .set_source_types(event_source.id().to_string(), event_source.get_types());
            }
            DataSourceEvent::Error(message) => {
                warn!(data_source = event_source.id(), %message, "data source error");
            }
        }));

        self.subscriptions
            .push((source.id().to_string(), listener));
        self.sources.push(source);
    }

    pub fn register_filter(&mut self, filter: Arc<dyn FilterCapability>) {
        self.filters.register(filter);
    }

    /// Connect every registered source. Individual connection failures are
    /// reported and do not abort the others.
    pub async fn connect_all(&self) {
        for source in &self.sources {
            if let Err(err) = source.connect().await {
                warn!(data_source = source.id(), error = %err, "connect failed");
            }
        }
    }

    pub fn data_sources(&self) -> &[Arc<dyn DataSource>] {
        &self.sources
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn loader(&self) -> &PreviewLoader {
        &self.loader
    }

    /// Compile every page's expressions into per-data-source query strings.
    pub fn compile_queries(
        &self,
        host: &dyn DocumentHost,
        pages: &[(PageId, ComponentId)],
    ) -> Result<HashMap<PageId, HashMap<DataSourceId, String>>> {
        let registry = self.registry.lock().expect("type registry lock poisoned");
        let compiler = QueryCompiler::new(&registry, host);
        Ok(compiler.build_document_queries(pages, &self.sources)?)
    }

    /// Fetch preview data for one page's compiled queries.
    pub async fn load_preview(&self, queries: &HashMap<DataSourceId, String>) -> LoadOutcome {
        self.loader.load(queries, &self.sources).await
    }

    /// Evaluate an expression for a component against the current preview
    /// snapshot.
    pub fn evaluate(
        &self,
        host: &dyn DocumentHost,
        component: &ComponentId,
        expression: &Expression,
        resolve_preview_index: bool,
    ) -> Result<Option<Value>> {
        let snapshot = self.loader.snapshot();
        let ctx = EvalContext {
            host,
            filters: &self.filters,
            preview_data: &snapshot,
            component: component.clone(),
            resolve_preview_index,
        };
        Ok(evaluate(expression, &ctx, None)?)
    }

    /// Unsubscribe from every source and drop the connector handles.
    pub fn teardown(&mut self) {
        for (source_id, listener) in self.subscriptions.drain(..) {
            if let Some(source) = self.sources.iter().find(|s| s.id() == source_id) {
                source.events().off(listener);
            }
        }
        self.sources.clear();
    }
}

impl Default for BindingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BindingEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}
