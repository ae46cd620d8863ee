use futures_util::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use weave_ast::DataSourceId;
use weave_common::EventEmitter;
use weave_datasource::DataSource;

/// Events surfaced around a preview load.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewEvent {
    LoadStart,
    /// The load finished and its payload is now the shared snapshot.
    LoadEnd(HashMap<DataSourceId, Value>),
    /// A newer load superseded this one; its results were discarded.
    LoadCancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Completed(HashMap<DataSourceId, Value>),
    /// A newer load started before this one settled.
    Interrupted,
}

/// Fetches preview values for compiled queries, one concurrent fetch per
/// data source, with generation-counter cancellation of stale loads.
///
/// The snapshot is replaced wholesale per load, never partially merged
/// mid-flight; the evaluator only ever reads it.
pub struct PreviewLoader {
    generation: AtomicU64,
    data: Mutex<HashMap<DataSourceId, Value>>,
    events: EventEmitter<PreviewEvent>,
}

impl PreviewLoader {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            data: Mutex::new(HashMap::new()),
            events: EventEmitter::new(),
        }
    }

    pub fn events(&self) -> &EventEmitter<PreviewEvent> {
        &self.events
    }

    /// Read-only copy of the current snapshot.
    pub fn snapshot(&self) -> HashMap<DataSourceId, Value> {
        self.data.lock().expect("preview store lock poisoned").clone()
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Fetch every query concurrently and commit the results, unless a
    /// newer load starts first.
    ///
    /// A single source's failure is reported per source and its
    /// contribution omitted; it never aborts the other fetches.
    pub async fn load(
        &self,
        queries: &HashMap<DataSourceId, String>,
        sources: &[Arc<dyn DataSource>],
    ) -> LoadOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(generation, "preview load started");
        self.events.emit(&PreviewEvent::LoadStart);
        self.data
            .lock()
            .expect("preview store lock poisoned")
            .clear();

        let mut fetches = Vec::new();
        for (data_source_id, query) in queries {
            let Some(source) = sources.iter().find(|s| s.id() == data_source_id) else {
                warn!(data_source = %data_source_id, "no registered source for query");
                continue;
            };
            let source = Arc::clone(source);
            let data_source_id = data_source_id.clone();
            let query = query.clone();
            fetches.push(async move {
                let result = source.fetch_values(&query).await;
                (data_source_id, result)
            });
        }
        let results = join_all(fetches).await;

        let mut payload = HashMap::new();
        for (data_source_id, result) in results {
            match result {
                Ok(values) => {
                    payload.insert(data_source_id, values);
                }
                Err(err) => {
                    warn!(data_source = %data_source_id, error = %err, "preview fetch failed");
                }
            }
        }

        // Commit under the store lock so a stale load can never overwrite a
        // newer one between the generation check and the write.
        {
            let mut store = self.data.lock().expect("preview store lock poisoned");
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!(generation, "preview load superseded, discarding results");
                drop(store);
                self.events.emit(&PreviewEvent::LoadCancelled);
                return LoadOutcome::Interrupted;
            }
            *store = payload.clone();
        }

        info!(generation, sources = payload.len(), "preview load finished");
        self.events.emit(&PreviewEvent::LoadEnd(payload.clone()));
        LoadOutcome::Completed(payload)
    }
}

impl Default for PreviewLoader {
    fn default() -> Self {
        Self::new()
    }
}
