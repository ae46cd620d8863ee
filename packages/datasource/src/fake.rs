//! In-memory connector used by the integration suites: canned schema and
//! payloads, optional fetch delay and failure injection.

use crate::{graphql, DataSource, DataSourceError, DataSourceEvent, DataSourceResult};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use weave_ast::{DataSourceId, Field, QueryTree, Type};
use weave_common::EventEmitter;

pub struct FakeDataSource {
    id: DataSourceId,
    types: Vec<Type>,
    queryables: Vec<Field>,
    values: Value,
    connected: AtomicBool,
    fail_fetch: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    queries_seen: Mutex<Vec<String>>,
    events: EventEmitter<DataSourceEvent>,
}

impl FakeDataSource {
    pub fn new(id: impl Into<DataSourceId>, types: Vec<Type>, queryables: Vec<Field>) -> Self {
        Self {
            id: id.into(),
            types,
            queryables,
            values: Value::Null,
            connected: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
            fetch_delay: Mutex::new(None),
            queries_seen: Mutex::new(Vec::new()),
            events: EventEmitter::new(),
        }
    }

    /// Payload returned by every fetch.
    pub fn with_values(mut self, values: Value) -> Self {
        self.values = values;
        self
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        *self.fetch_delay.lock().expect("fetch delay lock poisoned") = delay;
    }

    /// Queries handed to [`DataSource::fetch_values`], oldest first.
    pub fn queries_seen(&self) -> Vec<String> {
        self.queries_seen
            .lock()
            .expect("query log lock poisoned")
            .clone()
    }

    /// Simulate a remote schema change notification.
    pub fn emit_changed(&self) {
        self.events.emit(&DataSourceEvent::Changed);
    }
}

impl DataSource for FakeDataSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn connect(&self) -> BoxFuture<'_, DataSourceResult<()>> {
        Box::pin(async move {
            self.connected.store(true, Ordering::SeqCst);
            self.events.emit(&DataSourceEvent::Ready);
            Ok(())
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn get_types(&self) -> Vec<Type> {
        self.types.clone()
    }

    fn get_queryables(&self) -> Vec<Field> {
        self.queryables.clone()
    }

    fn get_query(&self, trees: &[QueryTree]) -> String {
        graphql::render_query(trees)
    }

    fn fetch_values(&self, query: &str) -> BoxFuture<'_, DataSourceResult<Value>> {
        let query = query.to_string();
        Box::pin(async move {
            if !self.is_connected() {
                return Err(DataSourceError::NotConnected {
                    id: self.id.clone(),
                });
            }
            debug!(data_source = %self.id, %query, "serving canned values");
            self.queries_seen
                .lock()
                .expect("query log lock poisoned")
                .push(query);
            let delay = *self.fetch_delay.lock().expect("fetch delay lock poisoned");
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(DataSourceError::Fetch {
                    id: self.id.clone(),
                    message: "injected failure".to_string(),
                });
            }
            Ok(self.values.clone())
        })
    }

    fn events(&self) -> &EventEmitter<DataSourceEvent> {
        &self.events
    }
}
