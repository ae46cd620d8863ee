use crate::host::{DocumentHost, StateNamespace, StateRecord};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use weave_ast::{ComponentId, PageId, PersistentId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("unknown component '{0}'")]
    UnknownComponent(ComponentId),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(Debug, Clone, Default)]
struct Node {
    parent: Option<ComponentId>,
    children: Vec<ComponentId>,
    persistent_id: PersistentId,
    exposed: BTreeMap<String, StateRecord>,
    private: BTreeMap<String, StateRecord>,
    attributes: BTreeMap<String, Value>,
}

/// A minimal in-memory component tree implementing [`DocumentHost`].
///
/// Handles are generated strings; persistent ids are supplied by the caller
/// and must be unique per document for state resolution to be meaningful.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocument {
    nodes: HashMap<ComponentId, Node>,
    pages: Vec<(PageId, ComponentId)>,
    next_handle: u64,
}

impl InMemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_handle(&mut self) -> ComponentId {
        self.next_handle += 1;
        format!("c{}", self.next_handle)
    }

    /// Add a page and return the handle of its root component.
    pub fn add_page(
        &mut self,
        page_id: impl Into<PageId>,
        persistent_id: impl Into<PersistentId>,
    ) -> ComponentId {
        let handle = self.new_handle();
        self.nodes.insert(
            handle.clone(),
            Node {
                persistent_id: persistent_id.into(),
                ..Node::default()
            },
        );
        self.pages.push((page_id.into(), handle.clone()));
        handle
    }

    pub fn add_child(
        &mut self,
        parent: &ComponentId,
        persistent_id: impl Into<PersistentId>,
    ) -> DocumentResult<ComponentId> {
        if !self.nodes.contains_key(parent) {
            return Err(DocumentError::UnknownComponent(parent.clone()));
        }
        let handle = self.new_handle();
        self.nodes.insert(
            handle.clone(),
            Node {
                parent: Some(parent.clone()),
                persistent_id: persistent_id.into(),
                ..Node::default()
            },
        );
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(handle.clone());
        }
        Ok(handle)
    }

    pub fn set_state(
        &mut self,
        component: &ComponentId,
        namespace: StateNamespace,
        name: impl Into<String>,
        record: StateRecord,
    ) -> DocumentResult<()> {
        let node = self
            .nodes
            .get_mut(component)
            .ok_or_else(|| DocumentError::UnknownComponent(component.clone()))?;
        let bucket = match namespace {
            StateNamespace::Exposed => &mut node.exposed,
            StateNamespace::Private => &mut node.private,
        };
        bucket.insert(name.into(), record);
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        component: &ComponentId,
        name: impl Into<String>,
        value: Value,
    ) -> DocumentResult<()> {
        let node = self
            .nodes
            .get_mut(component)
            .ok_or_else(|| DocumentError::UnknownComponent(component.clone()))?;
        node.attributes.insert(name.into(), value);
        Ok(())
    }

    pub fn pages(&self) -> &[(PageId, ComponentId)] {
        &self.pages
    }
}

impl DocumentHost for InMemoryDocument {
    fn parent(&self, component: &ComponentId) -> Option<ComponentId> {
        self.nodes.get(component).and_then(|n| n.parent.clone())
    }

    fn children(&self, component: &ComponentId) -> Vec<ComponentId> {
        self.nodes
            .get(component)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn persistent_id(&self, component: &ComponentId) -> Option<PersistentId> {
        self.nodes.get(component).map(|n| n.persistent_id.clone())
    }

    fn states(
        &self,
        component: &ComponentId,
        namespace: StateNamespace,
    ) -> Vec<(String, StateRecord)> {
        let Some(node) = self.nodes.get(component) else {
            return Vec::new();
        };
        let bucket = match namespace {
            StateNamespace::Exposed => &node.exposed,
            StateNamespace::Private => &node.private,
        };
        bucket
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect()
    }

    fn state(
        &self,
        component: &ComponentId,
        namespace: StateNamespace,
        name: &str,
    ) -> Option<StateRecord> {
        let node = self.nodes.get(component)?;
        let bucket = match namespace {
            StateNamespace::Exposed => &node.exposed,
            StateNamespace::Private => &node.private,
        };
        bucket.get(name).cloned()
    }

    fn attributes(&self, component: &ComponentId) -> Vec<(String, Value)> {
        self.nodes
            .get(component)
            .map(|n| {
                n.attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
