use std::collections::{HashMap, HashSet};
use tracing::debug;
use weave_ast::{builtin_scalars, DataSourceId, Field, Type, TypeId};

/// Aggregated view of every connected data source's types plus the built-in
/// scalars.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    builtins: Vec<Type>,
    source_types: HashMap<DataSourceId, Vec<Type>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            builtins: builtin_scalars(),
            source_types: HashMap::new(),
        }
    }

    /// Replace one source's contribution wholesale. Called on every
    /// ready/changed event from that source.
    pub fn set_source_types(&mut self, data_source_id: impl Into<DataSourceId>, types: Vec<Type>) {
        self.source_types.insert(data_source_id.into(), types);
    }

    pub fn remove_source(&mut self, data_source_id: &str) {
        self.source_types.remove(data_source_id);
    }

    /// Look up a type by id. When a data-source filter is given, the match
    /// must come from that source or from the built-ins.
    pub fn get_type(&self, type_id: &str, data_source_id: Option<&str>) -> Option<&Type> {
        if let Some(builtin) = self.builtins.iter().find(|t| t.id == type_id) {
            return Some(builtin);
        }
        match data_source_id {
            Some(source) => self
                .source_types
                .get(source)
                .and_then(|types| types.iter().find(|t| t.id == type_id)),
            None => self
                .source_types
                .values()
                .flatten()
                .find(|t| t.id == type_id),
        }
    }

    /// All candidate types for a plural type-id list. Missing ids are
    /// dropped (tolerant path), with a debug diagnostic.
    pub fn types_named(&self, type_ids: &[TypeId], data_source_id: Option<&str>) -> Vec<&Type> {
        type_ids
            .iter()
            .filter_map(|id| {
                let found = self.get_type(id, data_source_id);
                if found.is_none() {
                    debug!(type_id = %id, "type not found in registry");
                }
                found
            })
            .collect()
    }

    /// Search the fields of all candidate types for a field id, returning
    /// the first schema declaration found.
    pub fn find_field(
        &self,
        type_ids: &[TypeId],
        data_source_id: Option<&str>,
        field_id: &str,
    ) -> Option<&Field> {
        self.types_named(type_ids, data_source_id)
            .into_iter()
            .flat_map(|t| t.fields.iter())
            .find(|f| f.id == field_id)
    }

    /// The set of type ids reachable through one field hop from the given
    /// candidates. This is the relativity oracle used by the tree builder:
    /// a fragment is nested under a parent iff its declared types intersect
    /// this set for the parent.
    pub fn field_types_one_hop(
        &self,
        type_ids: &[TypeId],
        data_source_id: Option<&str>,
    ) -> HashSet<TypeId> {
        self.types_named(type_ids, data_source_id)
            .into_iter()
            .flat_map(|t| t.fields.iter())
            .flat_map(|f| f.type_ids.iter().cloned())
            .collect()
    }

    pub fn all_types(&self) -> impl Iterator<Item = &Type> {
        self.builtins
            .iter()
            .chain(self.source_types.values().flatten())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
