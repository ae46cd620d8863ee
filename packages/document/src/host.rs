use serde::{Deserialize, Serialize};
use serde_json::Value;
use weave_ast::{ComponentId, Expression, PersistentId};

/// Which bucket a state record lives in on its component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateNamespace {
    /// Visible to descendant components.
    Exposed,
    /// Internal to the declaring component.
    Private,
}

/// A named piece of state declared on a component: a label for the editor
/// plus the stored expression it binds to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecord {
    pub label: String,
    pub expression: Expression,
}

/// The component-tree host (the visual editor) as seen by the binding core.
///
/// The core only reads: ancestry, persistent identity, declared state and
/// attributes. All handles are transient; persistence goes through the
/// persistent id.
pub trait DocumentHost {
    fn parent(&self, component: &ComponentId) -> Option<ComponentId>;

    fn children(&self, component: &ComponentId) -> Vec<ComponentId>;

    fn persistent_id(&self, component: &ComponentId) -> Option<PersistentId>;

    fn states(
        &self,
        component: &ComponentId,
        namespace: StateNamespace,
    ) -> Vec<(String, StateRecord)>;

    fn state(
        &self,
        component: &ComponentId,
        namespace: StateNamespace,
        name: &str,
    ) -> Option<StateRecord>;

    fn attributes(&self, component: &ComponentId) -> Vec<(String, Value)>;
}

/// Resolve the component a state token refers to: walk up the ancestor
/// chain from `from` (self first) until a component's persistent id matches.
///
/// Weak reference by key: the result is recomputed on every use, never
/// stored.
pub fn resolve_state_component(
    host: &dyn DocumentHost,
    from: &ComponentId,
    persistent_id: &PersistentId,
) -> Option<ComponentId> {
    let mut current = Some(from.clone());
    while let Some(component) = current {
        if host.persistent_id(&component).as_ref() == Some(persistent_id) {
            return Some(component);
        }
        current = host.parent(&component);
    }
    None
}
