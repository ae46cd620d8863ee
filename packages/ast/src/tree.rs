use crate::tokens::PropertyToken;
use serde::{Deserialize, Serialize};

/// Compiled intermediate representation of one field selection plus its
/// nested selections, used to generate a connector-specific query.
///
/// Trees are ephemeral: rebuilt on every compilation pass, never persisted,
/// and never mutated in place. Merging always returns new trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTree {
    pub token: PropertyToken,
    #[serde(default)]
    pub children: Vec<QueryTree>,
}

impl QueryTree {
    pub fn leaf(token: PropertyToken) -> Self {
        Self {
            token,
            children: Vec::new(),
        }
    }

    pub fn with_children(token: PropertyToken, children: Vec<QueryTree>) -> Self {
        Self { token, children }
    }

    /// Total number of nodes in this tree, root included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(QueryTree::node_count).sum::<usize>()
    }
}
