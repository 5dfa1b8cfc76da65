//! Graph-mutation operations.

use serde::{Deserialize, Serialize};

use crate::statement;

/// What an operation does to the remote graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationKind {
    /// Wipe all vertices (and with them, all edges).
    ResetGraph,
    /// Add a `person` vertex keyed by `name`.
    CreateVertex { name: String },
    /// Add a directed `knows` edge between two existing vertices.
    CreateEdge { source: String, target: String },
}

/// One atomic graph mutation, ready to be submitted.
///
/// `description` is what the run log shows; `statement` is the payload handed
/// to the execution channel. Both are derived from `kind` at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub description: String,
    pub statement: String,
}

impl Operation {
    pub fn new(kind: OperationKind) -> Self {
        let description = statement::describe(&kind);
        let statement = statement::render(&kind);
        Self {
            kind,
            description,
            statement,
        }
    }

    pub fn reset_graph() -> Self {
        Self::new(OperationKind::ResetGraph)
    }

    pub fn create_vertex(name: impl Into<String>) -> Self {
        Self::new(OperationKind::CreateVertex { name: name.into() })
    }

    pub fn create_edge(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(OperationKind::CreateEdge {
            source: source.into(),
            target: target.into(),
        })
    }

    pub fn is_vertex(&self) -> bool {
        matches!(self.kind, OperationKind::CreateVertex { .. })
    }

    pub fn is_edge(&self) -> bool {
        matches!(self.kind, OperationKind::CreateEdge { .. })
    }

    /// `(source, target)` for edge operations.
    pub fn edge_endpoints(&self) -> Option<(&str, &str)> {
        match &self.kind {
            OperationKind::CreateEdge { source, target } => Some((source, target)),
            _ => None,
        }
    }

    pub fn vertex_name(&self) -> Option<&str> {
        match &self.kind {
            OperationKind::CreateVertex { name } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_fill_description_and_statement() {
        let op = Operation::create_edge("Hazel", "Ron");
        assert_eq!(op.description, "Hazel knows Ron");
        assert_eq!(op.statement, "g.V('Hazel').addE('knows').to(g.V('Ron'))");
        assert_eq!(op.edge_endpoints(), Some(("Hazel", "Ron")));
        assert!(op.is_edge());
        assert!(!op.is_vertex());
    }

    #[test]
    fn accessors_only_match_their_kind() {
        let vertex = Operation::create_vertex("Mona");
        assert_eq!(vertex.vertex_name(), Some("Mona"));
        assert_eq!(vertex.edge_endpoints(), None);

        let reset = Operation::reset_graph();
        assert_eq!(reset.vertex_name(), None);
        assert!(!reset.is_vertex() && !reset.is_edge());
    }
}
