//! Gremlin rendering for operations.
//!
//! The payload format belongs to the remote service; the generator and runner
//! treat the rendered string as opaque.

use crate::operation::OperationKind;

pub const VERTEX_LABEL: &str = "person";
pub const EDGE_LABEL: &str = "knows";

pub fn render(kind: &OperationKind) -> String {
    match kind {
        OperationKind::ResetGraph => "g.V().drop()".to_string(),
        OperationKind::CreateVertex { name } => format!(
            "g.addV('{VERTEX_LABEL}').property('id', {})",
            quote_literal(name)
        ),
        OperationKind::CreateEdge { source, target } => format!(
            "g.V({}).addE('{EDGE_LABEL}').to(g.V({}))",
            quote_literal(source),
            quote_literal(target)
        ),
    }
}

pub fn describe(kind: &OperationKind) -> String {
    match kind {
        OperationKind::ResetGraph => "Drop existing Graph".to_string(),
        OperationKind::CreateVertex { name } => format!("Add {name}"),
        OperationKind::CreateEdge { source, target } => format!("{source} {EDGE_LABEL} {target}"),
    }
}

/// Single-quoted Gremlin string literal with `\` and `'` escaped.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if matches!(ch, '\\' | '\'') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}
