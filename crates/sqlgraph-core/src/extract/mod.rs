//! Graph extraction entry point
//!
//! Control flow: comment mask -> CTE splitting -> per-scope analysis ->
//! assembled graph. Extraction is best-effort and pure: the same input
//! always yields the same graph, and no failure ever reaches the caller.

mod cte;
mod mask;
mod scope;

use std::panic::{catch_unwind, AssertUnwindSafe};

pub use mask::mask_comments;

use crate::error::ExtractError;
use crate::graph::{Graph, GraphBuilder};

/// Extract the dependency graph from a single SQL `SELECT` statement.
///
/// Any internal fault degrades to an empty graph; a caller cannot tell a
/// failed extraction apart from a query with no recognizable tables.
pub fn extract_graph(sql: &str) -> Graph {
    contain(|| try_extract(sql))
}

/// Boundary containment: both error returns and panics from the passes
/// collapse to the empty graph here, so nothing ever reaches the caller.
fn contain<F>(f: F) -> Graph
where
    F: FnOnce() -> Result<Graph, ExtractError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(graph)) => graph,
        Ok(Err(err)) => {
            tracing::warn!("graph extraction failed, returning empty graph: {err}");
            Graph::default()
        }
        Err(_) => {
            tracing::warn!("graph extraction panicked, returning empty graph");
            Graph::default()
        }
    }
}

fn try_extract(sql: &str) -> Result<Graph, ExtractError> {
    let masked = mask_comments(sql);
    let mut builder = GraphBuilder::new();
    cte::split_scopes(&masked, &mut builder)?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::{LinkKind, NodeKind};

    #[test]
    fn test_comments_are_invisible_to_extraction() {
        let graph = extract_graph(
            "SELECT * FROM orders o /* JOIN hidden h ON h.id = o.id */ -- JOIN also_hidden x",
        );
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].id, "O");
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_offsets_are_against_the_original_text() {
        let sql = "/* leading comment */ SELECT * FROM orders o";
        let graph = extract_graph(sql);
        let span = graph.node("O").unwrap().location.unwrap();
        assert_eq!(&sql[span.start..span.end], "o");
    }

    #[test]
    fn test_cte_and_usage_wiring() {
        let graph = extract_graph("WITH recent AS (SELECT * FROM events e) SELECT * FROM recent r");

        assert_eq!(graph.node("RECENT").unwrap().kind, NodeKind::Cte);
        assert_eq!(graph.node("E").unwrap().kind, NodeKind::Join);
        assert_eq!(graph.node("R").unwrap().kind, NodeKind::Join);

        let kinds: Vec<LinkKind> = graph.links.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LinkKind::CteDef, LinkKind::Instance]);
    }

    #[test]
    fn test_unrecognizable_input_yields_empty_graph() {
        assert!(extract_graph("hello world").is_empty());
        assert!(extract_graph("").is_empty());
    }

    #[test]
    fn test_panics_collapse_to_empty_graph() {
        let graph = contain(|| panic!("induced fault"));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_internal_errors_collapse_to_empty_graph() {
        let graph = contain(|| Err(ExtractError::invalid_offset(9, 3)));
        assert!(graph.is_empty());
    }
}
