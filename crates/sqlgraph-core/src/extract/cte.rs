//! CTE splitting
//!
//! Peels `WITH name AS ( ... )` definitions off the front of the (masked)
//! query, analyzing each parenthesized body as its own scope before handing
//! the remaining main query to the scope analyzer. All offsets are kept
//! absolute against the original input.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExtractError;
use crate::extract::scope;
use crate::graph::{GraphBuilder, Node, NodeKind, Span};

static WITH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bWITH\s").unwrap());

/// `<identifier> AS (` anchored at the cursor, allowing leading whitespace
static CTE_HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*([A-Za-z_$][A-Za-z0-9_$]*)\s+AS\s*\(").unwrap());

static COMMA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*,").unwrap());

/// Split off leading CTE definitions, analyze each body as an owned scope,
/// then analyze the remainder as the top-level scope.
pub(super) fn split_scopes(text: &str, builder: &mut GraphBuilder) -> Result<(), ExtractError> {
    let Some(with_kw) = WITH_RE.find(text) else {
        scope::analyze(text, 0, None, &[], builder);
        return Ok(());
    };

    let mut cursor = with_kw.end();
    let mut cte_names: Vec<String> = Vec::new();

    loop {
        let tail = text
            .get(cursor..)
            .ok_or_else(|| ExtractError::invalid_offset(cursor, text.len()))?;

        let Some(caps) = CTE_HEAD_RE.captures(tail) else {
            // Not a CTE definition: everything from here is the main query.
            break;
        };
        let Some(ident) = caps.get(1) else {
            break;
        };
        let Some(head) = caps.get(0) else {
            break;
        };

        let name = ident.as_str();
        let id = name.to_ascii_uppercase();
        builder.add_node(Node {
            id: id.clone(),
            table_name: name.to_string(),
            alias: name.to_string(),
            kind: NodeKind::Cte,
            location: Some(Span::new(cursor + ident.start(), cursor + ident.end())),
        });
        if !cte_names.contains(&id) {
            cte_names.push(id.clone());
        }

        // The head match ends just past the opening parenthesis.
        let body_start = cursor + head.end();
        let Some(close) = find_balanced_close(text, body_start) else {
            // Unterminated parens: abort CTE processing and treat the rest
            // as one top-level scope from the current cursor.
            let rest = text
                .get(cursor..)
                .ok_or_else(|| ExtractError::invalid_offset(cursor, text.len()))?;
            scope::analyze(rest, cursor, None, &cte_names, builder);
            return Ok(());
        };

        let body = text
            .get(body_start..close)
            .ok_or_else(|| ExtractError::invalid_offset(close, text.len()))?;
        scope::analyze(body, body_start, Some(&id), &cte_names, builder);

        cursor = close + 1;
        let after = text
            .get(cursor..)
            .ok_or_else(|| ExtractError::invalid_offset(cursor, text.len()))?;
        match COMMA_RE.find(after) {
            Some(comma) => cursor += comma.end(),
            None => break,
        }
    }

    let main = text
        .get(cursor..)
        .ok_or_else(|| ExtractError::invalid_offset(cursor, text.len()))?;
    scope::analyze(main, cursor, None, &cte_names, builder);
    Ok(())
}

/// Scan forward from `from` (just past an opening parenthesis) and return
/// the byte index of the matching close, counting nested parens.
fn find_balanced_close(text: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, b) in text.as_bytes().iter().enumerate().skip(from) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::{Graph, LinkKind};

    fn split(sql: &str) -> Graph {
        let mut builder = GraphBuilder::new();
        split_scopes(sql, &mut builder).unwrap();
        builder.build()
    }

    #[test]
    fn test_balanced_close_skips_nested_parens() {
        //          0123456789
        let text = "(a (b) c) d";
        assert_eq!(find_balanced_close(text, 1), Some(8));
        assert_eq!(find_balanced_close("((", 1), None);
    }

    #[test]
    fn test_single_cte_is_registered() {
        let graph = split("WITH recent AS (SELECT * FROM events) SELECT * FROM recent");
        let cte = graph.node("RECENT").unwrap();
        assert_eq!(cte.kind, NodeKind::Cte);
        assert_eq!(cte.table_name, "recent");
        assert_eq!(cte.location, Some(Span::new(5, 11)));
    }

    #[test]
    fn test_multiple_ctes_separated_by_commas() {
        let graph = split(
            "WITH a AS (SELECT * FROM t1), b AS (SELECT * FROM t2) \
             SELECT * FROM a JOIN b ON a.x = b.x",
        );
        assert_eq!(graph.node("A").unwrap().kind, NodeKind::Cte);
        assert_eq!(graph.node("B").unwrap().kind, NodeKind::Cte);
        assert!(graph.node("T1").is_some());
        assert!(graph.node("T2").is_some());
    }

    #[test]
    fn test_cte_body_relations_point_at_owner() {
        let graph = split("WITH a AS (SELECT * FROM t1) SELECT * FROM a");
        let def = graph
            .links
            .iter()
            .find(|l| l.kind == LinkKind::CteDef)
            .unwrap();
        assert_eq!(def.source, "T1");
        assert_eq!(def.target, "A");
        assert_eq!(def.condition, "defines");
    }

    #[test]
    fn test_unterminated_paren_falls_back_to_top_level() {
        let graph = split("WITH x AS (SELECT * FROM t");
        // The definition node survives; processing does not crash.
        assert_eq!(graph.node("X").unwrap().kind, NodeKind::Cte);
        assert!(graph.node("T").is_some());
    }

    #[test]
    fn test_with_keyword_not_followed_by_definition() {
        // `WITH` present but no `<ident> AS (` after it: the remainder is
        // the main query.
        let graph = split("WITH SELECT * FROM t");
        assert!(graph.node("T").is_some());
        assert_eq!(graph.nodes.len(), 1);
    }

    #[test]
    fn test_duplicate_cte_name_keeps_first_definition() {
        let graph = split("WITH a AS (SELECT * FROM t1), a AS (SELECT * FROM t2) SELECT 1");
        let node = graph.node("A").unwrap();
        assert_eq!(node.kind, NodeKind::Cte);
        assert_eq!(node.location, Some(Span::new(5, 6)));
    }
}
