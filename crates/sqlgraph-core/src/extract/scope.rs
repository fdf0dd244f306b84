//! Scope analysis
//!
//! A scope is one contiguous span of SQL text (a CTE body or the main
//! query). Two independent scans run over it: one discovering table
//! references after `FROM`/`JOIN`-family keywords, one discovering qualified
//! equality comparisons between aliases registered by the first scan.

use std::sync::LazyLock;

use regex::Regex;

use crate::graph::{GraphBuilder, Link, LinkKind, Node, NodeKind, Span};

/// `FROM`/`JOIN`-family keyword followed by a dotted-or-plain identifier.
/// Must not consume the alias candidate: a clause keyword right after an
/// alias-less reference has to stay visible to the next iteration.
static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(FROM|(?:INNER\s+|LEFT\s+|RIGHT\s+|FULL\s+OUTER\s+|CROSS\s+)?JOIN)\s+([A-Za-z_$][A-Za-z0-9_$]*(?:\.[A-Za-z_$][A-Za-z0-9_$]*)*)",
    )
    .unwrap()
});

/// Alias candidate probed right after a table reference
static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+([A-Za-z_$][A-Za-z0-9_$]*)").unwrap());

/// `alias.column OP alias.column` comparison
static JOIN_COND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b([A-Za-z_$][A-Za-z0-9_$]*)\.([A-Za-z_$][A-Za-z0-9_$]*)\s*(=|<>|!=)\s*([A-Za-z_$][A-Za-z0-9_$]*)\.([A-Za-z_$][A-Za-z0-9_$]*)",
    )
    .unwrap()
});

/// Clause keywords that disqualify an identifier from being an alias
const RESERVED_AFTER_TABLE: &[&str] = &[
    "ON", "WHERE", "GROUP", "ORDER", "HAVING", "LEFT", "RIGHT", "INNER", "OUTER", "FULL", "CROSS",
    "JOIN", "UNION", "SELECT", "WITH", "LIMIT", "OFFSET",
];

/// Analyze one scope of (masked) text.
///
/// `base` is the scope's absolute byte offset into the original input, so
/// every emitted location stays valid against the unmasked text. `owner` is
/// the id of the CTE whose body this is, if any. `cte_names` holds the
/// uppercased names of CTEs known at this point of the walk.
pub(super) fn analyze(
    text: &str,
    base: usize,
    owner: Option<&str>,
    cte_names: &[String],
    builder: &mut GraphBuilder,
) {
    // Aliases registered in *this* scope; join conditions only resolve
    // against these.
    let mut local_ids: Vec<String> = Vec::new();

    for caps in TABLE_RE.captures_iter(text) {
        let (Some(keyword), Some(table)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let table_text = table.as_str();

        // Probe for a written alias without consuming it from the scan.
        let after = text.get(table.end()..).unwrap_or_default();
        let written_alias = ALIAS_RE.captures(after).and_then(|ac| {
            let m = ac.get(1)?;
            if RESERVED_AFTER_TABLE
                .iter()
                .any(|kw| kw.eq_ignore_ascii_case(m.as_str()))
            {
                return None;
            }
            let start = base + table.end() + m.start();
            Some((m.as_str().to_string(), Span::new(start, start + m.len())))
        });

        // Last dotted segment doubles as the implicit alias of a
        // schema-qualified reference.
        let last_segment = table_text.rsplit('.').next().unwrap_or(table_text);
        let (alias, location) = match &written_alias {
            Some((alias, span)) => (alias.clone(), *span),
            None => (
                last_segment.to_string(),
                Span::new(base + table.start(), base + table.end()),
            ),
        };

        let id = alias.to_ascii_uppercase();
        let cte_id = table_text.to_ascii_uppercase();
        let is_cte_usage = cte_names.contains(&cte_id);
        let is_from = keyword.as_str().eq_ignore_ascii_case("FROM");

        if !builder.contains_node(&id) {
            // MAIN is reserved for plain-table FROM targets of the
            // top-level scope; CTE usages always register as JOIN.
            let kind = if is_from && owner.is_none() && !is_cte_usage {
                NodeKind::Main
            } else {
                NodeKind::Join
            };
            builder.add_node(Node {
                id: id.clone(),
                table_name: table_text.to_string(),
                alias,
                kind,
                location: Some(location),
            });
        }
        if !local_ids.contains(&id) {
            local_ids.push(id.clone());
        }

        if let Some(owner_id) = owner {
            builder.add_link(Link {
                source: id.clone(),
                target: owner_id.to_string(),
                kind: LinkKind::CteDef,
                condition: "defines".to_string(),
            });
        }

        if is_cte_usage && id != cte_id {
            builder.add_link(Link {
                source: cte_id,
                target: id,
                kind: LinkKind::Instance,
                condition: "usage".to_string(),
            });
        }
    }

    for caps in JOIN_COND_RE.captures_iter(text) {
        let (Some(whole), Some(left), Some(right)) = (caps.get(0), caps.get(1), caps.get(4)) else {
            continue;
        };
        let source = left.as_str().to_ascii_uppercase();
        let target = right.as_str().to_ascii_uppercase();
        if !local_ids.contains(&source) || !local_ids.contains(&target) {
            continue;
        }
        builder.add_link(Link {
            source,
            target,
            kind: LinkKind::Join,
            condition: whole.as_str().to_string(),
        });
    }
}
