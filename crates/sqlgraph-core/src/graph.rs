//! Graph data model and the accumulating builder
//!
//! Nodes represent distinct referenceable relations (tables, CTEs); links
//! represent CTE containment, CTE usage, and equality join conditions. Both
//! collections preserve discovery order and are built strictly additively
//! during one extraction pass.

use indexmap::IndexMap;
use miette::SourceSpan;
use serde::{Deserialize, Serialize};

/// Half-open byte offset range into the original input text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.start.into(), span.len())
    }
}

/// Kind of relation a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// The first top-level `FROM` target
    Main,
    /// Any other referenced relation, including usages of a CTE by name
    Join,
    /// A common table expression definition
    Cte,
}

/// One distinct referenceable relation in the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Uppercased alias (or table name when alias-less); unique key
    pub id: String,
    /// Source table/CTE name as written
    pub table_name: String,
    /// Alias as written, or the table name if none was given
    pub alias: String,
    pub kind: NodeKind,
    /// Offsets of the identifier chosen to represent this node in the text
    /// (the written alias when one exists, else the table name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Span>,
}

/// Kind of relationship between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkKind {
    /// A relation used inside a CTE body, pointing at the CTE that owns it
    CteDef,
    /// A usage of a CTE under a different alias, from CTE name to usage id
    Instance,
    /// An equality join condition between two aliases in the same scope
    Join,
}

/// Directed relationship between two node ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub kind: LinkKind,
    /// `"defines"`, `"usage"`, or the matched comparison text for joins
    pub condition: String,
}

/// The extraction result: nodes and links in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    /// Look up a node by its normalized id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Mutable accumulator shared by the CTE splitter and the scope analyzer
///
/// Enforces the graph invariants: one node per normalized id with first
/// writer wins (a later reference never overwrites an existing node's
/// fields, not even a missing location), exact-triple dedup for `CTE_DEF`
/// and `INSTANCE` links, and undirected-pair dedup for `JOIN` links.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: IndexMap<String, Node>,
    links: Vec<Link>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Register a node unless one with the same id already exists.
    /// Returns whether the node was inserted.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Append a link unless the dedup rules suppress it.
    /// Returns whether the link was inserted.
    pub fn add_link(&mut self, link: Link) -> bool {
        let duplicate = match link.kind {
            // Join edges are undirected: a link between {a,b} in either
            // direction suppresses a new one.
            LinkKind::Join => self.links.iter().any(|l| {
                l.kind == LinkKind::Join
                    && ((l.source == link.source && l.target == link.target)
                        || (l.source == link.target && l.target == link.source))
            }),
            _ => self
                .links
                .iter()
                .any(|l| l.kind == link.kind && l.source == link.source && l.target == link.target),
        };
        if duplicate {
            return false;
        }
        self.links.push(link);
        true
    }

    pub fn build(self) -> Graph {
        Graph {
            nodes: self.nodes.into_values().collect(),
            links: self.links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: NodeKind) -> Node {
        Node {
            id: id.to_string(),
            table_name: id.to_lowercase(),
            alias: id.to_lowercase(),
            kind,
            location: None,
        }
    }

    fn link(source: &str, target: &str, kind: LinkKind) -> Link {
        Link {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            condition: String::new(),
        }
    }

    #[test]
    fn test_first_writer_wins() {
        let mut builder = GraphBuilder::new();
        assert!(builder.add_node(Node {
            location: Some(Span::new(3, 4)),
            ..node("A", NodeKind::Main)
        }));
        assert!(!builder.add_node(Node {
            location: Some(Span::new(10, 11)),
            ..node("A", NodeKind::Join)
        }));

        let graph = builder.build();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].kind, NodeKind::Main);
        assert_eq!(graph.nodes[0].location, Some(Span::new(3, 4)));
    }

    #[test]
    fn test_missing_location_is_not_backfilled() {
        let mut builder = GraphBuilder::new();
        builder.add_node(node("A", NodeKind::Join));
        builder.add_node(Node {
            location: Some(Span::new(5, 6)),
            ..node("A", NodeKind::Join)
        });

        let graph = builder.build();
        assert_eq!(graph.nodes[0].location, None);
    }

    #[test]
    fn test_directed_link_dedup_by_triple() {
        let mut builder = GraphBuilder::new();
        assert!(builder.add_link(link("A", "B", LinkKind::CteDef)));
        assert!(!builder.add_link(link("A", "B", LinkKind::CteDef)));
        // Reverse direction is a different triple
        assert!(builder.add_link(link("B", "A", LinkKind::CteDef)));
        // Different kind is a different triple
        assert!(builder.add_link(link("A", "B", LinkKind::Instance)));
        assert_eq!(builder.build().links.len(), 3);
    }

    #[test]
    fn test_join_link_dedup_is_undirected() {
        let mut builder = GraphBuilder::new();
        assert!(builder.add_link(link("A", "B", LinkKind::Join)));
        assert!(!builder.add_link(link("B", "A", LinkKind::Join)));
        assert!(!builder.add_link(link("A", "B", LinkKind::Join)));
        assert_eq!(builder.build().links.len(), 1);
    }

    #[test]
    fn test_node_order_is_insertion_order() {
        let mut builder = GraphBuilder::new();
        builder.add_node(node("C", NodeKind::Cte));
        builder.add_node(node("A", NodeKind::Main));
        builder.add_node(node("B", NodeKind::Join));

        let graph = builder.build();
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_graph_round_trips_without_locations() {
        let mut builder = GraphBuilder::new();
        builder.add_node(node("A", NodeKind::Main));
        builder.add_link(link("A", "A", LinkKind::Join));
        let graph = builder.build();

        // A location-less node omits the field entirely; deserializing the
        // result must still succeed.
        let json = serde_json::to_string(&graph).unwrap();
        assert!(!json.contains("location"));
        let back: Graph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn test_kind_serialization_names() {
        assert_eq!(serde_json::to_string(&NodeKind::Cte).unwrap(), "\"CTE\"");
        assert_eq!(serde_json::to_string(&NodeKind::Main).unwrap(), "\"MAIN\"");
        assert_eq!(
            serde_json::to_string(&LinkKind::CteDef).unwrap(),
            "\"CTE_DEF\""
        );
        assert_eq!(
            serde_json::to_string(&LinkKind::Instance).unwrap(),
            "\"INSTANCE\""
        );
    }
}
