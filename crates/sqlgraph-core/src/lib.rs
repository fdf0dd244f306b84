//! sqlgraph-core: SQL dependency graph extraction library
//!
//! This library extracts the tables, common table expressions, and join
//! relationships referenced by a single SQL `SELECT` statement, annotated
//! with byte-exact offsets into the original text so callers can highlight
//! each identifier. It performs best-effort lexical scanning over the raw
//! text, not full parsing.

pub mod error;
pub mod extract;
pub mod graph;

pub use extract::{extract_graph, mask_comments};
pub use graph::{Graph, Link, LinkKind, Node, NodeKind, Span};
