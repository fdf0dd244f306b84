//! Output formatting

use sqlgraph_core::{Graph, LinkKind, NodeKind};

use crate::args::OutputFormat;

/// Formatter for extracted graphs
pub struct GraphFormatter {
    format: OutputFormat,
    file_name: String,
}

impl GraphFormatter {
    pub fn new(format: OutputFormat, file_name: String) -> Self {
        Self { format, file_name }
    }

    /// Print a graph in the configured format
    pub fn print_graph(&self, graph: &Graph) {
        match self.format {
            OutputFormat::Human => self.print_human(graph),
            OutputFormat::Json => self.print_json(graph),
            OutputFormat::Dot => self.print_dot(graph),
        }
    }

    fn print_human(&self, graph: &Graph) {
        println!(
            "{}: {} node(s), {} link(s)",
            self.file_name,
            graph.nodes.len(),
            graph.links.len()
        );

        for node in &graph.nodes {
            let kind = match node.kind {
                NodeKind::Main => "MAIN",
                NodeKind::Join => "JOIN",
                NodeKind::Cte => "CTE ",
            };
            let location = match node.location {
                Some(span) => format!(" @ {}..{}", span.start, span.end),
                None => String::new(),
            };
            if node.alias == node.table_name {
                println!("  {} {:<12} {}{}", kind, node.id, node.table_name, location);
            } else {
                println!(
                    "  {} {:<12} {} (alias {}){}",
                    kind, node.id, node.table_name, node.alias, location
                );
            }
        }

        for link in &graph.links {
            let arrow = match link.kind {
                LinkKind::CteDef => "defined in",
                LinkKind::Instance => "instantiated as",
                LinkKind::Join => "joined with",
            };
            println!(
                "  {} {} {}: {}",
                link.source, arrow, link.target, link.condition
            );
        }
    }

    fn print_json(&self, graph: &Graph) {
        let output = serde_json::json!({
            "file": self.file_name,
            "graph": graph
        });
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    }

    fn print_dot(&self, graph: &Graph) {
        println!("digraph sqlgraph {{");
        println!("  rankdir=LR;");

        for node in &graph.nodes {
            let shape = match node.kind {
                NodeKind::Main => "box",
                NodeKind::Join => "ellipse",
                NodeKind::Cte => "folder",
            };
            let label = if node.alias == node.table_name {
                node.table_name.clone()
            } else {
                format!("{}\\n({})", node.table_name, node.alias)
            };
            println!(
                "  \"{}\" [label=\"{}\", shape={}];",
                escape(&node.id),
                escape(&label),
                shape
            );
        }

        for link in &graph.links {
            let style = match link.kind {
                LinkKind::CteDef => "dashed",
                LinkKind::Instance => "dotted",
                LinkKind::Join => "solid",
            };
            println!(
                "  \"{}\" -> \"{}\" [style={}, label=\"{}\"];",
                escape(&link.source),
                escape(&link.target),
                style,
                escape(&link.condition)
            );
        }

        println!("}}");
    }
}

/// Escape double quotes for DOT string literals
fn escape(s: &str) -> String {
    s.replace('"', "\\\"")
}
