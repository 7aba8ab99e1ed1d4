//! Dependency graph export for diagnostics and visualization.
//!
//! A [`DependencyGraph`] is a point-in-time picture of the live singletons,
//! the dependencies captured while they were built and the order
//! [`delete_all`](crate::SingletonRegistry::delete_all) would tear them down
//! in. It renders to Graphviz DOT or Mermaid out of the box, and to JSON or
//! YAML with the `graph-export` feature.

#[cfg(feature = "graph-export")]
use serde::{Deserialize, Serialize};

use crate::error::{SingletonError, SingletonResult};
use crate::internal::master;
use crate::registry::SingletonRegistry;

const GRAPH_VERSION: &str = "1.0.0";

/// A live singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphNode {
    /// Identifier used by edges, e.g. `n0`
    pub id: String,
    /// Full type name
    pub type_name: String,
    /// `implicit` or `param`
    pub kind: String,
    /// Lifecycle state at export time
    pub state: String,
    /// Construction-start sequence number
    pub sequence: u64,
    /// Type names of the singletons this one depends on
    pub dependencies: Vec<String>,
}

/// `from` depends on `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphMetadata {
    pub live_count: usize,
    pub edge_count: usize,
    /// Whether teardown ordering had to break a cycle
    pub has_cycles: bool,
    pub exported_at: String,
    pub version: String,
}

/// Snapshot of the live dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct DependencyGraph {
    /// Nodes in construction-start order
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Node ids in teardown order
    pub teardown_order: Vec<String>,
    pub metadata: GraphMetadata,
}

impl DependencyGraph {
    pub fn node(&self, type_name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.type_name == type_name)
    }
}

/// Export formats supported for dependency graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON (requires `graph-export`)
    Json,
    /// YAML (requires `graph-export`)
    Yaml,
    /// Graphviz DOT
    Dot,
    /// Mermaid flowchart
    Mermaid,
}

/// Renders a [`DependencyGraph`] into a textual format.
pub trait GraphExporter {
    fn export(&self, graph: &DependencyGraph, format: ExportFormat) -> SingletonResult<String>;
}

/// Stock exporter for every [`ExportFormat`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGraphExporter;

impl GraphExporter for DefaultGraphExporter {
    fn export(&self, graph: &DependencyGraph, format: ExportFormat) -> SingletonResult<String> {
        match format {
            ExportFormat::Json => export_json(graph),
            ExportFormat::Yaml => export_yaml(graph),
            ExportFormat::Dot => Ok(export_dot(graph)),
            ExportFormat::Mermaid => Ok(export_mermaid(graph)),
        }
    }
}

#[cfg(feature = "graph-export")]
fn export_json(graph: &DependencyGraph) -> SingletonResult<String> {
    serde_json::to_string_pretty(graph).map_err(|e| SingletonError::Export(e.to_string()))
}

#[cfg(not(feature = "graph-export"))]
fn export_json(_graph: &DependencyGraph) -> SingletonResult<String> {
    Err(SingletonError::Export("JSON export requires the `graph-export` feature".to_string()))
}

#[cfg(feature = "graph-export")]
fn export_yaml(graph: &DependencyGraph) -> SingletonResult<String> {
    serde_yaml::to_string(graph).map_err(|e| SingletonError::Export(e.to_string()))
}

#[cfg(not(feature = "graph-export"))]
fn export_yaml(_graph: &DependencyGraph) -> SingletonResult<String> {
    Err(SingletonError::Export("YAML export requires the `graph-export` feature".to_string()))
}

fn export_dot(graph: &DependencyGraph) -> String {
    let mut output = String::new();
    output.push_str("digraph Singletons {\n");
    output.push_str("  rankdir=TB;\n");
    output.push_str("  node [shape=box, style=filled];\n\n");

    for node in &graph.nodes {
        let color = match node.kind.as_str() {
            "param" => "lightyellow",
            _ => "lightblue",
        };
        output.push_str(&format!(
            "  {} [label=\"{}\\n({})\", fillcolor={}];\n",
            node.id,
            escape_dot(&node.type_name),
            node.state,
            color
        ));
    }

    output.push('\n');
    for edge in &graph.edges {
        output.push_str(&format!("  {} -> {};\n", edge.from, edge.to));
    }
    output.push_str("}\n");
    output
}

fn export_mermaid(graph: &DependencyGraph) -> String {
    let mut output = String::new();
    output.push_str("graph TD\n");

    for node in &graph.nodes {
        output.push_str(&format!("  {}[\"{}\"]\n", node.id, escape_mermaid(&node.type_name)));
    }
    for edge in &graph.edges {
        output.push_str(&format!("  {} --> {}\n", edge.from, edge.to));
    }

    output.push_str("\n  classDef implicit fill:#e1f5fe\n");
    output.push_str("  classDef param fill:#fff3e0\n");
    for node in &graph.nodes {
        output.push_str(&format!("  class {} {}\n", node.id, node.kind));
    }
    output
}

fn escape_dot(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_mermaid(name: &str) -> String {
    name.replace('"', "#quot;").replace('<', "#lt;").replace('>', "#gt;")
}

fn timestamp() -> String {
    #[cfg(feature = "graph-export")]
    {
        chrono::Utc::now().to_rfc3339()
    }
    #[cfg(not(feature = "graph-export"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string()
    }
}

impl SingletonRegistry {
    /// Snapshot the live singletons and their captured dependencies.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_lifecycle::graph_export::{DefaultGraphExporter, ExportFormat, GraphExporter};
    /// use ferrous_lifecycle::{HookResult, Managed, Singleton, SingletonRegistry};
    ///
    /// struct Fonts;
    /// impl Managed for Fonts {}
    /// impl Singleton for Fonts {
    ///     fn construct(_: &SingletonRegistry) -> HookResult<Self> {
    ///         Ok(Fonts)
    ///     }
    /// }
    ///
    /// let registry = SingletonRegistry::new();
    /// registry.get_required::<Fonts>();
    ///
    /// let graph = registry.dependency_graph();
    /// assert_eq!(graph.metadata.live_count, 1);
    /// let dot = DefaultGraphExporter.export(&graph, ExportFormat::Dot).unwrap();
    /// assert!(dot.starts_with("digraph"));
    /// ```
    pub fn dependency_graph(&self) -> DependencyGraph {
        let snapshot = self.live_entries();
        let plan = master::plan(&snapshot);
        let id = |i: usize| format!("n{}", i);

        let nodes: Vec<GraphNode> = snapshot
            .iter()
            .enumerate()
            .map(|(i, entry)| GraphNode {
                id: id(i),
                type_name: entry.key.display_name().to_string(),
                kind: entry.slot.kind().as_str().to_string(),
                state: entry.slot.state().as_str().to_string(),
                sequence: entry.seq,
                dependencies: entry.dependencies.iter().map(|d| d.display_name().to_string()).collect(),
            })
            .collect();

        let mut edges = Vec::new();
        for (i, entry) in snapshot.iter().enumerate() {
            for dep in &entry.dependencies {
                if let Some(j) = snapshot.iter().position(|e| e.key == *dep) {
                    edges.push(GraphEdge { from: id(i), to: id(j) });
                }
            }
        }

        DependencyGraph {
            metadata: GraphMetadata {
                live_count: nodes.len(),
                edge_count: edges.len(),
                has_cycles: plan.has_cycles(),
                exported_at: timestamp(),
                version: GRAPH_VERSION.to_string(),
            },
            teardown_order: plan.order.iter().map(|&i| id(i)).collect(),
            nodes,
            edges,
        }
    }

    /// Render [`dependency_graph`](Self::dependency_graph) with the stock exporter.
    pub fn export_graph(&self, format: ExportFormat) -> SingletonResult<String> {
        DefaultGraphExporter.export(&self.dependency_graph(), format)
    }
}
