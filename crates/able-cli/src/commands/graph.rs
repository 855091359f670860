//! Graph command: print the import edges of the loaded program

use able_loader::{ImportGraph, ImportKind, Program};
use serde::Serialize;

use super::{load_program, CommandContext};
use crate::LoadArgs;

/// JSON form of the import graph
#[derive(Debug, Serialize)]
pub struct GraphReport {
    /// Packages in load order
    pub packages: Vec<String>,
    pub edges: Vec<EdgeReport>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct EdgeReport {
    pub from: String,
    pub to: String,
    pub kind: ImportKind,
}

/// Execute the graph command
pub fn execute(args: &LoadArgs, json: bool, ctx: &CommandContext) -> anyhow::Result<()> {
    let program = load_program(args, ctx)?;
    let graph = ImportGraph::from_program(&program);

    if json {
        ctx.output.print(&serde_json::to_string_pretty(&graph_report(&program, &graph))?);
    } else {
        ctx.output.print(&render_graph(&program, &graph));
    }
    Ok(())
}

pub fn graph_report(program: &Program, graph: &ImportGraph) -> GraphReport {
    GraphReport {
        packages: program.package_names().into_iter().map(String::from).collect(),
        edges: graph
            .edges()
            .into_iter()
            .map(|(from, to, kind)| EdgeReport {
                from: from.to_string(),
                to: to.to_string(),
                kind,
            })
            .collect(),
    }
}

/// Text form: `a -> b` for static imports, `a ~> b (dynamic)` for dynamic
/// ones. Packages without edges are listed on their own.
pub fn render_graph(program: &Program, graph: &ImportGraph) -> String {
    let edges = graph.edges();
    let mut lines: Vec<String> = edges
        .iter()
        .map(|(from, to, kind)| match kind {
            ImportKind::Static => format!("{} -> {}", from, to),
            ImportKind::Dynamic => format!("{} ~> {} (dynamic)", from, to),
        })
        .collect();

    for name in program.package_names() {
        if !edges.iter().any(|(from, to, _)| *from == name || *to == name) {
            lines.push(name.to_string());
        }
    }
    lines.join("\n")
}
