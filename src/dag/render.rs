// src/dag/render.rs

//! Graphviz rendering of a schedule's current state.

use std::collections::HashMap;
use std::fmt;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{Graph, NodeIndex};

use crate::dag::schedule::Schedule;
use crate::types::Combinator;

/// Node weight for the rendered graph.
struct RenderNode {
    label: String,
    completed: bool,
    kind: Combinator,
}

impl fmt::Display for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Render tasks and `predecessor -> successor` edges as a DOT digraph.
///
/// Completed tasks are filled green and pending ones red; OR tasks are drawn
/// as diamonds, AND tasks as boxes. Nodes and edges are emitted in sorted
/// order so the output is stable for a given state.
pub fn to_dot<S>(schedule: &S) -> String
where
    S: Schedule,
    S::Task: fmt::Display,
{
    let graph = schedule.graph();

    let mut tasks: Vec<&S::Task> = graph.tasks().collect();
    tasks.sort();

    let mut rendered: Graph<RenderNode, &'static str> = Graph::new();
    let mut index: HashMap<&S::Task, NodeIndex> = HashMap::with_capacity(tasks.len());

    for task in tasks {
        let node = RenderNode {
            label: task.to_string(),
            completed: schedule.is_completed(task),
            kind: schedule.kind_of(task),
        };
        index.insert(task, rendered.add_node(node));
    }

    let mut edges: Vec<(&S::Task, &S::Task)> = graph.edges().collect();
    edges.sort();

    for (pred, succ) in edges {
        rendered.add_edge(index[pred], index[succ], "");
    }

    let dot = Dot::with_attr_getters(
        &rendered,
        &[Config::EdgeNoLabel],
        &|_, _| String::new(),
        &|_, (_, node)| node_attributes(node),
    );

    format!("{dot}")
}

fn node_attributes(node: &RenderNode) -> String {
    let fill = if node.completed { "palegreen" } else { "lightcoral" };
    let shape = match node.kind {
        Combinator::And => "box",
        Combinator::Or => "diamond",
    };
    format!("shape = {shape}, style = filled, fillcolor = {fill}")
}
