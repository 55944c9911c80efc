//! Event graph construction
//!
//! Derives a directed multigraph of event-to-event relationships from the
//! rule list. Node identity is the normalized event expression, so two rules
//! whose expressions normalize equal collapse into one node (accepted
//! identity-collision policy, not an error).

use crate::types::EventRule;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// The internal event sink node (normalized form)
pub const EVENTS_INT: &str = "Events\nInt";
/// The external event source node (normalized form)
pub const EVENTS_EXT: &str = "Events\nExt";
/// Weight assigned to every scheduling/cancellation edge
pub const EDGE_WEIGHT: f64 = 4.0;

/// Normalize an event expression into its node identity
///
/// Underscores become line breaks (producing a multi-line label) and each
/// word is title-cased: a letter is uppercased when the preceding character
/// is not a letter, lowercased otherwise. The function is pure and
/// idempotent.
pub fn normalize_event(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut prev_alpha = false;
    for ch in expression.chars() {
        if ch == '_' {
            out.push('\n');
            prev_alpha = false;
        } else if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// A directed multigraph of event nodes and scheduling edges
///
/// Wraps a `petgraph::Graph` (which permits parallel edges) together with a
/// label-to-index map so each label is inserted once and node iteration
/// follows insertion order. Insertion order matters: the circular layout
/// places nodes in iteration order, and output must be stable across runs.
#[derive(Debug, Default)]
pub struct EventGraph {
    graph: Graph<String, f64>,
    indices: HashMap<String, NodeIndex>,
}

impl EventGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node if its label is not already present
    pub fn ensure_node(&mut self, label: &str) -> NodeIndex {
        match self.indices.get(label) {
            Some(&index) => index,
            None => {
                let index = self.graph.add_node(label.to_string());
                self.indices.insert(label.to_string(), index);
                index
            }
        }
    }

    /// Add a directed edge, creating endpoint nodes as needed
    ///
    /// Parallel edges between the same pair are kept distinct.
    pub fn add_edge(&mut self, source: &str, target: &str, weight: f64) {
        let source = self.ensure_node(source);
        let target = self.ensure_node(target);
        self.graph.add_edge(source, target, weight);
    }

    pub fn contains_node(&self, label: &str) -> bool {
        self.indices.contains_key(label)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node labels in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(move |i| self.graph[i].as_str())
    }

    /// All edges as (source label, target label, weight), in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.graph.edge_references().map(move |e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
                *e.weight(),
            )
        })
    }

    /// Number of parallel edges from `source` to `target`
    pub fn edge_count_between(&self, source: &str, target: &str) -> usize {
        self.edges()
            .filter(|(s, t, _)| *s == source && *t == target)
            .count()
    }
}

/// Build the event graph from the ordered rule list
///
/// Every conditional-scheduling entry contributes two edges: source to
/// follow-up, and follow-up into the internal event sink. The fixed
/// external-to-internal cancellation edge is added exactly once regardless
/// of input content.
pub fn build_graph(rules: &[EventRule]) -> EventGraph {
    let mut graph = EventGraph::new();

    for rule in rules {
        let Some(entries) = &rule.event_routine.conditional_scheduling else {
            continue;
        };
        let source = normalize_event(&rule.event_expression);
        for entry in entries {
            let follow_up = normalize_event(&entry.follow_up_event);
            graph.ensure_node(&source);
            graph.ensure_node(&follow_up);
            graph.add_edge(&source, &follow_up, EDGE_WEIGHT);
            graph.add_edge(&follow_up, EVENTS_INT, EDGE_WEIGHT);
        }
    }

    graph.add_edge(EVENTS_EXT, EVENTS_INT, EDGE_WEIGHT);

    log::debug!(
        "Built event graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConditionalScheduling, EventRule};

    fn scheduling(follow_up: &str, condition: &str) -> ConditionalScheduling {
        ConditionalScheduling {
            follow_up_event: follow_up.to_string(),
            condition: condition.to_string(),
        }
    }

    #[test]
    fn test_normalize_event() {
        assert_eq!(normalize_event("order_placed"), "Order\nPlaced");
        assert_eq!(normalize_event("events_int"), "Events\nInt");
        assert_eq!(normalize_event("single"), "Single");
        assert_eq!(normalize_event("retry2_sent"), "Retry2\nSent");
    }

    #[test]
    fn test_normalize_event_is_idempotent() {
        for raw in ["order_placed", "events_ext", "a_b_c", "ALL_CAPS"] {
            let once = normalize_event(raw);
            assert_eq!(normalize_event(&once), once);
        }
    }

    #[test]
    fn test_empty_input_has_only_fixed_edge() {
        let graph = build_graph(&[]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains_node(EVENTS_EXT));
        assert!(graph.contains_node(EVENTS_INT));
        assert_eq!(graph.edge_count_between(EVENTS_EXT, EVENTS_INT), 1);
    }

    #[test]
    fn test_single_rule_graph_shape() {
        let rules = vec![EventRule::new_conditional_scheduling(
            "order_placed",
            vec![scheduling("order_shipped", "self . is_paid")],
        )];
        let graph = build_graph(&rules);

        let nodes: Vec<&str> = graph.nodes().collect();
        assert_eq!(
            nodes,
            vec!["Order\nPlaced", "Order\nShipped", EVENTS_INT, EVENTS_EXT]
        );
        assert_eq!(graph.edge_count_between("Order\nPlaced", "Order\nShipped"), 1);
        assert_eq!(graph.edge_count_between("Order\nShipped", EVENTS_INT), 1);
        assert_eq!(graph.edge_count_between(EVENTS_EXT, EVENTS_INT), 1);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_every_follow_up_flows_into_sink() {
        let rules = vec![
            EventRule::new_conditional_scheduling(
                "a",
                vec![scheduling("b", "x"), scheduling("c", "y")],
            ),
            EventRule::new_conditional_scheduling("b", vec![scheduling("c", "z")]),
        ];
        let graph = build_graph(&rules);
        for follow_up in ["B", "C"] {
            assert!(graph.contains_node(follow_up));
            assert!(graph.edge_count_between(follow_up, EVENTS_INT) >= 1);
        }
    }

    #[test]
    fn test_parallel_edges_are_kept() {
        // Two entries linking the same pair produce two distinct edges.
        let rules = vec![EventRule::new_conditional_scheduling(
            "a",
            vec![scheduling("b", "x"), scheduling("b", "y")],
        )];
        let graph = build_graph(&rules);
        assert_eq!(graph.edge_count_between("A", "B"), 2);
        assert_eq!(graph.edge_count_between("B", EVENTS_INT), 2);
    }

    #[test]
    fn test_colliding_expressions_merge() {
        let rules = vec![
            EventRule::new_conditional_scheduling("order_placed", vec![scheduling("done", "x")]),
            EventRule::new_conditional_scheduling("Order_Placed", vec![scheduling("done", "y")]),
        ];
        let graph = build_graph(&rules);
        // Both raw spellings normalize to "Order\nPlaced" and share one node.
        assert_eq!(
            graph.nodes().filter(|n| *n == "Order\nPlaced").count(),
            1
        );
        assert_eq!(graph.edge_count_between("Order\nPlaced", "Done"), 2);
    }

    #[test]
    fn test_rule_without_scheduling_adds_nothing() {
        let rules = vec![EventRule::new_unconditional_state_transition(
            "tick",
            "{ self . count += 1 ; Ok(()) }",
        )];
        let graph = build_graph(&rules);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(!graph.contains_node("Tick"));
    }
}
