//! Circular layout
//!
//! Assigns a 2-D position to every node. Nodes sit evenly spaced on the unit
//! circle in graph insertion order, so repeated runs over the same input
//! produce identical positions. An iterative spring layout was considered
//! and rejected; the circular arrangement is the shipped configuration.

use crate::graph::EventGraph;
use crate::types::{Point, RenderError, Result};
use std::collections::HashMap;
use std::f64::consts::TAU;

/// A mapping from node label to position, preserving node order
#[derive(Debug, Clone, Default)]
pub struct Layout {
    order: Vec<String>,
    positions: HashMap<String, Point>,
}

impl Layout {
    /// Position of a node, failing with `LookupError` if the label is absent
    pub fn get(&self, label: &str) -> Result<Point> {
        self.positions
            .get(label)
            .copied()
            .ok_or_else(|| RenderError::LookupError(label.to_string()))
    }

    /// Labels and positions in layout order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Point)> {
        self.order
            .iter()
            .map(move |label| (label.as_str(), self.positions[label]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Place every node of the graph on the unit circle
///
/// Node `i` of `n` lands at angle `2*pi*i/n` starting from the positive x
/// axis. A single node sits at the origin; an empty graph yields an empty
/// layout.
pub fn circular_layout(graph: &EventGraph) -> Layout {
    let n = graph.node_count();
    let mut layout = Layout::default();

    for (i, label) in graph.nodes().enumerate() {
        let position = if n == 1 {
            Point::new(0.0, 0.0)
        } else {
            let angle = TAU * i as f64 / n as f64;
            Point::new(angle.cos(), angle.sin())
        };
        layout.order.push(label.to_string());
        layout.positions.insert(label.to_string(), position);
    }

    log::debug!("Computed circular layout for {} nodes", layout.len());
    layout
}
