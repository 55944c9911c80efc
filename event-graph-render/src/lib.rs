//! Event Graph Renderer Library
//!
//! Renders a static diagram of an event-driven rule system. The input is a
//! JSON list of event rules, each mapping an event expression to a routine
//! that may conditionally schedule follow-up events or unconditionally
//! mutate state. The output is a single PNG image.
//!
//! # Architecture
//!
//! One linear pipeline, no persistent state:
//! - Parse the rule list (`loader`)
//! - Build a directed multigraph of event relationships (`graph`)
//! - Place nodes on a circle (`layout`)
//! - Format condition and state-transition legends (`legend`)
//! - Draw everything as SVG and rasterize to PNG (`render`)
//!
//! The library does NOT execute, simulate, or validate the rules, and it
//! does not parse the rule-definition language; state-transition bodies are
//! cleaned with a fixed table of text substitutions, nothing more.
//!
//! # Example Usage
//!
//! ```no_run
//! use event_graph_render::{render_file, RenderConfig};
//!
//! let config = RenderConfig::new()
//!     .with_input("output.json")
//!     .with_output("event_graph.png");
//!
//! render_file(&config).unwrap();
//! ```

// Public modules
pub mod config;
pub mod graph;
pub mod layout;
pub mod legend;
pub mod loader;
pub mod render;
pub mod types;

// Re-export main types for convenience
pub use config::RenderConfig;
pub use graph::{build_graph, normalize_event, EventGraph, EVENTS_EXT, EVENTS_INT};
pub use layout::{circular_layout, Layout};
pub use legend::{build_legends, TextItem};
pub use loader::load_rules;
pub use types::{ConditionalScheduling, EventRoutine, EventRule, Point, RenderError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render an already-loaded rule list to the configured output image
pub fn render_rules(rules: &[EventRule], config: &RenderConfig) -> Result<()> {
    let graph = graph::build_graph(rules);
    let layout = layout::circular_layout(&graph);
    let legends = legend::build_legends(rules, &layout)?;
    let svg = render::render_svg(&graph, &layout, &legends, config)?;
    render::write_png(&svg, &config.output_path, config)
}

/// Run the whole pipeline: load rules, build, lay out, annotate, render
pub fn render_file(config: &RenderConfig) -> Result<()> {
    let rules = loader::load_rules(&config.input_path)?;
    render_rules(&rules, config)
}
