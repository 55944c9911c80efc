//! Renderer configuration
//!
//! Minimal configuration for the render pipeline. Defaults reproduce the
//! documented output: rules read from `output.json`, diagram written to
//! `event_graph.png`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the render pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Path to the rule list JSON document
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,

    /// Path of the PNG image to write
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Pixels per world unit (the layout circle has radius 1)
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Node circle radius in world units
    #[serde(default = "default_node_radius")]
    pub node_radius: f64,

    /// Node fill color
    #[serde(default = "default_node_color")]
    pub node_color: String,

    /// Node fill opacity (0.0 - 1.0)
    #[serde(default = "default_node_alpha")]
    pub node_alpha: f64,

    /// Edge stroke color
    #[serde(default = "default_edge_color")]
    pub edge_color: String,

    /// Edge stroke width in pixels
    #[serde(default = "default_edge_width")]
    pub edge_width: f64,

    /// Arrowhead size in pixels
    #[serde(default = "default_arrow_size")]
    pub arrow_size: f64,

    /// Font family for all text
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

fn default_input_path() -> PathBuf {
    PathBuf::from("output.json")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("event_graph.png")
}

fn default_scale() -> f64 {
    240.0
}

fn default_node_radius() -> f64 {
    0.16
}

fn default_node_color() -> String {
    "#000000".to_string()
}

fn default_node_alpha() -> f64 {
    0.4
}

fn default_edge_color() -> String {
    "#000000".to_string()
}

fn default_edge_width() -> f64 {
    4.0
}

fn default_arrow_size() -> f64 {
    20.0
}

fn default_font_family() -> String {
    "serif".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
            scale: default_scale(),
            node_radius: default_node_radius(),
            node_color: default_node_color(),
            node_alpha: default_node_alpha(),
            edge_color: default_edge_color(),
            edge_width: default_edge_width(),
            arrow_size: default_arrow_size(),
            font_family: default_font_family(),
        }
    }
}

impl RenderConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the input rule file
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    /// Builder method: set the output image file
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Builder method: set the pixel scale
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Builder method: set the node radius in world units
    pub fn with_node_radius(mut self, radius: f64) -> Self {
        self.node_radius = radius;
        self
    }
}
