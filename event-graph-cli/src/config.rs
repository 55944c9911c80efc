//! Configuration loading and parsing

use anyhow::{Context, Result};
use event_graph_render::RenderConfig;
use std::fs;
use std::path::Path;

/// Load a renderer configuration from a TOML file
///
/// Missing keys fall back to the library defaults, so a config file only
/// needs to name the settings it overrides.
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: RenderConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    Ok(config)
}
