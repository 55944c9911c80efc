//! Rule list loading
//!
//! Reads the JSON document produced by the rule-compilation step. Any IO or
//! shape problem is fatal: the pipeline cannot proceed without input.

use crate::types::{EventRule, RenderError, Result};
use std::path::Path;

/// Load an ordered list of event rules from a JSON file
///
/// Source order is preserved because it drives legend numbering downstream.
pub fn load_rules(path: &Path) -> Result<Vec<EventRule>> {
    log::info!("Loading event rules from {:?}", path);

    let content = std::fs::read_to_string(path).map_err(|e| {
        RenderError::DataFormatError(format!("Failed to read rule file {:?}: {}", path, e))
    })?;

    let rules: Vec<EventRule> = serde_json::from_str(&content).map_err(|e| {
        RenderError::DataFormatError(format!("Failed to parse rule file {:?}: {}", path, e))
    })?;

    log::info!("Loaded {} event rules from {:?}", rules.len(), path);
    Ok(rules)
}
