//! Legend formatting
//!
//! Produces every annotation the renderer draws on top of the graph: tilde
//! markers with `i_k` indices on conditional edges, the numbered condition
//! list, `Δ_j` labels under follow-up nodes, and the state-transition text
//! rows matched to those labels.
//!
//! Indices are threaded through each pass as explicit accumulators. The
//! condition index `k` increments once per (rule, entry) pair globally in
//! source order, never per node. The delta map is last-write-wins when the
//! same follow-up name repeats; that aliasing is documented behavior and
//! asserted by tests, not a bug to fix here.

use crate::graph::normalize_event;
use crate::layout::Layout;
use crate::types::{EventRule, Result};
use std::collections::HashMap;

/// Horizontal text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// One piece of text placed in world coordinates
///
/// Sizes are in world units (the layout circle has radius 1); the renderer
/// multiplies by the pixel scale. Rotation is counter-clockwise degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub size: f64,
    pub color: String,
    pub halign: HAlign,
    pub rotation: f64,
}

impl TextItem {
    fn label(x: f64, y: f64, text: impl Into<String>, halign: HAlign) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            size: TEXT_SIZE,
            color: TEXT_COLOR.to_string(),
            halign,
            rotation: 0.0,
        }
    }
}

/// Base size of annotation text, in world units
pub const TEXT_SIZE: f64 = 0.05;
/// Size of the tilde condition marker
const MARKER_SIZE: f64 = 0.15;
const MARKER_COLOR: &str = "#999999";
const TEXT_COLOR: &str = "#000000";

/// Vertical spacing between legend rows
const ROW_STEP: f64 = 0.07;
/// Right-aligned condition list column
const CONDITION_COLUMN_X: f64 = 0.95;
const CONDITION_COLUMN_Y: f64 = -1.3;
/// Offset of the `Δ` label below its follow-up node
const DELTA_LABEL_OFFSET: f64 = 0.22;
/// Left-aligned state-transition columns
const TRANSITION_INDEX_X: f64 = 1.2;
const TRANSITION_TEXT_X: f64 = 1.25;
const TRANSITION_COLUMN_Y: f64 = 1.05;
/// Offset of the condition index label below the edge midpoint
const CONDITION_INDEX_OFFSET: f64 = 0.05;

/// Normalize a guard condition for display
///
/// Line breaks collapse to spaces and the `self . ` receiver prefix the
/// rule compiler emits is dropped.
pub fn clean_condition(condition: &str) -> String {
    let text = condition.replace('\n', " ").replace("self . ", " ");
    consolidate_whitespace(&text).trim().to_string()
}

/// Best-effort pretty-printer for a state-transition body
///
/// This is a fixed table of substitutions, not a parser: trim the trailing
/// `Ok(())` return and closing brace (character-set trim), trim the leading
/// brace, flatten line breaks, then re-break after statement separators and
/// braces, collapse space runs, and drop the `self . ` receiver and
/// ` . clone()` calls. Returns one string per emitted row; the tail after
/// the final break is not emitted. Ill-formed bodies degrade to odd rows,
/// never a panic.
pub fn format_transition_body(body: &str) -> Vec<String> {
    let cleaned = body
        .trim_end_matches(|c| "Ok(())\n}".contains(c))
        .trim_start_matches(|c| "{\n".contains(c))
        .replace('\n', " ")
        .replace(';', ";\n")
        .replace('{', "{\n")
        .replace('}', "}\n")
        .replace(',', ",\n");
    let cleaned = consolidate_whitespace(&cleaned)
        .replace("self . ", " ")
        .replace(" . clone()", "");

    let rows = cleaned.matches('\n').count();
    cleaned.split('\n').take(rows).map(str::to_string).collect()
}

fn consolidate_whitespace(input: &str) -> String {
    let mut text = input.to_string();
    while text.contains("  ") {
        text = text.replace("  ", " ");
    }
    text
}

/// Condition annotations: edge markers, `i_k` indices, and the legend list
///
/// `k` starts at 0 and increments once per (rule, entry) pair in source
/// order across all rules.
pub fn condition_legends(rules: &[EventRule], layout: &Layout) -> Result<Vec<TextItem>> {
    let mut items = Vec::new();
    let mut index: usize = 0;

    for rule in rules {
        let Some(entries) = &rule.event_routine.conditional_scheduling else {
            continue;
        };
        for entry in entries {
            let source = layout.get(&normalize_event(&rule.event_expression))?;
            let target = layout.get(&normalize_event(&entry.follow_up_event))?;
            let mid = source.midpoint(target);
            // Rotate the marker perpendicular to the edge.
            let angle = (source.y - target.y)
                .atan2(source.x - target.x)
                .to_degrees()
                + 90.0;

            items.push(TextItem {
                x: mid.x,
                y: mid.y,
                text: "~".to_string(),
                size: MARKER_SIZE,
                color: MARKER_COLOR.to_string(),
                halign: HAlign::Center,
                rotation: angle,
            });
            items.push(TextItem::label(
                mid.x,
                mid.y - CONDITION_INDEX_OFFSET,
                format!("i{}", index),
                HAlign::Center,
            ));
            items.push(TextItem::label(
                CONDITION_COLUMN_X,
                CONDITION_COLUMN_Y - ROW_STEP * index as f64,
                format!("i{}: {}", index, clean_condition(&entry.condition)),
                HAlign::Right,
            ));
            index += 1;
        }
    }

    Ok(items)
}

/// Delta labels under follow-up nodes, plus the name-to-index map
///
/// Iterates the same (rule, entry) ordering as `condition_legends`. The map
/// keys are the raw follow-up event strings; when a name repeats, the later
/// index wins.
pub fn delta_indices(
    rules: &[EventRule],
    layout: &Layout,
) -> Result<(Vec<TextItem>, HashMap<String, usize>)> {
    let mut items = Vec::new();
    let mut map = HashMap::new();
    let mut index: usize = 0;

    for rule in rules {
        let Some(entries) = &rule.event_routine.conditional_scheduling else {
            continue;
        };
        for entry in entries {
            let position = layout.get(&normalize_event(&entry.follow_up_event))?;
            items.push(TextItem::label(
                position.x,
                position.y - DELTA_LABEL_OFFSET,
                format!("Δ{}", index),
                HAlign::Center,
            ));
            map.insert(entry.follow_up_event.clone(), index);
            index += 1;
        }
    }

    Ok((items, map))
}

/// State-transition rows in the side column
///
/// A rule qualifies when it carries an unconditional state transition and
/// its raw event expression appears in the delta map. Each qualifying rule
/// emits its matched `Δ_j` label followed by one row per pretty-printed
/// line; the row counter is shared across all qualifying rules.
pub fn transition_legends(
    rules: &[EventRule],
    deltas: &HashMap<String, usize>,
) -> Vec<TextItem> {
    let mut items = Vec::new();
    let mut row: usize = 0;

    for rule in rules {
        let Some(body) = &rule.event_routine.unconditional_state_transition else {
            continue;
        };
        let Some(&index) = deltas.get(&rule.event_expression) else {
            continue;
        };

        items.push(TextItem::label(
            TRANSITION_INDEX_X,
            TRANSITION_COLUMN_Y - ROW_STEP * row as f64,
            format!("Δ{}", index),
            HAlign::Left,
        ));
        let lines = format_transition_body(body);
        for (i, line) in lines.iter().enumerate() {
            items.push(TextItem::label(
                TRANSITION_TEXT_X,
                TRANSITION_COLUMN_Y - ROW_STEP * (row + i) as f64,
                line.clone(),
                HAlign::Left,
            ));
        }
        row += lines.len();
    }

    items
}

/// Run all three legend passes and concatenate their output
pub fn build_legends(rules: &[EventRule], layout: &Layout) -> Result<Vec<TextItem>> {
    let mut items = condition_legends(rules, layout)?;
    let (delta_items, delta_map) = delta_indices(rules, layout)?;
    items.extend(delta_items);
    items.extend(transition_legends(rules, &delta_map));
    log::debug!("Formatted {} legend text items", items.len());
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::layout::circular_layout;
    use crate::types::{ConditionalScheduling, EventRule};

    fn scheduling(follow_up: &str, condition: &str) -> ConditionalScheduling {
        ConditionalScheduling {
            follow_up_event: follow_up.to_string(),
            condition: condition.to_string(),
        }
    }

    fn layout_for(rules: &[EventRule]) -> Layout {
        circular_layout(&build_graph(rules))
    }

    #[test]
    fn test_clean_condition_strips_receiver() {
        assert_eq!(clean_condition("self . is_paid"), "is_paid");
        assert_eq!(
            clean_condition("self . count\n> 3 && self . armed"),
            "count > 3 && armed"
        );
        assert_eq!(clean_condition("true"), "true");
    }

    #[test]
    fn test_condition_indices_follow_source_order() {
        let rules = vec![
            EventRule::new_conditional_scheduling(
                "a",
                vec![scheduling("b", "one"), scheduling("c", "two")],
            ),
            EventRule::new_conditional_scheduling("b", vec![scheduling("c", "three")]),
        ];
        let items = condition_legends(&rules, &layout_for(&rules)).unwrap();
        let list_rows: Vec<&str> = items
            .iter()
            .filter(|item| item.halign == HAlign::Right)
            .map(|item| item.text.as_str())
            .collect();
        assert_eq!(list_rows, vec!["i0: one", "i1: two", "i2: three"]);
        // Each entry contributes marker + index + list row.
        assert_eq!(items.len(), 9);
    }

    #[test]
    fn test_condition_legend_scenario() {
        let rules = vec![EventRule::new_conditional_scheduling(
            "order_placed",
            vec![scheduling("order_shipped", "self . is_paid")],
        )];
        let items = condition_legends(&rules, &layout_for(&rules)).unwrap();
        assert!(items.iter().any(|item| item.text == "i0: is_paid"));
        let marker = items.iter().find(|item| item.text == "~").unwrap();
        assert_eq!(marker.color, "#999999");
        assert!(marker.rotation != 0.0);
    }

    #[test]
    fn test_empty_scheduling_list_emits_nothing() {
        // An empty entry list creates no nodes, so no position lookups
        // may happen either.
        let rules = vec![EventRule::new_conditional_scheduling("orphan", vec![])];
        let items = condition_legends(&rules, &layout_for(&rules)).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_condition_legend_missing_node_is_lookup_error() {
        let rules = vec![EventRule::new_conditional_scheduling(
            "a",
            vec![scheduling("b", "x")],
        )];
        // Layout built from an unrelated graph lacks the rule's nodes.
        let empty_layout = layout_for(&[]);
        let err = condition_legends(&rules, &empty_layout).unwrap_err();
        assert!(matches!(err, crate::types::RenderError::LookupError(_)));
    }

    #[test]
    fn test_delta_map_last_write_wins() {
        let rules = vec![
            EventRule::new_conditional_scheduling("a", vec![scheduling("shared", "x")]),
            EventRule::new_conditional_scheduling("b", vec![scheduling("shared", "y")]),
        ];
        let (items, map) = delta_indices(&rules, &layout_for(&rules)).unwrap();
        // Both entries emit a label, but the map keeps only the later index.
        assert_eq!(items.len(), 2);
        assert_eq!(map.get("shared"), Some(&1));
    }

    #[test]
    fn test_format_transition_body_rows() {
        let body = "{\nself . status = Pending ;\nself . retries = 0 ;\nOk(())\n}";
        let lines = format_transition_body(body);
        // Receiver removal replaces "self . " with a single space, so rows
        // keep a leading space (two when the receiver followed a space).
        assert_eq!(lines, vec![" status = Pending ;", "  retries = 0 ;"]);
    }

    #[test]
    fn test_format_transition_body_drops_clone_calls() {
        let body = "{\nself . last = self . current . clone() ;\nOk(())\n}";
        let lines = format_transition_body(body);
        assert_eq!(lines, vec![" last =  current ;"]);
    }

    #[test]
    fn test_format_transition_body_ill_formed_does_not_panic() {
        assert!(format_transition_body("").is_empty());
        assert!(format_transition_body("Ok(())").is_empty());
        // No trailing separator: the tail is dropped, matching row counting.
        assert!(format_transition_body("just words").is_empty());
        let lines = format_transition_body("a ; b");
        assert_eq!(lines, vec!["a ;"]);
    }

    #[test]
    fn test_transition_legend_matches_delta_index() {
        let rules = vec![
            EventRule::new_conditional_scheduling(
                "order_placed",
                vec![scheduling("order_shipped", "self . is_paid")],
            ),
            EventRule::new_unconditional_state_transition(
                "order_shipped",
                "{\nself . shipped = true ;\nself . pending = false ;\nOk(())\n}",
            ),
        ];
        let layout = layout_for(&rules);
        let (_, map) = delta_indices(&rules, &layout).unwrap();
        let items = transition_legends(&rules, &map);

        assert_eq!(items[0].text, "Δ0");
        assert_eq!(items[0].x, TRANSITION_INDEX_X);
        let rows: Vec<&str> = items[1..].iter().map(|item| item.text.as_str()).collect();
        assert_eq!(rows, vec![" shipped = true ;", "  pending = false ;"]);
    }

    #[test]
    fn test_transition_legend_skips_unmatched_rules() {
        let rules = vec![EventRule::new_unconditional_state_transition(
            "never_scheduled",
            "{\nself . x = 1 ;\nOk(())\n}",
        )];
        let items = transition_legends(&rules, &HashMap::new());
        assert!(items.is_empty());
    }

    #[test]
    fn test_transition_rows_share_running_counter() {
        let rules = vec![
            EventRule::new_conditional_scheduling(
                "start",
                vec![scheduling("first", "a"), scheduling("second", "b")],
            ),
            EventRule::new_unconditional_state_transition(
                "first",
                "{\nself . one = 1 ;\nOk(())\n}",
            ),
            EventRule::new_unconditional_state_transition(
                "second",
                "{\nself . two = 2 ;\nOk(())\n}",
            ),
        ];
        let layout = layout_for(&rules);
        let (_, map) = delta_indices(&rules, &layout).unwrap();
        let items = transition_legends(&rules, &map);

        // First rule emits Δ0 + 1 row at row 0; second emits Δ1 + 1 row at row 1.
        assert_eq!(items[0].text, "Δ0");
        assert_eq!(items[0].y, TRANSITION_COLUMN_Y);
        assert_eq!(items[2].text, "Δ1");
        assert!((items[2].y - (TRANSITION_COLUMN_Y - ROW_STEP)).abs() < 1e-12);
    }
}
