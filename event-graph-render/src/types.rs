//! Core types for the event graph renderer library
//!
//! This module defines the rule records the renderer consumes, the geometry
//! primitives shared by the layout and drawing stages, and the error type for
//! the whole pipeline. The renderer is stateless - every run rebuilds all of
//! these from the loaded rule list.

use serde::{Deserialize, Serialize};

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, RenderError>;

/// One event rule as emitted by the rule-compilation step
///
/// Maps an event expression (the trigger) to the routine that runs when the
/// event fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRule {
    /// Identifier of the triggering event (e.g., "order_placed")
    pub event_expression: String,
    /// What happens when the event fires
    pub event_routine: EventRoutine,
}

/// The behavior attached to an event rule
///
/// The rule compiler serializes a Rust enum, so documents in the wild carry
/// exactly one of these keys per rule. The loader is more permissive: zero,
/// one, or both keys may be present, and an absent key simply means that
/// behavior is not defined for the rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRoutine {
    /// Guarded follow-up events, in declaration order
    #[serde(
        rename = "ConditionalScheduling",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub conditional_scheduling: Option<Vec<ConditionalScheduling>>,

    /// Body of state-mutation code executed unconditionally
    #[serde(
        rename = "UnconditionalStateTransition",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub unconditional_state_transition: Option<String>,
}

/// One "if `condition` holds, schedule `follow_up_event`" clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalScheduling {
    /// Name of the event to schedule
    pub follow_up_event: String,
    /// Guard expression as captured from the rule source
    pub condition: String,
}

impl EventRule {
    /// Create a rule with only a conditional-scheduling routine
    pub fn new_conditional_scheduling(
        event_expression: impl Into<String>,
        entries: Vec<ConditionalScheduling>,
    ) -> Self {
        Self {
            event_expression: event_expression.into(),
            event_routine: EventRoutine {
                conditional_scheduling: Some(entries),
                unconditional_state_transition: None,
            },
        }
    }

    /// Create a rule with only an unconditional state transition
    pub fn new_unconditional_state_transition(
        event_expression: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            event_expression: event_expression.into(),
            event_routine: EventRoutine {
                conditional_scheduling: None,
                unconditional_state_transition: Some(body.into()),
            },
        }
    }
}

/// A 2-D layout coordinate in world units (the layout circle has radius 1)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between this point and another
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Angle of the vector from this point to another, in radians
    pub fn angle_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

/// Errors that can occur while building or rendering the event graph
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to parse rule file: {0}")]
    DataFormatError(String),

    #[error("Node not found in layout: {0}")]
    LookupError(String),

    #[error("Failed to build SVG tree: {0}")]
    SvgError(String),

    #[error("Failed to encode PNG: {0}")]
    PngEncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
