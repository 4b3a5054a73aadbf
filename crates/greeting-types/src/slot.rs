//! Display slot state: presentation style, snapshots, and mutations.
//!
//! A display slot owns two pieces of presentation state: its text content
//! and its visual style (opacity plus a vertical offset). Every change to a
//! slot is expressed as a [`SlotMutation`] so that renderers, observers, and
//! tests all see the same sequence of events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::TransitionId;

/// Visual state of a display slot.
///
/// Opacity is either 0 (hidden) or 1 (visible). The vertical offset is in
/// pixels; a positive value pushes the element down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SlotStyle {
    /// Opacity, 0 or 1.
    pub opacity: u8,
    /// Vertical translation in pixels.
    pub translate_y_px: i32,
}

impl SlotStyle {
    /// Fully visible, resting position.
    pub const VISIBLE: Self = Self {
        opacity: 1,
        translate_y_px: 0,
    };

    /// Transparent and shifted down by `offset_px`.
    pub const fn hidden(offset_px: i32) -> Self {
        Self {
            opacity: 0,
            translate_y_px: offset_px,
        }
    }

    /// Whether the style renders the element visibly.
    pub const fn is_visible(self) -> bool {
        self.opacity > 0
    }

    /// Render the style as an inline CSS declaration list.
    pub fn to_css(self) -> String {
        format!(
            "opacity: {}; transform: translateY({}px)",
            self.opacity, self.translate_y_px
        )
    }
}

impl Default for SlotStyle {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// The kind of change applied to a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationKind {
    /// Change only the visual style (first half of a transition).
    Hide {
        /// Style to apply.
        style: SlotStyle,
    },
    /// Replace the text and style together (second half of a transition).
    Reveal {
        /// New text content.
        text: String,
        /// Style to apply.
        style: SlotStyle,
    },
}

/// A single change to a display slot, tagged with the transition it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SlotMutation {
    /// The updater invocation that produced this mutation.
    pub transition: TransitionId,
    /// What changed.
    pub kind: MutationKind,
}

impl SlotMutation {
    /// Build a hide mutation.
    pub const fn hide(transition: TransitionId, style: SlotStyle) -> Self {
        Self {
            transition,
            kind: MutationKind::Hide { style },
        }
    }

    /// Build a reveal mutation.
    pub const fn reveal(transition: TransitionId, text: String, style: SlotStyle) -> Self {
        Self {
            transition,
            kind: MutationKind::Reveal { text, style },
        }
    }
}

/// Point-in-time view of a display slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SlotSnapshot {
    /// Stable identifier the slot is registered under.
    pub slot_id: String,
    /// Current text content (empty until the first reveal).
    pub text: String,
    /// Current visual style.
    pub style: SlotStyle,
    /// Number of mutations applied so far.
    pub revision: u64,
    /// The transition that produced the latest mutation.
    pub last_transition: Option<TransitionId>,
    /// When the latest mutation was applied.
    pub updated_at: Option<DateTime<Utc>>,
}

impl SlotSnapshot {
    /// An untouched slot: empty text, visible, revision 0.
    pub fn new(slot_id: impl Into<String>) -> Self {
        Self {
            slot_id: slot_id.into(),
            text: String::new(),
            style: SlotStyle::VISIBLE,
            revision: 0,
            last_transition: None,
            updated_at: None,
        }
    }

    /// Apply a mutation in place.
    ///
    /// A reveal replaces text and style in one step, so a reader never sees
    /// a new text with the hidden style or the reverse.
    pub fn apply(&mut self, mutation: &SlotMutation, at: DateTime<Utc>) {
        match &mutation.kind {
            MutationKind::Hide { style } => {
                self.style = *style;
            }
            MutationKind::Reveal { text, style } => {
                text.clone_into(&mut self.text);
                self.style = *style;
            }
        }
        self.revision = self.revision.saturating_add(1);
        self.last_transition = Some(mutation.transition);
        self.updated_at = Some(at);
    }
}

/// Message published to observers after each slot mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SlotUpdate {
    /// The mutation that was applied.
    pub mutation: SlotMutation,
    /// Slot state after the mutation.
    pub snapshot: SlotSnapshot,
}
