//! Normalized event records handed to the recording sink.
//!
//! Every record carries node ids resolved at emission time; nothing here
//! references live nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Durable node identity as assigned by the identity collaborator.
pub type NodeId = i64;

/// Id used when a node has no known identity.
pub const MISSING_ID: NodeId = -1;

/// A pointer sample inside a movement batch.
///
/// `time_offset` is relative to the batch baseline while pending and is
/// rewritten at flush time to be relative to the flush instant (always <= 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub id: NodeId,
    pub time_offset: f64,
}

/// Whether a movement batch came from mouse or touch input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementSource {
    MouseMove,
    TouchMove,
}

/// A flushed batch of pointer samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementBatch {
    pub positions: Vec<Position>,
    pub source: MovementSource,
}

/// Discrete pointer/touch interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MouseInteraction {
    MouseUp,
    MouseDown,
    Click,
    ContextMenu,
    DblClick,
    Focus,
    Blur,
    TouchStart,
    TouchEnd,
}

impl MouseInteraction {
    pub const ALL: [MouseInteraction; 9] = [
        MouseInteraction::MouseUp,
        MouseInteraction::MouseDown,
        MouseInteraction::Click,
        MouseInteraction::ContextMenu,
        MouseInteraction::DblClick,
        MouseInteraction::Focus,
        MouseInteraction::Blur,
        MouseInteraction::TouchStart,
        MouseInteraction::TouchEnd,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseInteractionRecord {
    #[serde(rename = "type")]
    pub kind: MouseInteraction,
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportDimensions {
    pub width: u32,
    pub height: u32,
}

/// The observable state of a form control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub text: String,
    pub is_checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    #[serde(flatten)]
    pub value: InputValue,
    pub id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaInteraction {
    Play,
    Pause,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInteractionRecord {
    #[serde(rename = "type")]
    pub kind: MediaInteraction,
    pub id: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAdd {
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRemove {
    pub index: usize,
}

/// A stylesheet rule insertion or removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSheetRuleChange {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adds: Vec<RuleAdd>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removes: Vec<RuleRemove>,
}

impl StyleSheetRuleChange {
    pub fn added(id: NodeId, rule: &str, index: Option<usize>) -> Self {
        Self {
            id,
            adds: vec![RuleAdd {
                rule: rule.to_string(),
                index,
            }],
            removes: Vec::new(),
        }
    }

    pub fn removed(id: NodeId, index: usize) -> Self {
        Self {
            id,
            adds: Vec::new(),
            removes: vec![RuleRemove { index }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChange {
    pub id: NodeId,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub id: NodeId,
    /// Current value per changed attribute; `None` when it was removed.
    pub attributes: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedNode {
    pub parent_id: NodeId,
    pub id: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedNode {
    pub parent_id: NodeId,
    pub next_id: Option<NodeId>,
    pub id: NodeId,
    /// Lower-case tag for elements, `None` for text nodes.
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Serialized structural changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationBatch {
    pub texts: Vec<TextChange>,
    pub attributes: Vec<AttributeChange>,
    pub removes: Vec<RemovedNode>,
    pub adds: Vec<AddedNode>,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
            && self.attributes.is_empty()
            && self.removes.is_empty()
            && self.adds.is_empty()
    }
}

/// Any record the pipeline can produce, tagged by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "data", rename_all = "snake_case")]
pub enum RecordedEvent {
    Mutation(MutationBatch),
    MouseMove(MovementBatch),
    MouseInteraction(MouseInteractionRecord),
    Scroll(ScrollPosition),
    ViewportResize(ViewportDimensions),
    Input(InputRecord),
    MediaInteraction(MediaInteractionRecord),
    StyleSheetRule(StyleSheetRuleChange),
}

impl RecordedEvent {
    /// Short category name, as used in logs and statistics.
    pub fn category(&self) -> &'static str {
        match self {
            RecordedEvent::Mutation(_) => "mutation",
            RecordedEvent::MouseMove(_) => "mouse_move",
            RecordedEvent::MouseInteraction(_) => "mouse_interaction",
            RecordedEvent::Scroll(_) => "scroll",
            RecordedEvent::ViewportResize(_) => "viewport_resize",
            RecordedEvent::Input(_) => "input",
            RecordedEvent::MediaInteraction(_) => "media_interaction",
            RecordedEvent::StyleSheetRule(_) => "style_sheet_rule",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_record_shape() {
        let record = InputRecord {
            value: InputValue {
                text: "***".to_string(),
                is_checked: false,
            },
            id: 4,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "***", "isChecked": false, "id": 4})
        );
    }

    #[test]
    fn test_style_sheet_change_omits_empty_lists() {
        let change = StyleSheetRuleChange::added(3, "a{color:red}", Some(0));
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "adds": [{"rule": "a{color:red}", "index": 0}]})
        );
    }

    #[test]
    fn test_recorded_event_is_tagged() {
        let event = RecordedEvent::ViewportResize(ViewportDimensions {
            width: 800,
            height: 600,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["source"], "viewport_resize");
        assert_eq!(json["data"]["width"], 800);
        assert_eq!(event.category(), "viewport_resize");
    }
}
