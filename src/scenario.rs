//! Scripted interaction scenarios.
//!
//! A scenario describes an initial document and a list of timed steps, each
//! one host action (a pointer move, a keystroke, a script assignment, a
//! stylesheet edit). The CLI replays scenarios against a recorder; tests use
//! them to drive end-to-end runs.
//!
//! ```json
//! {
//!   "nodes": [{ "id": "html", "tag": "html", "children": [
//!     { "id": "name", "tag": "input", "attributes": { "type": "text" } }
//!   ]}],
//!   "steps": [
//!     { "at": 0, "action": "pointer", "kind": "mousemove", "target": "name", "x": 4, "y": 8 },
//!     { "at": 120, "action": "input", "target": "name", "value": "Ada" }
//!   ]
//! }
//! ```

use crate::core::timer::{ms_duration, ManualScheduler, Scheduler};
use crate::error::{RecordError, RecordResult};
use crate::host::document::Document;
use crate::host::events::EventKind;
use crate::host::node::NodeRef;
use crate::host::stylesheet::StyleSheet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Initial tree, appended under the document node.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// An element (with `tag`) or a text node (with `text`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Name used by steps to refer to this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
    /// Rules of a stylesheet owned by this element
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Milliseconds from the start of the scenario
    pub at: f64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Pointer {
        kind: EventKind,
        target: String,
        x: f64,
        y: f64,
    },
    /// A keystroke-level edit
    Input { target: String, value: String },
    /// End of an edit
    Commit { target: String },
    Check { target: String, checked: bool },
    Select { target: String, index: i64 },
    /// Script assignment of `value`
    SetValue { target: String, value: String },
    /// Script assignment of `checked`
    SetChecked { target: String, checked: bool },
    /// Scroll an element, or the document when `target` is absent
    Scroll {
        #[serde(default)]
        target: Option<String>,
        x: f64,
        y: f64,
    },
    Resize { width: u32, height: u32 },
    Play { target: String },
    Pause { target: String },
    InsertRule {
        target: String,
        rule: String,
        #[serde(default)]
        index: Option<usize>,
    },
    DeleteRule { target: String, index: usize },
    Append { parent: String, node: NodeSpec },
    Remove { target: String },
    SetAttribute {
        target: String,
        name: String,
        value: String,
    },
    SetText { target: String, text: String },
}

/// Named nodes of a built scenario.
#[derive(Debug, Default)]
pub struct SceneNodes {
    nodes: HashMap<String, NodeRef>,
}

impl SceneNodes {
    pub fn get(&self, name: &str) -> RecordResult<&NodeRef> {
        self.nodes
            .get(name)
            .ok_or_else(|| RecordError::Scenario(format!("unknown node '{name}'")))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> RecordResult<Self> {
        serde_json::from_str(json).map_err(|e| RecordError::Scenario(e.to_string()))
    }

    pub fn load(path: &Path) -> RecordResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RecordError::Scenario(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    /// Build the initial tree into `doc`.
    pub fn build(&self, doc: &Document) -> RecordResult<SceneNodes> {
        let mut scene = SceneNodes::default();
        for spec in &self.nodes {
            let node = build_node(doc, spec, &mut scene)?;
            doc.append_child(doc.root(), &node);
        }
        doc.flush_mutations()?;
        Ok(scene)
    }

    /// Time of the last step, in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.steps.iter().map(|step| step.at).fold(0.0, f64::max)
    }

    /// Replay every step on a virtual clock, then let `settle` elapse so
    /// pending flushes fire.
    pub fn run_virtual(
        &self,
        doc: &Document,
        scene: &mut SceneNodes,
        clock: &ManualScheduler,
        settle: Duration,
    ) -> RecordResult<()> {
        let mut steps: Vec<&Step> = self.steps.iter().collect();
        steps.sort_by(|a, b| a.at.total_cmp(&b.at));

        for step in steps {
            let wait = step.at - clock.now();
            if wait > 0.0 {
                clock.advance_ms(wait)?;
            }
            apply(doc, scene, &step.action)?;
        }
        clock.advance(settle)
    }
}

fn build_node(doc: &Document, spec: &NodeSpec, scene: &mut SceneNodes) -> RecordResult<NodeRef> {
    let node = match (&spec.tag, &spec.text) {
        (Some(tag), _) => {
            let attributes: Vec<(&str, &str)> = spec
                .attributes
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect();
            doc.create_element_with(tag, &attributes)
        }
        (None, Some(text)) => doc.create_text(text),
        (None, None) => {
            return Err(RecordError::Scenario(
                "node needs either a tag or text".to_string(),
            ))
        }
    };

    for child in &spec.children {
        let child = build_node(doc, child, scene)?;
        doc.append_child(&node, &child);
    }
    if !spec.rules.is_empty() {
        let sheet = doc.create_style_sheet(&node);
        for rule in &spec.rules {
            doc.insert_rule(&sheet, rule, Some(sheet.len()))?;
        }
    }
    if let Some(ref id) = spec.id {
        scene.nodes.insert(id.clone(), node.clone());
    }
    Ok(node)
}

/// Perform one action, then deliver any structural changes it caused.
pub fn apply(doc: &Document, scene: &mut SceneNodes, action: &Action) -> RecordResult<()> {
    match action {
        Action::Pointer { kind, target, x, y } => doc.pointer(*kind, scene.get(target)?, *x, *y)?,
        Action::Input { target, value } => doc.user_input(scene.get(target)?, value)?,
        Action::Commit { target } => doc.user_commit(scene.get(target)?)?,
        Action::Check { target, checked } => doc.user_check(scene.get(target)?, *checked)?,
        Action::Select { target, index } => doc.user_select(scene.get(target)?, *index)?,
        Action::SetValue { target, value } => doc.set_value(scene.get(target)?, value)?,
        Action::SetChecked { target, checked } => doc.set_checked(scene.get(target)?, *checked)?,
        Action::Scroll { target, x, y } => {
            let target = match target {
                Some(name) => scene.get(name)?.clone(),
                None => doc.root().clone(),
            };
            doc.scroll_to(&target, *x, *y)?
        }
        Action::Resize { width, height } => doc.resize(*width, *height)?,
        Action::Play { target } => doc.play(scene.get(target)?)?,
        Action::Pause { target } => doc.pause(scene.get(target)?)?,
        Action::InsertRule {
            target,
            rule,
            index,
        } => {
            let sheet = style_sheet(scene.get(target)?)?;
            doc.insert_rule(&sheet, rule, *index)?;
        }
        Action::DeleteRule { target, index } => {
            let sheet = style_sheet(scene.get(target)?)?;
            doc.delete_rule(&sheet, *index)?;
        }
        Action::Append { parent, node } => {
            let parent = scene.get(parent)?.clone();
            let node = build_node(doc, node, scene)?;
            doc.append_child(&parent, &node);
        }
        Action::Remove { target } => {
            let node = scene.get(target)?.clone();
            if let Some(parent) = node.parent() {
                doc.remove_child(&parent, &node);
            }
        }
        Action::SetAttribute {
            target,
            name,
            value,
        } => doc.set_attribute(scene.get(target)?, name, value),
        Action::SetText { target, text } => doc.set_text(scene.get(target)?, text),
    }
    doc.flush_mutations()
}

fn style_sheet(node: &NodeRef) -> RecordResult<Rc<StyleSheet>> {
    node.sheet()
        .ok_or_else(|| RecordError::Scenario("node has no stylesheet".to_string()))
}

/// Delay until a step due at `at` ms, given the current clock reading.
pub fn delay_until(at: f64, now: f64) -> Duration {
    ms_duration((at - now).max(0.0))
}
