use crate::catalog::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn enabled_by_default() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// A serialized workspace, as saved by the block editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceJson {
    #[serde(default)]
    pub blocks: BlockList,
}

/// The top-level block list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockList {
    #[serde(rename = "languageVersion", default)]
    pub language_version: u32,
    #[serde(default)]
    pub blocks: Vec<BlockJson>,
}

/// One block and, recursively, everything plugged into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockJson {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default = "enabled_by_default", skip_serializing_if = "is_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, InputJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NextJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons: Option<IconsJson>,
}

impl BlockJson {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            x: None,
            y: None,
            enabled: true,
            fields: BTreeMap::new(),
            inputs: BTreeMap::new(),
            next: None,
            icons: None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        self.icons
            .as_ref()
            .and_then(|icons| icons.comment.as_ref())
            .map(|comment| comment.text.as_str())
    }
}

/// What is plugged into a value input. A real block covers the shadow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Box<BlockJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Box<BlockJson>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextJson {
    pub block: Box<BlockJson>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconsJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentJson {
    pub text: String,
    #[serde(default)]
    pub pinned: bool,
}
