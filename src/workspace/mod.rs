//! Reading and writing diagrams in the block editor's JSON workspace format.
//!
//! Every `next` link nests one block deeper, so long protocols produce deeply
//! nested JSON. Parsing and writing run without serde_json's recursion limit
//! and grow the stack on demand.

pub mod conversion;
pub mod definition;

pub use conversion::*;
pub use definition::*;

use crate::catalog::Catalog;
use crate::diagram::Diagram;
use crate::error::WorkspaceError;
use serde::{Deserialize, Serialize};

/// Parses workspace JSON without building a diagram.
pub fn parse_workspace(json: &str) -> Result<WorkspaceJson, WorkspaceError> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let workspace = WorkspaceJson::deserialize(serde_stacker::Deserializer::new(&mut deserializer))
        .map_err(|e| WorkspaceError::JsonParseError(e.to_string()))?;
    deserializer
        .end()
        .map_err(|e| WorkspaceError::JsonParseError(e.to_string()))?;
    Ok(workspace)
}

/// Parses workspace JSON and builds a diagram against `catalog`.
pub fn load_workspace(catalog: &Catalog, json: &str) -> Result<Diagram, WorkspaceError> {
    parse_workspace(json)?.into_diagram(catalog)
}

/// Serializes a diagram to pretty workspace JSON.
pub fn save_workspace(diagram: &Diagram) -> Result<String, WorkspaceError> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::pretty(&mut out);
    diagram
        .to_workspace()
        .serialize(serde_stacker::Serializer::new(&mut serializer))
        .map_err(|e| WorkspaceError::JsonParseError(e.to_string()))?;
    String::from_utf8(out).map_err(|e| WorkspaceError::JsonParseError(e.to_string()))
}
