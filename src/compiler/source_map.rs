use crate::script::BLOCK_MARKER;
use std::collections::BTreeMap;

/// Maps lines of a marker-free script back to the blocks that produced them.
///
/// Line numbers are 1-based. Blank lines are never attributed to a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    lines: BTreeMap<usize, String>,
}

impl SourceMap {
    /// Strips `# block_id:` marker lines from `code` and records which block
    /// each remaining line belongs to.
    pub fn from_marked(code: &str) -> (String, SourceMap) {
        let mut map = SourceMap::default();
        let mut kept: Vec<&str> = Vec::new();
        let mut current: Option<&str> = None;

        for line in code.lines() {
            if let Some(id) = line.trim_start().strip_prefix(BLOCK_MARKER) {
                current = Some(id.trim());
                continue;
            }
            kept.push(line);
            if let Some(id) = current {
                if !line.trim().is_empty() {
                    map.lines.insert(kept.len(), id.to_string());
                }
            }
        }

        let mut stripped = kept.join("\n");
        if code.ends_with('\n') && !stripped.is_empty() {
            stripped.push('\n');
        }
        (stripped, map)
    }

    pub fn block_at(&self, line: usize) -> Option<&str> {
        self.lines.get(&line).map(String::as_str)
    }

    pub fn lines_for(&self, block_id: &str) -> Vec<usize> {
        self.lines
            .iter()
            .filter(|(_, id)| id.as_str() == block_id)
            .map(|(line, _)| *line)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Removes block marker lines, leaving the script runnable as-is.
pub fn strip_block_markers(code: &str) -> String {
    SourceMap::from_marked(code).0
}
