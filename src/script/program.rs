use super::{Stmt, render_statements};
use serde::{Deserialize, Serialize};

/// Prefix of the comment line that tags the code of one block.
pub const BLOCK_MARKER: &str = "# block_id: ";

/// The compiled form of a whole diagram, before rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub chains: Vec<Chain>,
}

/// One top-level stack of blocks, in link order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub blocks: Vec<EmittedBlock>,
}

/// The statements emitted for one block of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmittedBlock {
    pub block_id: String,
    pub kind: String,
    pub comment: Option<String>,
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Renders the program to script text.
    pub fn render(&self) -> String {
        self.render_inner(false)
    }

    /// Renders the program with a `# block_id: <id>` line before every block's code.
    pub fn render_with_markers(&self) -> String {
        self.render_inner(true)
    }

    pub fn statement_count(&self) -> usize {
        self.chains
            .iter()
            .flat_map(|chain| &chain.blocks)
            .map(|block| block.statements.len())
            .sum()
    }

    fn render_inner(&self, markers: bool) -> String {
        let chains: Vec<String> = self
            .chains
            .iter()
            .map(|chain| {
                let mut code = String::new();
                for block in &chain.blocks {
                    if markers {
                        code.push_str(BLOCK_MARKER);
                        code.push_str(&block.block_id.replace(char::is_control, " "));
                        code.push('\n');
                    }
                    if let Some(comment) = &block.comment {
                        code.push_str(&render_statements(&[Stmt::Comment(comment.clone())]));
                    }
                    code.push_str(&render_statements(&block.statements));
                }
                code
            })
            .collect();
        finish(&chains.join("\n"))
    }
}

/// Trims leading blank lines, trailing whitespace on each line and at the end.
fn finish(code: &str) -> String {
    let lines: Vec<&str> = code.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => {
            let mut out = lines[start..=end].join("\n");
            out.push('\n');
            out
        }
        _ => String::new(),
    }
}
