use super::{Compiler, Diagnostic};
use crate::diagram::{BlockInstance, Diagram};
use crate::script::{Chain, EmittedBlock, Program};

/// Responsible for walking a diagram's top-level chains into a `Program`.
pub(super) struct ProgramBuilder<'a> {
    compiler: &'a Compiler,
    diagram: &'a Diagram,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ProgramBuilder<'a> {
    pub(super) fn new(compiler: &'a Compiler, diagram: &'a Diagram) -> Self {
        Self {
            compiler,
            diagram,
            diagnostics: Vec::new(),
        }
    }

    pub(super) fn build(mut self) -> (Program, Vec<Diagnostic>) {
        let diagram = self.diagram;
        let mut program = Program::default();
        for top in diagram.top_blocks() {
            let chain = self.build_chain(top);
            if !chain.blocks.is_empty() {
                program.chains.push(chain);
            }
        }
        (program, self.diagnostics)
    }

    /// Emits a chain in link order, skipping disabled blocks.
    fn build_chain(&mut self, top: &'a BlockInstance) -> Chain {
        let diagram = self.diagram;
        let mut chain = Chain::default();
        for block in diagram.chain(top.id()) {
            if !block.is_enabled() {
                tracing::debug!(block_id = block.id(), "Skipping disabled block");
                continue;
            }
            if let Some(emitted) = self.emit_block(block) {
                chain.blocks.push(emitted);
            }
        }
        chain
    }

    fn emit_block(&mut self, block: &'a BlockInstance) -> Option<EmittedBlock> {
        let fragment = self
            .compiler
            .emit_fragment(self.diagram, block, &mut self.diagnostics)?;
        Some(EmittedBlock {
            block_id: block.id().to_string(),
            kind: block.kind().to_string(),
            comment: block.comment().map(str::to_string),
            // A value block left at the top level becomes an expression statement.
            statements: fragment.into_statements(),
        })
    }
}
