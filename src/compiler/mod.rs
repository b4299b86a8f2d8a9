use crate::catalog::{BlockKind, Catalog, Socket, TypeTag};
use crate::diagram::{BlockInstance, Diagram};
use crate::error::{CatalogError, CompileError};
use crate::script::{Expr, Fragment, Program};
use crate::settings::SerialSettings;
use std::fmt;

pub mod artifact;
mod builder;
pub mod emitter;
pub mod source_map;

use builder::ProgramBuilder;
use emitter::EmitContext;

/// Knobs that change how a compiled program is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Prefix each block's code with a `# block_id: <id>` line.
    pub block_markers: bool,
}

/// Something the compiler noticed while emitting. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A value socket had nothing connected and its default was used.
    MissingConnection {
        block_id: String,
        kind: String,
        socket: String,
        default: String,
    },
    /// The block's kind is not in the catalog; it emitted nothing.
    UnknownKind { block_id: String, kind: String },
    /// A statement block sat where a value was expected.
    UnexpectedShape { block_id: String, kind: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingConnection {
                block_id,
                kind,
                socket,
                default,
            } => write!(
                f,
                "Block '{}' ({}): socket '{}' is empty, using default `{}`",
                block_id, kind, socket, default
            ),
            Diagnostic::UnknownKind { block_id, kind } => {
                write!(f, "Block '{}' has unregistered kind '{}'", block_id, kind)
            }
            Diagnostic::UnexpectedShape { block_id, kind } => write!(
                f,
                "Block '{}' ({}) does not produce a value and was ignored",
                block_id, kind
            ),
        }
    }
}

/// The result of compiling a diagram.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    pub program: Program,
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledScript {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Fails if any diagnostic was recorded.
    pub fn into_strict(self) -> Result<Self, CompileError> {
        if self.is_clean() {
            Ok(self)
        } else {
            Err(CompileError::Strict(self.diagnostics.len()))
        }
    }
}

/// Turns diagrams into scripts. Owns the block catalog for its whole lifetime.
pub struct Compiler {
    catalog: Catalog,
    options: CompileOptions,
    serial_defaults: Option<SerialSettings>,
}

pub struct CompilerBuilder {
    catalog: Catalog,
    options: CompileOptions,
    serial_defaults: Option<SerialSettings>,
}

impl CompilerBuilder {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            options: CompileOptions::default(),
            serial_defaults: None,
        }
    }

    /// Registers an additional block kind.
    pub fn with_kind(mut self, kind: BlockKind) -> Result<Self, CatalogError> {
        self.catalog.register(kind)?;
        Ok(self)
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_block_markers(mut self, enabled: bool) -> Self {
        self.options.block_markers = enabled;
        self
    }

    /// Uses `settings` instead of an empty mapping for unconnected serial-config sockets.
    pub fn with_serial_defaults(mut self, settings: SerialSettings) -> Self {
        self.serial_defaults = Some(settings);
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            catalog: self.catalog,
            options: self.options,
            serial_defaults: self.serial_defaults,
        }
    }
}

impl Compiler {
    pub fn builder(catalog: Catalog) -> CompilerBuilder {
        CompilerBuilder::new(catalog)
    }

    /// A compiler over the standard catalog with default options.
    pub fn standard() -> Self {
        Self::builder(Catalog::standard()).build()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Emits a single block. Statement blocks yield only their own statements,
    /// not the rest of their chain.
    pub fn emit(&self, diagram: &Diagram, block_id: &str) -> Result<Fragment, CompileError> {
        let block = diagram
            .block(block_id)
            .ok_or_else(|| CompileError::BlockNotFound(block_id.to_string()))?;
        let mut diagnostics = Vec::new();
        Ok(self
            .emit_fragment(diagram, block, &mut diagnostics)
            .unwrap_or(Fragment::Statements(Vec::new())))
    }

    /// Compiles every top-level chain of the diagram.
    pub fn compile(&self, diagram: &Diagram) -> CompiledScript {
        tracing::info!(
            "Compiling diagram ({} blocks, {} top-level)",
            diagram.len(),
            diagram.top_blocks().len()
        );
        let (program, diagnostics) = ProgramBuilder::new(self, diagram).build();
        let code = if self.options.block_markers {
            program.render_with_markers()
        } else {
            program.render()
        };
        tracing::info!(
            statements = program.statement_count(),
            diagnostics = diagnostics.len(),
            "Code generation complete ({} bytes)",
            code.len()
        );
        CompiledScript {
            program,
            code,
            diagnostics,
        }
    }

    pub(crate) fn emit_fragment(
        &self,
        diagram: &Diagram,
        block: &BlockInstance,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Fragment> {
        let Some(kind) = self.catalog.get(block.kind()) else {
            tracing::warn!(block_id = block.id(), kind = block.kind(), "Unregistered block kind");
            diagnostics.push(Diagnostic::UnknownKind {
                block_id: block.id().to_string(),
                kind: block.kind().to_string(),
            });
            return None;
        };
        let mut ctx = EmitContext {
            compiler: self,
            diagram,
            block,
            schema: &kind.schema,
            diagnostics,
        };
        Some(kind.emitter.emit(&mut ctx))
    }

    pub(crate) fn emit_value(
        &self,
        diagram: &Diagram,
        block: &BlockInstance,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Expr> {
        match self.emit_fragment(diagram, block, diagnostics)? {
            Fragment::Value(expr) => Some(expr),
            Fragment::Statements(_) => {
                diagnostics.push(Diagnostic::UnexpectedShape {
                    block_id: block.id().to_string(),
                    kind: block.kind().to_string(),
                });
                None
            }
        }
    }

    pub(crate) fn socket_default(&self, socket: &Socket) -> Expr {
        match &self.serial_defaults {
            Some(settings) if socket.check.is_some() && socket.accepts(TypeTag::SerialConfig) => {
                settings.to_config_expr()
            }
            _ => socket.default.clone(),
        }
    }
}
