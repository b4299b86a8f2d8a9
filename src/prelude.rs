//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to build, load and compile diagrams.
//!
//! # Example
//!
//! ```rust,no_run
//! use labblocks::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let compiler = Compiler::standard();
//! let json = std::fs::read_to_string("path/to/workspace.json")?;
//! let diagram = load_workspace(compiler.catalog(), &json)?;
//!
//! let script = compiler.compile(&diagram).into_strict()?;
//! std::fs::write("protocol.py", &script.code)?;
//! # Ok(())
//! # }
//! ```

// Catalog and diagram model
pub use crate::catalog::{BlockKind, BlockSchema, Catalog, FieldValue, FieldWidget, Socket, TypeTag};
pub use crate::diagram::{BlockInstance, Diagram, available_ports};

// Compilation
pub use crate::compiler::artifact::CompiledArtifact;
pub use crate::compiler::emitter::{BlockEmitter, EmitContext};
pub use crate::compiler::source_map::{SourceMap, strip_block_markers};
pub use crate::compiler::{CompileOptions, CompiledScript, Compiler, Diagnostic};
pub use crate::script::{Expr, Fragment, Program, Stmt};

// Workspace files and settings
pub use crate::settings::SerialSettings;
pub use crate::workspace::{IntoDiagram, WorkspaceJson, load_workspace, save_workspace};

// Error types
pub use crate::error::{
    ArtifactError, CatalogError, CompileError, DiagramError, SettingsError, WorkspaceError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
