//! # LabBlocks - Block Diagram to Lab Automation Script Compiler
//!
//! **LabBlocks** turns visual block diagrams into Python scripts that drive a
//! syringe pump and a rotary valve over a shared serial connection. Each block
//! kind carries a schema (typed value sockets, field widgets, statement links)
//! and an emitter that produces a typed script fragment.
//!
//! ## Core Workflow
//!
//! 1.  **Build or Load a Diagram**: Create blocks programmatically with `Diagram`, or
//!     import a saved editor workspace through the `IntoDiagram` trait.
//! 2.  **Compile**: A `Compiler` owns the block `Catalog` and walks the top-level
//!     chains, emitting one fragment per block. Empty sockets fall back to their
//!     defaults and are reported as diagnostics.
//! 3.  **Use the Script**: The result holds the rendered code, the typed `Program`
//!     (which can be saved as a binary artifact), and the diagnostics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labblocks::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let compiler = Compiler::standard();
//!     let catalog = compiler.catalog();
//!
//!     let mut diagram = Diagram::new();
//!     let config = diagram.add_block(catalog, "serial_config")?;
//!     diagram.set_field(catalog, &config, "BAUDRATE", "9600")?;
//!     let init = diagram.add_block(catalog, "init_valve")?;
//!     diagram.connect_value(catalog, &init, "SERIAL_CONFIG", &config)?;
//!     let rotate = diagram.add_block(catalog, "rotate_valve")?;
//!     diagram.connect_next(catalog, &init, &rotate)?;
//!
//!     let script = compiler.compile(&diagram);
//!     for diagnostic in &script.diagnostics {
//!         eprintln!("warning: {}", diagnostic);
//!     }
//!     println!("{}", script.code);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod compiler;
pub mod diagram;
pub mod error;
pub mod prelude;
pub mod script;
pub mod settings;
pub mod workspace;

#[cfg(feature = "python-bindings")]
mod python;
