//! Typed intermediate representation of the generated script and its Python rendering.
pub mod expression;
pub mod fragment;
pub mod program;
pub mod statement;

pub use expression::*;
pub use fragment::*;
pub use program::*;
pub use statement::*;
