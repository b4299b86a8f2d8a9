use super::{Compiler, Diagnostic};
use crate::catalog::{BlockSchema, FieldValue};
use crate::diagram::{BlockInstance, Diagram};
use crate::script::{Expr, Fragment};

/// Defines the contract for turning one block instance into script.
pub trait BlockEmitter: Send + Sync {
    fn emit(&self, ctx: &mut EmitContext<'_>) -> Fragment;
}

impl<F> BlockEmitter for F
where
    F: Fn(&mut EmitContext<'_>) -> Fragment + Send + Sync,
{
    fn emit(&self, ctx: &mut EmitContext<'_>) -> Fragment {
        self(ctx)
    }
}

/// The view of one block handed to its emitter.
///
/// Inputs are resolved on demand: a connected producer is emitted recursively,
/// an empty socket yields the socket's default and a diagnostic.
pub struct EmitContext<'a> {
    pub(super) compiler: &'a Compiler,
    pub(super) diagram: &'a Diagram,
    pub(super) block: &'a BlockInstance,
    pub(super) schema: &'a BlockSchema,
    pub(super) diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> EmitContext<'a> {
    pub fn block_id(&self) -> &str {
        self.block.id()
    }

    pub fn kind(&self) -> &str {
        self.block.kind()
    }

    /// The value of a field, falling back to the widget default.
    pub fn field(&self, name: &str) -> FieldValue {
        if let Some(value) = self.block.field(name) {
            return value.clone();
        }
        self.schema
            .find_field(name)
            .map(|definition| definition.widget.default_value())
            .unwrap_or_else(|| FieldValue::Text(String::new()))
    }

    pub fn field_text(&self, name: &str) -> String {
        self.field(name).to_string()
    }

    /// Resolves a value socket to an expression.
    pub fn input(&mut self, socket: &str) -> Expr {
        let connected = self
            .block
            .input(socket)
            .and_then(|child_id| self.diagram.block(child_id))
            .filter(|child| child.is_enabled());

        if let Some(child) = connected {
            if let Some(expr) = self
                .compiler
                .emit_value(self.diagram, child, &mut *self.diagnostics)
            {
                return expr;
            }
        }
        self.default_for(socket)
    }

    fn default_for(&mut self, socket: &str) -> Expr {
        let default = self
            .schema
            .find_socket(socket)
            .map(|s| self.compiler.socket_default(s))
            .unwrap_or(Expr::Null);

        tracing::warn!(
            block_id = self.block.id(),
            kind = self.block.kind(),
            socket,
            "No block connected, using default {}",
            default
        );
        self.diagnostics.push(Diagnostic::MissingConnection {
            block_id: self.block.id().to_string(),
            kind: self.block.kind().to_string(),
            socket: socket.to_string(),
            default: default.to_string(),
        });
        default
    }
}

/// Defines emitters for blocks that compile to a single method call, one
/// argument per socket, e.g. `pump.aspirate(<VOLUME>)`.
macro_rules! call_statement_emitters {
    ( $( ($struct_name:ident, $receiver:expr, $method:expr, [ $( $socket:expr ),* ]) ),* $(,)? ) => {
        $(
            pub(crate) struct $struct_name;
            impl $crate::compiler::emitter::BlockEmitter for $struct_name {
                #[allow(unused_variables)]
                fn emit(
                    &self,
                    ctx: &mut $crate::compiler::emitter::EmitContext<'_>,
                ) -> $crate::script::Fragment {
                    let args: Vec<$crate::script::Expr> = vec![ $( ctx.input($socket) ),* ];
                    $crate::script::Fragment::Statements(vec![$crate::script::Stmt::expr(
                        $crate::script::Expr::path($receiver).method($method, args),
                    )])
                }
            }
        )*
    };
}
pub(crate) use call_statement_emitters;
