//! Rotary valve blocks.
use super::serial::initialize_sequence;
use super::{BlockKind, BlockSchema, Socket, TypeTag};
use crate::compiler::emitter::{BlockEmitter, EmitContext, call_statement_emitters};
use crate::script::{Expr, Fragment, Stmt};

pub fn kinds() -> Vec<BlockKind> {
    vec![
        BlockKind::new(
            BlockSchema::statement(
                "init_valve",
                "initialize rotary valve serial config %1 device address %2",
            )
            .socket(
                Socket::new("SERIAL_CONFIG")
                    .check(&[TypeTag::SerialConfig])
                    .default(Expr::Dict(vec![])),
            )
            .socket(
                Socket::new("DEVICE_ADDRESS")
                    .check(&[TypeTag::Number])
                    .default(Expr::number(1.0)),
            ),
            InitValveEmitter,
        ),
        BlockKind::new(
            BlockSchema::statement("rotate_valve", "rotate valve to position %1").socket(
                Socket::new("POSITION")
                    .check(&[TypeTag::Number])
                    .default(Expr::number(1.0)),
            ),
            RotateEmitter,
        ),
        BlockKind::new(
            BlockSchema::value(
                "get_valve_position",
                "current valve position",
                &[TypeTag::Number],
            ),
            current_position,
        ),
        BlockKind::new(
            BlockSchema::value(
                "get_valve_last_position",
                "valve position before power loss",
                &[TypeTag::Number],
            ),
            last_position,
        ),
    ]
}

call_statement_emitters! {
    (RotateEmitter, "valve", "rotate_to_position", ["POSITION"]),
}

struct InitValveEmitter;

impl BlockEmitter for InitValveEmitter {
    fn emit(&self, ctx: &mut EmitContext<'_>) -> Fragment {
        let config = ctx.input("SERIAL_CONFIG");
        let address = ctx.input("DEVICE_ADDRESS");
        Fragment::Statements(initialize_sequence(
            config,
            "rotary valve",
            vec![
                Stmt::assign(
                    Expr::path("valve"),
                    Expr::path("ValveController").call(vec![Expr::path("serial_controller")]),
                ),
                Stmt::expr(Expr::path("valve").method("initialize", vec![address])),
            ],
        ))
    }
}

fn current_position(_ctx: &mut EmitContext<'_>) -> Fragment {
    Fragment::Value(Expr::path("valve").method("get_current_position", vec![]))
}

fn last_position(_ctx: &mut EmitContext<'_>) -> Fragment {
    Fragment::Value(Expr::path("valve").method("get_last_position", vec![]))
}
