//! Syringe pump blocks.
use super::serial::initialize_sequence;
use super::{BlockKind, BlockSchema, Socket, TypeTag};
use crate::compiler::emitter::{BlockEmitter, EmitContext, call_statement_emitters};
use crate::script::{Expr, Fragment, Stmt};

fn number_socket(name: &str) -> Socket {
    Socket::new(name)
        .check(&[TypeTag::Number])
        .default(Expr::number(0.0))
}

pub fn kinds() -> Vec<BlockKind> {
    vec![
        BlockKind::new(
            BlockSchema::statement(
                "pump_initialize",
                "initialize syringe pump serial config %1 device address %2",
            )
            .socket(
                Socket::new("SERIAL_CONFIG")
                    .check(&[TypeTag::SerialConfig, TypeTag::String])
                    .default(Expr::Dict(vec![])),
            )
            .socket(
                Socket::new("DEVICE_ADDRESS")
                    .check(&[TypeTag::Number, TypeTag::DeviceAddress])
                    .default(Expr::number(1.0)),
            ),
            InitializeEmitter,
        ),
        BlockKind::new(
            BlockSchema::statement("pump_set_volume_range", "set volume range %1")
                .socket(number_socket("VOLUME")),
            SetVolumeRangeEmitter,
        ),
        BlockKind::new(
            BlockSchema::statement("pump_set_total_steps", "set total steps %1")
                .socket(number_socket("STEPS")),
            SetTotalStepsEmitter,
        ),
        BlockKind::new(
            BlockSchema::statement("pump_switch_input", "switch to input mode"),
            SwitchInputEmitter,
        ),
        BlockKind::new(
            BlockSchema::statement("pump_switch_output", "switch to output mode"),
            SwitchOutputEmitter,
        ),
        BlockKind::new(
            BlockSchema::statement("pump_set_speed", "set speed %1")
                .socket(number_socket("SPEED")),
            SetSpeedEmitter,
        ),
        BlockKind::new(
            BlockSchema::statement("pump_aspirate", "aspirate %1 ml")
                .socket(number_socket("VOLUME")),
            AspirateEmitter,
        ),
        BlockKind::new(
            BlockSchema::statement("pump_dispense", "dispense %1 ml")
                .socket(number_socket("VOLUME")),
            DispenseEmitter,
        ),
        BlockKind::new(BlockSchema::statement("pump_stop", "stop"), StopEmitter),
        BlockKind::new(
            BlockSchema::statement("pump_delay", "wait %1 seconds")
                .socket(number_socket("SECONDS")),
            DelayEmitter,
        ),
    ]
}

call_statement_emitters! {
    (SetVolumeRangeEmitter, "pump", "set_volume_range", ["VOLUME"]),
    (SetTotalStepsEmitter, "pump", "set_total_steps", ["STEPS"]),
    (SwitchInputEmitter, "pump", "switch_to_input", []),
    (SwitchOutputEmitter, "pump", "switch_to_output", []),
    (SetSpeedEmitter, "pump", "set_speed", ["SPEED"]),
    (AspirateEmitter, "pump", "aspirate", ["VOLUME"]),
    (DispenseEmitter, "pump", "dispense", ["VOLUME"]),
    (StopEmitter, "pump", "stop", []),
}

struct InitializeEmitter;

impl BlockEmitter for InitializeEmitter {
    fn emit(&self, ctx: &mut EmitContext<'_>) -> Fragment {
        let config = ctx.input("SERIAL_CONFIG");
        let address = ctx.input("DEVICE_ADDRESS");
        Fragment::Statements(initialize_sequence(
            config,
            "syringe pump",
            vec![
                Stmt::assign(
                    Expr::path("pump.pump_address"),
                    Expr::path("str").call(vec![address]),
                ),
                Stmt::expr(Expr::path("pump").method("initialize", vec![])),
            ],
        ))
    }
}

struct DelayEmitter;

impl BlockEmitter for DelayEmitter {
    fn emit(&self, ctx: &mut EmitContext<'_>) -> Fragment {
        let seconds = ctx.input("SECONDS");
        Fragment::Statements(vec![
            Stmt::Import("time".to_string()),
            Stmt::expr(Expr::path("time").method("sleep", vec![seconds])),
        ])
    }
}
