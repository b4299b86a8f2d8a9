//! Tests for per-block emission and whole-diagram compilation.
mod common;
use common::*;
use labblocks::prelude::*;
use labblocks::script::{GeneratedFragment, Order};

fn compile_single(kind: &str) -> CompiledScript {
    let compiler = Compiler::standard();
    let (diagram, _) = single_block(compiler.catalog(), kind);
    compiler.compile(&diagram)
}

fn missing_sockets(script: &CompiledScript) -> Vec<(&str, &str)> {
    script
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::MissingConnection {
                socket, default, ..
            } => Some((socket.as_str(), default.as_str())),
            _ => None,
        })
        .collect()
}

#[test]
fn test_unconnected_pump_calls_use_defaults() {
    let cases = [
        ("pump_set_volume_range", "pump.set_volume_range(0)\n", "VOLUME"),
        ("pump_set_total_steps", "pump.set_total_steps(0)\n", "STEPS"),
        ("pump_set_speed", "pump.set_speed(0)\n", "SPEED"),
        ("pump_aspirate", "pump.aspirate(0)\n", "VOLUME"),
        ("pump_dispense", "pump.dispense(0)\n", "VOLUME"),
        ("pump_delay", "import time\ntime.sleep(0)\n", "SECONDS"),
    ];
    for (kind, expected, socket) in cases {
        let script = compile_single(kind);
        assert_eq!(script.code, expected, "kind {}", kind);
        assert_eq!(missing_sockets(&script), [(socket, "0")], "kind {}", kind);
    }
}

#[test]
fn test_argument_free_kinds_are_clean() {
    let cases = [
        ("pump_switch_input", "pump.switch_to_input()\n"),
        ("pump_switch_output", "pump.switch_to_output()\n"),
        ("pump_stop", "pump.stop()\n"),
        ("serial_save_settings", "serial_settings.save()\n"),
        (
            "serial_close",
            "# Close serial port\nif serial_controller.is_connected:\n    logger.info(\"Closing serial port...\")\n    serial_controller.disconnect()\n",
        ),
    ];
    for (kind, expected) in cases {
        let script = compile_single(kind);
        assert_eq!(script.code, expected, "kind {}", kind);
        assert!(script.is_clean(), "kind {}", kind);
    }
}

#[test]
fn test_unconnected_pump_initialize() {
    let script = compile_single("pump_initialize");
    let expected = r#"# Connect serial port
if not serial_controller.is_connected:
    logger.info("Connecting serial port...")
    try:
        serial_controller.connect({})
    except Exception as e:
        logger.error(f"Serial connection failed: {e}")
        raise

# Initialize syringe pump
if serial_controller.is_connected:
    logger.info("Initializing syringe pump...")
    pump.pump_address = str(1)
    pump.initialize()
else:
    logger.error("Serial port not connected, cannot initialize syringe pump")
    raise ConnectionError("Serial port not connected, cannot initialize syringe pump")
"#;
    assert_eq!(script.code, expected);
    assert_eq!(
        missing_sockets(&script),
        [("SERIAL_CONFIG", "{}"), ("DEVICE_ADDRESS", "1")]
    );
}

#[test]
fn test_unconnected_init_valve() {
    let script = compile_single("init_valve");
    let expected = r#"# Connect serial port
if not serial_controller.is_connected:
    logger.info("Connecting serial port...")
    try:
        serial_controller.connect({})
    except Exception as e:
        logger.error(f"Serial connection failed: {e}")
        raise

# Initialize rotary valve
if serial_controller.is_connected:
    logger.info("Initializing rotary valve...")
    valve = ValveController(serial_controller)
    valve.initialize(1)
else:
    logger.error("Serial port not connected, cannot initialize rotary valve")
    raise ConnectionError("Serial port not connected, cannot initialize rotary valve")
"#;
    assert_eq!(script.code, expected);
    assert_eq!(
        missing_sockets(&script),
        [("SERIAL_CONFIG", "{}"), ("DEVICE_ADDRESS", "1")]
    );
}

#[test]
fn test_empty_text_block_is_an_empty_string() {
    let script = compile_single("text");
    assert_eq!(script.code, "\"\"\n");
    assert!(script.is_clean(), "{:?}", script.diagnostics);
}

#[test]
fn test_unconnected_rotate_defaults_to_first_position() {
    let script = compile_single("rotate_valve");
    assert_eq!(script.code, "valve.rotate_to_position(1)\n");
    assert_eq!(missing_sockets(&script), [("POSITION", "1")]);
}

#[test]
fn test_value_fragments() {
    let compiler = Compiler::standard();
    let catalog = compiler.catalog();
    let mut diagram = Diagram::new();

    let position = diagram.add_block(catalog, "get_valve_position").unwrap();
    let fragment = compiler.emit(&diagram, &position).unwrap().render();
    assert_eq!(
        fragment,
        GeneratedFragment::Expression {
            code: "valve.get_current_position()".into(),
            order: Order::FunctionCall,
        }
    );

    let last = diagram.add_block(catalog, "get_valve_last_position").unwrap();
    let fragment = compiler.emit(&diagram, &last).unwrap().render();
    assert_eq!(fragment.code(), "valve.get_last_position()");

    let address = diagram.add_block(catalog, "device_address").unwrap();
    diagram.set_field(catalog, &address, "ADDRESS", 42.0).unwrap();
    let fragment = compiler.emit(&diagram, &address).unwrap().render();
    assert_eq!(
        fragment,
        GeneratedFragment::Expression {
            code: "42".into(),
            order: Order::Atomic,
        }
    );

    let port = diagram.add_block(catalog, "serial_port_select").unwrap();
    let fragment = compiler.emit(&diagram, &port).unwrap().render();
    assert_eq!(fragment.code(), "\"COM3\"");
}

#[test]
fn test_text_literals_are_escaped() {
    let compiler = Compiler::standard();
    let catalog = compiler.catalog();
    let (mut diagram, id) = single_block(catalog, "text");
    diagram
        .set_field(catalog, &id, "TEXT", "say \"hi\"\\\nbye")
        .unwrap();
    let fragment = compiler.emit(&diagram, &id).unwrap().render();
    assert_eq!(fragment.code(), r#""say \"hi\"\\\nbye""#);
}

#[test]
fn test_serial_config_mapping_keys_in_fixed_order() {
    let compiler = Compiler::standard();
    let catalog = compiler.catalog();
    let (mut diagram, id) = single_block(catalog, "serial_config");
    diagram.set_field(catalog, &id, "BAUDRATE", "115200").unwrap();
    diagram.set_field(catalog, &id, "PARITY", "E").unwrap();
    diagram.set_field(catalog, &id, "STOPBITS", "1.5").unwrap();

    let fragment = compiler.emit(&diagram, &id).unwrap().render();
    let expected = r#"{
    'port': "COM3",
    'baudrate': 115200,
    'databits': 8,
    'parity': 'E',
    'stopbits': 1.5,
    'flowcontrol': 'N'
}"#;
    assert_eq!(fragment.code(), expected);
}

#[test]
fn test_config_feeds_connect_call_verbatim() {
    let compiler = Compiler::standard();
    let catalog = compiler.catalog();
    let (diagram, ids) = valve_protocol(catalog);

    let mapping = compiler.emit(&diagram, &ids.config).unwrap().render();
    let script = compiler.compile(&diagram);

    let indented: Vec<String> = mapping
        .code()
        .lines()
        .map(|line| format!("        {}", line))
        .collect();
    let call = format!(
        "        serial_controller.connect({}",
        indented.join("\n").trim_start()
    );
    assert!(script.code.contains(&format!("{})", call)), "{}", script.code);
}

#[test]
fn test_valve_protocol_compiles() {
    let compiler = Compiler::standard();
    let (diagram, _) = valve_protocol(compiler.catalog());
    let script = compiler.compile(&diagram);
    assert_eq!(script.code, VALVE_PROTOCOL_SCRIPT);
    assert!(script.is_clean(), "{:?}", script.diagnostics);
}

#[test]
fn test_compilation_is_deterministic() {
    let compiler = Compiler::standard();
    let (diagram, _) = valve_protocol(compiler.catalog());
    let first = compiler.compile(&diagram);
    let second = compiler.compile(&diagram);
    assert_eq!(first.code, second.code);
    assert_eq!(first.program, second.program);
}

#[test]
fn test_emit_returns_only_the_block_itself() {
    let compiler = Compiler::standard();
    let (diagram, ids) = valve_protocol(compiler.catalog());
    let fragment = compiler.emit(&diagram, &ids.init).unwrap().render();
    assert!(!fragment.code().contains("rotate_to_position"));

    assert_eq!(
        compiler.emit(&diagram, "missing"),
        Err(CompileError::BlockNotFound("missing".into()))
    );
}

#[test]
fn test_disabled_blocks_are_skipped() {
    let compiler = Compiler::standard();
    let catalog = compiler.catalog();
    let (mut diagram, ids) = valve_protocol(catalog);
    let stop = diagram.add_block(catalog, "pump_stop").unwrap();
    diagram.connect_next(catalog, &ids.rotate, &stop).unwrap();

    diagram.set_enabled(&ids.rotate, false).unwrap();
    let script = compiler.compile(&diagram);
    assert!(!script.code.contains("rotate_to_position"));
    assert!(script.code.ends_with("\npump.stop()\n"));
}

#[test]
fn test_disabled_producer_counts_as_unconnected() {
    let compiler = Compiler::standard();
    let (mut diagram, ids) = valve_protocol(compiler.catalog());
    diagram.set_enabled(&ids.position, false).unwrap();

    let script = compiler.compile(&diagram);
    assert!(script.code.ends_with("valve.rotate_to_position(1)\n"));
    assert_eq!(
        script.diagnostics,
        [Diagnostic::MissingConnection {
            block_id: ids.rotate.clone(),
            kind: "rotate_valve".into(),
            socket: "POSITION".into(),
            default: "1".into(),
        }]
    );
}

#[test]
fn test_block_comments_precede_code() {
    let compiler = Compiler::standard();
    let (mut diagram, ids) = valve_protocol(compiler.catalog());
    diagram
        .set_comment(&ids.rotate, Some("Select waste line\nbefore flushing".into()))
        .unwrap();
    let script = compiler.compile(&diagram);
    assert!(script.code.ends_with(
        "# Select waste line\n# before flushing\nvalve.rotate_to_position(7)\n"
    ));
}

#[test]
fn test_carriage_returns_in_comments_stay_commented() {
    let compiler = Compiler::standard();
    let catalog = compiler.catalog();
    let (mut diagram, id) = single_block(catalog, "pump_stop");
    diagram
        .set_comment(&id, Some("note\rimport os\r\nlast".into()))
        .unwrap();
    let script = compiler.compile(&diagram);
    assert_eq!(script.code, "# note\n# import os\n# last\npump.stop()\n");
}

#[test]
fn test_chains_are_separated_and_ordered_by_position() {
    let compiler = Compiler::standard();
    let catalog = compiler.catalog();
    let mut diagram = Diagram::new();
    let lower = diagram.add_block(catalog, "pump_stop").unwrap();
    let upper = diagram.add_block(catalog, "pump_switch_input").unwrap();
    let value = diagram.add_block(catalog, "get_valve_position").unwrap();
    diagram.set_position(&lower, 0.0, 200.0).unwrap();
    diagram.set_position(&upper, 0.0, 20.0).unwrap();
    diagram.set_position(&value, 0.0, 500.0).unwrap();

    let script = compiler.compile(&diagram);
    assert_eq!(
        script.code,
        "pump.switch_to_input()\n\npump.stop()\n\nvalve.get_current_position()\n"
    );
}

#[test]
fn test_empty_diagram_compiles_to_nothing() {
    let compiler = Compiler::standard();
    let script = compiler.compile(&Diagram::new());
    assert_eq!(script.code, "");
    assert!(script.is_clean());
}

#[test]
fn test_strict_mode_rejects_defaults() {
    let script = compile_single("pump_aspirate");
    assert_eq!(script.into_strict().err(), Some(CompileError::Strict(1)));

    let script = compile_single("pump_stop");
    assert!(script.into_strict().is_ok());
}

#[test]
fn test_serial_defaults_replace_empty_config() {
    let settings = SerialSettings {
        port: "COM6".into(),
        baudrate: 19200,
        ..SerialSettings::default()
    };
    let compiler = Compiler::builder(Catalog::standard())
        .with_serial_defaults(settings)
        .build();
    let (diagram, _) = single_block(compiler.catalog(), "init_valve");

    let script = compiler.compile(&diagram);
    assert!(script.code.contains(
        "        serial_controller.connect({\n            'port': \"COM6\",\n            'baudrate': 19200,\n"
    ));
    // Still reported, since nothing was connected.
    assert_eq!(script.diagnostics.len(), 2);
}

#[test]
fn test_block_markers() {
    let compiler = Compiler::builder(Catalog::standard())
        .with_block_markers(true)
        .build();
    let (diagram, ids) = valve_protocol(compiler.catalog());
    let script = compiler.compile(&diagram);

    assert!(
        script
            .code
            .starts_with(&format!("# block_id: {}\n# Connect serial port\n", ids.init))
    );
    assert!(script.code.ends_with(&format!(
        "# block_id: {}\nvalve.rotate_to_position(7)\n",
        ids.rotate
    )));
    assert_eq!(strip_block_markers(&script.code), VALVE_PROTOCOL_SCRIPT);
}

fn beep(_ctx: &mut EmitContext<'_>) -> Fragment {
    Fragment::Statements(vec![Stmt::expr(Expr::path("buzzer").method("beep", vec![]))])
}

fn wait_ms(ctx: &mut EmitContext<'_>) -> Fragment {
    let ms = ctx.field_text("MS");
    Fragment::Statements(vec![Stmt::expr(Expr::path("time").method(
        "sleep",
        vec![Expr::raw(format!("{} / 1000", ms), Order::Multiplicative)],
    ))])
}

fn custom_kinds() -> Vec<BlockKind> {
    vec![
        BlockKind::new(BlockSchema::statement("beep", "beep"), beep),
        BlockKind::new(
            BlockSchema::statement("wait_ms", "wait %1 ms").field(
                "MS",
                FieldWidget::Number {
                    default: 100.0,
                    min: 0.0,
                    max: 60000.0,
                    precision: 1.0,
                },
            ),
            wait_ms,
        ),
    ]
}

#[test]
fn test_custom_kinds_extend_the_catalog() {
    let mut builder = Compiler::builder(Catalog::standard());
    for kind in custom_kinds() {
        builder = builder.with_kind(kind).unwrap();
    }
    let compiler = builder.build();
    let catalog = compiler.catalog();

    let mut diagram = Diagram::new();
    let a = diagram.add_block(catalog, "beep").unwrap();
    let b = diagram.add_block(catalog, "wait_ms").unwrap();
    let c = diagram.add_block(catalog, "pump_stop").unwrap();
    diagram.connect_next(catalog, &a, &b).unwrap();
    diagram.connect_next(catalog, &b, &c).unwrap();

    let script = compiler.compile(&diagram);
    assert_eq!(
        script.code,
        "buzzer.beep()\ntime.sleep(100 / 1000)\npump.stop()\n"
    );
}

#[test]
fn test_unregistered_kinds_emit_nothing() {
    let mut catalog = Catalog::standard();
    for kind in custom_kinds() {
        catalog.register(kind).unwrap();
    }
    let mut diagram = Diagram::new();
    let a = diagram.add_block(&catalog, "beep").unwrap();
    let b = diagram.add_block(&catalog, "pump_stop").unwrap();
    diagram.connect_next(&catalog, &a, &b).unwrap();

    let script = Compiler::standard().compile(&diagram);
    assert_eq!(script.code, "pump.stop()\n");
    assert_eq!(
        script.diagnostics,
        [Diagnostic::UnknownKind {
            block_id: a.clone(),
            kind: "beep".into(),
        }]
    );
}

#[test]
fn test_diagnostic_display() {
    let diagnostic = Diagnostic::MissingConnection {
        block_id: "b1".into(),
        kind: "pump_aspirate".into(),
        socket: "VOLUME".into(),
        default: "0".into(),
    };
    assert_eq!(
        diagnostic.to_string(),
        "Block 'b1' (pump_aspirate): socket 'VOLUME' is empty, using default `0`"
    );
}
