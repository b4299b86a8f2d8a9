//! Serial-port blocks: port selection, connection settings, literals and closing.
use super::{BlockKind, BlockSchema, FieldWidget, Socket, TypeTag};
use crate::compiler::emitter::{BlockEmitter, EmitContext};
use crate::script::{Expr, Fragment, Handler, Stmt};

/// Port selected when no port is known.
pub const FALLBACK_PORT: &str = "COM3";

/// Keys of the serial configuration mapping, in emission order.
pub const CONFIG_KEYS: [&str; 6] = [
    "port",
    "baudrate",
    "databits",
    "parity",
    "stopbits",
    "flowcontrol",
];

/// Flow control is not user-selectable; every configuration carries this value.
pub const FLOW_CONTROL: &str = "N";

pub fn kinds() -> Vec<BlockKind> {
    vec![
        BlockKind::new(
            BlockSchema::value("serial_port_select", "serial port %1", &[TypeTag::String])
                .field("PORT", FieldWidget::dynamic_dropdown(&[FALLBACK_PORT])),
            PortSelectEmitter,
        ),
        BlockKind::new(
            BlockSchema::value(
                "serial_config",
                "serial config port %1 baud rate %2 data bits %3 parity %4 stop bits %5",
                &[TypeTag::SerialConfig],
            )
            .socket(
                Socket::new("PORT")
                    .check(&[TypeTag::String, TypeTag::Text])
                    .default(Expr::str(FALLBACK_PORT)),
            )
            .field(
                "BAUDRATE",
                FieldWidget::dropdown(&[
                    ("9600", "9600"),
                    ("19200", "19200"),
                    ("38400", "38400"),
                    ("57600", "57600"),
                    ("115200", "115200"),
                ]),
            )
            .field(
                "DATABITS",
                FieldWidget::dropdown(&[
                    ("8 bits", "8"),
                    ("7 bits", "7"),
                    ("6 bits", "6"),
                    ("5 bits", "5"),
                ]),
            )
            .field(
                "PARITY",
                FieldWidget::dropdown(&[("none", "N"), ("odd", "O"), ("even", "E")]),
            )
            .field(
                "STOPBITS",
                FieldWidget::dropdown(&[("1 bit", "1"), ("1.5 bits", "1.5"), ("2 bits", "2")]),
            ),
            ConfigEmitter,
        ),
        BlockKind::new(
            BlockSchema::value("text", "%1", &[TypeTag::String]).field(
                "TEXT",
                FieldWidget::Text {
                    default: String::new(),
                },
            ),
            TextEmitter,
        ),
        BlockKind::new(
            BlockSchema::value("device_address", "device address %1", &[TypeTag::Number]).field(
                "ADDRESS",
                FieldWidget::Number {
                    default: 1.0,
                    min: 1.0,
                    max: 99.0,
                    precision: 1.0,
                },
            ),
            AddressEmitter,
        ),
        BlockKind::new(
            BlockSchema::statement("serial_close", "close serial port"),
            CloseEmitter,
        ),
        BlockKind::new(
            BlockSchema::statement("serial_save_settings", "save serial settings %1")
                .socket(Socket::new("SERIAL").check(&[TypeTag::Serial])),
            SaveSettingsEmitter,
        ),
    ]
}

/// Builds the serial configuration mapping literal.
pub fn config_mapping(
    port: Expr,
    baudrate: Expr,
    databits: Expr,
    parity: &str,
    stopbits: Expr,
) -> Expr {
    let values = [
        port,
        baudrate,
        databits,
        Expr::single(parity),
        stopbits,
        Expr::single(FLOW_CONTROL),
    ];
    Expr::Dict(
        CONFIG_KEYS
            .iter()
            .map(|key| key.to_string())
            .zip(values)
            .collect(),
    )
}

fn log(level: &str, message: &str) -> Stmt {
    Stmt::expr(Expr::path("logger").method(level, vec![Expr::str(message)]))
}

/// Opens the shared serial connection unless it is already open, re-raising on failure.
pub(crate) fn connection_prelude(config: Expr) -> Vec<Stmt> {
    vec![
        Stmt::comment("Connect serial port"),
        Stmt::if_else(
            Expr::path("serial_controller.is_connected").not(),
            vec![
                log("info", "Connecting serial port..."),
                Stmt::Try {
                    body: vec![Stmt::expr(
                        Expr::path("serial_controller").method("connect", vec![config]),
                    )],
                    handlers: vec![Handler {
                        exception: "Exception".to_string(),
                        binding: Some("e".to_string()),
                        body: vec![
                            Stmt::expr(Expr::path("logger").method(
                                "error",
                                vec![Expr::Format("Serial connection failed: {e}".to_string())],
                            )),
                            Stmt::Raise(None),
                        ],
                    }],
                },
            ],
            vec![],
        ),
    ]
}

/// Runs `setup` for a device only if the serial connection is open, raising otherwise.
pub(crate) fn guarded_device_setup(device: &str, setup: Vec<Stmt>) -> Vec<Stmt> {
    let failure = format!("Serial port not connected, cannot initialize {}", device);
    let mut body = vec![log("info", &format!("Initializing {}...", device))];
    body.extend(setup);
    vec![
        Stmt::comment(format!("Initialize {}", device)),
        Stmt::if_else(
            Expr::path("serial_controller.is_connected"),
            body,
            vec![
                log("error", &failure),
                Stmt::Raise(Some(
                    Expr::Name("ConnectionError".to_string()).call(vec![Expr::str(failure.as_str())]),
                )),
            ],
        ),
    ]
}

/// Full initialize sequence shared by every device: connection prelude, blank line, device setup.
pub(crate) fn initialize_sequence(config: Expr, device: &str, setup: Vec<Stmt>) -> Vec<Stmt> {
    let mut statements = connection_prelude(config);
    statements.push(Stmt::Blank);
    statements.extend(guarded_device_setup(device, setup));
    statements
}

struct PortSelectEmitter;

impl BlockEmitter for PortSelectEmitter {
    fn emit(&self, ctx: &mut EmitContext<'_>) -> Fragment {
        let port = ctx.field_text("PORT");
        tracing::debug!(block_id = ctx.block_id(), "Selected port: {}", port);
        Fragment::Value(Expr::str(port))
    }
}

struct ConfigEmitter;

impl BlockEmitter for ConfigEmitter {
    fn emit(&self, ctx: &mut EmitContext<'_>) -> Fragment {
        let port = ctx.input("PORT");
        let mapping = config_mapping(
            port,
            Expr::numeric_or_str(&ctx.field_text("BAUDRATE")),
            Expr::numeric_or_str(&ctx.field_text("DATABITS")),
            &ctx.field_text("PARITY"),
            Expr::numeric_or_str(&ctx.field_text("STOPBITS")),
        );
        Fragment::Value(mapping)
    }
}

struct TextEmitter;

impl BlockEmitter for TextEmitter {
    fn emit(&self, ctx: &mut EmitContext<'_>) -> Fragment {
        Fragment::Value(Expr::str(ctx.field_text("TEXT")))
    }
}

struct AddressEmitter;

impl BlockEmitter for AddressEmitter {
    fn emit(&self, ctx: &mut EmitContext<'_>) -> Fragment {
        let address = ctx.field("ADDRESS");
        Fragment::Value(match address.as_number() {
            Some(n) => Expr::number(n),
            None => Expr::numeric_or_str(&address.to_string()),
        })
    }
}

struct CloseEmitter;

impl BlockEmitter for CloseEmitter {
    fn emit(&self, _ctx: &mut EmitContext<'_>) -> Fragment {
        Fragment::Statements(vec![
            Stmt::comment("Close serial port"),
            Stmt::if_else(
                Expr::path("serial_controller.is_connected"),
                vec![
                    log("info", "Closing serial port..."),
                    Stmt::expr(Expr::path("serial_controller").method("disconnect", vec![])),
                ],
                vec![],
            ),
        ])
    }
}

struct SaveSettingsEmitter;

impl BlockEmitter for SaveSettingsEmitter {
    // The SERIAL socket only shapes the diagram; the runtime saves its own settings.
    fn emit(&self, _ctx: &mut EmitContext<'_>) -> Fragment {
        Fragment::Statements(vec![Stmt::expr(
            Expr::path("serial_settings").method("save", vec![]),
        )])
    }
}
