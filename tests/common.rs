//! Common test utilities for building diagrams and expected scripts.
use labblocks::prelude::*;

/// Ids of the blocks in [`valve_protocol`].
#[allow(dead_code)]
pub struct ValveProtocol {
    pub port: String,
    pub config: String,
    pub address: String,
    pub init: String,
    pub rotate: String,
    pub position: String,
}

/// Builds `init_valve(serial_config(port="COM4"), address=5) -> rotate_valve(7)`.
#[allow(dead_code)]
pub fn valve_protocol(catalog: &Catalog) -> (Diagram, ValveProtocol) {
    let mut diagram = Diagram::new();
    let port = diagram.add_block(catalog, "serial_port_select").unwrap();
    diagram.set_field(catalog, &port, "PORT", "COM4").unwrap();
    let config = diagram.add_block(catalog, "serial_config").unwrap();
    diagram.set_field(catalog, &config, "BAUDRATE", "9600").unwrap();
    diagram.connect_value(catalog, &config, "PORT", &port).unwrap();

    let address = diagram.add_block(catalog, "device_address").unwrap();
    diagram.set_field(catalog, &address, "ADDRESS", 5.0).unwrap();

    let init = diagram.add_block(catalog, "init_valve").unwrap();
    diagram
        .connect_value(catalog, &init, "SERIAL_CONFIG", &config)
        .unwrap();
    diagram
        .connect_value(catalog, &init, "DEVICE_ADDRESS", &address)
        .unwrap();

    let position = diagram.add_block(catalog, "device_address").unwrap();
    diagram.set_field(catalog, &position, "ADDRESS", 7.0).unwrap();
    let rotate = diagram.add_block(catalog, "rotate_valve").unwrap();
    diagram
        .connect_value(catalog, &rotate, "POSITION", &position)
        .unwrap();
    diagram.connect_next(catalog, &init, &rotate).unwrap();

    (
        diagram,
        ValveProtocol {
            port,
            config,
            address,
            init,
            rotate,
            position,
        },
    )
}

/// The script [`valve_protocol`] compiles to.
#[allow(dead_code)]
pub const VALVE_PROTOCOL_SCRIPT: &str = r#"# Connect serial port
if not serial_controller.is_connected:
    logger.info("Connecting serial port...")
    try:
        serial_controller.connect({
            'port': "COM4",
            'baudrate': 9600,
            'databits': 8,
            'parity': 'N',
            'stopbits': 1,
            'flowcontrol': 'N'
        })
    except Exception as e:
        logger.error(f"Serial connection failed: {e}")
        raise

# Initialize rotary valve
if serial_controller.is_connected:
    logger.info("Initializing rotary valve...")
    valve = ValveController(serial_controller)
    valve.initialize(5)
else:
    logger.error("Serial port not connected, cannot initialize rotary valve")
    raise ConnectionError("Serial port not connected, cannot initialize rotary valve")
valve.rotate_to_position(7)
"#;

/// A lone block of `kind` in an otherwise empty diagram.
#[allow(dead_code)]
pub fn single_block(catalog: &Catalog, kind: &str) -> (Diagram, String) {
    let mut diagram = Diagram::new();
    let id = diagram.add_block(catalog, kind).unwrap();
    (diagram, id)
}

/// Workspace JSON for a pump routine with a comment, a disabled block and a shadow.
#[allow(dead_code)]
pub const PUMP_WORKSPACE: &str = r#"{
  "blocks": {
    "languageVersion": 0,
    "blocks": [
      {
        "type": "pump_set_speed",
        "id": "speed",
        "x": 20,
        "y": 40,
        "icons": { "comment": { "text": "slow draw", "pinned": false, "height": 80, "width": 160 } },
        "inputs": {
          "SPEED": { "shadow": { "type": "device_address", "id": "speed_value", "fields": { "ADDRESS": 10 } } }
        },
        "next": {
          "block": {
            "type": "pump_aspirate",
            "id": "draw",
            "enabled": false,
            "next": {
              "block": {
                "type": "pump_delay",
                "id": "wait",
                "inputs": {
                  "SECONDS": { "block": { "type": "device_address", "id": "two", "fields": { "ADDRESS": 2 } } }
                }
              }
            }
          }
        }
      },
      {
        "type": "serial_close",
        "id": "close",
        "x": 20,
        "y": 400
      }
    ]
  }
}"#;
