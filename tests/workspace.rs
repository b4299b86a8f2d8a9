//! Tests for loading and saving editor workspaces.
mod common;
use common::*;
use labblocks::prelude::*;
use labblocks::workspace::{BlockJson, parse_workspace};

const PUMP_SCRIPT: &str = "# slow draw
pump.set_speed(10)
import time
time.sleep(2)

# Close serial port
if serial_controller.is_connected:
    logger.info(\"Closing serial port...\")
    serial_controller.disconnect()
";

#[test]
fn test_load_workspace_builds_the_diagram() {
    let catalog = Catalog::standard();
    let diagram = load_workspace(&catalog, PUMP_WORKSPACE).unwrap();

    assert_eq!(diagram.len(), 6);
    let speed = diagram.block("speed").unwrap();
    assert_eq!(speed.position(), Some((20.0, 40.0)));
    assert_eq!(speed.comment(), Some("slow draw"));
    assert_eq!(speed.input("SPEED"), Some("speed_value"));
    assert_eq!(speed.next(), Some("draw"));

    assert!(diagram.block("speed_value").unwrap().is_shadow());
    assert!(!diagram.block("draw").unwrap().is_enabled());
    assert_eq!(
        diagram.block("two").unwrap().field("ADDRESS"),
        Some(&FieldValue::Number(2.0))
    );
    assert_eq!(diagram.top_blocks().len(), 2);
}

#[test]
fn test_loaded_workspace_compiles() {
    let compiler = Compiler::standard();
    let diagram = load_workspace(compiler.catalog(), PUMP_WORKSPACE).unwrap();
    let script = compiler.compile(&diagram);
    assert_eq!(script.code, PUMP_SCRIPT);
    assert!(script.is_clean(), "{:?}", script.diagnostics);
}

#[test]
fn test_export_then_import_preserves_output() {
    let compiler = Compiler::standard();
    let catalog = compiler.catalog();

    let (diagram, _) = valve_protocol(catalog);
    let json = save_workspace(&diagram).unwrap();
    let reloaded = load_workspace(catalog, &json).unwrap();
    assert_eq!(compiler.compile(&reloaded).code, VALVE_PROTOCOL_SCRIPT);

    let diagram = load_workspace(catalog, PUMP_WORKSPACE).unwrap();
    let reloaded = load_workspace(catalog, &save_workspace(&diagram).unwrap()).unwrap();
    assert_eq!(compiler.compile(&reloaded).code, PUMP_SCRIPT);
    assert!(reloaded.block("speed_value").unwrap().is_shadow());
    assert!(!reloaded.block("draw").unwrap().is_enabled());
}

#[test]
fn test_export_layout() {
    let catalog = Catalog::standard();
    let diagram = load_workspace(&catalog, PUMP_WORKSPACE).unwrap();
    let workspace = diagram.to_workspace();

    assert_eq!(workspace.blocks.language_version, 0);
    let tops: Vec<&BlockJson> = workspace.blocks.blocks.iter().collect();
    assert_eq!(tops.len(), 2);
    assert_eq!(tops[0].id.as_deref(), Some("speed"));
    assert_eq!(tops[0].comment(), Some("slow draw"));
    let speed_input = &tops[0].inputs["SPEED"];
    assert!(speed_input.block.is_none());
    assert_eq!(speed_input.shadow.as_ref().unwrap().kind, "device_address");

    let draw = &tops[0].next.as_ref().unwrap().block;
    assert!(!draw.enabled);
    // Only top-level blocks carry coordinates.
    assert_eq!(draw.x, None);

    let value = serde_json::to_value(&workspace).unwrap();
    assert_eq!(value["blocks"]["blocks"][1]["type"], "serial_close");
    assert_eq!(value["blocks"]["blocks"][1]["y"], 400.0);
    assert!(value["blocks"]["blocks"][1].get("enabled").is_none());
}

#[test]
fn test_blocks_without_ids_get_generated_ids() {
    let catalog = Catalog::standard();
    let json = r#"{"blocks": {"blocks": [
        {"type": "pump_switch_input", "next": {"block": {"type": "pump_stop"}}}
    ]}}"#;
    let diagram = load_workspace(&catalog, json).unwrap();
    assert_eq!(diagram.len(), 2);
    let top = diagram.top_blocks()[0];
    assert_eq!(top.kind(), "pump_switch_input");
    let next = diagram.block(top.next().unwrap()).unwrap();
    assert_eq!(next.kind(), "pump_stop");
}

#[test]
fn test_generated_ids_skip_ids_used_later_in_the_file() {
    let catalog = Catalog::standard();
    let json = r#"{"blocks": {"blocks": [
        {"type": "pump_switch_input", "next": {"block": {"type": "pump_stop", "id": "b1"}}}
    ]}}"#;
    let diagram = load_workspace(&catalog, json).unwrap();
    assert_eq!(diagram.len(), 2);
    let top = diagram.top_blocks()[0];
    assert_eq!(top.kind(), "pump_switch_input");
    assert_ne!(top.id(), "b1");
    assert_eq!(top.next(), Some("b1"));
}

#[test]
fn test_long_chains_survive_export_and_import() {
    let compiler = Compiler::standard();
    let catalog = compiler.catalog();
    let mut diagram = Diagram::new();
    let mut previous = diagram.add_block(catalog, "pump_stop").unwrap();
    for _ in 1..250 {
        let id = diagram.add_block(catalog, "pump_stop").unwrap();
        diagram.connect_next(catalog, &previous, &id).unwrap();
        previous = id;
    }
    let expected = compiler.compile(&diagram).code;
    assert_eq!(expected.lines().count(), 250);

    let json = save_workspace(&diagram).unwrap();
    let reloaded = load_workspace(catalog, &json).unwrap();
    assert_eq!(reloaded.len(), 250);
    assert_eq!(reloaded.top_blocks().len(), 1);
    assert_eq!(compiler.compile(&reloaded).code, expected);
}

#[test]
fn test_block_ids_that_break_lines_are_rejected() {
    let catalog = Catalog::standard();
    let json = r#"{"blocks": {"blocks": [{"type": "pump_stop", "id": "x\nimport os"}]}}"#;
    assert_eq!(
        load_workspace(&catalog, json).unwrap_err(),
        WorkspaceError::Diagram(DiagramError::InvalidBlockId("x\nimport os".into()))
    );
}

#[test]
fn test_empty_workspace() {
    let catalog = Catalog::standard();
    let diagram = load_workspace(&catalog, "{}").unwrap();
    assert!(diagram.is_empty());
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    assert!(matches!(
        parse_workspace("{\"blocks\": ["),
        Err(WorkspaceError::JsonParseError(_))
    ));
}

#[test]
fn test_invalid_content_is_rejected() {
    let catalog = Catalog::standard();

    let unknown = r#"{"blocks": {"blocks": [{"type": "controls_repeat", "id": "r"}]}}"#;
    assert_eq!(
        load_workspace(&catalog, unknown).err(),
        Some(WorkspaceError::Diagram(DiagramError::UnknownKind(
            "controls_repeat".into()
        )))
    );

    let mismatch = r#"{"blocks": {"blocks": [{"type": "init_valve", "id": "v",
        "inputs": {"SERIAL_CONFIG": {"block": {"type": "get_valve_position", "id": "p"}}}}]}}"#;
    assert!(matches!(
        load_workspace(&catalog, mismatch),
        Err(WorkspaceError::Diagram(DiagramError::TypeMismatch { .. }))
    ));

    let bad_field = r#"{"blocks": {"blocks": [{"type": "serial_config", "id": "c",
        "fields": {"PARITY": "X"}}]}}"#;
    assert!(matches!(
        load_workspace(&catalog, bad_field),
        Err(WorkspaceError::Diagram(DiagramError::InvalidFieldValue { .. }))
    ));

    let half_placed = r#"{"blocks": {"blocks": [{"type": "pump_stop", "x": 10}]}}"#;
    assert!(matches!(
        load_workspace(&catalog, half_placed),
        Err(WorkspaceError::ValidationError(_))
    ));
}

#[test]
fn test_custom_formats_through_into_diagram() {
    struct StepList(Vec<&'static str>);

    impl IntoDiagram for StepList {
        fn into_diagram(self, catalog: &Catalog) -> std::result::Result<Diagram, WorkspaceError> {
            let mut diagram = Diagram::new();
            let mut previous: Option<String> = None;
            for kind in self.0 {
                let id = diagram.add_block(catalog, kind)?;
                if let Some(previous) = &previous {
                    diagram.connect_next(catalog, previous, &id)?;
                }
                previous = Some(id);
            }
            Ok(diagram)
        }
    }

    let compiler = Compiler::standard();
    let diagram = StepList(vec!["pump_switch_output", "pump_stop"])
        .into_diagram(compiler.catalog())
        .unwrap();
    assert_eq!(
        compiler.compile(&diagram).code,
        "pump.switch_to_output()\npump.stop()\n"
    );
}
