use clap::{Parser, Subcommand};
use labblocks::prelude::*;
use labblocks::settings::DEFAULT_SETTINGS_PATH;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Compiles block-editor workspaces into lab automation scripts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a workspace JSON file to a Python script
    Compile {
        /// Path to the workspace JSON file
        workspace: String,
        /// Write the script here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
        /// Prefix each block's code with a `# block_id:` line
        #[arg(long)]
        markers: bool,
        /// Fail if any socket fell back to its default
        #[arg(long)]
        strict: bool,
        /// Use these serial settings for unconnected serial-config sockets
        #[arg(long)]
        settings: Option<String>,
        /// Also save the compiled program as a binary artifact
        #[arg(long)]
        artifact: Option<String>,
    },
    /// List the registered block kinds
    Catalog,
    /// Refresh every serial-port dropdown of a workspace with the given ports
    Ports {
        /// Path to the workspace JSON file
        workspace: String,
        /// Available ports; none selects the fallback port
        ports: Vec<String>,
        /// Write the workspace here instead of overwriting the input
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Render a saved artifact back to a script
    Render {
        /// Path to the artifact file
        artifact: String,
        #[arg(long)]
        markers: bool,
    },
    /// Show or edit the persisted serial settings
    Settings {
        #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
        path: String,
        /// `key=value` pairs to update; values are parsed as JSON, falling back to strings
        #[arg(long = "set", value_name = "KEY=VALUE")]
        updates: Vec<String>,
        /// Restore the defaults
        #[arg(long)]
        reset: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compile {
            workspace,
            output,
            markers,
            strict,
            settings,
            artifact,
        } => run_compile(workspace, output, markers, strict, settings, artifact),
        Command::Catalog => run_catalog(),
        Command::Ports {
            workspace,
            ports,
            output,
        } => run_ports(workspace, ports, output),
        Command::Render { artifact, markers } => run_render(artifact, markers),
        Command::Settings {
            path,
            updates,
            reset,
        } => run_settings(path, updates, reset),
    }
}

fn run_compile(
    workspace_path: String,
    output: Option<String>,
    markers: bool,
    strict: bool,
    settings_path: Option<String>,
    artifact_path: Option<String>,
) {
    let start = Instant::now();
    let json = fs::read_to_string(&workspace_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read workspace file '{}': {}",
            workspace_path, e
        ))
    });

    let mut builder = Compiler::builder(Catalog::standard()).with_block_markers(markers);
    if let Some(path) = settings_path {
        let settings = SerialSettings::load(&path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load settings: {}", e)));
        builder = builder.with_serial_defaults(settings);
    }
    let compiler = builder.build();

    let diagram = load_workspace(compiler.catalog(), &json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workspace: {}", e)));
    let script = compiler.compile(&diagram);
    for diagnostic in &script.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }
    let script = if strict {
        script
            .into_strict()
            .unwrap_or_else(|e| exit_with_error(&e.to_string()))
    } else {
        script
    };

    if let Some(path) = artifact_path {
        CompiledArtifact::new(script.program.clone())
            .save(&path)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    }
    match output {
        Some(path) => {
            fs::write(&path, &script.code).unwrap_or_else(|e| {
                exit_with_error(&format!("Could not write script '{}': {}", path, e))
            });
            eprintln!(
                "Compiled {} blocks into '{}' in {:?}",
                diagram.len(),
                path,
                start.elapsed()
            );
        }
        None => print!("{}", script.code),
    }
}

fn run_catalog() {
    let catalog = Catalog::standard();
    for kind in catalog.kinds() {
        let shape = if kind.schema.is_statement() {
            "statement"
        } else {
            "value"
        };
        println!("{:<26} {:<10} {}", kind.id(), shape, kind.schema.template);
    }
}

fn run_ports(workspace_path: String, ports: Vec<String>, output: Option<String>) {
    let catalog = Catalog::standard();
    let json = fs::read_to_string(&workspace_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read workspace file '{}': {}",
            workspace_path, e
        ))
    });
    let mut diagram = load_workspace(&catalog, &json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workspace: {}", e)));
    let ports = available_ports(ports);
    let refreshed = diagram
        .refresh_ports(&catalog, &ports)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let updated =
        save_workspace(&diagram).unwrap_or_else(|e| exit_with_error(&e.to_string()));

    let target = output.unwrap_or(workspace_path);
    fs::write(&target, updated)
        .unwrap_or_else(|e| exit_with_error(&format!("Could not write '{}': {}", target, e)));
    eprintln!(
        "Refreshed {} port selector(s) with [{}]",
        refreshed,
        ports.join(", ")
    );
}

fn run_render(artifact_path: String, markers: bool) {
    let program = CompiledArtifact::from_file(&artifact_path)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()))
        .into_program();
    let code = if markers {
        program.render_with_markers()
    } else {
        program.render()
    };
    print!("{}", code);
}

fn run_settings(path: String, updates: Vec<String>, reset: bool) {
    let mut settings = SerialSettings::load(&path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load settings: {}", e)));

    if reset {
        settings
            .reset(&path)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    } else if !updates.is_empty() {
        for update in &updates {
            let Some((key, raw)) = update.split_once('=') else {
                exit_with_error(&format!("Expected KEY=VALUE, got '{}'", update));
            };
            let value = serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
            settings
                .update(key.trim(), value)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
        }
        settings
            .save(&path)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    }

    let json = serde_json::to_string_pretty(&settings)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    println!("{}", json);
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
