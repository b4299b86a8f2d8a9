use thiserror::Error;

/// Errors that can occur while building a block catalog.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Block kind '{0}' is already registered")]
    DuplicateKind(String),

    #[error(
        "Block kind '{kind}' has {placeholders} placeholders in its template but declares {inputs} inputs"
    )]
    TemplateMismatch {
        kind: String,
        placeholders: usize,
        inputs: usize,
    },

    #[error("Block kind '{kind}' declares input '{name}' more than once")]
    DuplicateInput { kind: String, name: String },
}

/// Errors that can occur while editing a diagram.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagramError {
    #[error("Block kind '{0}' is not registered in the catalog")]
    UnknownKind(String),

    #[error("Block '{0}' not found in the diagram")]
    BlockNotFound(String),

    #[error("A block with id '{0}' already exists in the diagram")]
    DuplicateBlockId(String),

    #[error("Block id {0:?} must be non-empty and free of control characters")]
    InvalidBlockId(String),

    #[error("Block '{block_id}' ({kind}) has no value socket named '{socket}'")]
    UnknownSocket {
        block_id: String,
        kind: String,
        socket: String,
    },

    #[error("Block '{block_id}' ({kind}) has no field named '{field}'")]
    UnknownField {
        block_id: String,
        kind: String,
        field: String,
    },

    #[error("Invalid value for field '{field}' on block '{block_id}': {message}")]
    InvalidFieldValue {
        block_id: String,
        field: String,
        message: String,
    },

    #[error("Block '{block_id}' ({kind}) has no output and cannot be plugged into a socket")]
    NoOutput { block_id: String, kind: String },

    #[error(
        "Socket '{socket}' on block '{block_id}' accepts [{accepted}] but the connected block provides [{provided}]"
    )]
    TypeMismatch {
        block_id: String,
        socket: String,
        accepted: String,
        provided: String,
    },

    #[error("Socket '{socket}' on block '{block_id}' already holds a connection")]
    SocketOccupied { block_id: String, socket: String },

    #[error("Block '{0}' is already connected to another block")]
    AlreadyConnected(String),

    #[error("Block '{block_id}' ({kind}) has no {link} statement connection")]
    NoStatementLink {
        block_id: String,
        kind: String,
        link: &'static str,
    },

    #[error("Connecting block '{0}' would create a cycle")]
    Cycle(String),
}

/// Errors that can occur when converting a workspace file into a diagram.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkspaceError {
    #[error("Failed to parse workspace JSON: {0}")]
    JsonParseError(String),

    #[error("Invalid workspace data: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Diagram(#[from] DiagramError),
}

/// Errors that can occur during compilation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Block '{0}' not found in the diagram")]
    BlockNotFound(String),

    #[error("Compilation produced {0} diagnostic(s) and strict mode is enabled")]
    Strict(usize),
}

/// Errors that can occur while saving or loading a compiled program.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Artifact error: {0}")]
    Generic(String),
}

/// Errors that can occur while loading or saving serial settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not access settings file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown serial setting '{0}'")]
    UnknownKey(String),
}
