//! The registry of block kinds available to diagrams and the compiler.
use crate::compiler::emitter::BlockEmitter;
use crate::error::CatalogError;
use ahash::{AHashMap, AHashSet};

pub mod pump;
pub mod schema;
pub mod serial;
pub mod valve;

pub use schema::*;

/// A block kind: its schema and the emitter that turns instances into script.
pub struct BlockKind {
    pub schema: BlockSchema,
    pub emitter: Box<dyn BlockEmitter>,
}

impl BlockKind {
    pub fn new(schema: BlockSchema, emitter: impl BlockEmitter + 'static) -> Self {
        Self {
            schema,
            emitter: Box::new(emitter),
        }
    }

    pub fn id(&self) -> &str {
        &self.schema.kind
    }
}

impl std::fmt::Debug for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockKind")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// A set of block kinds, keyed by kind id.
///
/// Built once at startup and read-only while compiling.
#[derive(Debug, Default)]
pub struct Catalog {
    kinds: AHashMap<String, BlockKind>,
    order: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the serial, pump and valve blocks.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for kind in serial::kinds()
            .into_iter()
            .chain(pump::kinds())
            .chain(valve::kinds())
        {
            if let Err(e) = catalog.register(kind) {
                tracing::error!("Skipping built-in block kind: {}", e);
            }
        }
        catalog
    }

    /// Adds a kind, refusing ids that are already registered.
    pub fn register(&mut self, kind: BlockKind) -> Result<(), CatalogError> {
        if self.kinds.contains_key(kind.id()) {
            return Err(CatalogError::DuplicateKind(kind.id().to_string()));
        }
        Self::validate(&kind.schema)?;
        self.insert(kind);
        Ok(())
    }

    /// Adds a kind, overwriting any kind with the same id. Returns the previous kind.
    pub fn replace(&mut self, kind: BlockKind) -> Option<BlockKind> {
        let id = kind.id().to_string();
        let previous = self.kinds.remove(&id);
        self.insert(kind);
        previous
    }

    pub fn get(&self, kind: &str) -> Option<&BlockKind> {
        self.kinds.get(kind)
    }

    pub fn schema(&self, kind: &str) -> Option<&BlockSchema> {
        self.kinds.get(kind).map(|k| &k.schema)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Kinds in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &BlockKind> {
        self.order.iter().filter_map(|id| self.kinds.get(id))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    fn insert(&mut self, kind: BlockKind) {
        let id = kind.id().to_string();
        if !self.order.contains(&id) {
            self.order.push(id.clone());
        }
        self.kinds.insert(id, kind);
    }

    fn validate(schema: &BlockSchema) -> Result<(), CatalogError> {
        let placeholders = schema.placeholder_count();
        if placeholders != schema.inputs.len() {
            return Err(CatalogError::TemplateMismatch {
                kind: schema.kind.clone(),
                placeholders,
                inputs: schema.inputs.len(),
            });
        }
        let mut seen = AHashSet::new();
        for input in &schema.inputs {
            if !seen.insert(input.name()) {
                return Err(CatalogError::DuplicateInput {
                    kind: schema.kind.clone(),
                    name: input.name().to_string(),
                });
            }
        }
        Ok(())
    }
}
