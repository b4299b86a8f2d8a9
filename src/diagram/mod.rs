//! Block instances and the connections between them.
use crate::catalog::{BlockSchema, Catalog, DropdownOption, FieldValue, describe_tags, types_compatible};
use crate::error::DiagramError;
use ahash::AHashMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;

mod options;

pub use options::*;

/// A concrete block placed in a diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockInstance {
    id: String,
    kind: String,
    fields: BTreeMap<String, FieldValue>,
    /// Value socket name -> id of the producer plugged into it.
    inputs: BTreeMap<String, String>,
    next: Option<String>,
    /// Block and socket this block is plugged into.
    parent: Option<(String, String)>,
    previous: Option<String>,
    comment: Option<String>,
    enabled: bool,
    shadow: bool,
    position: Option<(f64, f64)>,
    /// Dropdown options replaced at runtime, by field name.
    options: BTreeMap<String, Vec<DropdownOption>>,
    revision: u64,
}

impl BlockInstance {
    fn new(id: String, schema: &BlockSchema) -> Self {
        let fields = schema
            .fields()
            .map(|f| (f.name.clone(), f.widget.default_value()))
            .collect();
        Self {
            id,
            kind: schema.kind.clone(),
            fields,
            inputs: BTreeMap::new(),
            next: None,
            parent: None,
            previous: None,
            comment: None,
            enabled: true,
            shadow: false,
            position: None,
            options: BTreeMap::new(),
            revision: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Id of the block plugged into a value socket.
    pub fn input(&self, socket: &str) -> Option<&str> {
        self.inputs.get(socket).map(String::as_str)
    }

    pub fn inputs(&self) -> &BTreeMap<String, String> {
        &self.inputs
    }

    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// The `(block id, socket)` this block is plugged into.
    pub fn parent(&self) -> Option<(&str, &str)> {
        self.parent.as_ref().map(|(b, s)| (b.as_str(), s.as_str()))
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_shadow(&self) -> bool {
        self.shadow
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.position
    }

    /// Options of a dropdown field that were replaced on this instance.
    pub fn options(&self, field: &str) -> Option<&[DropdownOption]> {
        self.options.get(field).map(Vec::as_slice)
    }

    /// Incremented on every change the editor needs to redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none() && self.previous.is_none()
    }
}

/// A forest of block instances. The diagram owns every instance; connections
/// are stored as ids on both ends.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    blocks: AHashMap<String, BlockInstance>,
    order: Vec<String>,
    next_id: u64,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block of `kind` with a generated id and default field values.
    pub fn add_block(&mut self, catalog: &Catalog, kind: &str) -> Result<String, DiagramError> {
        let id = self.fresh_id(|_| false);
        self.add_block_with_id(catalog, &id, kind)
    }

    /// The next generated id that is neither in use nor `reserved`.
    pub(crate) fn fresh_id(&mut self, reserved: impl Fn(&str) -> bool) -> String {
        loop {
            self.next_id += 1;
            let candidate = format!("b{}", self.next_id);
            if !self.blocks.contains_key(&candidate) && !reserved(&candidate) {
                return candidate;
            }
        }
    }

    /// Adds a block with a caller-chosen id.
    pub fn add_block_with_id(
        &mut self,
        catalog: &Catalog,
        id: &str,
        kind: &str,
    ) -> Result<String, DiagramError> {
        let schema = catalog
            .schema(kind)
            .ok_or_else(|| DiagramError::UnknownKind(kind.to_string()))?;
        if id.is_empty() || id.chars().any(char::is_control) {
            return Err(DiagramError::InvalidBlockId(id.to_string()));
        }
        if self.blocks.contains_key(id) {
            return Err(DiagramError::DuplicateBlockId(id.to_string()));
        }
        self.blocks
            .insert(id.to_string(), BlockInstance::new(id.to_string(), schema));
        self.order.push(id.to_string());
        Ok(id.to_string())
    }

    pub fn block(&self, id: &str) -> Option<&BlockInstance> {
        self.blocks.get(id)
    }

    /// Blocks in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockInstance> {
        self.order.iter().filter_map(|id| self.blocks.get(id))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Releases every instance.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.order.clear();
    }

    pub fn set_field(
        &mut self,
        catalog: &Catalog,
        id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), DiagramError> {
        let block = self.get(id)?;
        let schema = Self::schema_of(catalog, block)?;
        let definition = schema
            .find_field(field)
            .ok_or_else(|| DiagramError::UnknownField {
                block_id: id.to_string(),
                kind: block.kind.clone(),
                field: field.to_string(),
            })?;
        let stored = definition
            .widget
            .validate(value.into(), block.options(field))
            .map_err(|message| DiagramError::InvalidFieldValue {
                block_id: id.to_string(),
                field: field.to_string(),
                message,
            })?;

        let block = self.get_mut(id)?;
        block.fields.insert(field.to_string(), stored);
        block.revision += 1;
        Ok(())
    }

    pub fn set_comment(&mut self, id: &str, comment: Option<String>) -> Result<(), DiagramError> {
        let block = self.get_mut(id)?;
        block.comment = comment.filter(|c| !c.trim().is_empty());
        block.revision += 1;
        Ok(())
    }

    /// Disabled blocks emit no code.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), DiagramError> {
        let block = self.get_mut(id)?;
        block.enabled = enabled;
        block.revision += 1;
        Ok(())
    }

    pub fn set_shadow(&mut self, id: &str, shadow: bool) -> Result<(), DiagramError> {
        self.get_mut(id)?.shadow = shadow;
        Ok(())
    }

    pub fn set_position(&mut self, id: &str, x: f64, y: f64) -> Result<(), DiagramError> {
        self.get_mut(id)?.position = Some((x, y));
        Ok(())
    }

    /// Plugs `child` into the value socket `socket` of `parent`.
    pub fn connect_value(
        &mut self,
        catalog: &Catalog,
        parent: &str,
        socket: &str,
        child: &str,
    ) -> Result<(), DiagramError> {
        let parent_block = self.get(parent)?;
        let child_block = self.get(child)?;
        let parent_schema = Self::schema_of(catalog, parent_block)?;
        let child_schema = Self::schema_of(catalog, child_block)?;

        let target = parent_schema
            .find_socket(socket)
            .ok_or_else(|| DiagramError::UnknownSocket {
                block_id: parent.to_string(),
                kind: parent_block.kind.clone(),
                socket: socket.to_string(),
            })?;
        let output = child_schema.output().ok_or_else(|| DiagramError::NoOutput {
            block_id: child.to_string(),
            kind: child_block.kind.clone(),
        })?;
        if !types_compatible(output, target.check.as_deref()) {
            return Err(DiagramError::TypeMismatch {
                block_id: parent.to_string(),
                socket: socket.to_string(),
                accepted: describe_tags(target.check.as_deref()),
                provided: describe_tags(output),
            });
        }
        if parent_block.inputs.contains_key(socket) {
            return Err(DiagramError::SocketOccupied {
                block_id: parent.to_string(),
                socket: socket.to_string(),
            });
        }
        if !child_block.is_top_level() {
            return Err(DiagramError::AlreadyConnected(child.to_string()));
        }
        if self.root_of(parent) == child {
            return Err(DiagramError::Cycle(child.to_string()));
        }

        self.get_mut(parent)?
            .inputs
            .insert(socket.to_string(), child.to_string());
        self.get_mut(child)?.parent = Some((parent.to_string(), socket.to_string()));
        Ok(())
    }

    /// Attaches `next` directly below `previous` in a statement chain.
    pub fn connect_next(
        &mut self,
        catalog: &Catalog,
        previous: &str,
        next: &str,
    ) -> Result<(), DiagramError> {
        let previous_block = self.get(previous)?;
        let next_block = self.get(next)?;
        if !Self::schema_of(catalog, previous_block)?.has_next() {
            return Err(DiagramError::NoStatementLink {
                block_id: previous.to_string(),
                kind: previous_block.kind.clone(),
                link: "next",
            });
        }
        if !Self::schema_of(catalog, next_block)?.has_previous() {
            return Err(DiagramError::NoStatementLink {
                block_id: next.to_string(),
                kind: next_block.kind.clone(),
                link: "previous",
            });
        }
        if previous_block.next.is_some() {
            return Err(DiagramError::SocketOccupied {
                block_id: previous.to_string(),
                socket: "next".to_string(),
            });
        }
        if !next_block.is_top_level() {
            return Err(DiagramError::AlreadyConnected(next.to_string()));
        }
        if self.root_of(previous) == next {
            return Err(DiagramError::Cycle(next.to_string()));
        }

        self.get_mut(previous)?.next = Some(next.to_string());
        self.get_mut(next)?.previous = Some(previous.to_string());
        Ok(())
    }

    /// Detaches a block from its parent socket or previous block. The block
    /// keeps its own children and the rest of its chain.
    pub fn disconnect(&mut self, id: &str) -> Result<(), DiagramError> {
        let block = self.get_mut(id)?;
        let parent = block.parent.take();
        let previous = block.previous.take();
        if let Some((parent_id, socket)) = parent {
            if let Some(parent) = self.blocks.get_mut(&parent_id) {
                parent.inputs.remove(&socket);
            }
        }
        if let Some(previous_id) = previous {
            if let Some(previous) = self.blocks.get_mut(&previous_id) {
                previous.next = None;
            }
        }
        Ok(())
    }

    /// Deletes a block together with everything plugged into its sockets. The
    /// statement below it moves up to take its place.
    pub fn remove_block(&mut self, id: &str) -> Result<(), DiagramError> {
        let block = self.get(id)?;
        let previous = block.previous.clone();
        let next = block.next.clone();

        self.disconnect(id)?;
        if let Some(next_id) = &next {
            self.get_mut(next_id)?.previous = previous.clone();
            if let Some(previous_id) = &previous {
                self.get_mut(previous_id)?.next = Some(next_id.clone());
            }
        }

        let mut pending = vec![id.to_string()];
        while let Some(current) = pending.pop() {
            if let Some(removed) = self.blocks.remove(&current) {
                pending.extend(removed.inputs.into_values());
            }
        }
        self.order.retain(|b| self.blocks.contains_key(b));
        Ok(())
    }

    /// Blocks with neither a parent nor a previous block, sorted top to bottom,
    /// then left to right. Unpositioned blocks follow in insertion order.
    pub fn top_blocks(&self) -> Vec<&BlockInstance> {
        let mut tops: Vec<&BlockInstance> = self.blocks().filter(|b| b.is_top_level()).collect();
        tops.sort_by(|a, b| match (a.position, b.position) {
            (Some((ax, ay)), Some((bx, by))) => ay.total_cmp(&by).then(ax.total_cmp(&bx)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        tops
    }

    /// The chain starting at `id`, following next links.
    pub fn chain(&self, id: &str) -> Vec<&BlockInstance> {
        let mut chain = Vec::new();
        let mut current = self.blocks.get(id);
        while let Some(block) = current {
            chain.push(block);
            current = block.next.as_deref().and_then(|n| self.blocks.get(n));
        }
        chain
    }

    /// Walks parent and previous links up to the top-level block.
    fn root_of<'a>(&'a self, id: &'a str) -> &'a str {
        let mut current = id;
        while let Some(block) = self.blocks.get(current) {
            match (&block.parent, &block.previous) {
                (Some((parent, _)), _) => current = parent,
                (None, Some(previous)) => current = previous,
                (None, None) => break,
            }
        }
        current
    }

    fn get(&self, id: &str) -> Result<&BlockInstance, DiagramError> {
        self.blocks
            .get(id)
            .ok_or_else(|| DiagramError::BlockNotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut BlockInstance, DiagramError> {
        self.blocks
            .get_mut(id)
            .ok_or_else(|| DiagramError::BlockNotFound(id.to_string()))
    }

    fn schema_of<'c>(
        catalog: &'c Catalog,
        block: &BlockInstance,
    ) -> Result<&'c BlockSchema, DiagramError> {
        catalog
            .schema(&block.kind)
            .ok_or_else(|| DiagramError::UnknownKind(block.kind.clone()))
    }
}
