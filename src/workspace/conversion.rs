use super::definition::{BlockJson, BlockList, CommentJson, IconsJson, InputJson, NextJson, WorkspaceJson};
use crate::catalog::Catalog;
use crate::diagram::{BlockInstance, Diagram};
use crate::error::WorkspaceError;
use ahash::AHashSet;

/// A trait for saved workspace formats that can be turned into a `Diagram`.
///
/// Implement it on your own editor format to feed the compiler without going
/// through the block-editor JSON.
pub trait IntoDiagram {
    /// Consumes the object and builds a diagram against `catalog`.
    fn into_diagram(self, catalog: &Catalog) -> Result<Diagram, WorkspaceError>;
}

impl IntoDiagram for WorkspaceJson {
    fn into_diagram(self, catalog: &Catalog) -> Result<Diagram, WorkspaceError> {
        let mut importer = Importer {
            diagram: Diagram::new(),
            catalog,
            reserved: explicit_ids(&self.blocks.blocks),
        };
        for block in &self.blocks.blocks {
            importer.import_chain(block, false)?;
        }
        tracing::debug!(blocks = importer.diagram.len(), "Imported workspace");
        Ok(importer.diagram)
    }
}

/// Every id written in the file. Generated ids skip these.
fn explicit_ids(blocks: &[BlockJson]) -> AHashSet<String> {
    let mut ids = AHashSet::new();
    let mut pending: Vec<&BlockJson> = blocks.iter().collect();
    while let Some(block) = pending.pop() {
        if let Some(id) = &block.id {
            ids.insert(id.clone());
        }
        for input in block.inputs.values() {
            pending.extend(input.block.as_deref());
            pending.extend(input.shadow.as_deref());
        }
        pending.extend(block.next.as_ref().map(|next| &*next.block));
    }
    ids
}

struct Importer<'a> {
    diagram: Diagram,
    catalog: &'a Catalog,
    reserved: AHashSet<String>,
}

impl Importer<'_> {
    /// Imports `json` and follows its `next` links. Returns the head's id.
    fn import_chain(&mut self, json: &BlockJson, shadow: bool) -> Result<String, WorkspaceError> {
        let head = self.import_block(json, shadow)?;
        let mut previous = head.clone();
        let mut link = json.next.as_ref();
        while let Some(next) = link {
            let id = self.import_block(&next.block, false)?;
            self.diagram.connect_next(self.catalog, &previous, &id)?;
            previous = id;
            link = next.block.next.as_ref();
        }
        Ok(head)
    }

    /// Imports one block and its inputs, ignoring its `next` link.
    fn import_block(&mut self, json: &BlockJson, shadow: bool) -> Result<String, WorkspaceError> {
        let catalog = self.catalog;
        let id = match &json.id {
            Some(id) => self.diagram.add_block_with_id(catalog, id, &json.kind)?,
            None => {
                let reserved = &self.reserved;
                let id = self.diagram.fresh_id(|candidate| reserved.contains(candidate));
                self.diagram.add_block_with_id(catalog, &id, &json.kind)?
            }
        };

        let diagram = &mut self.diagram;
        for (name, value) in &json.fields {
            diagram.set_field(catalog, &id, name, value.clone())?;
        }
        match (json.x, json.y) {
            (Some(x), Some(y)) => diagram.set_position(&id, x, y)?,
            (None, None) => {}
            _ => {
                return Err(WorkspaceError::ValidationError(format!(
                    "Block '{}' has only one coordinate",
                    id
                )));
            }
        }
        if !json.enabled {
            diagram.set_enabled(&id, false)?;
        }
        if shadow {
            diagram.set_shadow(&id, true)?;
        }
        if let Some(comment) = json.comment() {
            diagram.set_comment(&id, Some(comment.to_string()))?;
        }

        for (socket, input) in &json.inputs {
            let child = match (&input.block, &input.shadow) {
                (Some(block), _) => self.import_chain(block, false)?,
                (None, Some(shadow)) => self.import_chain(shadow, true)?,
                (None, None) => continue,
            };
            self.diagram.connect_value(catalog, &id, socket, &child)?;
        }
        Ok(id)
    }
}

impl Diagram {
    /// Exports the diagram in the block-editor JSON layout.
    pub fn to_workspace(&self) -> WorkspaceJson {
        WorkspaceJson {
            blocks: BlockList {
                language_version: 0,
                blocks: self
                    .top_blocks()
                    .into_iter()
                    .map(|block| self.export_chain(block))
                    .collect(),
            },
        }
    }

    /// Exports `head` with the rest of its chain nested under `next`.
    fn export_chain(&self, head: &BlockInstance) -> BlockJson {
        let mut linked: Option<BlockJson> = None;
        for block in self.chain(head.id()).into_iter().rev() {
            let mut json = self.export_block(block);
            json.next = linked.take().map(|next| NextJson {
                block: Box::new(next),
            });
            linked = Some(json);
        }
        linked.unwrap_or_else(|| self.export_block(head))
    }

    fn export_block(&self, block: &BlockInstance) -> BlockJson {
        let mut json = BlockJson::new(block.kind());
        json.id = Some(block.id().to_string());
        if block.is_top_level() {
            if let Some((x, y)) = block.position() {
                json.x = Some(x);
                json.y = Some(y);
            }
        }
        json.enabled = block.is_enabled();
        json.fields = block.fields().clone();
        json.icons = block.comment().map(|text| IconsJson {
            comment: Some(CommentJson {
                text: text.to_string(),
                pinned: false,
            }),
        });

        for (socket, child_id) in block.inputs() {
            let Some(child) = self.block(child_id) else {
                continue;
            };
            let exported = Box::new(self.export_chain(child));
            let input = if child.is_shadow() {
                InputJson {
                    block: None,
                    shadow: Some(exported),
                }
            } else {
                InputJson {
                    block: Some(exported),
                    shadow: None,
                }
            };
            json.inputs.insert(socket.clone(), input);
        }
        json
    }
}
