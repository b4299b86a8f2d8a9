use super::Diagram;
use crate::catalog::serial::FALLBACK_PORT;
use crate::catalog::{Catalog, DropdownOption, FieldValue, FieldWidget};
use crate::error::DiagramError;

/// Kind and field of the serial-port dropdown fed by port enumeration.
pub const PORT_SELECT_KIND: &str = "serial_port_select";
pub const PORT_FIELD: &str = "PORT";

/// Normalizes an enumerated port list: sorted, deduplicated, and never empty.
pub fn available_ports<I, S>(discovered: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut ports: Vec<String> = discovered
        .into_iter()
        .map(Into::into)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    ports.sort();
    ports.dedup();
    if ports.is_empty() {
        ports.push(FALLBACK_PORT.to_string());
    }
    ports
}

impl Diagram {
    /// Replaces the options of a dropdown field with one `(option, option)` pair
    /// per entry and selects the first. An empty list selects [`FALLBACK_PORT`].
    ///
    /// The previous selection is dropped even if it is still offered.
    pub fn refresh_options(
        &mut self,
        catalog: &Catalog,
        id: &str,
        field: &str,
        options: &[String],
    ) -> Result<(), DiagramError> {
        let block = self.get(id)?;
        let schema = Self::schema_of(catalog, block)?;
        match schema.find_field(field).map(|f| &f.widget) {
            Some(FieldWidget::Dropdown { .. }) => {}
            Some(_) => {
                return Err(DiagramError::InvalidFieldValue {
                    block_id: id.to_string(),
                    field: field.to_string(),
                    message: "options can only be refreshed on a dropdown".to_string(),
                });
            }
            None => {
                return Err(DiagramError::UnknownField {
                    block_id: id.to_string(),
                    kind: block.kind.clone(),
                    field: field.to_string(),
                });
            }
        }

        let mut pairs: Vec<DropdownOption> =
            options.iter().map(|o| DropdownOption::same(o)).collect();
        if pairs.is_empty() {
            pairs.push(DropdownOption::same(FALLBACK_PORT));
        }
        let selected = pairs[0].value.clone();
        tracing::debug!(block_id = id, field, "Setting new value to: {}", selected);

        let block = self.get_mut(id)?;
        block.options.insert(field.to_string(), pairs);
        block.fields.insert(field.to_string(), FieldValue::Text(selected));
        block.revision += 1;
        Ok(())
    }

    /// Refreshes `field` on every block of `kind`. Returns how many blocks changed.
    pub fn refresh_kind_options(
        &mut self,
        catalog: &Catalog,
        kind: &str,
        field: &str,
        options: &[String],
    ) -> Result<usize, DiagramError> {
        let targets: Vec<String> = self
            .blocks()
            .filter(|b| b.kind == kind)
            .map(|b| b.id.clone())
            .collect();
        for id in &targets {
            self.refresh_options(catalog, id, field, options)?;
        }
        Ok(targets.len())
    }

    /// Feeds a fresh port enumeration to every serial-port dropdown.
    pub fn refresh_ports(&mut self, catalog: &Catalog, ports: &[String]) -> Result<usize, DiagramError> {
        self.refresh_kind_options(catalog, PORT_SELECT_KIND, PORT_FIELD, ports)
    }
}
