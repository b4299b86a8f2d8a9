use crate::catalog::serial::config_mapping;
use crate::error::SettingsError;
use crate::script::Expr;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where the host application keeps its serial settings by default.
pub const DEFAULT_SETTINGS_PATH: &str = "settings/serial_settings.json";

/// Persisted serial-port configuration. Missing keys fall back to the defaults
/// when loading, so older files keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub port: String,
    pub baudrate: u32,
    pub databits: u8,
    pub parity: String,
    pub stopbits: f64,
    pub flowcontrol: String,
    pub device_address: String,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "COM3".to_string(),
            baudrate: 9600,
            databits: 8,
            parity: "N".to_string(),
            stopbits: 1.0,
            flowcontrol: "N".to_string(),
            device_address: "1".to_string(),
        }
    }
}

impl SerialSettings {
    /// Loads settings from `path`, merged over the defaults. A missing file
    /// yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = serde_json::from_str(&text)?;
        tracing::info!(path = %path.display(), "Loaded serial settings");
        Ok(settings)
    }

    /// Writes pretty JSON to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let io_err = |source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(io_err)?;
        tracing::info!(path = %path.display(), "Saved serial settings");
        Ok(())
    }

    /// Sets one key from a JSON value. Unknown keys are rejected.
    pub fn update(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        let mut current = serde_json::to_value(&*self)?;
        let Some(object) = current.as_object_mut() else {
            return Err(SettingsError::UnknownKey(key.to_string()));
        };
        let value = match (object.get(key), value) {
            (None, _) => return Err(SettingsError::UnknownKey(key.to_string())),
            // Text settings such as `device_address` also accept bare numbers.
            (Some(serde_json::Value::String(_)), serde_json::Value::Number(n)) => {
                serde_json::Value::String(n.to_string())
            }
            (Some(_), value) => value,
        };
        object.insert(key.to_string(), value);
        *self = serde_json::from_value(current)?;
        Ok(())
    }

    /// Restores the defaults and saves them to `path`.
    pub fn reset(&mut self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        *self = Self::default();
        self.save(path)
    }

    /// The mapping literal an init block would receive from a `serial_config` block.
    pub fn to_config_expr(&self) -> Expr {
        config_mapping(
            Expr::str(&self.port),
            Expr::number(f64::from(self.baudrate)),
            Expr::number(f64::from(self.databits)),
            &self.parity,
            Expr::number(self.stopbits),
        )
    }
}
