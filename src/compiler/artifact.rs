use crate::error::ArtifactError;
use crate::script::Program;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// Bumped whenever the serialized shape of `Program` changes.
pub const ARTIFACT_VERSION: u32 = 1;

/// A compiled program stored on disk so it can be re-rendered without the diagram.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompiledArtifact {
    pub version: u32,
    pub program: Program,
}

impl CompiledArtifact {
    pub fn new(program: Program) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            program,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard())
            .map_err(|e| ArtifactError::Generic(format!("Serialization failed: {}", e)))
    }

    /// Saves the artifact to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|e| {
            ArtifactError::Generic(format!("Could not create file '{}': {}", path, e))
        })?;
        file.write_all(&bytes).map_err(|e| {
            ArtifactError::Generic(format!("Could not write to file '{}': {}", path, e))
        })?;
        tracing::debug!(path, bytes = bytes.len(), "Saved compiled artifact");
        Ok(())
    }

    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let mut file = fs::File::open(path).map_err(|e| {
            ArtifactError::Generic(format!("Could not open file '{}': {}", path, e))
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            ArtifactError::Generic(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Decodes an artifact, rejecting ones written by another format version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let artifact: Self = decode_from_slice(bytes, standard())
            .map(|(artifact, _)| artifact)
            .map_err(|e| ArtifactError::Generic(format!("Deserialization failed: {}", e)))?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(ArtifactError::Generic(format!(
                "Unsupported artifact version {} (expected {})",
                artifact.version, ARTIFACT_VERSION
            )));
        }
        Ok(artifact)
    }

    pub fn into_program(self) -> Program {
        self.program
    }
}
