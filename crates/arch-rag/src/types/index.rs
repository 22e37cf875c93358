//! Persisted embedding index format

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Current on-disk format version
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// A chunk of a source document with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Entry ID
    pub id: Uuid,
    /// Source document file name
    pub source: String,
    /// 1-based page number
    pub page: u32,
    /// Chunk text
    pub content: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Create a new entry with a fresh ID
    pub fn new(source: impl Into<String>, page: u32, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            page,
            content: content.into(),
            embedding,
        }
    }
}

/// Index file written by the index builder and loaded by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedIndex {
    /// Format version
    pub version: u32,
    /// Embedding model the vectors were produced with
    pub model: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Build time
    pub created_at: DateTime<Utc>,
    /// Indexed chunks
    pub entries: Vec<IndexEntry>,
}

impl PersistedIndex {
    /// Create an empty index for a model
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            model: model.into(),
            dimensions,
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Read and validate an index file
    pub fn read(path: &Path) -> Result<Self> {
        let display = path.display().to_string();

        let raw = std::fs::read(path).map_err(|e| Error::index_load(&display, e.to_string()))?;
        let index: PersistedIndex = serde_json::from_slice(&raw)
            .map_err(|e| Error::index_load(&display, format!("malformed index: {}", e)))?;

        index.validate().map_err(|message| Error::index_load(&display, message))?;
        Ok(index)
    }

    /// Write the index, creating parent directories
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Check version and vector dimensions
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.version != INDEX_FORMAT_VERSION {
            return Err(format!(
                "unsupported index version {} (expected {})",
                self.version, INDEX_FORMAT_VERSION
            ));
        }

        if let Some(bad) = self
            .entries
            .iter()
            .find(|e| e.embedding.len() != self.dimensions)
        {
            return Err(format!(
                "entry {} has {} dimensions, index declares {}",
                bad.id,
                bad.embedding.len(),
                self.dimensions
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.json");

        let mut index = PersistedIndex::new("test-model", 3);
        index
            .entries
            .push(IndexEntry::new("ec2-ug.pdf", 12, "Choose Launch instance.", vec![1.0, 0.0, 0.0]));
        index.write(&path).unwrap();

        let loaded = PersistedIndex::read(&path).unwrap();
        assert_eq!(loaded.model, "test-model");
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].page, 12);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let mut index = PersistedIndex::new("test-model", 3);
        index.entries.push(IndexEntry::new("a.pdf", 1, "text", vec![1.0, 0.0]));
        index.write(&path).unwrap();

        let err = PersistedIndex::read(&path).unwrap_err();
        assert!(matches!(err, Error::IndexLoad { .. }));
        assert!(err.to_string().contains("2 dimensions"));
    }

    #[test]
    fn test_missing_file() {
        let err = PersistedIndex::read(Path::new("/nonexistent/index.json")).unwrap_err();
        assert!(matches!(err, Error::IndexLoad { .. }));
    }

    #[test]
    fn test_version_rejected() {
        let mut index = PersistedIndex::new("m", 1);
        index.version = 99;
        assert!(index.validate().is_err());
    }
}
