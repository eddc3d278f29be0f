//! Document and chunk types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Anything else; skipped by the loader
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename or path
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Text extracted from one page (or one whole file) of a stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Filename the text came from
    pub source: String,
    /// Page number (1-indexed) when the format is paginated
    pub page: Option<u32>,
    /// Extracted text
    pub content: String,
}

impl Document {
    /// Create a page record
    pub fn new(source: impl Into<String>, page: Option<u32>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            page,
            content: content.into(),
        }
    }
}

/// A chunk of text from a document page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable chunk ID (hex SHA-256 of source, page, index and content)
    pub id: String,
    /// Filename the chunk came from
    pub source: String,
    /// Page number, if known
    pub page: Option<u32>,
    /// Chunk index within its page record
    pub chunk_index: u32,
    /// Text content
    pub content: String,
    /// Embedding vector, filled in by the index builder
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a new chunk from a page record
    pub fn new(doc: &Document, chunk_index: u32, content: String) -> Self {
        Self {
            id: chunk_id(&doc.source, doc.page, chunk_index, &content),
            source: doc.source.clone(),
            page: doc.page,
            chunk_index,
            content,
            embedding: Vec::new(),
        }
    }
}

/// Deterministic chunk ID so repeated rebuilds overwrite rather than duplicate
fn chunk_id(source: &str, page: Option<u32>, chunk_index: u32, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([0u8]);
    hasher.update(page.unwrap_or(0).to_le_bytes());
    hasher.update(chunk_index.to_le_bytes());
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_filename() {
        assert_eq!(FileType::from_filename("tcs.pdf"), FileType::Pdf);
        assert_eq!(FileType::from_filename("Report.DOCX"), FileType::Docx);
        assert_eq!(FileType::from_filename("notes.txt"), FileType::Unknown);
        assert_eq!(FileType::from_filename("README"), FileType::Unknown);
    }

    #[test]
    fn test_chunk_id_is_stable() {
        let doc = Document::new("tcs.pdf", Some(3), "Revenue grew 6.8%.");
        let a = Chunk::new(&doc, 0, "Revenue grew 6.8%.".to_string());
        let b = Chunk::new(&doc, 0, "Revenue grew 6.8%.".to_string());
        let c = Chunk::new(&doc, 1, "Revenue grew 6.8%.".to_string());

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 64);
    }
}
