//! Directory loader: every supported file in the documents directory becomes page records

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{Document, FileType};

use super::parser::FileParser;

/// Loads and parses all documents in a directory
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    dir: PathBuf,
}

impl DocumentLoader {
    /// Create a loader for `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory being loaded
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Supported files directly inside the directory, sorted by name
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::internal(format!("Failed to read {}: {}", self.dir.display(), e))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if FileType::from_filename(&name).is_supported() {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Parse every supported file.
    ///
    /// Files that fail to parse are logged and skipped so one bad upload does not
    /// block indexing of the rest.
    pub fn load(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for path in self.list_files()? {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let data = match std::fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            match FileParser::parse(&filename, &data) {
                Ok(pages) => {
                    tracing::debug!("Loaded {} ({} page records)", filename, pages.len());
                    documents.extend(pages);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", filename, e);
                }
            }
        }

        tracing::info!(
            "Loaded {} page records from {}",
            documents.len(),
            self.dir.display()
        );

        Ok(documents)
    }

    /// [`load`](Self::load) on the blocking pool
    pub async fn load_async(&self) -> Result<Vec<Document>> {
        let loader = self.clone();
        tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}
