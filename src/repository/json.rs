//! Catalogue stored as a single JSON document

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use super::Store;
use crate::{
    error::StoreError,
    models::catalogue::{CatalogueState, LegacyBook, LegacyBorrowers},
};

/// File name of the borrower map kept next to a legacy book list
pub const LEGACY_BORROWERS_FILE: &str = "borrowed_books.json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    legacy_borrowers: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let legacy_borrowers = path.with_file_name(LEGACY_BORROWERS_FILE);
        Self {
            path,
            legacy_borrowers,
        }
    }

    /// Read the borrower map of a legacy book list from `path` instead of
    /// the sibling `borrowed_books.json`
    pub fn with_legacy_borrowers(mut self, path: impl AsRef<Path>) -> Self {
        self.legacy_borrowers = path.as_ref().to_path_buf();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

enum Document {
    Current(CatalogueState),
    Legacy(Vec<LegacyBook>),
}

/// Parse a document: the current schema, or a legacy bare array of books
fn parse_document(bytes: &[u8]) -> Result<Document, StoreError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::Current(CatalogueState::default()));
    }

    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    if value.is_array() {
        return Ok(Document::Legacy(serde_json::from_value(value)?));
    }
    Ok(Document::Current(serde_json::from_value(value)?))
}

impl JsonFileStore {
    async fn load_legacy_borrowers(&self) -> Result<LegacyBorrowers, StoreError> {
        match tokio::fs::read(&self.legacy_borrowers).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(LegacyBorrowers::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LegacyBorrowers::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load(&self) -> Result<CatalogueState, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match parse_document(&bytes)? {
                Document::Current(state) => Ok(state),
                Document::Legacy(records) => {
                    let borrowers = self.load_legacy_borrowers().await?;
                    tracing::info!(
                        records = records.len(),
                        borrowers = %self.legacy_borrowers.display(),
                        "Migrating legacy book list"
                    );
                    CatalogueState::from_legacy(records, borrowers, Utc::now())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No catalogue file, starting empty");
                Ok(CatalogueState::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &CatalogueState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(state)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write aside, then rename over the target
        let temp = self.temp_path();
        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), books = state.books.len(), "Catalogue saved");
        Ok(())
    }
}
