//! In-memory [`RemoteFiles`] fake for tests.
//!
//! Stores documents in a vector (newest first, matching the Drive
//! listing order) and lets tests script delete failures to exercise the
//! retry loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use gws_gdrive::types::{mime_types, DriveError, DriveErrorKind, DriveFile, DriveResult};

use crate::remote::RemoteFiles;

#[derive(Debug, Clone)]
struct StoredDoc {
    id: String,
    name: String,
    content: String,
}

/// Scriptable in-memory remote.
#[derive(Default)]
pub struct MemoryRemote {
    docs: Mutex<Vec<StoredDoc>>,
    next_id: AtomicU64,
    /// Errors to return from upcoming `delete_document` calls, in order.
    delete_failures: Mutex<VecDeque<DriveError>>,
    delete_attempts: AtomicUsize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, returning its id.
    pub fn seed(&self, name: &str, content: &str) -> String {
        let id = self.fresh_id();
        self.docs.lock().unwrap().insert(
            0,
            StoredDoc {
                id: id.clone(),
                name: name.to_string(),
                content: content.to_string(),
            },
        );
        id
    }

    /// Content of a document, if present.
    pub fn content_of(&self, id: &str) -> Option<String> {
        self.docs
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.content.clone())
    }

    /// Name of a document, if present.
    pub fn name_of(&self, id: &str) -> Option<String> {
        self.docs
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.clone())
    }

    pub fn document_count(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    /// Queue errors for upcoming delete calls.
    pub fn fail_deletes_with(&self, errors: Vec<DriveError>) {
        self.delete_failures.lock().unwrap().extend(errors);
    }

    /// Number of `delete_document` calls observed.
    pub fn delete_attempts(&self) -> usize {
        self.delete_attempts.load(Ordering::SeqCst)
    }

    fn fresh_id(&self) -> String {
        format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn not_found(id: &str) -> DriveError {
        DriveError::new(DriveErrorKind::NotFound, format!("No such document: {id}"))
    }
}

#[async_trait]
impl RemoteFiles for MemoryRemote {
    async fn list_documents(&self) -> DriveResult<Vec<DriveFile>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .map(|d| DriveFile {
                id: d.id.clone(),
                name: d.name.clone(),
                mime_type: mime_types::JSON.to_string(),
                created_time: Some(Utc::now()),
                ..Default::default()
            })
            .collect())
    }

    async fn read_document(&self, file_id: &str) -> DriveResult<String> {
        self.content_of(file_id)
            .ok_or_else(|| Self::not_found(file_id))
    }

    async fn create_document(&self, name: &str, content: &str) -> DriveResult<DriveFile> {
        let id = self.seed(name, content);
        Ok(DriveFile {
            id,
            name: name.to_string(),
            mime_type: mime_types::JSON.to_string(),
            created_time: Some(Utc::now()),
            ..Default::default()
        })
    }

    async fn update_document(&self, file_id: &str, content: &str) -> DriveResult<DriveFile> {
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .iter_mut()
            .find(|d| d.id == file_id)
            .ok_or_else(|| Self::not_found(file_id))?;
        doc.content = content.to_string();
        Ok(DriveFile {
            id: doc.id.clone(),
            name: doc.name.clone(),
            mime_type: mime_types::JSON.to_string(),
            ..Default::default()
        })
    }

    async fn rename_document(&self, file_id: &str, name: &str) -> DriveResult<DriveFile> {
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .iter_mut()
            .find(|d| d.id == file_id)
            .ok_or_else(|| Self::not_found(file_id))?;
        doc.name = name.to_string();
        Ok(DriveFile {
            id: doc.id.clone(),
            name: doc.name.clone(),
            mime_type: mime_types::JSON.to_string(),
            ..Default::default()
        })
    }

    async fn delete_document(&self, file_id: &str) -> DriveResult<()> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.delete_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut docs = self.docs.lock().unwrap();
        let before = docs.len();
        docs.retain(|d| d.id != file_id);
        if docs.len() == before {
            return Err(Self::not_found(file_id));
        }
        Ok(())
    }
}
