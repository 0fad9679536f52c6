//! Remote document interface required by the chat store.
//!
//! Exactly the operations [`crate::store::ChatStore`] needs from the
//! Drive layer, so tests can substitute an in-memory fake.

use async_trait::async_trait;

use gws_gdrive::service::DriveFiles;
use gws_gdrive::types::{DriveFile, DriveResult};

#[async_trait]
pub trait RemoteFiles: Send + Sync {
    /// Documents in the app folder, newest first.
    async fn list_documents(&self) -> DriveResult<Vec<DriveFile>>;

    /// Raw text content of a document.
    async fn read_document(&self, file_id: &str) -> DriveResult<String>;

    /// Create a document with the given content, returning its metadata
    /// (the assigned id in particular).
    async fn create_document(&self, name: &str, content: &str) -> DriveResult<DriveFile>;

    /// Replace a document's content.
    async fn update_document(&self, file_id: &str, content: &str) -> DriveResult<DriveFile>;

    /// Rename a document.
    async fn rename_document(&self, file_id: &str, name: &str) -> DriveResult<DriveFile>;

    /// Delete a document permanently.
    async fn delete_document(&self, file_id: &str) -> DriveResult<()>;
}

#[async_trait]
impl<R: RemoteFiles + ?Sized> RemoteFiles for std::sync::Arc<R> {
    async fn list_documents(&self) -> DriveResult<Vec<DriveFile>> {
        (**self).list_documents().await
    }

    async fn read_document(&self, file_id: &str) -> DriveResult<String> {
        (**self).read_document(file_id).await
    }

    async fn create_document(&self, name: &str, content: &str) -> DriveResult<DriveFile> {
        (**self).create_document(name, content).await
    }

    async fn update_document(&self, file_id: &str, content: &str) -> DriveResult<DriveFile> {
        (**self).update_document(file_id, content).await
    }

    async fn rename_document(&self, file_id: &str, name: &str) -> DriveResult<DriveFile> {
        (**self).rename_document(file_id, name).await
    }

    async fn delete_document(&self, file_id: &str) -> DriveResult<()> {
        (**self).delete_document(file_id).await
    }
}

#[async_trait]
impl RemoteFiles for DriveFiles {
    async fn list_documents(&self) -> DriveResult<Vec<DriveFile>> {
        DriveFiles::list_documents(self).await
    }

    async fn read_document(&self, file_id: &str) -> DriveResult<String> {
        DriveFiles::read_document(self, file_id).await
    }

    async fn create_document(&self, name: &str, content: &str) -> DriveResult<DriveFile> {
        DriveFiles::create_document(self, name, content).await
    }

    async fn update_document(&self, file_id: &str, content: &str) -> DriveResult<DriveFile> {
        DriveFiles::update_document(self, file_id, content).await
    }

    async fn rename_document(&self, file_id: &str, name: &str) -> DriveResult<DriveFile> {
        DriveFiles::rename_document(self, file_id, name).await
    }

    async fn delete_document(&self, file_id: &str) -> DriveResult<()> {
        DriveFiles::delete_document(self, file_id).await
    }
}
