//! High-level Drive file service.
//!
//! [`DriveFiles`] is the façade the rest of the app talks to: it owns the
//! client and caches the app folder ID so the find-or-create query runs at
//! most once per signed-in session. `reset()` drops the cache on sign-out
//! so the next session resolves the folder fresh.

use std::sync::{Arc, Mutex};

use log::{debug, info};

use crate::client::DriveClient;
use crate::files;
use crate::folders;
use crate::token_store::TokenStore;
use crate::types::{DriveConfig, DriveFile, DriveResult, UpdateFileRequest};

/// Default name of the app's Drive folder.
pub const DEFAULT_APP_FOLDER: &str = "GatewayStudio_Chats";

/// Drive-backed document storage scoped to one app folder.
pub struct DriveFiles {
    client: DriveClient,
    folder_name: String,
    /// Resolved app folder ID, cached after the first call.
    folder_id: Mutex<Option<String>>,
}

impl DriveFiles {
    pub fn new(config: DriveConfig, tokens: Arc<TokenStore>, folder_name: String) -> DriveResult<Self> {
        Ok(Self {
            client: DriveClient::new(config, tokens)?,
            folder_name,
            folder_id: Mutex::new(None),
        })
    }

    /// The underlying client (profile fetch, revoke).
    pub fn client(&self) -> &DriveClient {
        &self.client
    }

    /// Drop cached session state. Called on sign-out.
    pub fn reset(&self) {
        *self.folder_lock() = None;
    }

    /// Resolve the app folder ID, creating the folder on first use.
    pub async fn app_folder_id(&self) -> DriveResult<String> {
        if let Some(id) = self.folder_lock().clone() {
            return Ok(id);
        }
        let folder = folders::get_or_create_folder(&self.client, &self.folder_name).await?;
        info!("App folder '{}' -> {}", self.folder_name, folder.id);
        *self.folder_lock() = Some(folder.id.clone());
        Ok(folder.id)
    }

    /// List the documents in the app folder, newest first.
    pub async fn list_documents(&self) -> DriveResult<Vec<DriveFile>> {
        let folder_id = self.app_folder_id().await?;
        folders::list_documents(&self.client, &folder_id).await
    }

    /// Read a document's content as text.
    pub async fn read_document(&self, file_id: &str) -> DriveResult<String> {
        files::read_text(&self.client, file_id).await
    }

    /// Create a document in the app folder with the given content.
    pub async fn create_document(&self, name: &str, content: &str) -> DriveResult<DriveFile> {
        let folder_id = self.app_folder_id().await?;
        files::create_with_content(&self.client, name, &[folder_id], content).await
    }

    /// Replace a document's content.
    pub async fn update_document(&self, file_id: &str, content: &str) -> DriveResult<DriveFile> {
        files::update_content(&self.client, file_id, content).await
    }

    /// Rename a document.
    pub async fn rename_document(&self, file_id: &str, name: &str) -> DriveResult<DriveFile> {
        debug!("Renaming {} -> '{}'", file_id, name);
        let request = UpdateFileRequest {
            name: Some(name.to_string()),
        };
        files::update_metadata(&self.client, file_id, &request).await
    }

    /// Delete a document permanently.
    pub async fn delete_document(&self, file_id: &str) -> DriveResult<()> {
        files::delete_file(&self.client, file_id).await
    }

    fn folder_lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        match self.folder_id.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DriveErrorKind;

    fn service() -> DriveFiles {
        DriveFiles::new(
            DriveConfig::default(),
            Arc::new(TokenStore::new()),
            DEFAULT_APP_FOLDER.into(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn folder_resolution_requires_auth() {
        let svc = service();
        let err = svc.app_folder_id().await.unwrap_err();
        assert_eq!(err.kind, DriveErrorKind::AuthRequired);
    }

    #[test]
    fn reset_clears_cached_folder() {
        let svc = service();
        *svc.folder_lock() = Some("folder123".into());
        svc.reset();
        assert!(svc.folder_lock().is_none());
    }

    #[test]
    fn default_folder_name() {
        assert_eq!(DEFAULT_APP_FOLDER, "GatewayStudio_Chats");
    }
}
