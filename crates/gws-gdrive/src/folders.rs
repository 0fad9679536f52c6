//! Google Drive folder operations.
//!
//! Folders in Drive are files with MIME type `application/vnd.google-apps.folder`.
//! The app keeps all its documents in one folder at the Drive root, found or
//! created by name.

use crate::client::DriveClient;
use crate::files;
use crate::types::{mime_types, CreateFileRequest, DriveFile, DriveResult, ListFilesParams};

/// Create a new folder under the Drive root.
pub async fn create_folder(client: &DriveClient, name: &str) -> DriveResult<DriveFile> {
    let request = CreateFileRequest {
        name: name.to_string(),
        mime_type: Some(mime_types::FOLDER.to_string()),
        parents: Vec::new(),
    };
    files::create_file(client, &request).await
}

/// Search for a root-level folder by name.
pub async fn find_folder(client: &DriveClient, name: &str) -> DriveResult<Option<DriveFile>> {
    let q = format!(
        "mimeType = '{}' and name = '{}' and trashed = false and 'root' in parents",
        mime_types::FOLDER,
        name.replace('\'', "\\'")
    );

    let params = ListFilesParams {
        query: Some(q),
        page_size: Some(1),
        ..Default::default()
    };
    let list = files::list_files(client, &params).await?;
    Ok(list.files.into_iter().next())
}

/// Get or create a root-level folder by name.
pub async fn get_or_create_folder(client: &DriveClient, name: &str) -> DriveResult<DriveFile> {
    if let Some(existing) = find_folder(client, name).await? {
        return Ok(existing);
    }
    create_folder(client, name).await
}

/// List non-folder children of a folder, newest first.
pub async fn list_documents(client: &DriveClient, folder_id: &str) -> DriveResult<Vec<DriveFile>> {
    let params = ListFilesParams {
        query: Some(format!(
            "'{}' in parents and mimeType != '{}' and trashed = false",
            folder_id.replace('\'', "\\'"),
            mime_types::FOLDER
        )),
        order_by: Some("createdTime desc".into()),
        ..Default::default()
    };
    files::list_all_files(client, &params).await
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_folder_query_escapes_quotes() {
        let name = "Bob's Chats";
        let q = format!(
            "mimeType = '{}' and name = '{}' and trashed = false and 'root' in parents",
            mime_types::FOLDER,
            name.replace('\'', "\\'")
        );
        assert!(q.contains("Bob\\'s Chats"));
        assert!(q.contains("'root' in parents"));
    }

    #[test]
    fn documents_query_excludes_folders() {
        let q = format!(
            "'{}' in parents and mimeType != '{}' and trashed = false",
            "folder1",
            mime_types::FOLDER
        );
        assert!(q.contains("mimeType !="));
        assert!(q.contains(mime_types::FOLDER));
    }

    #[test]
    fn folder_create_request_has_no_parents() {
        let req = CreateFileRequest {
            name: "GatewayStudio_Chats".into(),
            mime_type: Some(mime_types::FOLDER.to_string()),
            parents: Vec::new(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(mime_types::FOLDER));
        assert!(!json.contains("parents"));
    }
}
