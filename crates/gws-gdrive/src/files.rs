//! Google Drive file operations used by the chat store.
//!
//! Covers the small slice of the v3 files surface this app needs: listing
//! with query strings, multipart create (metadata + content in one
//! request), media-only content updates, metadata rename, text download,
//! and delete.

use log::debug;

use crate::client::DriveClient;
use crate::types::{
    mime_types, CreateFileRequest, DriveFile, DriveResult, FileList, ListFilesParams,
    UpdateFileRequest,
};

/// List one page of files matching the given parameters.
pub async fn list_files(client: &DriveClient, params: &ListFilesParams) -> DriveResult<FileList> {
    let url = DriveClient::api_url("files");

    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(ref q) = params.query {
        query.push(("q", q.clone()));
    }
    let page_size = params
        .page_size
        .unwrap_or(client.config().default_page_size);
    query.push(("pageSize", page_size.to_string()));
    if let Some(ref token) = params.page_token {
        query.push(("pageToken", token.clone()));
    }
    if let Some(ref order) = params.order_by {
        query.push(("orderBy", order.clone()));
    }
    query.push((
        "fields",
        format!("nextPageToken,files({})", client.config().file_fields),
    ));

    client.get_json_with_query(&url, &query).await
}

/// List all files matching the params by consuming all pages.
pub async fn list_all_files(
    client: &DriveClient,
    params: &ListFilesParams,
) -> DriveResult<Vec<DriveFile>> {
    let mut all_files = Vec::new();
    let mut page_params = params.clone();

    loop {
        let page = list_files(client, &page_params).await?;
        all_files.extend(page.files);

        match page.next_page_token {
            Some(token) => page_params.page_token = Some(token),
            None => break,
        }
    }

    Ok(all_files)
}

/// Create a new file (metadata only, no content).
pub async fn create_file(client: &DriveClient, request: &CreateFileRequest) -> DriveResult<DriveFile> {
    let url = format!(
        "{}?fields={}",
        DriveClient::api_url("files"),
        client.config().file_fields
    );
    client.post_json(&url, request).await
}

/// Create a file with JSON content in a single multipart/related request.
pub async fn create_with_content(
    client: &DriveClient,
    name: &str,
    parents: &[String],
    content: &str,
) -> DriveResult<DriveFile> {
    debug!("Multipart create '{}' ({} bytes)", name, content.len());

    let metadata = CreateFileRequest {
        name: name.to_string(),
        mime_type: Some(mime_types::JSON.to_string()),
        parents: parents.to_vec(),
    };
    let metadata_json = serde_json::to_string(&metadata)
        .map_err(|e| crate::types::DriveError::invalid(format!("Metadata serialization: {e}")))?;

    let boundary = format!("gws_gdrive_{}", uuid::Uuid::new_v4());
    let content_type = format!("multipart/related; boundary={}", boundary);

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata_json.as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_types::JSON).as_bytes());
    body.extend_from_slice(content.as_bytes());
    body.extend_from_slice(format!("\r\n--{}--", boundary).as_bytes());

    let url = format!(
        "{}?uploadType=multipart&fields={}",
        DriveClient::upload_url("files"),
        client.config().file_fields
    );
    client.post_bytes::<DriveFile>(&url, &content_type, body).await
}

/// Replace a file's content without touching its metadata.
pub async fn update_content(
    client: &DriveClient,
    file_id: &str,
    content: &str,
) -> DriveResult<DriveFile> {
    debug!("Media update {} ({} bytes)", file_id, content.len());
    let url = format!(
        "{}?uploadType=media",
        DriveClient::upload_url(&format!("files/{}", file_id))
    );
    client
        .patch_bytes(&url, mime_types::JSON, content.as_bytes().to_vec())
        .await
}

/// Update a file's metadata (rename).
pub async fn update_metadata(
    client: &DriveClient,
    file_id: &str,
    request: &UpdateFileRequest,
) -> DriveResult<DriveFile> {
    let url = format!(
        "{}?fields={}",
        DriveClient::api_url(&format!("files/{}", file_id)),
        client.config().file_fields
    );
    client.patch_json(&url, request).await
}

/// Download a file's content as text (`alt=media`).
pub async fn read_text(client: &DriveClient, file_id: &str) -> DriveResult<String> {
    let url = DriveClient::api_url(&format!("files/{}", file_id));
    let query = [("alt", "media".to_string())];
    client.get_text(&url, &query).await
}

/// Delete a file permanently (bypasses trash).
pub async fn delete_file(client: &DriveClient, file_id: &str) -> DriveResult<()> {
    let url = DriveClient::api_url(&format!("files/{}", file_id));
    client.delete(&url).await
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
