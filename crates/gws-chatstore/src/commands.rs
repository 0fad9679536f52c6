//! Tauri command handlers for chat persistence.
//!
//! All commands follow the `chat_*` naming convention and accept
//! `State<'_, ChatStoreState>` as their first parameter.

use std::sync::Arc;

use tauri::State;

use gws_gdrive::service::DriveFiles;
use gws_gdrive::types::DriveError;

use crate::store::ChatStore;
use crate::types::{Chat, ChatContent};

/// Shared, managed store state. The store keeps no mutable state of its
/// own, so commands share it without an outer lock.
pub type ChatStoreState = Arc<ChatStore<Arc<DriveFiles>>>;

fn err_str(e: DriveError) -> String {
    e.to_string()
}

/// List chats in the app folder, newest first.
#[tauri::command]
pub async fn chat_list(state: State<'_, ChatStoreState>) -> Result<Vec<Chat>, String> {
    state.list_chats().await.map_err(err_str)
}

/// Read a chat's full content.
#[tauri::command]
pub async fn chat_get_content(
    state: State<'_, ChatStoreState>,
    id: String,
) -> Result<ChatContent, String> {
    state.get_chat_content(&id).await.map_err(err_str)
}

/// Create a new empty chat.
#[tauri::command]
pub async fn chat_create(state: State<'_, ChatStoreState>, name: String) -> Result<Chat, String> {
    state.create_chat(&name).await.map_err(err_str)
}

/// Save a chat, promoting a local session to a remote document.
#[tauri::command]
pub async fn chat_save(
    state: State<'_, ChatStoreState>,
    content: ChatContent,
) -> Result<ChatContent, String> {
    state.save_or_update_chat(content).await.map_err(err_str)
}

/// Rename a chat.
#[tauri::command]
pub async fn chat_rename(
    state: State<'_, ChatStoreState>,
    id: String,
    new_name: String,
) -> Result<(), String> {
    state.rename_chat(&id, &new_name).await.map_err(err_str)
}

/// Delete a chat (retries transient failures internally).
#[tauri::command]
pub async fn chat_delete(state: State<'_, ChatStoreState>, id: String) -> Result<(), String> {
    state.delete_chat(&id).await.map_err(err_str)
}
