//! Conversation orchestration.
//!
//! Holds the active chat, switches between local-only and Drive-backed
//! sessions, and applies generation responses. Sending is split in two so
//! the service lock is not held across the backend call: `begin_send`
//! appends the user turn and hands out an epoch token, `complete_send` /
//! `fail_send` apply the outcome only if that token still matches. Any
//! chat switch bumps the epoch, so a response that arrives after the user
//! navigated away is discarded instead of landing in the wrong chat.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use serde_json::Value;
use tauri::State;
use tokio::sync::Mutex;

use gws_backend::client::BackendClient;
use gws_backend::types::{GenerateRequest, UploadFile};
use gws_chatstore::remote::RemoteFiles;
use gws_chatstore::store::ChatStore;
use gws_chatstore::types::{Attachment, Chat, ChatContent, ConversationTurn, ResponsePart};
use gws_gdrive::service::DriveFiles;
use gws_gdrive::types::{DriveErrorKind, DriveResult};

pub type ConversationServiceState = Arc<Mutex<ConversationService<Arc<DriveFiles>>>>;
pub type BackendState = Arc<BackendClient>;

/// Longest auto-derived chat name.
const MAX_DERIVED_NAME: usize = 48;

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub default_model: String,
    pub refiner_model: String,
}

pub struct ConversationService<R: RemoteFiles> {
    store: Arc<ChatStore<R>>,
    settings: GenerationSettings,
    /// Cached sidebar listing from the last refresh.
    chats: Vec<Chat>,
    active: ChatContent,
    /// Bumped on every chat switch; in-flight sends carry the value they
    /// started under and are discarded on mismatch.
    epoch: u64,
}

impl<R: RemoteFiles> ConversationService<R> {
    pub fn new(store: Arc<ChatStore<R>>, settings: GenerationSettings) -> Self {
        Self {
            store,
            settings,
            chats: Vec::new(),
            active: ChatContent::local(""),
            epoch: 0,
        }
    }

    pub fn active(&self) -> &ChatContent {
        &self.active
    }

    // ── Session switching ────────────────────────────────────────

    /// Refresh the chat listing.
    pub async fn refresh_chats(&mut self) -> DriveResult<Vec<Chat>> {
        self.chats = self.store.list_chats().await?;
        Ok(self.chats.clone())
    }

    /// Open a stored chat as the active session.
    pub async fn open_chat(&mut self, id: &str) -> DriveResult<ChatContent> {
        let content = self.store.get_chat_content(id).await?;
        self.active = content.clone();
        self.epoch += 1;
        Ok(content)
    }

    /// Start a fresh local-only session.
    pub fn new_local_chat(&mut self) -> ChatContent {
        self.active = ChatContent::local("");
        self.epoch += 1;
        self.active.clone()
    }

    // ── Sending ──────────────────────────────────────────────────

    /// Append the user turn and build the backend request. Returns the
    /// epoch token the completion must present.
    pub fn begin_send(
        &mut self,
        api_key: String,
        prompt: String,
        model: String,
        files: Vec<UploadFile>,
    ) -> (u64, GenerateRequest) {
        if self.active.is_local() && self.active.name.is_empty() {
            self.active.name = derive_chat_name(&prompt);
        }
        self.active.conversation.push(ConversationTurn::User {
            prompt: prompt.clone(),
            attachments: files
                .iter()
                .map(|f| Attachment {
                    name: f.name.clone(),
                    mime_type: f.mime_type.clone(),
                    content: f.content_base64.clone(),
                })
                .collect(),
            timestamp: Utc::now().to_rfc3339(),
        });

        let model = if model.is_empty() {
            self.settings.default_model.clone()
        } else {
            model
        };
        let request = GenerateRequest {
            api_key,
            prompt,
            model,
            refiner_model: self.settings.refiner_model.clone(),
            files,
        };
        (self.epoch, request)
    }

    /// Apply a successful generation. Returns `None` when the response is
    /// stale (the user switched chats while it was in flight).
    pub async fn complete_send(
        &mut self,
        epoch: u64,
        parts: Vec<Value>,
    ) -> Option<ChatContent> {
        if epoch != self.epoch {
            debug!("Discarding stale generation response");
            return None;
        }
        self.active.conversation.push(ConversationTurn::Ai {
            parts: parts.into_iter().map(ResponsePart::from_value).collect(),
            timestamp: Utc::now().to_rfc3339(),
        });
        self.autosave().await;
        Some(self.active.clone())
    }

    /// Record a failed generation as an error turn in the conversation,
    /// unless the response is stale.
    pub fn fail_send(&mut self, epoch: u64, message: &str) -> Option<ChatContent> {
        if epoch != self.epoch {
            debug!("Discarding stale generation failure");
            return None;
        }
        self.active.conversation.push(ConversationTurn::Ai {
            parts: vec![ResponsePart::Code {
                language: "error".into(),
                content: format!("Request failed: {message}"),
            }],
            timestamp: Utc::now().to_rfc3339(),
        });
        Some(self.active.clone())
    }

    /// Persist the active chat, promoting a local session on first save.
    /// A signed-out session stays local; other save failures keep the
    /// turns in memory for the next attempt.
    async fn autosave(&mut self) {
        match self.store.save_or_update_chat(self.active.clone()).await {
            Ok(saved) => self.active = saved,
            Err(e) if e.kind == DriveErrorKind::AuthRequired => {
                debug!("Not signed in, keeping session local");
            }
            Err(e) => warn!("Autosave failed, keeping turns in memory: {e}"),
        }
    }

    // ── Rename / delete ──────────────────────────────────────────

    pub async fn rename_chat(&mut self, id: &str, new_name: &str) -> DriveResult<()> {
        self.store.rename_chat(id, new_name).await?;
        if self.active.id == id {
            self.active.name = new_name.to_string();
        }
        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == id) {
            chat.name = new_name.to_string();
        }
        Ok(())
    }

    /// Delete a chat. If it was the active one, fall back to the first
    /// remaining chat, or a fresh local session when none is left.
    /// Returns the active chat after the operation.
    pub async fn delete_chat(&mut self, id: &str) -> DriveResult<ChatContent> {
        self.store.delete_chat(id).await?;
        self.chats.retain(|c| c.id != id);

        if self.active.id == id {
            let replacement = self.chats.first().map(|c| c.id.clone());
            match replacement {
                Some(next_id) => self.open_chat(&next_id).await?,
                None => self.new_local_chat(),
            };
        }
        Ok(self.active.clone())
    }
}

/// Derive a display name from the first prompt of a session.
fn derive_chat_name(prompt: &str) -> String {
    let line = prompt.trim().lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        return String::new();
    }
    line.chars().take(MAX_DERIVED_NAME).collect()
}

// ── Commands ─────────────────────────────────────────────────────

#[tauri::command]
pub async fn conversation_active(
    state: State<'_, ConversationServiceState>,
) -> Result<ChatContent, String> {
    let svc = state.lock().await;
    Ok(svc.active().clone())
}

#[tauri::command]
pub async fn conversation_refresh(
    state: State<'_, ConversationServiceState>,
) -> Result<Vec<Chat>, String> {
    let mut svc = state.lock().await;
    svc.refresh_chats().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn conversation_open(
    state: State<'_, ConversationServiceState>,
    id: String,
) -> Result<ChatContent, String> {
    let mut svc = state.lock().await;
    svc.open_chat(&id).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn conversation_new(
    state: State<'_, ConversationServiceState>,
) -> Result<ChatContent, String> {
    let mut svc = state.lock().await;
    Ok(svc.new_local_chat())
}

/// Send a prompt. Returns the updated chat, or `None` when the response
/// arrived for a chat the user has already left.
#[tauri::command]
pub async fn conversation_send(
    state: State<'_, ConversationServiceState>,
    backend: State<'_, BackendState>,
    api_key: String,
    prompt: String,
    model: String,
    files: Vec<UploadFile>,
) -> Result<Option<ChatContent>, String> {
    // Append the user turn under the lock, then release it for the
    // duration of the backend call.
    let (epoch, request) = {
        let mut svc = state.lock().await;
        svc.begin_send(api_key, prompt, model, files)
    };

    match backend.generate(&request).await {
        Ok(parts) => {
            let mut svc = state.lock().await;
            Ok(svc.complete_send(epoch, parts).await)
        }
        Err(e) => {
            let mut svc = state.lock().await;
            Ok(svc.fail_send(epoch, &e.to_string()))
        }
    }
}

#[tauri::command]
pub async fn conversation_rename(
    state: State<'_, ConversationServiceState>,
    id: String,
    new_name: String,
) -> Result<(), String> {
    let mut svc = state.lock().await;
    svc.rename_chat(&id, &new_name)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn conversation_delete(
    state: State<'_, ConversationServiceState>,
    id: String,
) -> Result<ChatContent, String> {
    let mut svc = state.lock().await;
    svc.delete_chat(&id).await.map_err(|e| e.to_string())
}

/// Clone a repository server-side and hand back its processed text as an
/// attachable file.
#[tauri::command]
pub async fn conversation_clone_repo(
    backend: State<'_, BackendState>,
    url: String,
) -> Result<UploadFile, String> {
    use base64::Engine;

    let repo = backend.clone_repo(&url).await.map_err(|e| e.to_string())?;
    let name = repo.repo_name.trim_start_matches("gh_repo:::");
    Ok(UploadFile {
        name: format!("gh_repo:::{name}_context.txt"),
        mime_type: "text/plain".into(),
        content_base64: base64::engine::general_purpose::STANDARD
            .encode(repo.processed_text.as_bytes()),
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gws_chatstore::testing::MemoryRemote;
    use gws_gdrive::types::{DriveError, DriveFile};
    use serde_json::json;

    fn settings() -> GenerationSettings {
        GenerationSettings {
            default_model: "gemini-2.5-pro".into(),
            refiner_model: "models/gemini-2.5-flash".into(),
        }
    }

    fn service() -> ConversationService<MemoryRemote> {
        ConversationService::new(Arc::new(ChatStore::new(MemoryRemote::new())), settings())
    }

    fn service_with(remote: MemoryRemote) -> ConversationService<MemoryRemote> {
        ConversationService::new(Arc::new(ChatStore::new(remote)), settings())
    }

    fn text_parts() -> Vec<Value> {
        vec![json!({"type": "text", "content": "answer"})]
    }

    /// Remote that refuses every write, as seen when signed out.
    struct SignedOutRemote;

    #[async_trait]
    impl RemoteFiles for SignedOutRemote {
        async fn list_documents(&self) -> DriveResult<Vec<DriveFile>> {
            Err(DriveError::auth_required("No access token set"))
        }
        async fn read_document(&self, _: &str) -> DriveResult<String> {
            Err(DriveError::auth_required("No access token set"))
        }
        async fn create_document(&self, _: &str, _: &str) -> DriveResult<DriveFile> {
            Err(DriveError::auth_required("No access token set"))
        }
        async fn update_document(&self, _: &str, _: &str) -> DriveResult<DriveFile> {
            Err(DriveError::auth_required("No access token set"))
        }
        async fn rename_document(&self, _: &str, _: &str) -> DriveResult<DriveFile> {
            Err(DriveError::auth_required("No access token set"))
        }
        async fn delete_document(&self, _: &str) -> DriveResult<()> {
            Err(DriveError::auth_required("No access token set"))
        }
    }

    #[tokio::test]
    async fn send_appends_turns_and_autosaves() {
        let mut svc = service();
        let (epoch, request) =
            svc.begin_send("key".into(), "explain traits".into(), String::new(), vec![]);
        assert_eq!(request.model, "gemini-2.5-pro");

        let content = svc.complete_send(epoch, text_parts()).await.unwrap();
        assert_eq!(content.conversation.len(), 2);
        // Promoted: the session now has a real id and one stored document.
        assert!(!content.is_local());
        assert_eq!(svc.store.remote().document_count(), 1);
    }

    #[tokio::test]
    async fn first_prompt_names_the_session() {
        let mut svc = service();
        svc.begin_send("key".into(), "  How do lifetimes work?\nmore".into(), String::new(), vec![]);
        assert_eq!(svc.active().name, "How do lifetimes work?");
    }

    #[tokio::test]
    async fn long_prompt_name_is_truncated() {
        let mut svc = service();
        let prompt = "x".repeat(200);
        svc.begin_send("key".into(), prompt, String::new(), vec![]);
        assert_eq!(svc.active().name.chars().count(), MAX_DERIVED_NAME);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let mut svc = service();
        let (epoch, _) = svc.begin_send("key".into(), "first".into(), String::new(), vec![]);

        // The user navigates away before the response lands.
        svc.new_local_chat();

        assert!(svc.complete_send(epoch, text_parts()).await.is_none());
        assert!(svc.active().conversation.is_empty());
    }

    #[tokio::test]
    async fn stale_failure_is_discarded() {
        let mut svc = service();
        let (epoch, _) = svc.begin_send("key".into(), "first".into(), String::new(), vec![]);
        svc.new_local_chat();
        assert!(svc.fail_send(epoch, "timeout").is_none());
    }

    #[tokio::test]
    async fn failure_is_recorded_as_error_turn() {
        let mut svc = service();
        let (epoch, _) = svc.begin_send("key".into(), "hi".into(), String::new(), vec![]);
        let content = svc.fail_send(epoch, "backend exploded").unwrap();
        match content.conversation.last().unwrap() {
            ConversationTurn::Ai { parts, .. } => match &parts[0] {
                ResponsePart::Code { language, content } => {
                    assert_eq!(language, "error");
                    assert!(content.contains("backend exploded"));
                }
                other => panic!("unexpected part: {other:?}"),
            },
            other => panic!("unexpected turn: {other:?}"),
        }
    }

    #[tokio::test]
    async fn signed_out_send_stays_local() {
        let mut svc =
            ConversationService::new(Arc::new(ChatStore::new(SignedOutRemote)), settings());
        let (epoch, _) = svc.begin_send("key".into(), "offline".into(), String::new(), vec![]);
        let content = svc.complete_send(epoch, text_parts()).await.unwrap();
        // Both turns kept, session still local.
        assert_eq!(content.conversation.len(), 2);
        assert!(content.is_local());
    }

    #[tokio::test]
    async fn attachments_are_persisted_on_the_user_turn() {
        let mut svc = service();
        let files = vec![UploadFile {
            name: "main.rs".into(),
            mime_type: "text/plain".into(),
            content_base64: "Zm4gbWFpbigpIHt9".into(),
        }];
        svc.begin_send("key".into(), "review this".into(), String::new(), files);
        match svc.active().conversation.last().unwrap() {
            ConversationTurn::User { attachments, .. } => {
                assert_eq!(attachments.len(), 1);
                assert_eq!(attachments[0].name, "main.rs");
            }
            other => panic!("unexpected turn: {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_chat_switches_session() {
        let remote = MemoryRemote::new();
        let id = remote.seed(
            "Saved.json",
            r#"{"id":"","name":"Saved","conversation":[]}"#,
        );
        let mut svc = service_with(remote);

        let content = svc.open_chat(&id).await.unwrap();
        assert_eq!(content.id, id);
        assert_eq!(svc.active().name, "Saved");
    }

    #[tokio::test]
    async fn rename_updates_active_chat() {
        let mut svc = service();
        let (epoch, _) = svc.begin_send("key".into(), "hi".into(), String::new(), vec![]);
        let content = svc.complete_send(epoch, text_parts()).await.unwrap();

        svc.rename_chat(&content.id, "Renamed").await.unwrap();
        assert_eq!(svc.active().name, "Renamed");
        assert_eq!(
            svc.store.remote().name_of(&content.id).unwrap(),
            "Renamed.json"
        );
    }

    #[tokio::test]
    async fn deleting_active_chat_falls_back_to_next() {
        let remote = MemoryRemote::new();
        let other_id = remote.seed(
            "Other.json",
            r#"{"id":"","name":"Other","conversation":[]}"#,
        );
        let mut svc = service_with(remote);
        svc.refresh_chats().await.unwrap();

        let (epoch, _) = svc.begin_send("key".into(), "hi".into(), String::new(), vec![]);
        let content = svc.complete_send(epoch, text_parts()).await.unwrap();
        svc.refresh_chats().await.unwrap();

        let active = svc.delete_chat(&content.id).await.unwrap();
        assert_eq!(active.id, other_id);
    }

    #[tokio::test]
    async fn deleting_last_chat_starts_local_session() {
        let mut svc = service();
        let (epoch, _) = svc.begin_send("key".into(), "hi".into(), String::new(), vec![]);
        let content = svc.complete_send(epoch, text_parts()).await.unwrap();
        svc.refresh_chats().await.unwrap();

        let active = svc.delete_chat(&content.id).await.unwrap();
        assert!(active.is_local());
        assert!(active.conversation.is_empty());
    }

    #[test]
    fn derived_name_handles_blank_prompts() {
        assert_eq!(derive_chat_name("   \n\n"), "");
        assert_eq!(derive_chat_name("hello"), "hello");
    }
}
