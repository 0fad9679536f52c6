//! Drive-backed chat store.
//!
//! Maps `Chat`/`ChatContent` onto JSON documents in the app folder.
//! Contract highlights:
//! - `save_or_update` is the promotion path: a local session (sentinel
//!   id) becomes a remote document in one step and the caller swaps its
//!   whole active-chat reference to the returned value.
//! - Regular saves write content only; `rename_chat` is the sole
//!   metadata write.
//! - `delete_chat` is the only operation that retries automatically:
//!   up to 3 attempts with exponential backoff, `NotFound` counts as
//!   success, exhaustion raises one aggregated error.

use std::time::Duration;

use log::{debug, info, warn};

use gws_gdrive::types::{DriveError, DriveErrorKind, DriveResult};

use crate::remote::RemoteFiles;
use crate::types::{Chat, ChatContent, CHAT_FILE_EXT, LOCAL_CHAT_ID};

/// Maximum delete attempts.
const DELETE_ATTEMPTS: u32 = 3;
/// Base backoff delay; doubles after each failed attempt.
const DELETE_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Fallback name for an unsaved chat with no title.
const UNTITLED_CHAT: &str = "New Chat";

pub struct ChatStore<R: RemoteFiles> {
    remote: R,
}

impl<R: RemoteFiles> ChatStore<R> {
    pub fn new(remote: R) -> Self {
        Self { remote }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// List chats, newest first, with the storage extension stripped
    /// from display names.
    pub async fn list_chats(&self) -> DriveResult<Vec<Chat>> {
        let files = self.remote.list_documents().await?;
        Ok(files
            .into_iter()
            .map(|f| Chat {
                id: f.id,
                name: f
                    .name
                    .strip_suffix(CHAT_FILE_EXT)
                    .unwrap_or(&f.name)
                    .to_string(),
                created_time: f.created_time,
            })
            .collect())
    }

    /// Read and parse a chat document.
    ///
    /// An empty or unparsable body yields an empty conversation rather
    /// than an error, so a just-created document is immediately openable.
    /// `NotFound` propagates: the id must stop being selectable.
    pub async fn get_chat_content(&self, id: &str) -> DriveResult<ChatContent> {
        let body = self.remote.read_document(id).await?;
        let mut content = if body.trim().is_empty() {
            ChatContent::local("")
        } else {
            match serde_json::from_str::<ChatContent>(&body) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Chat {} has an unparsable body, treating as empty: {e}", id);
                    ChatContent::local("")
                }
            }
        };
        // The requested id wins over whatever the body carries; documents
        // created by promotion store the pre-promotion sentinel.
        content.id = id.to_string();
        Ok(content)
    }

    /// Create a new chat document with an empty conversation. The
    /// returned chat always carries the real assigned id.
    pub async fn create_chat(&self, name: &str) -> DriveResult<Chat> {
        let display_name = if name.is_empty() { UNTITLED_CHAT } else { name };
        let content = ChatContent::local(display_name);
        let body = serialize_content(&content)?;
        let file = self
            .remote
            .create_document(&format!("{display_name}{CHAT_FILE_EXT}"), &body)
            .await?;
        info!("Created chat '{}' -> {}", display_name, file.id);
        Ok(Chat {
            id: file.id,
            name: display_name.to_string(),
            created_time: file.created_time,
        })
    }

    /// Save a chat: promote a local session to a new remote document, or
    /// update an existing document's content in place. Returns the
    /// content the caller should adopt as its active chat.
    pub async fn save_or_update_chat(&self, content: ChatContent) -> DriveResult<ChatContent> {
        if content.id == LOCAL_CHAT_ID {
            let mut promoted = content;
            if promoted.name.is_empty() {
                promoted.name = UNTITLED_CHAT.to_string();
            }
            let body = serialize_content(&promoted)?;
            let file = self
                .remote
                .create_document(&format!("{}{}", promoted.name, CHAT_FILE_EXT), &body)
                .await?;
            info!("Promoted local chat '{}' -> {}", promoted.name, file.id);
            promoted.id = file.id;
            Ok(promoted)
        } else {
            let body = serialize_content(&content)?;
            self.remote.update_document(&content.id, &body).await?;
            debug!("Updated chat {}", content.id);
            Ok(content)
        }
    }

    /// Rename a chat. Metadata-only; never touches content or id.
    pub async fn rename_chat(&self, id: &str, new_name: &str) -> DriveResult<()> {
        if new_name.is_empty() {
            return Err(DriveError::invalid("Chat name must not be empty"));
        }
        self.remote
            .rename_document(id, &format!("{new_name}{CHAT_FILE_EXT}"))
            .await?;
        info!("Renamed chat {} -> '{}'", id, new_name);
        Ok(())
    }

    /// Delete a chat with bounded retry.
    ///
    /// `NotFound` on any attempt means the document is already gone and
    /// counts as success. Only retryable failures are retried; after the
    /// final attempt one aggregated error names the last failure so the
    /// caller can restore its optimistic UI state.
    pub async fn delete_chat(&self, id: &str) -> DriveResult<()> {
        let mut last_err: Option<DriveError> = None;

        for attempt in 1..=DELETE_ATTEMPTS {
            match self.remote.delete_document(id).await {
                Ok(()) => {
                    info!("Deleted chat {}", id);
                    return Ok(());
                }
                Err(e) if e.kind == DriveErrorKind::NotFound => {
                    debug!("Chat {} already gone", id);
                    return Ok(());
                }
                Err(e) if e.kind.is_retryable() && attempt < DELETE_ATTEMPTS => {
                    let backoff = DELETE_BACKOFF_BASE * 2u32.pow(attempt - 1);
                    warn!(
                        "Delete of {} failed ({}), retry {}/{} in {:?}",
                        id,
                        e,
                        attempt + 1,
                        DELETE_ATTEMPTS,
                        backoff
                    );
                    last_err = Some(e);
                    tokio::time::sleep(backoff).await;
                }
                Err(e) if e.kind.is_retryable() => {
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        // Retryable failure on every attempt.
        let last = last_err.unwrap_or_else(|| {
            DriveError::new(DriveErrorKind::TransientServer, "Delete failed")
        });
        Err(DriveError::new(
            last.kind,
            format!("Delete of chat {id} failed after {DELETE_ATTEMPTS} attempts: {last}"),
        ))
    }
}

fn serialize_content(content: &ChatContent) -> DriveResult<String> {
    serde_json::to_string_pretty(content)
        .map_err(|e| DriveError::invalid(format!("Chat serialization: {e}")))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryRemote;
    use crate::types::{ConversationTurn, ResponsePart};
    use gws_gdrive::types::DriveErrorKind;

    fn store() -> ChatStore<MemoryRemote> {
        ChatStore::new(MemoryRemote::new())
    }

    fn sample_conversation() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::User {
                prompt: "explain lifetimes".into(),
                attachments: Vec::new(),
                timestamp: "2025-03-01T10:00:00Z".into(),
            },
            ConversationTurn::Ai {
                parts: vec![
                    ResponsePart::Heading {
                        content: "Lifetimes".into(),
                    },
                    ResponsePart::Text {
                        content: "A lifetime names a region of validity.".into(),
                    },
                ],
                timestamp: "2025-03-01T10:00:07Z".into(),
            },
        ]
    }

    #[tokio::test]
    async fn list_strips_extension() {
        let store = store();
        store.remote().seed("Rust notes.json", "{}");
        store.remote().seed("no-extension", "{}");

        let chats = store.list_chats().await.unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[1].name, "Rust notes");
        assert_eq!(chats[0].name, "no-extension");
    }

    #[tokio::test]
    async fn create_chat_returns_real_id() {
        let store = store();
        let chat = store.create_chat("Plans").await.unwrap();
        assert!(!chat.id.is_empty());
        assert_ne!(chat.id, LOCAL_CHAT_ID);
        assert_eq!(store.remote().name_of(&chat.id).unwrap(), "Plans.json");
    }

    #[tokio::test]
    async fn create_chat_defaults_empty_name() {
        let store = store();
        let chat = store.create_chat("").await.unwrap();
        assert_eq!(chat.name, "New Chat");
    }

    #[tokio::test]
    async fn save_round_trip_preserves_conversation() {
        let store = store();
        let mut content = ChatContent::local("Lifetimes");
        content.conversation = sample_conversation();

        let saved = store.save_or_update_chat(content.clone()).await.unwrap();
        let read = store.get_chat_content(&saved.id).await.unwrap();
        assert_eq!(read.conversation, content.conversation);
        assert_eq!(read.name, "Lifetimes");
    }

    #[tokio::test]
    async fn promotion_creates_exactly_one_document() {
        let store = store();
        let saved = store
            .save_or_update_chat(ChatContent::local("Once"))
            .await
            .unwrap();
        assert_ne!(saved.id, LOCAL_CHAT_ID);
        assert_eq!(store.remote().document_count(), 1);
    }

    #[tokio::test]
    async fn update_writes_in_place() {
        let store = store();
        let mut content = store
            .save_or_update_chat(ChatContent::local("Ongoing"))
            .await
            .unwrap();
        let id = content.id.clone();

        content.conversation = sample_conversation();
        let saved = store.save_or_update_chat(content).await.unwrap();
        assert_eq!(saved.id, id);
        assert_eq!(store.remote().document_count(), 1);
        assert!(store.remote().content_of(&id).unwrap().contains("Lifetimes"));
    }

    #[tokio::test]
    async fn empty_body_reads_as_empty_conversation() {
        let store = store();
        let id = store.remote().seed("Fresh.json", "");
        let content = store.get_chat_content(&id).await.unwrap();
        assert_eq!(content.id, id);
        assert!(content.conversation.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_reads_as_empty_conversation() {
        let store = store();
        let id = store.remote().seed("Broken.json", "{not json");
        let content = store.get_chat_content(&id).await.unwrap();
        assert!(content.conversation.is_empty());
    }

    #[tokio::test]
    async fn read_overrides_stale_body_id() {
        let store = store();
        let saved = store
            .save_or_update_chat(ChatContent::local("Promoted"))
            .await
            .unwrap();
        // The stored body still carries the pre-promotion sentinel id.
        assert!(store
            .remote()
            .content_of(&saved.id)
            .unwrap()
            .contains("\"id\": \"\""));
        let read = store.get_chat_content(&saved.id).await.unwrap();
        assert_eq!(read.id, saved.id);
    }

    #[tokio::test]
    async fn missing_chat_read_propagates_not_found() {
        let store = store();
        let err = store.get_chat_content("nope").await.unwrap_err();
        assert_eq!(err.kind, DriveErrorKind::NotFound);
    }

    #[tokio::test]
    async fn rename_changes_name_only() {
        let store = store();
        let chat = store.create_chat("Old").await.unwrap();
        store.rename_chat(&chat.id, "New").await.unwrap();
        assert_eq!(store.remote().name_of(&chat.id).unwrap(), "New.json");
        // Content untouched.
        let content = store.get_chat_content(&chat.id).await.unwrap();
        assert!(content.conversation.is_empty());
    }

    #[tokio::test]
    async fn rename_rejects_empty_name() {
        let store = store();
        let chat = store.create_chat("Keep").await.unwrap();
        let err = store.rename_chat(&chat.id, "").await.unwrap_err();
        assert_eq!(err.kind, DriveErrorKind::InvalidParameter);
    }

    #[tokio::test]
    async fn delete_succeeds_first_try() {
        let store = store();
        let chat = store.create_chat("Gone").await.unwrap();
        store.delete_chat(&chat.id).await.unwrap();
        assert_eq!(store.remote().document_count(), 0);
        assert_eq!(store.remote().delete_attempts(), 1);
    }

    #[tokio::test]
    async fn second_delete_is_idempotent() {
        let store = store();
        let chat = store.create_chat("Twice").await.unwrap();
        store.delete_chat(&chat.id).await.unwrap();
        // Second delete observes NotFound, which counts as success.
        store.delete_chat(&chat.id).await.unwrap();
        assert_eq!(store.remote().delete_attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_retries_through_transient_failures() {
        let store = store();
        let chat = store.create_chat("Flaky").await.unwrap();
        store.remote().fail_deletes_with(vec![
            DriveError::new(DriveErrorKind::TransientServer, "503"),
            DriveError::new(DriveErrorKind::TransientServer, "503"),
        ]);

        store.delete_chat(&chat.id).await.unwrap();
        assert_eq!(store.remote().delete_attempts(), 3);
        assert_eq!(store.remote().document_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_exhaustion_raises_aggregated_error() {
        let store = store();
        let chat = store.create_chat("Stubborn").await.unwrap();
        store.remote().fail_deletes_with(vec![
            DriveError::new(DriveErrorKind::TransientServer, "503 a"),
            DriveError::new(DriveErrorKind::TransientServer, "503 b"),
            DriveError::new(DriveErrorKind::TransientServer, "503 c"),
        ]);

        let err = store.delete_chat(&chat.id).await.unwrap_err();
        assert_eq!(store.remote().delete_attempts(), 3);
        assert_eq!(err.kind, DriveErrorKind::TransientServer);
        assert!(err.message.contains("after 3 attempts"));
        assert!(err.message.contains("503 c"));
    }

    #[tokio::test]
    async fn delete_does_not_retry_permanent_failures() {
        let store = store();
        let chat = store.create_chat("Forbidden").await.unwrap();
        store.remote().fail_deletes_with(vec![DriveError::new(
            DriveErrorKind::PermanentClient(403),
            "forbidden",
        )]);

        let err = store.delete_chat(&chat.id).await.unwrap_err();
        assert_eq!(store.remote().delete_attempts(), 1);
        assert_eq!(err.kind, DriveErrorKind::PermanentClient(403));
    }
}
