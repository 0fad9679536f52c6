mod config;
mod conversation;

use std::sync::Arc;

use tauri::Manager;
use tokio::sync::Mutex;

use gws_auth::commands::AuthControllerState;
use gws_auth::controller::AuthController;
use gws_auth::identity::GoogleIdentity;
use gws_backend::client::BackendClient;
use gws_chatstore::commands::ChatStoreState;
use gws_chatstore::store::ChatStore;
use gws_gdrive::auth::OAuthSettings;
use gws_gdrive::service::DriveFiles;
use gws_gdrive::token_store::TokenStore;
use gws_gdrive::types::DriveConfig;

use config::AppConfig;
use conversation::{BackendState, ConversationService, ConversationServiceState, GenerationSettings};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  tauri::Builder::default()
    .setup(|app| {
      if cfg!(debug_assertions) {
        app.handle().plugin(
          tauri_plugin_log::Builder::default()
            .level(log::LevelFilter::Info)
            .build(),
        )?;
      }

      let app_dir = app.path().app_data_dir()?;
      std::fs::create_dir_all(&app_dir)?;
      let app_config = AppConfig::load(&app_dir.join("config.json"));

      // Shared token cell, mirrored to a session file so a restart within
      // the token's lifetime stays signed in.
      let tokens = Arc::new(TokenStore::with_session_file(app_dir.join("session.json")));

      let drive = Arc::new(DriveFiles::new(
        DriveConfig::default(),
        tokens.clone(),
        app_config.app_folder.clone(),
      )?);

      let auth_controller = AuthController::new(
        OAuthSettings {
          client_id: app_config.google.client_id.clone(),
          redirect_uri: app_config.google.redirect_uri.clone(),
          scopes: vec![app_config.google.scope.clone()],
        },
        tokens,
        drive.clone(),
        Box::new(GoogleIdentity::new(drive.client().clone())),
      );
      let auth_state: AuthControllerState = Arc::new(Mutex::new(auth_controller));
      app.manage(auth_state);

      let store = Arc::new(ChatStore::new(drive));
      let store_state: ChatStoreState = store.clone();
      app.manage(store_state);

      let conversation = ConversationService::new(
        store,
        GenerationSettings {
          default_model: app_config.default_model.clone(),
          refiner_model: app_config.refiner_model.clone(),
        },
      );
      let conversation_state: ConversationServiceState = Arc::new(Mutex::new(conversation));
      app.manage(conversation_state);

      let backend: BackendState = Arc::new(BackendClient::new(app_config.backend_url.clone())?);
      app.manage(backend);

      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
        gws_auth::commands::auth_initialize,
        gws_auth::commands::auth_sign_in,
        gws_auth::commands::auth_wait_for_sign_in,
        gws_auth::commands::auth_handle_grant,
        gws_auth::commands::auth_sign_out,
        gws_auth::commands::auth_status,
        gws_chatstore::commands::chat_list,
        gws_chatstore::commands::chat_get_content,
        gws_chatstore::commands::chat_create,
        gws_chatstore::commands::chat_save,
        gws_chatstore::commands::chat_rename,
        gws_chatstore::commands::chat_delete,
        conversation::conversation_active,
        conversation::conversation_refresh,
        conversation::conversation_open,
        conversation::conversation_new,
        conversation::conversation_send,
        conversation::conversation_rename,
        conversation::conversation_delete,
        conversation::conversation_clone_repo
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
