//! Dify chat-messages API client
//!
//! Implements a single blocking turn against the chat-messages endpoint with:
//! - Bearer-token auth
//! - Conversation continuity via conversation_id
//! - Category-code extraction from replies
//!
//! Sends are serialised, so session updates land in submission order. A reset
//! or explicit set starts a new session generation; a reply to a request made
//! under an older generation is returned to its caller but its
//! conversation_id is not stored.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use crate::categories;
use crate::config::{ClientConfig, ConfigUpdate, DEFAULT_USER};
use crate::error::ClientError;

/// Ask the service for one complete reply instead of an SSE stream
pub const RESPONSE_MODE_BLOCKING: &str = "blocking";

/// Request body for POST /chat-messages
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// App input variables (always empty here)
    pub inputs: serde_json::Map<String, serde_json::Value>,
    pub query: String,
    pub response_mode: &'static str,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Successful reply
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    /// Unix seconds, when the service includes it
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl ChatResponse {
    pub fn has_categories(&self) -> bool {
        categories::has_categories(&self.answer)
    }

    pub fn category_codes(&self) -> Vec<String> {
        categories::extract_category_codes(&self.answer)
    }
}

/// Error body the service returns alongside a non-2xx status
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Active conversation state
#[derive(Debug, Default)]
struct Session {
    conversation_id: Option<String>,
    /// Bumped on every reset or explicit set
    generation: u64,
}

/// Client for one conversation at a time
pub struct ConversationClient {
    http: reqwest::Client,
    config: RwLock<ClientConfig>,
    session: Mutex<Session>,
    /// Held for a whole round trip
    send_lock: tokio::sync::Mutex<()>,
    user: String,
}

impl ConversationClient {
    /// Create a client with a fresh (absent) session
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: RwLock::new(config),
            session: Mutex::new(Session::default()),
            send_lock: tokio::sync::Mutex::new(()),
            user: DEFAULT_USER.to_string(),
        }
    }

    /// Override the default end-user identifier
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Send a query as the default user
    pub async fn send_message(&self, query: &str) -> Result<ChatResponse, ClientError> {
        self.send_message_as(query, &self.user).await
    }

    /// Send a query as `user`, continuing the active session if there is one
    pub async fn send_message_as(
        &self,
        query: &str,
        user: &str,
    ) -> Result<ChatResponse, ClientError> {
        let _turn = self.send_lock.lock().await;

        let (conversation_id, generation) = {
            let session = self.session();
            (session.conversation_id.clone(), session.generation)
        };
        let config = self.config();

        let request = ChatRequest {
            inputs: serde_json::Map::new(),
            query: query.to_string(),
            response_mode: RESPONSE_MODE_BLOCKING,
            user: user.to_string(),
            conversation_id,
        };

        tracing::debug!(
            endpoint = %config.endpoint,
            conversation_id = ?request.conversation_id,
            "Sending chat message"
        );

        let result = self.post(&config, &request).await;

        match &result {
            Ok(response) => self.store_conversation_id(response, generation),
            Err(e) => tracing::warn!("Chat message failed: {}", e),
        }

        result
    }

    async fn post(
        &self,
        config: &ClientConfig,
        request: &ChatRequest,
    ) -> Result<ChatResponse, ClientError> {
        let response = self
            .http
            .post(&config.endpoint)
            .bearer_auth(&config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // A body that isn't the documented error shape gets the generic message
            let body = response.text().await?;
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            return Err(ClientError::request(status.as_u16(), message));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(500).collect();
            ClientError::Parse(format!("{}. Response preview: {}", e, preview))
        })
    }

    fn store_conversation_id(&self, response: &ChatResponse, generation: u64) {
        let Some(id) = response
            .conversation_id
            .as_deref()
            .filter(|id| !id.is_empty())
        else {
            return;
        };

        let mut session = self.session();
        if session.generation != generation {
            tracing::debug!(
                conversation_id = id,
                "Ignoring conversation id from a superseded session"
            );
            return;
        }
        session.conversation_id = Some(id.to_string());
    }

    /// Forget the active session. In-flight requests are not cancelled.
    pub fn reset_conversation(&self) {
        let mut session = self.session();
        session.conversation_id = None;
        session.generation += 1;
    }

    pub fn get_conversation_id(&self) -> Option<String> {
        self.session().conversation_id.clone()
    }

    /// Resume (or clear) a session by id
    pub fn set_conversation_id(&self, conversation_id: Option<String>) {
        let mut session = self.session();
        session.conversation_id = conversation_id;
        session.generation += 1;
    }

    /// Merge a partial config; applies to the next request
    pub fn update_config(&self, update: ConfigUpdate) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        config.apply(update);
        tracing::debug!(config = ?*config, "Updated client config");
    }

    /// Snapshot of the current config
    pub fn config(&self) -> ClientConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn extract_category_codes(answer: &str) -> Vec<String> {
        categories::extract_category_codes(answer)
    }

    pub fn has_categories(answer: &str) -> bool {
        categories::has_categories(answer)
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
