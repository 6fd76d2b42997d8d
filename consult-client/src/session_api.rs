//! Session bookkeeping against the clinic's REST backend.

use crate::error::SessionApiError;
use async_trait::async_trait;
use consult_core::RoomKey;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Records when a consultation starts and ends. Callers treat every failure
/// as non-fatal.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn session_started(&self, room: &RoomKey) -> Result<(), SessionApiError>;

    async fn session_ended(&self, room: &RoomKey) -> Result<(), SessionApiError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSessionRegistry;

#[async_trait]
impl SessionRegistry for NoopSessionRegistry {
    async fn session_started(&self, _room: &RoomKey) -> Result<(), SessionApiError> {
        Ok(())
    }

    async fn session_ended(&self, _room: &RoomKey) -> Result<(), SessionApiError> {
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord<'a> {
    appointment_id: &'a str,
}

/// `POST /video/sessions` and `POST /video/sessions/end`, bearer authenticated.
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSessionApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, SessionApiError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn post(&self, path: &str, room: &RoomKey) -> Result<(), SessionApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} for appointment {}", url, room);

        let mut request = self.client.post(&url).json(&SessionRecord {
            appointment_id: room.as_str(),
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionApiError::Status(status));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRegistry for HttpSessionApi {
    async fn session_started(&self, room: &RoomKey) -> Result<(), SessionApiError> {
        self.post("/video/sessions", room).await
    }

    async fn session_ended(&self, room: &RoomKey) -> Result<(), SessionApiError> {
        self.post("/video/sessions/end", room).await
    }
}
