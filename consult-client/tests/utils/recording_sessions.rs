use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use consult_client::SessionApiError;
use consult_client::session_api::SessionRegistry;
use consult_core::RoomKey;

/// Session registry that remembers what it was told, and optionally fails.
#[derive(Debug, Default)]
pub struct RecordingSessions {
    started: Mutex<Vec<RoomKey>>,
    ended: Mutex<Vec<RoomKey>>,
    /// "start" and "end" in the order the records landed.
    landed: Mutex<Vec<&'static str>>,
    start_delay: Duration,
    fail: bool,
}

impl RecordingSessions {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// A registry whose start record takes `delay` to land.
    pub fn slow_start(delay: Duration) -> Self {
        Self {
            start_delay: delay,
            ..Default::default()
        }
    }

    pub fn landed(&self) -> Vec<&'static str> {
        self.landed.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<RoomKey> {
        self.started.lock().unwrap().clone()
    }

    pub fn ended(&self) -> Vec<RoomKey> {
        self.ended.lock().unwrap().clone()
    }

    fn outcome(&self) -> Result<(), SessionApiError> {
        if self.fail {
            return Err(SessionApiError::Status(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRegistry for RecordingSessions {
    async fn session_started(&self, room: &RoomKey) -> Result<(), SessionApiError> {
        self.started.lock().unwrap().push(room.clone());
        tokio::time::sleep(self.start_delay).await;
        self.landed.lock().unwrap().push("start");
        self.outcome()
    }

    async fn session_ended(&self, room: &RoomKey) -> Result<(), SessionApiError> {
        self.ended.lock().unwrap().push(room.clone());
        self.landed.lock().unwrap().push("end");
        self.outcome()
    }
}
