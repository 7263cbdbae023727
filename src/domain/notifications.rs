// src/domain/notifications.rs

use std::sync::Mutex;

use tracing::info;

use crate::dispatch::NotificationStatus;

/// Keeps what the last email script printed.
#[derive(Debug, Default)]
pub struct NotificationLog {
    last: Mutex<Option<String>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_status(&self) -> Option<String> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl NotificationStatus for NotificationLog {
    fn set_status(&self, raw: &str) {
        let status = raw.trim().to_string();
        info!(%status, "notification status");
        *self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(status);
    }
}
