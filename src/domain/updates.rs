// src/domain/updates.rs

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::dispatch::{UpdateAvailability, UpdateChannel};

/// Update channel choice plus the result of the last update check.
#[derive(Debug, Default)]
pub struct UpdateState {
    beta: AtomicBool,
    available: AtomicBool,
}

impl UpdateState {
    pub fn new(beta: bool) -> Self {
        Self {
            beta: AtomicBool::new(beta),
            available: AtomicBool::new(false),
        }
    }

    pub fn set_beta_mode(&self, beta: bool) {
        self.beta.store(beta, Ordering::SeqCst);
    }

    pub fn update_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

impl UpdateChannel for UpdateState {
    fn beta_mode(&self) -> bool {
        self.beta.load(Ordering::SeqCst)
    }
}

impl UpdateAvailability for UpdateState {
    fn set_update_available(&self, available: bool) {
        let was = self.available.swap(available, Ordering::SeqCst);
        if available && !was {
            info!(branch = self.branch(), "update available");
        }
    }
}
