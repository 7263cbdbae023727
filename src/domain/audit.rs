// src/domain/audit.rs

use tracing::info;

use crate::dispatch::AuditLog;

/// Audit lines go to the `spoolr::audit` tracing target, so a subscriber can
/// route them separately.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudit;

impl AuditLog for TracingAudit {
    fn write_log(&self, line: &str) {
        info!(target: "spoolr::audit", "{}", line);
    }
}
