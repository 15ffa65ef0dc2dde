//! Export types for serializing engine state.
//!
//! Flat, raw-id representations suitable for JSON export and offline
//! reconciliation tooling.

use serde::{Deserialize, Serialize};

use crate::event::AuditRecord;

/// Exported audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEventExport {
    /// Sequence number in the audit log.
    pub seq: u64,
    /// User id, absent for anonymous likes.
    pub user_id: Option<u64>,
    /// Item id.
    pub item_id: u64,
    /// Timestamp (seconds since UNIX epoch).
    pub timestamp: u64,
}

impl From<&AuditRecord> for LikeEventExport {
    fn from(record: &AuditRecord) -> Self {
        Self {
            seq: record.seq,
            user_id: record.event.user.map(|u| u.get()),
            item_id: record.event.item.get(),
            timestamp: record.event.timestamp,
        }
    }
}

/// Exported like count of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikesExport {
    pub item_id: u64,
    pub likes: u64,
}
