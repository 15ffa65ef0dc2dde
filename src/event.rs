//! Like events: the immutable facts recorded in the audit log.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, UserId};

/// A single accepted like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEvent {
    /// Who liked the item, `None` for anonymous likes.
    pub user: Option<UserId>,
    /// The liked item.
    pub item: ItemId,
    /// Timestamp (seconds since UNIX epoch).
    pub timestamp: u64,
}

impl LikeEvent {
    /// Create an event stamped with the current time.
    pub fn new(user: Option<UserId>, item: ItemId) -> Self {
        Self::at(
            user,
            item,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        )
    }

    /// Create an event with an explicit timestamp.
    pub fn at(user: Option<UserId>, item: ItemId, timestamp: u64) -> Self {
        Self {
            user,
            item,
            timestamp,
        }
    }
}

/// A like event as stored, with the sequence number the log assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Position in the log, starting at 1.
    pub seq: u64,
    pub event: LikeEvent,
}
