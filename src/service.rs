//! Engagement service: the like path.
//!
//! A like is processed in a fixed order:
//!
//! 1. identified users claim the `(user, item)` pair; a repeat claim answers
//!    `AlreadyLiked` with the current count and changes nothing
//! 2. the item is credited (counter and ranking, atomically)
//! 3. the event is appended to the audit log; a failed append downgrades the
//!    response to `LikedDegraded` but never fails it
//!
//! A claim that succeeded is not rolled back if the credit then fails.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::deadline::Deadline;
use crate::error::{LikeError, LikerankResult};
use crate::event::LikeEvent;
use crate::ids::{ItemId, UserId};
use crate::store::{Claim, FastStore};

/// How a like request was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeStatus {
    /// Counted and recorded in the audit log.
    Liked,
    /// The user had already liked the item; nothing changed.
    AlreadyLiked,
    /// Counted, but the audit append failed.
    LikedDegraded,
}

impl std::fmt::Display for LikeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LikeStatus::Liked => write!(f, "liked"),
            LikeStatus::AlreadyLiked => write!(f, "already liked"),
            LikeStatus::LikedDegraded => write!(f, "liked (audit record failed)"),
        }
    }
}

/// Response to a like request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeReceipt {
    /// The item's like count after this request.
    pub likes: u64,
    pub status: LikeStatus,
    /// Why the audit append failed, for `LikedDegraded` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_error: Option<String>,
}

impl LikeReceipt {
    fn liked(likes: u64) -> Self {
        Self {
            likes,
            status: LikeStatus::Liked,
            audit_error: None,
        }
    }

    fn already_liked(likes: u64) -> Self {
        Self {
            likes,
            status: LikeStatus::AlreadyLiked,
            audit_error: None,
        }
    }

    fn degraded(likes: u64, audit_error: String) -> Self {
        Self {
            likes,
            status: LikeStatus::LikedDegraded,
            audit_error: Some(audit_error),
        }
    }
}

/// Orchestrates dedup, credit and audit for like requests.
pub struct EngagementService {
    fast: Arc<dyn FastStore>,
    audit: Arc<dyn AuditLog>,
    deadline: Arc<Deadline>,
}

impl EngagementService {
    pub fn new(fast: Arc<dyn FastStore>, audit: Arc<dyn AuditLog>, deadline: Arc<Deadline>) -> Self {
        Self {
            fast,
            audit,
            deadline,
        }
    }

    /// Record a like of `item`, by `user` if known.
    ///
    /// Anonymous likes skip deduplication, so repeating one counts again.
    pub fn submit_like(&self, user: Option<UserId>, item: ItemId) -> LikerankResult<LikeReceipt> {
        if let Some(user) = user {
            let fast = Arc::clone(&self.fast);
            let claim = self
                .deadline
                .run("try_claim", move || fast.try_claim(user, item))
                .map_err(|source| LikeError::ClaimFailed {
                    user: user.get(),
                    item: item.get(),
                    source,
                })?;

            if claim == Claim::AlreadyClaimed {
                let likes = self.likes(item)?;
                tracing::debug!(%user, %item, likes, "like already recorded");
                return Ok(LikeReceipt::already_liked(likes));
            }
        }

        let fast = Arc::clone(&self.fast);
        let likes = self
            .deadline
            .run("credit", move || fast.credit(item))
            .map_err(|source| {
                tracing::warn!(?user, %item, error = %source, "credit failed after claim");
                LikeError::CounterUpdateFailed {
                    item: item.get(),
                    source,
                }
            })?;

        let event = LikeEvent::new(user, item);
        let audit = Arc::clone(&self.audit);
        match self.deadline.run("audit_append", move || audit.append(&event)) {
            Ok(seq) => {
                tracing::debug!(?user, %item, likes, seq, "like recorded");
                Ok(LikeReceipt::liked(likes))
            }
            Err(e) => {
                tracing::warn!(?user, %item, likes, error = %e, "like counted but audit append failed");
                Ok(LikeReceipt::degraded(likes, e.to_string()))
            }
        }
    }

    /// Current like count of `item`, 0 if it was never liked.
    pub fn likes(&self, item: ItemId) -> LikerankResult<u64> {
        let fast = Arc::clone(&self.fast);
        let likes = self
            .deadline
            .run("likes", move || fast.likes(item))
            .map_err(|source| LikeError::CountReadFailed {
                item: item.get(),
                source,
            })?;
        Ok(likes)
    }
}

impl std::fmt::Debug for EngagementService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngagementService")
            .field("backend", &self.fast.backend())
            .field("deadline", &self.deadline)
            .finish()
    }
}
