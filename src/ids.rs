//! Identifier types for items and users.
//!
//! Both wrap `NonZeroU64`: zero never names an item or a user, and
//! `Option<UserId>` (the anonymous case) costs nothing extra.

use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier of a piece of content that can be liked.
///
/// Never reused across distinct items, but may point at content that no
/// longer exists in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ItemId(NonZeroU64);

impl ItemId {
    /// Create an `ItemId` from a raw `u64`.
    ///
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(ItemId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl FromStr for ItemId {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value: u64 = raw
            .trim()
            .parse()
            .map_err(|_| ValidationError::MalformedItemId {
                raw: raw.to_string(),
            })?;
        ItemId::new(value).ok_or(ValidationError::ZeroItemId)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "item:{}", self.0)
    }
}

/// Identifier of the user behind a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct UserId(NonZeroU64);

impl UserId {
    /// Create a `UserId` from a raw `u64`.
    ///
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(UserId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Resolve a caller-supplied user value.
    ///
    /// Missing, empty, unparsable or zero values all resolve to `None`, which
    /// makes the like anonymous rather than rejecting it.
    pub fn resolve(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<u64>().ok())
            .and_then(UserId::new)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}
