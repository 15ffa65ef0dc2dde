//! Rich diagnostic error types for the likerank engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers can tell a
//! rejected request from a transient store failure.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the likerank engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum LikerankError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Like(#[from] LikeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rank(#[from] RankError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

impl LikerankError {
    /// Whether the whole operation may be retried.
    ///
    /// Retrying is idempotent for identified users only; anonymous likes may
    /// be counted twice.
    pub fn is_transient(&self) -> bool {
        match self {
            LikerankError::Store(_) | LikerankError::Like(_) | LikerankError::Rank(_) => true,
            LikerankError::Catalog(e) => matches!(e, CatalogError::Unreachable(_)),
            LikerankError::Validation(_) | LikerankError::Engine(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ValidationError {
    #[error("malformed item id: \"{raw}\"")]
    #[diagnostic(
        code(likerank::validation::malformed_item),
        help("Item ids are unsigned 64-bit integers, e.g. `42`.")
    )]
    MalformedItemId { raw: String },

    #[error("item id must be non-zero")]
    #[diagnostic(
        code(likerank::validation::zero_item),
        help("Zero is reserved and never identifies an item. Use the item's real id.")
    )]
    ZeroItemId,
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(likerank::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(likerank::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             The operation had no effect and can be retried."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(likerank::store::serde),
        help(
            "Failed to serialize or deserialize a stored record. \
             This usually means the on-disk format changed between versions."
        )
    )]
    Serialization { message: String },

    #[error("store call `{op}` timed out after {after_ms} ms")]
    #[diagnostic(
        code(likerank::store::timeout),
        help(
            "The store did not answer within `op_timeout_ms`. The call may still \
             complete in the background; retry the request or raise the timeout."
        )
    )]
    Timeout { op: &'static str, after_ms: u64 },

    #[error("store unavailable: {message}")]
    #[diagnostic(
        code(likerank::store::unavailable),
        help("The store could not serve the request. Retry once it is reachable again.")
    )]
    Unavailable { message: String },
}

// ---------------------------------------------------------------------------
// Like errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum LikeError {
    #[error("could not claim like of item {item} for user {user}")]
    #[diagnostic(
        code(likerank::like::claim_failed),
        help("The dedup store failed before anything was counted. Retrying is safe.")
    )]
    ClaimFailed {
        user: u64,
        item: u64,
        #[source]
        source: StoreError,
    },

    #[error("counter update failed for item {item}")]
    #[diagnostic(
        code(likerank::like::counter_update_failed),
        help(
            "Neither the counter nor the ranking changed. Retrying is safe for \
             identified users; anonymous retries may double count."
        )
    )]
    CounterUpdateFailed {
        item: u64,
        #[source]
        source: StoreError,
    },

    #[error("could not read like count for item {item}")]
    #[diagnostic(
        code(likerank::like::count_read_failed),
        help("The fast store did not answer. Retry the read.")
    )]
    CountReadFailed {
        item: u64,
        #[source]
        source: StoreError,
    },
}

// ---------------------------------------------------------------------------
// Rank errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RankError {
    #[error("could not read the top {n} ranking entries")]
    #[diagnostic(
        code(likerank::rank::range_read_failed),
        help("The ranking store did not answer. Retry the query.")
    )]
    RangeReadFailed {
        n: usize,
        #[source]
        source: StoreError,
    },
}

// ---------------------------------------------------------------------------
// Catalog errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("item {item} not found in catalog")]
    #[diagnostic(
        code(likerank::catalog::not_found),
        help("The item may have been removed. Ranked entries are returned without a title.")
    )]
    NotFound { item: u64 },

    #[error("catalog unreachable")]
    #[diagnostic(
        code(likerank::catalog::unreachable),
        help("Title enrichment is skipped while the catalog is unavailable.")
    )]
    Unreachable(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(likerank::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("data directory error: {path}")]
    #[diagnostic(
        code(likerank::engine::data_dir),
        help(
            "The data directory could not be accessed. \
             Ensure the path exists and has read/write permissions."
        )
    )]
    DataDir { path: String },

    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(likerank::engine::config_read),
        help("Ensure the config file exists and is valid TOML, or run `likerank init`.")
    )]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}")]
    #[diagnostic(
        code(likerank::engine::config_parse),
        help("Check the TOML syntax in the config file: {message}")
    )]
    ConfigParse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(likerank::engine::config_write),
        help("Ensure you have write permissions to the config directory.")
    )]
    ConfigWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for functions returning likerank results.
pub type LikerankResult<T> = std::result::Result<T, LikerankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_to_top_level() {
        let err = StoreError::Unavailable {
            message: "down".into(),
        };
        let top: LikerankError = err.into();
        assert!(matches!(top, LikerankError::Store(StoreError::Unavailable { .. })));
        assert!(top.is_transient());
    }

    #[test]
    fn validation_errors_are_not_transient() {
        let top: LikerankError = ValidationError::ZeroItemId.into();
        assert!(!top.is_transient());
    }

    #[test]
    fn catalog_not_found_is_not_transient() {
        let not_found: LikerankError = CatalogError::NotFound { item: 3 }.into();
        assert!(!not_found.is_transient());

        let unreachable: LikerankError = CatalogError::from(StoreError::Timeout {
            op: "lookup_title",
            after_ms: 10,
        })
        .into();
        assert!(unreachable.is_transient());
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = LikeError::CounterUpdateFailed {
            item: 42,
            source: StoreError::Timeout {
                op: "credit",
                after_ms: 250,
            },
        };
        assert!(format!("{err}").contains("42"));

        let timeout = StoreError::Timeout {
            op: "credit",
            after_ms: 250,
        };
        let msg = format!("{timeout}");
        assert!(msg.contains("credit"));
        assert!(msg.contains("250"));
    }
}
