// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # likerank
//!
//! An engagement counting and ranking engine: records likes against content
//! items, keeps a per-item counter and a global ranking in a fast store, and
//! appends every accepted like to a durable audit log.
//!
//! ## Architecture
//!
//! - **Fast store** (`store`): dedup claims, counters and ranking; in memory (DashMap) or redb
//! - **Audit log** (`audit`): append-only like events in redb
//! - **Engagement service** (`service`): claim → credit → audit, with degraded success
//! - **Rank reader** (`rank`): top-N queries enriched from the item `catalog`
//! - **Deadlines** (`deadline`): every store call is bounded by a timeout
//!
//! ## Library usage
//!
//! ```no_run
//! use likerank::config::EngineConfig;
//! use likerank::engine::Engine;
//! use likerank::ids::{ItemId, UserId};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let item = ItemId::new(42).unwrap();
//! let receipt = engine.submit_like(item, UserId::new(7)).unwrap();
//! assert_eq!(receipt.likes, 1);
//! let top = engine.top_n(10).unwrap();
//! assert_eq!(top[0].id, item);
//! ```

pub mod audit;
pub mod catalog;
pub mod config;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod event;
pub mod export;
pub mod ids;
pub mod rank;
pub mod service;
pub mod store;
