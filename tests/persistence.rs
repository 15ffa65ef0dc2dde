//! Persistence and recovery tests for the likerank engine.
//!
//! These tests verify that counters, ranking, dedup claims, the audit log
//! and catalog titles survive an engine restart.

use likerank::config::{EngineConfig, FastBackend};
use likerank::engine::Engine;
use likerank::ids::{ItemId, UserId};
use likerank::service::LikeStatus;

fn persistent_engine(dir: &std::path::Path) -> Engine {
    Engine::new(EngineConfig::persistent(dir)).unwrap()
}

fn item(raw: u64) -> ItemId {
    ItemId::new(raw).unwrap()
}

#[test]
fn counts_and_claims_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    // First session: like a few items.
    {
        let engine = persistent_engine(dir.path());
        engine.submit_like(item(42), UserId::new(7)).unwrap();
        engine.submit_like(item(42), UserId::new(8)).unwrap();
        engine.submit_like(item(5), None).unwrap();
    }

    // Second session: state is intact and dedup still applies.
    {
        let engine = persistent_engine(dir.path());
        assert_eq!(engine.likes(item(42)).unwrap(), 2);
        assert_eq!(engine.likes(item(5)).unwrap(), 1);

        let again = engine.submit_like(item(42), UserId::new(7)).unwrap();
        assert_eq!(again.status, LikeStatus::AlreadyLiked);
        assert_eq!(again.likes, 2);

        let top = engine.top_n(10).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].id, top[0].score), (item(42), 2));
        assert_eq!((top[1].id, top[1].score), (item(5), 1));
    }
}

#[test]
fn audit_log_resumes_sequence_after_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let engine = persistent_engine(dir.path());
        engine.submit_like(item(1), UserId::new(1)).unwrap();
        engine.submit_like(item(2), UserId::new(1)).unwrap();
    }
    {
        let engine = persistent_engine(dir.path());
        engine.submit_like(item(3), None).unwrap();

        let exported = engine.export_audit().unwrap();
        let seqs: Vec<u64> = exported.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(exported[2].item_id, 3);
    }
}

#[test]
fn catalog_titles_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let engine = persistent_engine(dir.path());
        engine.catalog().set_title(item(10), "Persisted title").unwrap();
        engine.submit_like(item(10), None).unwrap();
    }
    let engine = persistent_engine(dir.path());
    let top = engine.top_n(1).unwrap();
    assert_eq!(top[0].title.as_deref(), Some("Persisted title"));
}

#[test]
fn memory_fast_store_loses_counts_but_keeps_audit() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = EngineConfig {
        fast_store: FastBackend::Memory,
        ..EngineConfig::persistent(dir.path())
    };
    {
        let engine = Engine::new(config.clone()).unwrap();
        engine.submit_like(item(4), UserId::new(2)).unwrap();
    }
    let engine = Engine::new(config).unwrap();
    assert_eq!(engine.likes(item(4)).unwrap(), 0);
    assert!(engine.top_n(10).unwrap().is_empty());

    // The audit log is the record to reconcile from.
    let exported = engine.export_audit().unwrap();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].item_id, 4);
    assert_eq!(exported[0].user_id, Some(2));
}
