//! End-to-end tests over a persisted store

use selkie_core::config::{SelkieConfig, WorkingConfig};
use selkie_core::AgentId;
use selkie_memory::store::CONTEXT_HEADER;
use selkie_memory::{
    Importance, ImportMode, MemoryStore, MemoryTier, RecallSource, StaticSummarizer, TurnRole,
};
use std::path::Path;
use std::sync::Arc;

fn config(dir: &Path) -> SelkieConfig {
    let mut config = SelkieConfig::with_persist_dir(dir);
    config.working = WorkingConfig {
        tokens_budget: 256,
        compaction_threshold: 0.8,
    };
    config
}

async fn open(dir: &Path, agent: &str) -> MemoryStore {
    MemoryStore::builder(AgentId::new(agent).unwrap())
        .config(config(dir))
        .summarizer(Arc::new(StaticSummarizer::new()))
        .open()
        .await
        .unwrap()
}

#[tokio::test]
async fn remembered_name_shows_up_in_context() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path(), "assistant").await;

    store
        .remember("User's name is Alice", Some(Importance::new(8)))
        .await
        .unwrap();

    let context = store.get_context(Some("user"), None).await.unwrap();
    assert!(context.starts_with(CONTEXT_HEADER));
    assert!(context.contains("Alice"));
}

#[tokio::test]
async fn namespaces_never_leak() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = open(dir.path(), "alpha").await;
    let beta = open(dir.path(), "beta").await;

    alpha.remember("alpha launch codes", None).await.unwrap();
    beta.remember("beta grocery list", None).await.unwrap();

    let beta_results = beta.recall("alpha launch codes", 5).await.unwrap();
    assert!(beta_results.iter().all(|m| !m.content.contains("launch")));

    let alpha_context = alpha.get_context(Some("grocery"), None).await.unwrap();
    assert!(!alpha_context.contains("grocery list"));
}

#[tokio::test]
async fn store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = open(dir.path(), "durable").await;
        store
            .remember("the retro is every second friday", Some(Importance::new(6)))
            .await
            .unwrap();
    }

    let reopened = open(dir.path(), "durable").await;
    let stats = reopened.stats().await.unwrap();
    assert_eq!(stats.episodic_entry_count, 1);
    assert_eq!(stats.semantic_entry_count, 1);

    let results = reopened.recall("retro friday", 5).await.unwrap();
    assert_eq!(results[0].content, "the retro is every second friday");
}

#[tokio::test]
async fn export_then_import_reproduces_the_record_set() {
    let dir = tempfile::tempdir().unwrap();
    let source = open(dir.path(), "source").await;

    source
        .remember("likes espresso", Some(Importance::new(4)))
        .await
        .unwrap();
    source
        .remember("works at a bakery", Some(Importance::new(7)))
        .await
        .unwrap();

    let json = source.export_json().await.unwrap();

    let fresh_dir = tempfile::tempdir().unwrap();
    let target = open(fresh_dir.path(), "target").await;
    let written = target.import_json(&json, ImportMode::Replace).await.unwrap();
    assert_eq!(written, 2);

    // Imported rows keep their importance, so recall ranks them the same.
    let results = target.recall("bakery", 5).await.unwrap();
    assert_eq!(results[0].content, "works at a bakery");
    assert!(results[0].score >= 0.69);
}

#[tokio::test]
async fn duplicate_facts_collapse_in_the_semantic_tier() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path(), "dedup").await;

    store
        .remember("alice prefers dark mode", Some(Importance::new(3)))
        .await
        .unwrap();
    store
        .remember("alice prefers dark mode", Some(Importance::new(9)))
        .await
        .unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.semantic_entry_count, 1);
    // The episodic log keeps both rows; it is a log, not a set.
    assert_eq!(stats.episodic_entry_count, 2);

    let results = store.recall("alice dark mode", 5).await.unwrap();
    let semantic_hits: Vec<_> = results
        .iter()
        .filter(|m| m.source == RecallSource::Semantic)
        .collect();
    assert!(semantic_hits.len() <= 1);
}

#[tokio::test]
async fn long_conversation_compacts_into_episodic_summaries() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path(), "chatty").await;

    store
        .add_message(TurnRole::System, "you are a helpful assistant")
        .await
        .unwrap();

    let mut compacted = false;
    for i in 0..20 {
        let turn = format!("turn {}: {}", i, "detail ".repeat(30));
        compacted |= store.add_message(TurnRole::User, turn).await.unwrap();
    }
    assert!(compacted);

    let stats = store.stats().await.unwrap();
    assert!(stats.working_token_count < stats.working_token_budget);
    assert!(stats.episodic_entry_count >= 1);

    // The system turn is never compacted away.
    let messages = store.messages().await;
    assert_eq!(messages[0].role, TurnRole::System);
}

#[tokio::test]
async fn clearing_everything_leaves_an_empty_namespace() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path(), "wipe").await;

    store.remember("to be wiped", None).await.unwrap();
    store.add_message(TurnRole::User, "hello").await.unwrap();

    store.clear(&MemoryTier::ALL).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.working_message_count, 0);
    assert_eq!(stats.durable_entries(), 0);
    assert_eq!(store.get_context(Some("wiped"), None).await.unwrap(), "");
}
