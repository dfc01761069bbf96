//! Integration tests for the file-backed token store.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use authgate_application::TokenStore;
use authgate_domain::{AuthToken, TokenKind};
use authgate_infrastructure::{FileTokenStore, SystemClock, TokioFileSystem};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::DateTime;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

async fn open(path: &std::path::Path, kind: TokenKind) -> FileTokenStore<TokioFileSystem> {
    FileTokenStore::open(TokioFileSystem::new(), path, kind, Arc::new(SystemClock::new()))
        .await
        .expect("Failed to open token store")
}

fn jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"42","exp":{exp}}}"#));
    format!("{header}.{payload}.signature")
}

#[tokio::test]
async fn test_token_survives_reopen() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("auth").join("token.json");

    let store = open(&path, TokenKind::Simple).await;
    assert!(store.get().await.unwrap().is_none());
    store.set(AuthToken::new("abc123")).await.unwrap();
    drop(store);

    let reopened = open(&path, TokenKind::Simple).await;
    let token = reopened.get().await.unwrap().expect("token should persist");
    assert_eq!(token.value(), "abc123");
    assert_eq!(token.kind, TokenKind::Simple);

    let mut changes = reopened.changes();
    assert_eq!(changes.next().await.unwrap().unwrap().value(), "abc123");
}

#[tokio::test]
async fn test_clear_removes_file() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("token.json");

    let store = open(&path, TokenKind::Simple).await;
    store.set(AuthToken::new("abc123")).await.unwrap();
    assert!(path.exists());

    store.clear().await.unwrap();
    assert!(!path.exists());
    assert!(store.get().await.unwrap().is_none());

    let reopened = open(&path, TokenKind::Simple).await;
    assert!(reopened.get().await.unwrap().is_none());
}

#[tokio::test]
async fn test_jwt_kind_extracts_expiry() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("token.json");

    let store = open(&path, TokenKind::Jwt).await;
    store.set(AuthToken::new(jwt(1_700_003_600))).await.unwrap();

    let token = open(&path, TokenKind::Jwt)
        .await
        .get()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(token.kind, TokenKind::Jwt);
    assert_eq!(token.expires_at, DateTime::from_timestamp(1_700_003_600, 0));
}

#[tokio::test]
async fn test_corrupt_file_is_serialization_error() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("token.json");
    std::fs::write(&path, b"not json").unwrap();

    let result = FileTokenStore::open(
        TokioFileSystem::new(),
        &path,
        TokenKind::Simple,
        Arc::new(SystemClock::new()),
    )
    .await;

    assert!(matches!(
        result,
        Err(authgate_application::TokenStoreError::Serialization(_))
    ));
}

#[tokio::test]
async fn test_changes_follow_writes() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let store = open(&temp_dir.path().join("token.json"), TokenKind::Simple).await;

    let mut changes = store.changes();
    assert_eq!(changes.next().await.unwrap(), None);

    store.set(AuthToken::new("one")).await.unwrap();
    store.clear().await.unwrap();

    assert_eq!(changes.next().await.unwrap().unwrap().value(), "one");
    assert_eq!(changes.next().await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reads_never_see_partial_writes() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("token.json");
    let store = Arc::new(open(&path, TokenKind::Simple).await);
    // a second handle shares only the file, not the in-process lock
    let other = open(&path, TokenKind::Simple).await;
    let values = ["a".repeat(256 * 1024), "b".repeat(256 * 1024)];
    store.set(AuthToken::new(values[0].clone())).await.unwrap();

    let writer = {
        let store = Arc::clone(&store);
        let values = values.clone();
        tokio::spawn(async move {
            for i in 0..50 {
                store.set(AuthToken::new(values[i % 2].clone())).await.unwrap();
            }
        })
    };

    while !writer.is_finished() {
        for reader in [&*store, &other] {
            let token = reader
                .get()
                .await
                .expect("read during a write must not fail")
                .expect("token must stay present");
            assert!(values.iter().any(|v| v == token.value()));
        }
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();

    let last = store.get().await.unwrap().unwrap();
    assert_eq!(last.value(), values[1]);
}
