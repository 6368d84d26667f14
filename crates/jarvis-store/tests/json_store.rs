//! Behavioural tests for the JSON conversation store through its port.

use std::sync::Arc;
use std::time::Duration;

use jarvis_core::domain::{MessageRole, Turn};
use jarvis_core::ports::{ConversationStore, SystemClock};
use jarvis_store::JsonConversationStore;
use tempfile::tempdir;

async fn open(dir: &std::path::Path) -> Arc<dyn ConversationStore> {
    Arc::new(
        JsonConversationStore::open(dir, Arc::new(SystemClock))
            .await
            .unwrap(),
    )
}

#[tokio::test]
async fn turns_read_back_verbatim_in_append_order() {
    let temp = tempdir().unwrap();
    let store = open(temp.path()).await;
    let id = store.create().await.unwrap();

    let turns = vec![
        Turn::new(MessageRole::User, "What's the weather?", 10),
        Turn::new(MessageRole::Assistant, "Sunny, 21 °C.", 5),
        Turn::new(MessageRole::System, "Please enter your key", 7),
    ];
    for turn in &turns {
        store.append(&id, turn.clone()).await.unwrap();
    }

    assert_eq!(store.read(&id).await.unwrap(), turns);
}

#[tokio::test]
async fn list_is_most_recently_modified_first() {
    let temp = tempdir().unwrap();
    let store = open(temp.path()).await;

    let older = store.create().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let newer = store.create().await.unwrap();
    assert_eq!(store.list().await.unwrap(), vec![newer.clone(), older.clone()]);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    store
        .append(&older, Turn::new(MessageRole::User, "bump", 1))
        .await
        .unwrap();
    assert_eq!(store.list().await.unwrap(), vec![older, newer]);
}

#[tokio::test]
async fn store_survives_reopen() {
    let temp = tempdir().unwrap();
    let id = {
        let store = open(temp.path()).await;
        let id = store.create().await.unwrap();
        store
            .append(&id, Turn::new(MessageRole::User, "persist me", 1))
            .await
            .unwrap();
        store.rename(&id, "Persisted").await.unwrap().new_id
    };

    let store = open(temp.path()).await;
    assert_eq!(store.list().await.unwrap(), vec![id.clone()]);
    assert_eq!(store.read(&id).await.unwrap()[0].content, "persist me");
}
