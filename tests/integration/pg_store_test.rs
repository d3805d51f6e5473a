//! Postgres store tests
//!
//! Require a reachable database in `TEST_DATABASE_URL` (or `DATABASE_URL`);
//! run with `cargo test -p alloychat-integration-tests -- --ignored`.

use alloychat_common::{Database, Pagination};
use alloychat_conversations::{ConversationStore, MessageRole, PgConversationStore};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn store() -> anyhow::Result<(Database, PgConversationStore)> {
    dotenvy::from_filename(".env.test").ok();
    dotenvy::dotenv().ok();

    let url = std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))?;
    let pool = PgPoolOptions::new().max_connections(4).connect(&url).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let db = Database::from_pool(pool);
    let store = PgConversationStore::new(db.pool().clone());
    Ok((db, store))
}

#[tokio::test]
#[ignore] // Requires Postgres
async fn test_append_bumps_updated_at_and_orders_history() {
    let (db, store) = store().await.unwrap();
    let user = Uuid::new_v4();
    let conv = store
        .create_conversation(user, "Tool steels".to_string())
        .await
        .unwrap();

    for i in 0..12 {
        let role = if i % 2 == 0 {
            MessageRole::User
        } else {
            MessageRole::Assistant
        };
        store
            .append_message(conv.id, role, &format!("turn {}", i))
            .await
            .unwrap();
    }

    let reloaded = store.find_conversation(conv.id).await.unwrap().unwrap();
    assert!(reloaded.updated_at >= conv.updated_at);

    let recent = store.recent_messages(conv.id, 10).await.unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].content, "turn 2");
    assert_eq!(recent[9].content, "turn 11");
    assert!(recent.windows(2).all(|w| w[0].id < w[1].id));

    assert_eq!(store.recent_messages(conv.id, -1).await.unwrap().len(), 12);
    assert_eq!(store.conversation_owner(conv.id).await.unwrap(), Some(user));

    store.delete_conversation(conv.id).await.unwrap();
    db.close().await;
}

#[tokio::test]
#[ignore] // Requires Postgres
async fn test_delete_cascades_and_list_is_scoped() {
    let (db, store) = store().await.unwrap();
    let user = Uuid::new_v4();
    let first = store
        .create_conversation(user, "First".to_string())
        .await
        .unwrap();
    let second = store
        .create_conversation(user, "Second".to_string())
        .await
        .unwrap();
    store
        .append_message(first.id, MessageRole::User, "bump")
        .await
        .unwrap();

    let listed = store
        .list_conversations(user, Pagination::default())
        .await
        .unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    assert!(store.delete_conversation(first.id).await.unwrap());
    assert!(store.recent_messages(first.id, 0).await.unwrap().is_empty());
    assert!(store.find_conversation(first.id).await.unwrap().is_none());

    store.delete_conversation(second.id).await.unwrap();
    db.close().await;
}

#[tokio::test]
#[ignore] // Requires Postgres
async fn test_append_to_missing_conversation_is_not_found() {
    let (db, store) = store().await.unwrap();

    let result = store
        .append_message(Uuid::new_v4(), MessageRole::User, "orphan")
        .await;
    assert!(matches!(result, Err(alloychat_common::Error::NotFound(_))));

    db.close().await;
}
