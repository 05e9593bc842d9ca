mod common;

use std::time::Duration;

use common::{test_state, uid};
use messaging_store::error::AppError;

/// The last-message guard is strictly-newer on millisecond timestamps, so
/// tests that assert a preview moved forward space their sends apart.
async fn tick() {
    tokio::time::sleep(Duration::from_millis(2)).await;
}

#[tokio::test]
async fn first_message_creates_conversation_and_both_directory_entries() {
    let state = test_state();

    let outcome = state.send_message(uid(5), uid(9), "hi").await.unwrap();
    assert!(outcome.fanout.is_complete());
    assert_eq!(outcome.message.sender_id, uid(5));
    assert_eq!(outcome.message.receiver_id, uid(9));

    let conv = state.get_conversation(outcome.conversation_id).await.unwrap();
    assert_eq!(conv.low_user_id, uid(5));
    assert_eq!(conv.high_user_id, uid(9));
    assert_eq!(conv.last_message_content.as_deref(), Some("hi"));
    assert_eq!(conv.last_message_at, Some(outcome.message.created_at));

    for (owner, other) in [(uid(5), uid(9)), (uid(9), uid(5))] {
        let page = state
            .list_conversations_for_user(owner, None, None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        let entry = &page.items[0];
        assert_eq!(entry.owner_user_id, owner);
        assert_eq!(entry.other_user_id, other);
        assert_eq!(entry.conversation_id, outcome.conversation_id);
        assert_eq!(entry.last_message_content, "hi");
        assert_eq!(entry.last_message_at, outcome.message.created_at);
    }
}

#[tokio::test]
async fn reply_reuses_conversation_and_updates_previews() {
    let state = test_state();

    let first = state.send_message(uid(5), uid(9), "hi").await.unwrap();
    tick().await;
    let reply = state.send_message(uid(9), uid(5), "hey").await.unwrap();
    assert_eq!(first.conversation_id, reply.conversation_id);

    let conv = state.get_conversation(reply.conversation_id).await.unwrap();
    assert_eq!(conv.last_message_content.as_deref(), Some("hey"));
    assert_eq!(conv.last_message_at, Some(reply.message.created_at));

    for owner in [uid(5), uid(9)] {
        let page = state
            .list_conversations_for_user(owner, None, None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].last_message_content, "hey");
    }

    let history = state
        .list_messages(reply.conversation_id, None, None, None)
        .await
        .unwrap();
    let contents: Vec<&str> = history.items.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hey", "hi"]);
}

#[tokio::test]
async fn rejects_self_conversation_before_any_write() {
    let state = test_state();

    let err = state.send_message(uid(7), uid(7), "hello me").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidParticipants));

    let page = state
        .list_conversations_for_user(uid(7), None, None)
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn rejects_empty_and_oversized_content() {
    let state = test_state();

    assert!(matches!(
        state.send_message(uid(1), uid(2), "").await.unwrap_err(),
        AppError::BadRequest(_)
    ));

    let oversized = "x".repeat(state.config.max_content_bytes + 1);
    assert!(matches!(
        state.send_message(uid(1), uid(2), &oversized).await.unwrap_err(),
        AppError::BadRequest(_)
    ));

    let page = state
        .list_conversations_for_user(uid(1), None, None)
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn unknown_conversation_is_not_found() {
    let state = test_state();
    assert!(matches!(
        state.get_conversation(uid(42)).await.unwrap_err(),
        AppError::NotFound
    ));
}

#[tokio::test]
async fn separate_pairs_get_separate_conversations() {
    let state = test_state();

    let ab = state.send_message(uid(1), uid(2), "to b").await.unwrap();
    tick().await;
    let ac = state.send_message(uid(1), uid(3), "to c").await.unwrap();
    assert_ne!(ab.conversation_id, ac.conversation_id);

    let page = state
        .list_conversations_for_user(uid(1), None, None)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    // Most recent first.
    assert_eq!(page.items[0].other_user_id, uid(3));
    assert_eq!(page.items[1].other_user_id, uid(2));
}
