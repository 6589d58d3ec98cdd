mod common;

use common::TestApp;

#[tokio::test]
async fn send_stores_exactly_two_copies() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let bob = app.seed_user(2, "bob").await;

    app.send_direct(&alice, &bob, "hello bob").await;

    let rows = app.direct_message_rows().await;
    assert_eq!(rows.len(), 2, "A send must produce exactly two rows");

    let (sender_copy, recipient_copy) = (&rows[0], &rows[1]);
    assert_eq!(sender_copy, &(1, 1, 2, "hello bob".to_string(), true));
    assert_eq!(recipient_copy, &(2, 1, 2, "hello bob".to_string(), false));
}

#[tokio::test]
async fn self_message_is_allowed() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;

    app.send_direct(&alice, &alice, "note to self").await;

    let rows = app.direct_message_rows().await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|(owner, sender, recipient, _, _)| (*owner, *sender, *recipient) == (1, 1, 1)));
}

#[tokio::test]
async fn send_to_unknown_handle_is_not_found() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;

    let resp = app
        .post_json("/v1/messages", &alice, &serde_json::json!({"to_user": "nobody", "body": "hi"}))
        .await;

    assert_eq!(resp.status(), 404);
    assert!(app.direct_message_rows().await.is_empty());
}

#[tokio::test]
async fn delete_message_removes_only_the_callers_copy() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let bob = app.seed_user(2, "bob").await;

    app.send_direct(&alice, &bob, "ephemeral").await;

    let alice_copy_id = sqlx::query_scalar::<_, i64>("SELECT id FROM messages WHERE owner_id = 1")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let resp = app.delete(&format!("/v1/messages/{alice_copy_id}"), &alice).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], 1);

    let rows = app.direct_message_rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, 2, "Bob's copy must survive");
}

#[tokio::test]
async fn deleting_someone_elses_copy_is_not_found() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let bob = app.seed_user(2, "bob").await;

    app.send_direct(&alice, &bob, "mine").await;

    let bob_copy_id = sqlx::query_scalar::<_, i64>("SELECT id FROM messages WHERE owner_id = 2")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let resp = app.delete(&format!("/v1/messages/{bob_copy_id}"), &alice).await;
    assert_eq!(resp.status(), 404);
    assert_eq!(app.direct_message_rows().await.len(), 2);
}

#[tokio::test]
async fn delete_conversation_keeps_partner_copies() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let bob = app.seed_user(2, "bob").await;

    app.send_direct(&alice, &bob, "one").await;
    app.send_direct(&bob, &alice, "two").await;
    app.send_direct(&alice, &bob, "three").await;

    let resp = app.delete("/v1/conversations/2", &alice).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], 3);

    let rows = app.direct_message_rows().await;
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|(owner, ..)| *owner == 2), "Only Bob's copies remain");

    // Deleting an already-empty conversation succeeds with a zero count.
    let resp = app.delete("/v1/conversations/2", &alice).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], 0);
}
