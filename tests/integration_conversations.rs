mod common;

use common::TestApp;

#[tokio::test]
async fn unread_flow_for_a_single_message() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let bob = app.seed_user(2, "bob").await;

    app.send_direct(&alice, &bob, "hi").await;

    // Bob sees one conversation with one unread message from Alice.
    let list: serde_json::Value = app.get("/v1/conversations", &bob).await.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["partner"]["id"], 1);
    assert_eq!(list[0]["unread_count"], 1);
    assert_eq!(list[0]["is_sent_last"], false);
    assert_eq!(list[0]["last_message"]["body"], "hi");

    // Viewing the conversation is the read receipt.
    let detail: serde_json::Value = app.get("/v1/conversations/1", &bob).await.json().await.unwrap();
    let messages = detail["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["body"], "hi");
    assert_eq!(messages[0]["is_read"], true, "Returned rows reflect the mark-read that precedes the fetch");

    // Idempotent: a second view still reports zero unread.
    let _: serde_json::Value = app.get("/v1/conversations/1", &bob).await.json().await.unwrap();
    let list: serde_json::Value = app.get("/v1/conversations", &bob).await.json().await.unwrap();
    assert_eq!(list[0]["unread_count"], 0);
}

#[tokio::test]
async fn read_receipt_appears_after_partner_views() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let bob = app.seed_user(2, "bob").await;

    app.send_direct(&alice, &bob, "seen yet?").await;

    let detail: serde_json::Value = app.get("/v1/conversations/2", &alice).await.json().await.unwrap();
    assert_eq!(detail["messages"][0]["recipient_has_read"], false);

    // Bob opens the conversation, which flips his copy to read.
    let _: serde_json::Value = app.get("/v1/conversations/1", &bob).await.json().await.unwrap();

    let detail: serde_json::Value = app.get("/v1/conversations/2", &alice).await.json().await.unwrap();
    assert_eq!(detail["messages"][0]["recipient_has_read"], true);
}

#[tokio::test]
async fn received_messages_carry_no_receipt_annotation() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let bob = app.seed_user(2, "bob").await;

    app.send_direct(&alice, &bob, "hello").await;

    let detail: serde_json::Value = app.get("/v1/conversations/1", &bob).await.json().await.unwrap();
    assert!(
        detail["messages"][0].get("recipient_has_read").is_none(),
        "Receipts only annotate messages the viewer sent"
    );
}

#[tokio::test]
async fn conversations_order_by_latest_activity() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let bob = app.seed_user(2, "bob").await;
    let carol = app.seed_user(3, "carol").await;

    app.send_direct(&alice, &bob, "first").await;
    app.send_direct(&alice, &carol, "second").await;

    let list: serde_json::Value = app.get("/v1/conversations", &alice).await.json().await.unwrap();
    let partners: Vec<i64> =
        list.as_array().unwrap().iter().map(|c| c["partner"]["id"].as_i64().unwrap()).collect();
    assert_eq!(partners, vec![3, 2]);

    // New activity moves Bob back to the top.
    app.send_direct(&bob, &alice, "ping").await;

    let list: serde_json::Value = app.get("/v1/conversations", &alice).await.json().await.unwrap();
    let partners: Vec<i64> =
        list.as_array().unwrap().iter().map(|c| c["partner"]["id"].as_i64().unwrap()).collect();
    assert_eq!(partners, vec![2, 3]);
    assert_eq!(list[0]["is_sent_last"], false);
    assert_eq!(list[1]["is_sent_last"], true);
}

#[tokio::test]
async fn filter_restricts_to_first_username_match() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let bob = app.seed_user(2, "bob").await;
    let carol = app.seed_user(3, "carol").await;

    app.send_direct(&alice, &bob, "to bob").await;
    app.send_direct(&alice, &carol, "to carol").await;

    let list: serde_json::Value = app.get("/v1/conversations?search=car", &alice).await.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["partner"]["username"], "carol");

    let list: serde_json::Value = app.get("/v1/conversations?search=zzz", &alice).await.json().await.unwrap();
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn filter_match_without_history_is_empty() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let _mallory = app.seed_user(2, "mallory").await;

    let list: serde_json::Value = app.get("/v1/conversations?search=mal", &alice).await.json().await.unwrap();
    assert!(list.as_array().unwrap().is_empty(), "A match with no messages is not a conversation");
}

#[tokio::test]
async fn user_search_excludes_the_caller() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;
    let _bob = app.seed_user(2, "bob").await;
    let _carol = app.seed_user(3, "carol").await;

    let users: serde_json::Value = app.get("/v1/users?search=bo", &alice).await.json().await.unwrap();
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["username"], "bob");

    let users: serde_json::Value = app.get("/v1/users", &alice).await.json().await.unwrap();
    let names: Vec<&str> = users.as_array().unwrap().iter().map(|u| u["username"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["bob", "carol"]);
}
