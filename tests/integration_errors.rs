mod common;

use common::TestApp;

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = TestApp::spawn().await;

    for path in ["/v1/conversations", "/v1/rooms", "/v1/users"] {
        let resp = app.client.get(format!("{}{path}", app.server_url)).send().await.unwrap();
        assert_eq!(resp.status(), 401, "{path} must require authentication");
    }
}

#[tokio::test]
async fn requests_with_a_forged_token_are_unauthorized() {
    let app = TestApp::spawn().await;

    let forged = parley_server::services::identity_service::IdentityService::new("other_secret", 3600)
        .issue(1, "alice")
        .unwrap();

    let resp = app.client.get(format!("{}/v1/conversations", app.server_url)).bearer_auth(forged).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;

    let resp = app.get("/v1/conversations/999", &alice).await;
    assert_eq!(resp.status(), 404);

    let resp = app.get("/v1/rooms/999", &alice).await;
    assert_eq!(resp.status(), 404);

    let resp = app.delete("/v1/messages/999", &alice).await;
    assert_eq!(resp.status(), 404);

    let resp = app.delete("/v1/rooms/999/messages/1", &alice).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn validation_failures_report_the_reason() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user(1, "alice").await;

    let resp = app
        .post_json("/v1/rooms", &alice, &serde_json::json!({"name": "ab", "participant_ids": [1]}))
        .await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("at least 3 characters"));
}

#[tokio::test]
async fn management_endpoints_respond() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(format!("{}/livez", app.mgmt_url)).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}
