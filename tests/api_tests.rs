mod common;

use axum_test::TestServer;
use common::*;
use lead_discovery_agent::agent::AgentParts;
use lead_discovery_agent::server::api::router;
use axum::http::StatusCode;
use serde_json::{ json, Value };

fn create_test_server(parts: AgentParts) -> TestServer {
    TestServer::new(router(build_agent(parts), 1000)).expect("Failed to create test server")
}

#[tokio::test]
async fn health_reports_healthy() {
    let server = create_test_server(AgentParts::default());

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn index_lists_endpoints() {
    let server = create_test_server(AgentParts::default());

    let body: Value = server.get("/").await.json();
    assert!(body["agent"].as_str().unwrap().contains("Healthcare Lead Discovery Agent"));
    assert!(body["endpoints"]["/automate"].is_string());
    assert!(body["endpoints"]["/telegram-webhook"].is_string());
}

#[tokio::test]
async fn automate_without_search_key_returns_fallback_data() {
    let server = create_test_server(AgentParts::default());

    let response = server
        .post("/automate")
        .json(&json!({ "url": "https://www.glow-aesthetics.com" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["workflow_type"], "3-step-simplified");
    assert_eq!(body["practice"]["company"], "Glow Aesthetics");
    assert_eq!(body["practice"]["lead_score"], 30);
    assert_eq!(body["practice"]["practice_type"], "healthcare-basic");
    assert_eq!(body["practice"]["enriched"], false);
    assert_eq!(body["notion"]["stored"], false);
    assert!(body["notion"]["lead_id"].as_str().unwrap().starts_with("fallback_"));
}

#[tokio::test]
async fn automate_with_search_and_store() {
    let search = MockSearch::returning(vec![hit("Glow", "https://www.glow-aesthetics.com/", CLINIC_TEXT)]);
    let server = create_test_server(AgentParts {
        search: Some(search),
        store: Some(MockStore::working()),
        ..AgentParts::default()
    });

    let body: Value = server
        .post("/automate")
        .json(&json!({ "url": "https://www.glow-aesthetics.com" }))
        .await
        .json();

    assert_eq!(body["practice"]["enriched"], true);
    assert_eq!(body["practice"]["email"], "hello@glowaesthetics.com");
    assert_eq!(body["notion"]["stored"], true);
    assert_eq!(body["notion"]["lead_id"], "page-1");
}

#[tokio::test]
async fn automate_requires_a_url() {
    let server = create_test_server(AgentParts::default());

    let response = server.post("/automate").json(&json!({})).await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "URL is required");

    let response = server.post("/automate").text("not json").await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn automate_rejects_invalid_urls() {
    let server = create_test_server(AgentParts::default());

    for url in ["not a url", "ftp://files.example.com/", "mailto:info@clinic.nl"] {
        let response = server.post("/automate").json(&json!({ "url": url })).await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid URL");
    }
}

fn update(chat_id: i64, text: &str) -> Value {
    json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "chat": { "id": chat_id, "type": "private" },
            "text": text
        }
    })
}

#[tokio::test]
async fn webhook_rate_limits_the_eleventh_message() {
    let server = create_test_server(AgentParts::default());

    for _ in 0..10 {
        let body: Value = server.post("/telegram-webhook").json(&update(77, "/help")).await.json();
        assert_eq!(body["status"], "ok");
    }
    let response = server.post("/telegram-webhook").json(&update(77, "/help")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "rate_limited");
}

#[tokio::test]
async fn webhook_ignores_updates_without_text() {
    let server = create_test_server(AgentParts::default());

    let sticker = json!({ "update_id": 2, "message": { "chat": { "id": 1 } } });
    let body: Value = server.post("/telegram-webhook").json(&sticker).await.json();
    assert_eq!(body["status"], "ignored");

    let response = server.post("/telegram-webhook").text("garbage").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ignored");
}

#[tokio::test]
async fn webhook_replies_through_messenger() {
    let messenger = MockMessenger::new();
    let server = create_test_server(AgentParts {
        messenger: Some(messenger.clone()),
        ..AgentParts::default()
    });

    server.post("/telegram-webhook").json(&update(12, "/start")).await.assert_status_ok();

    let sent = messenger.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 12);
    assert!(sent[0].1.contains("Healthcare Lead Discovery Agent"));
}

#[tokio::test]
async fn status_reports_configuration_and_counters() {
    let server = create_test_server(AgentParts {
        chat: Some(MockChat::replying("Hello!")),
        store: Some(MockStore::working()),
        ..AgentParts::default()
    });

    server.post("/telegram-webhook").json(&update(1, "hi")).await;
    server.post("/telegram-webhook").json(&update(2, "hi")).await;

    let body: Value = server.get("/status").await.json();
    assert_eq!(body["exa_configured"], false);
    assert_eq!(body["llm_configured"], true);
    assert_eq!(body["notion_configured"], true);
    assert_eq!(body["telegram_configured"], false);
    assert_eq!(body["model"], "mock/model");
    assert_eq!(body["notion_database_id"], "mock-db");
    assert_eq!(body["messages_handled"], 2);
    assert_eq!(body["active_conversations"], 2);
}

#[tokio::test]
async fn reload_without_prompt_file_is_a_no_op() {
    let server = create_test_server(AgentParts::default());

    let response = server.get("/api/reload-prompts").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Prompts unchanged");
}

#[tokio::test]
async fn global_limit_sheds_api_routes_but_not_the_webhook() {
    let server = TestServer::new(router(build_agent(AgentParts::default()), 1)).expect(
        "Failed to create test server"
    );

    server.get("/health").await.assert_status_ok();
    let response = server.get("/health").await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["error"], "Too many requests");

    for chat_id in 0..3 {
        let response = server.post("/telegram-webhook").json(&update(chat_id, "/help")).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}
