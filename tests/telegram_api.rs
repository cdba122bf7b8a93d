use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use realty_bot::context::AppContext;
use realty_bot::error::AppError;
use realty_bot::models::{ChatId, Config, Listing, ScheduleConfig, Subscriber, TelegramConfig};
use realty_bot::pipeline::{ChangeDetector, NotificationLoop, PollSchedule};
use realty_bot::services::{CommandDispatcher, ListingSource, SubscriberRegistry};
use realty_bot::storage::{MemoryListingStore, MemorySubscriberStore};
use realty_bot::telegram::{ChatTransport, CommandSource, OutboundMessage, TelegramClient};

const TOKEN: &str = "123456:test-token";

fn client_for(server: &MockServer) -> TelegramClient {
    TelegramClient::new(&TelegramConfig {
        token: TOKEN.to_string(),
        api_url: server.uri(),
        poll_timeout_secs: 0,
    })
    .unwrap()
}

fn sent_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ok": true,
        "result": { "message_id": 1, "date": 0, "chat": { "id": 1, "type": "private" } }
    }))
}

async fn request_bodies(server: &MockServer, api_method: &str) -> Vec<Value> {
    let suffix = format!("/{api_method}");
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().ends_with(&suffix))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn send_message_posts_html() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({
            "chat_id": 42,
            "parse_mode": "HTML",
            "disable_web_page_preview": true
        })))
        .respond_with(sent_ok())
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .send(&OutboundMessage::reply(ChatId(42), "<b>hi</b>"))
        .await
        .unwrap();

    let bodies = request_bodies(&server, "sendMessage").await;
    assert_eq!(bodies[0]["text"], "<b>hi</b>");
}

#[tokio::test]
async fn api_error_description_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .send(&OutboundMessage::notification(ChatId(7), "x"))
        .await
        .unwrap_err();

    match &err {
        AppError::Telegram { method, description } => {
            assert_eq!(method, "sendMessage");
            assert_eq!(description, "Forbidden: bot was blocked by the user");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn non_json_error_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .send(&OutboundMessage::reply(ChatId(7), "x"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("HTTP 502"), "{err}");
}

#[tokio::test]
async fn updates_map_commands_and_advance_offset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .and(body_partial_json(json!({ "offset": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [
                {
                    "update_id": 100,
                    "message": {
                        "message_id": 1,
                        "date": 0,
                        "chat": { "id": 5, "type": "private", "username": "jdoe", "first_name": "John", "last_name": "Doe" },
                        "text": "/subscribe@realty_bot"
                    }
                },
                {
                    "update_id": 101,
                    "message": {
                        "message_id": 2,
                        "date": 0,
                        "chat": { "id": 6, "type": "private", "first_name": "Ann" },
                        "text": "hello there"
                    }
                },
                { "update_id": 102, "edited_message": { "message_id": 3 } }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .and(body_partial_json(json!({ "offset": 103 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": [] })))
        .mount(&server)
        .await;

    let mut updates = client_for(&server).updates();

    let batch = updates.next_batch().await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].chat_id, ChatId(5));
    assert_eq!(batch[0].command, "subscribe");
    assert_eq!(batch[0].sender_handle.as_deref(), Some("jdoe"));
    assert_eq!(batch[0].sender_first_name, "John");
    assert_eq!(batch[0].sender_last_name, "Doe");

    assert!(updates.next_batch().await.unwrap().is_empty());

    let bodies = request_bodies(&server, "getUpdates").await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[1]["offset"], 103);
    assert_eq!(bodies[1]["allowed_updates"], json!(["message"]));
}

#[tokio::test]
async fn subscribe_command_replies_through_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(sent_ok())
        .mount(&server)
        .await;

    let client = client_for(&server);
    let registry = Arc::new(
        SubscriberRegistry::load(Arc::new(MemorySubscriberStore::new()))
            .await
            .unwrap(),
    );
    let context = Arc::new(AppContext::new(
        Arc::new(Config::default()),
        Arc::clone(&registry),
        Arc::new(client),
    ));
    let dispatcher = CommandDispatcher::new(context);

    let inbound = realty_bot::telegram::InboundCommand {
        chat_id: ChatId(5),
        command: "subscribe".to_string(),
        sender_handle: Some("jdoe".to_string()),
        sender_first_name: "John".to_string(),
        sender_last_name: "Doe".to_string(),
    };
    dispatcher.handle(&inbound).await.unwrap();
    dispatcher.handle(&inbound).await.unwrap();

    assert!(registry.exists(ChatId(5)).await);
    let bodies = request_bodies(&server, "sendMessage").await;
    assert_eq!(bodies.len(), 2);
    assert_ne!(bodies[0]["text"], bodies[1]["text"]);
    assert!(bodies.iter().all(|b| b["chat_id"] == 5));
}

struct FixedSource(Vec<Listing>);

#[async_trait::async_trait]
impl ListingSource for FixedSource {
    async fn fetch_listings(&self) -> realty_bot::error::Result<Vec<Listing>> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn new_listing_is_sent_to_every_subscriber() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({ "chat_id": 2 })))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "ok": false,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(sent_ok())
        .mount(&server)
        .await;

    let registry = Arc::new(
        SubscriberRegistry::load(Arc::new(MemorySubscriberStore::new()))
            .await
            .unwrap(),
    );
    for id in 1..=3 {
        registry
            .add(Subscriber::new(ChatId(id), format!("User {id}"), None))
            .await
            .unwrap();
    }
    let context = Arc::new(AppContext::new(
        Arc::new(Config::default()),
        registry,
        Arc::new(client_for(&server)),
    ));

    let known = Listing::new("Old flat", 700, "https://example.com/ad/1", None, "Limassol");
    let fresh = Listing::new("New <flat>", 900, "https://example.com/ad/2", None, "Limassol");
    let store = Arc::new(MemoryListingStore::with_listings(vec![known.clone()]));
    let notifier = NotificationLoop::new(
        context,
        Arc::new(FixedSource(vec![fresh, known])),
        ChangeDetector::new(store),
        PollSchedule::new(&ScheduleConfig::default()),
    );

    notifier.run_cycle().await;

    let bodies = request_bodies(&server, "sendMessage").await;
    let chats: Vec<i64> = bodies.iter().map(|b| b["chat_id"].as_i64().unwrap()).collect();
    assert_eq!(chats, vec![1, 2, 3]);
    for body in &bodies {
        assert_eq!(body["disable_web_page_preview"], false);
        let text = body["text"].as_str().unwrap();
        assert!(text.contains("New &lt;flat&gt;"), "{text}");
        assert!(text.contains("https://example.com/ad/2"));
    }
}
