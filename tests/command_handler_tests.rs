mod common;

use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{mount_document, mount_update, put_requests, store, written_document};
use wg_license_bot::commands::CommandHandler;

const ADMIN: u64 = 1_459_150_994;
const STRANGER: u64 = 42;

fn handler(server: &MockServer) -> CommandHandler {
    CommandHandler::new(ADMIN, store(server))
}

async fn assert_no_requests(server: &MockServer) {
    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "unexpected requests: {}", requests.len());
}

#[tokio::test]
async fn non_command_text_is_ignored() {
    let server = MockServer::start().await;
    let handler = handler(&server);

    assert!(handler.try_handle(ADMIN, "hello there").await.is_none());
    assert!(handler.try_handle(ADMIN, "/unknown").await.is_none());
    assert_no_requests(&server).await;
}

#[tokio::test]
async fn commands_for_other_bots_are_ignored() {
    let server = MockServer::start().await;
    let handler = handler(&server).with_bot_username(Some("wg_license_bot".to_owned()));

    assert!(handler.try_handle(ADMIN, "/ban@some_other_bot WG-AAAA-AAAA-AAAA").await.is_none());
    assert!(handler.try_handle(ADMIN, "/gen@some_other_bot HW 1").await.is_none());
    assert_no_requests(&server).await;

    let result = handler.try_handle(STRANGER, "/start@wg_license_bot").await.unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn start_is_open_to_everyone() {
    let server = MockServer::start().await;

    let result = handler(&server).try_handle(STRANGER, "/start").await.unwrap();

    assert!(result.success);
    assert!(result.message.starts_with("WG License Bot is ready!"), "{}", result.message);
    assert!(result.message.contains("/gen &lt;HWID&gt; &lt;allowed_devices&gt; [days]"));
    assert!(result.message.contains("/ban &lt;KEY&gt;"));
    assert!(result.message.contains("/unban &lt;KEY&gt;"));
    assert_no_requests(&server).await;
}

#[tokio::test]
async fn stranger_cannot_mutate() {
    let server = MockServer::start().await;
    let handler = handler(&server);

    for text in ["/gen HW 1", "/ban WG-AAAA-AAAA-AAAA", "/unban WG-AAAA-AAAA-AAAA", "/gen"] {
        let result = handler.try_handle(STRANGER, text).await.unwrap();
        assert!(!result.success, "{text}");
        assert_eq!(result.message, "⚠️ You are not an administrator.");
    }

    assert_no_requests(&server).await;
}

#[tokio::test]
async fn bad_arguments_reply_with_usage() {
    let server = MockServer::start().await;
    let handler = handler(&server);

    let cases = [
        ("/gen", "Format: /gen &lt;HWID&gt; &lt;allowed_devices&gt; [days]"),
        ("/gen HW many", "allowed_devices must be a positive integer"),
        ("/gen HW 0", "allowed_devices must be a positive integer"),
        ("/gen HW 2 forever", "days must be a non-negative integer"),
        ("/ban", "Format: /ban &lt;KEY&gt;"),
        ("/unban", "Format: /unban &lt;KEY&gt;"),
    ];

    for (text, expected) in cases {
        let result = handler.try_handle(ADMIN, text).await.unwrap();
        assert!(!result.success, "{text}");
        assert!(result.message.contains(expected), "{text}: {}", result.message);
    }

    assert_no_requests(&server).await;
}

#[tokio::test]
async fn gen_replies_with_new_key() {
    let server = MockServer::start().await;
    mount_document(&server, &json!({"keys": {}}), "abc").await;
    mount_update(&server, "def").await;

    let result = handler(&server).try_handle(ADMIN, "/gen aa:bb:cc 3").await.unwrap();

    assert!(result.success, "{}", result.message);
    let written = written_document(&put_requests(&server).await[0]);
    let key = written["keys"].as_object().unwrap().keys().next().unwrap().clone();

    assert!(result.message.starts_with("✅ License created!"));
    assert!(result.message.contains(&format!("Key: <code>{key}</code>")));
    assert!(result.message.contains("First HWID: <code>AA:BB:CC</code>"));
    assert!(result.message.contains("Max devices: 3"));
    assert!(result.message.contains("Expires: never"));
}

#[tokio::test]
async fn gen_with_days_reports_expiry() {
    let server = MockServer::start().await;
    mount_document(&server, &json!({"keys": {}}), "abc").await;
    mount_update(&server, "def").await;

    let result = handler(&server).try_handle(ADMIN, "/gen HW 1 30").await.unwrap();

    assert!(result.success, "{}", result.message);
    let written = written_document(&put_requests(&server).await[0]);
    let record = written["keys"].as_object().unwrap().values().next().unwrap();
    let expiry = record["expire_at"].as_str().unwrap();
    assert!(result.message.contains(&format!("Expires: {expiry}")));
}

#[tokio::test]
async fn ban_and_unban_reply() {
    let server = MockServer::start().await;
    mount_document(
        &server,
        &json!({"keys": {"WG-AAAA-AAAA-AAAA": {"allowed_devices": 1, "devices": ["A"], "banned": false}}}),
        "abc",
    )
    .await;
    mount_update(&server, "def").await;
    let handler = handler(&server);

    let banned = handler.try_handle(ADMIN, "/ban WG-AAAA-AAAA-AAAA").await.unwrap();
    assert!(banned.success);
    assert_eq!(banned.message, "🚫 Key <code>WG-AAAA-AAAA-AAAA</code> banned.");

    let unbanned = handler.try_handle(ADMIN, "/unban WG-AAAA-AAAA-AAAA").await.unwrap();
    assert!(unbanned.success);
    assert_eq!(unbanned.message, "✅ Key <code>WG-AAAA-AAAA-AAAA</code> unbanned.");

    assert_eq!(put_requests(&server).await.len(), 2);
}

#[tokio::test]
async fn ban_unknown_key_replies_not_found() {
    let server = MockServer::start().await;
    mount_document(&server, &json!({"keys": {}}), "abc").await;

    let result = handler(&server)
        .try_handle(ADMIN, "/ban WG-0000-0000-0000")
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.message, "❌ Key <code>WG-0000-0000-0000</code> not found!");
    assert!(put_requests(&server).await.is_empty());
}

#[tokio::test]
async fn store_failures_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = handler(&server).try_handle(ADMIN, "/gen HW 1").await.unwrap();

    assert!(!result.success);
    assert!(result.message.starts_with("❌ Could not reach the license store"), "{}", result.message);
}

#[tokio::test]
async fn conflict_asks_admin_to_retry() {
    let server = MockServer::start().await;
    mount_document(&server, &json!({"keys": {}}), "abc").await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "conflict"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = handler(&server).try_handle(ADMIN, "/gen HW 1").await.unwrap();

    assert!(!result.success);
    assert!(result.message.contains("send the command again"), "{}", result.message);
}
