//! Mock GitHub contents API shared by the integration tests.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use wg_license_bot::config::StoreConfig;
use wg_license_bot::license::LicenseStore;

pub const TOKEN: &str = "test-token";
pub const REPO: &str = "owner/wg-licenses";
pub const CONTENTS_PATH: &str = "/repos/owner/wg-licenses/contents/licenses.json";

pub fn store_config(server: &MockServer) -> StoreConfig {
    StoreConfig::new(TOKEN.to_owned(), REPO.to_owned()).with_api_url(server.uri())
}

pub fn store(server: &MockServer) -> LicenseStore {
    LicenseStore::new(&store_config(server)).unwrap()
}

/// Encodes content the way GitHub returns it: base64 wrapped at 60 columns.
pub fn encode_wrapped(bytes: &[u8]) -> String {
    let encoded = BASE64.encode(bytes);
    encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

pub fn contents_response(document: &Value, sha: &str) -> ResponseTemplate {
    let raw = serde_json::to_vec(document).unwrap();
    ResponseTemplate::new(200).set_body_json(json!({
        "type": "file",
        "encoding": "base64",
        "path": "licenses.json",
        "content": encode_wrapped(&raw),
        "sha": sha,
    }))
}

pub fn update_response(new_sha: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "content": { "path": "licenses.json", "sha": new_sha },
        "commit": { "sha": "0000000000000000000000000000000000000000" }
    }))
}

pub async fn mount_document(server: &MockServer, document: &Value, sha: &str) {
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(contents_response(document, sha))
        .mount(server)
        .await;
}

pub async fn mount_update(server: &MockServer, new_sha: &str) {
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(update_response(new_sha))
        .mount(server)
        .await;
}

/// All PUT requests the server has received.
pub async fn put_requests(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.as_str() == "PUT")
        .collect()
}

/// Decodes the document carried by a PUT request.
pub fn written_content(request: &Request) -> String {
    let body: Value = request.body_json().unwrap();
    let encoded = body["content"].as_str().unwrap();
    String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap()
}

pub fn written_document(request: &Request) -> Value {
    serde_json::from_str(&written_content(request)).unwrap()
}

pub fn written_message(request: &Request) -> String {
    let body: Value = request.body_json().unwrap();
    body["message"].as_str().unwrap().to_owned()
}
