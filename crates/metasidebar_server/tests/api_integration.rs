//! Integration tests for the metadata HTTP API.

mod support;

use axum::http::StatusCode;
use serde_json::{json, Value};
use support::{setup_test_server, test_config, test_server_for};

const WRITABLE: &str = "/api/files/1001";
const READ_ONLY: &str = "/api/files/1002";

fn template_keys(body: &Value) -> Vec<String> {
    body["templates"]
        .as_array()
        .expect("templates array")
        .iter()
        .map(|template| template["template_key"].as_str().expect("key").to_string())
        .collect()
}

#[tokio::test]
async fn file_lookup_and_unknown_file() {
    let (server, _api) = setup_test_server();

    let response = server.get(WRITABLE).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let file: Value = response.json();
    assert_eq!(file["name"], "master-services-agreement.pdf");
    assert_eq!(file["permissions"]["can_upload"], true);

    let missing = server.get("/api/files/nope").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    let body: Value = missing.json();
    assert!(body["error"].as_str().expect("error").contains("nope"));
}

#[tokio::test]
async fn templates_route_hides_hidden_templates() {
    let (server, _api) = setup_test_server();
    let response = server.get("/api/templates").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let templates: Vec<Value> = response.json();
    let keys: Vec<&str> = templates
        .iter()
        .filter_map(|template| template["template_key"].as_str())
        .collect();
    assert_eq!(keys, vec!["properties", "contract"]);
}

#[tokio::test]
async fn list_metadata_honors_properties_flag() {
    let (server, _api) = setup_test_server();

    let response = server.get(&format!("{}/metadata", WRITABLE)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(template_keys(&body), vec!["properties", "contract"]);
    assert_eq!(body["editors"][0]["instance"]["id"], "contract-1001");
    assert_eq!(body["editors"][0]["instance"]["data"]["client"], "Acme Corp");

    let without = server
        .get(&format!("{}/metadata", WRITABLE))
        .add_query_param("include_properties", false)
        .await;
    assert_eq!(template_keys(&without.json()), vec!["contract"]);
}

#[tokio::test]
async fn properties_default_follows_server_config() {
    let api = metasidebar_server::MemoryMetadataApi::from_seed(
        metasidebar_server::memory::SeedData::demo(),
    );
    let mut config = test_config();
    config.include_properties = false;
    let server = test_server_for(config, api);

    let response = server.get(&format!("{}/metadata", WRITABLE)).await;
    assert_eq!(template_keys(&response.json()), vec!["contract"]);
}

#[tokio::test]
async fn metadata_lifecycle() {
    let (server, _api) = setup_test_server();

    let created = server
        .post(&format!("{}/metadata", WRITABLE))
        .json(&json!({ "scope": "global", "template_key": "properties" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let editor: Value = created.json();
    let editor_id = editor["instance"]["id"].as_str().expect("id").to_string();
    assert_eq!(editor["is_dirty"], false);

    let updated = server
        .patch(&format!("{}/metadata/global/properties", WRITABLE))
        .json(&json!([{ "op": "add", "path": "/color", "value": "blue" }]))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    let editor: Value = updated.json();
    assert_eq!(editor["instance"]["id"], editor_id.as_str());
    assert_eq!(editor["instance"]["data"]["color"], "blue");

    let deleted = server
        .delete(&format!("{}/metadata/global/properties", WRITABLE))
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let listed: Value = server.get(&format!("{}/metadata", WRITABLE)).await.json();
    let ids: Vec<&str> = listed["editors"]
        .as_array()
        .expect("editors")
        .iter()
        .filter_map(|editor| editor["instance"]["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["contract-1001"]);

    let again = server
        .delete(&format!("{}/metadata/global/properties", WRITABLE))
        .await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_duplicates_hidden_and_unknown_templates() {
    let (server, _api) = setup_test_server();
    let url = format!("{}/metadata", WRITABLE);

    let duplicate = server
        .post(&url)
        .json(&json!({ "scope": "enterprise", "template_key": "contract" }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let hidden = server
        .post(&url)
        .json(&json!({ "scope": "enterprise", "template_key": "audit" }))
        .await;
    assert_eq!(hidden.status_code(), StatusCode::BAD_REQUEST);

    let unknown = server
        .post(&url)
        .json(&json!({ "scope": "enterprise", "template_key": "invoice" }))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn read_only_file_rejects_mutations() {
    let (server, _api) = setup_test_server();

    let create = server
        .post(&format!("{}/metadata", READ_ONLY))
        .json(&json!({ "scope": "global", "template_key": "properties" }))
        .await;
    assert_eq!(create.status_code(), StatusCode::FORBIDDEN);

    let listed = server.get(&format!("{}/metadata", READ_ONLY)).await;
    assert_eq!(listed.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn failed_patch_is_atomic() {
    let (server, api) = setup_test_server();
    let url = format!("{}/metadata/enterprise/contract", WRITABLE);

    let response = server
        .patch(&url)
        .json(&json!([
            { "op": "replace", "path": "/client", "value": "Globex" },
            { "op": "test", "path": "/status", "value": "active" }
        ]))
        .await;
    assert_eq!(response.status_code(), StatusCode::PRECONDITION_FAILED);

    let file = api.file("1001").expect("file");
    let listed = metasidebar_core::MetadataApi::get_editors(
        &api,
        &file,
        &metasidebar_core::models::ListOptions::default(),
    )
    .expect("list");
    assert_eq!(listed.editors[0].instance.data["client"], "Acme Corp");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let (server, _api) = setup_test_server();
    let response = server.get("/api/templates").await;
    response.assert_header("x-content-type-options", "nosniff");
    response.assert_header("x-frame-options", "DENY");
}
