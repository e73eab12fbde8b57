use std::num::NonZeroU32;
use std::time::Duration;

use httpmock::MockServer;
use serde_json::json;
use url::Url;

use blockpress::application::source::{ContentSource, EntryQuery, SourceError};
use blockpress::config::{NotionCredentials, NotionSettings, PropertySettings};
use blockpress::infra::notion::NotionClient;

fn client(server: &MockServer) -> NotionClient {
    let settings = NotionSettings {
        token: None,
        database_id: None,
        api_base_url: Url::parse(&server.base_url()).expect("url"),
        version: "2022-06-28".to_string(),
        timeout: Duration::from_secs(5),
        block_page_size: NonZeroU32::new(100).expect("non-zero"),
    };
    NotionClient::new(
        &settings,
        NotionCredentials {
            token: "secret-token".to_string(),
            database_id: "db123".to_string(),
        },
        PropertySettings::default(),
    )
    .expect("client")
}

#[tokio::test]
async fn query_posts_filter_with_auth_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("POST")
                .path("/v1/databases/db123/query")
                .header("authorization", "Bearer secret-token")
                .header("notion-version", "2022-06-28")
                .json_body(json!({
                    "filter": { "and": [
                        { "property": "Slug", "rich_text": { "equals": "hello" } },
                        { "property": "Published", "checkbox": { "equals": true } }
                    ] },
                    "sorts": [{ "timestamp": "created_time", "direction": "ascending" }]
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "object": "list",
                    "results": [{ "object": "page", "id": "page-1" }],
                    "has_more": false
                }));
        })
        .await;

    let results = client(&server)
        .query_entries(&EntryQuery::published_with_slug("hello"))
        .await
        .expect("query");

    mock.assert_async().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "page-1");
}

#[tokio::test]
async fn block_listing_requests_one_page() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/v1/blocks/page-1/children")
                .query_param("page_size", "100");
            then.status(200).json_body(json!({
                "object": "list",
                "results": [
                    { "object": "block", "id": "b1", "type": "divider", "divider": {} }
                ],
                "has_more": true,
                "next_cursor": "cursor-2"
            }));
        })
        .await;

    let page = client(&server)
        .list_blocks("page-1", 100)
        .await
        .expect("blocks");

    mock.assert_async().await;
    assert_eq!(page.blocks.len(), 1);
    assert!(page.has_more);
}

#[tokio::test]
async fn error_status_carries_notion_message_and_is_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("POST").path("/v1/databases/db123/query");
            then.status(401).json_body(json!({
                "object": "error",
                "status": 401,
                "code": "unauthorized",
                "message": "API token is invalid."
            }));
        })
        .await;

    let err = client(&server)
        .query_entries(&EntryQuery::published())
        .await
        .expect_err("unauthorised");

    mock.assert_async().await;
    assert_eq!(
        err,
        SourceError::Status {
            status: 401,
            message: "API token is invalid.".to_string(),
        }
    );
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/v1/blocks/page-1/children");
            then.status(200).body("not json");
        })
        .await;

    let err = client(&server)
        .list_blocks("page-1", 10)
        .await
        .expect_err("decode failure");
    assert!(matches!(err, SourceError::Decode(_)));
}
