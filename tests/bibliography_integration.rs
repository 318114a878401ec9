//! End-to-end tests: mock Zotero library -> collection forest -> HTML document.

use std::path::Path;

use bibgen_core::{
    BibgenError, Config, ConfigOverrides, LibraryType, RetryPolicy, Session, get_bibliography,
    get_collections, get_last_modified_version,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;
use support::{DEPENDENT_CSL, bibtex_page, install_style};

const STYLE: &str = "author-title";

fn collection_json(key: &str, name: &str, parent: Option<&str>, collections: u32, items: u32) -> Value {
    json!({
        "key": key,
        "meta": {"numCollections": collections, "numItems": items},
        "data": {
            "name": name,
            "parentCollection": parent.map_or(json!(false), |p| json!(p)),
        }
    })
}

fn listing(collections: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Total-Results", collections.len().to_string())
        .set_body_json(Value::Array(collections))
}

async fn mount_items(server: &MockServer, key: &str, start: u32, limit: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/users/7/collections/{key}/items")))
        .and(query_param("format", "bibtex"))
        .and(query_param("start", start.to_string()))
        .and(query_param("limit", limit.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(bibtex_page(key, start, limit)))
        .expect(1)
        .mount(server)
        .await;
}

/// One root ("01 Sources") with two leaves: "2 Letters" (5 items) and
/// "10 Charters" (150 items).
async fn mount_library(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/7/collections/top"))
        .respond_with(listing(vec![collection_json("ROOT0000", "01 Sources", None, 2, 0)]))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/7/collections/ROOT0000/collections"))
        .respond_with(listing(vec![
            collection_json("SMALL000", "2 Letters", Some("ROOT0000"), 0, 5),
            collection_json("LARGE000", "10 Charters", Some("ROOT0000"), 0, 150),
        ]))
        .mount(server)
        .await;
    mount_items(server, "SMALL000", 0, 5).await;
    mount_items(server, "LARGE000", 0, 100).await;
    mount_items(server, "LARGE000", 100, 50).await;
}

fn config(server: &MockServer, styles_dir: &Path, top_collection: Option<&str>) -> Config {
    Config::from_overrides(ConfigOverrides {
        library_id: Some(7),
        library_type: Some(LibraryType::User),
        citation_style: Some(STYLE.into()),
        styles_dir: Some(styles_dir.to_path_buf()),
        remote_styles_url: Some(format!("{}/styles", server.uri())),
        top_collection: top_collection.map(str::to_string),
        ..ConfigOverrides::default()
    })
    .unwrap()
}

fn session(config: &Config, server: &MockServer) -> Session {
    Session::new(config)
        .with_base_url(server.uri())
        .with_retry_policy(RetryPolicy::no_retry())
}

#[tokio::test]
async fn test_forest_from_mock_library() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_library(&mock_server).await;
    let styles_dir = TempDir::new().unwrap();
    install_style(styles_dir.path(), STYLE);

    let config = config(&mock_server, styles_dir.path(), None);
    let session = session(&config, &mock_server);
    let forest = get_collections(&config, &session).await.unwrap();

    assert_eq!(forest.len(), 1);
    let root = &forest[0];
    assert_eq!(root.name, "Sources");
    assert_eq!(root.key, "ROOT0000");
    assert_eq!(root.header_level, 2);
    assert!(root.bibitems.is_empty());

    let names: Vec<&str> = root.subcollections.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Charters", "Letters"]);
    assert_eq!(root.subcollections[0].bibitems.len(), 150);
    assert_eq!(root.subcollections[1].bibitems.len(), 5);
    assert_eq!(root.item_count(), 155);

    let charters = &root.subcollections[0];
    assert_eq!(charters.header_level, 3);
    assert_eq!(charters.bibitems[0].key, "LARGE000_0");
    assert_eq!(charters.bibitems[149].key, "LARGE000_149");
    let citation = charters.bibitems[100].rendered.as_deref().unwrap();
    assert!(citation.contains("Volume 100"), "{citation}");
}

#[tokio::test]
async fn test_top_collection_roots_are_its_direct_children() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_library(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/users/7/collections/ROOT0000"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(collection_json("ROOT0000", "01 Sources", None, 2, 0)),
        )
        .mount(&mock_server)
        .await;
    let styles_dir = TempDir::new().unwrap();
    install_style(styles_dir.path(), STYLE);

    let config = config(&mock_server, styles_dir.path(), Some("ROOT0000"));
    let session = session(&config, &mock_server);
    let forest = get_collections(&config, &session).await.unwrap();

    let roots: Vec<(&str, u32)> = forest
        .iter()
        .map(|node| (node.name.as_str(), node.header_level))
        .collect();
    assert_eq!(roots, [("Charters", 2), ("Letters", 2)]);
}

#[tokio::test]
async fn test_bibliography_document_contains_sections_and_citations() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_library(&mock_server).await;
    let styles_dir = TempDir::new().unwrap();
    install_style(styles_dir.path(), STYLE);

    let config = config(&mock_server, styles_dir.path(), None);
    let session = session(&config, &mock_server);
    let html = get_bibliography(&config, &session, None).await.unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<h2>Sources</h2>"));
    assert!(html.contains("<h3>Charters</h3>"));
    assert!(html.contains("<h3>Letters</h3>"));
    assert!(html.contains("id=\"SMALL000_4\""));
    assert!(html.find("<h3>Charters</h3>") < html.find("<h3>Letters</h3>"));
}

#[tokio::test]
async fn test_dependent_style_renders_with_fallback_style() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_library(&mock_server).await;
    let styles_dir = TempDir::new().unwrap();
    std::fs::write(styles_dir.path().join(format!("{STYLE}.csl")), DEPENDENT_CSL).unwrap();
    install_style(styles_dir.path(), "harvard1");

    let config = config(&mock_server, styles_dir.path(), None);
    let session = session(&config, &mock_server);
    let forest = get_collections(&config, &session).await.unwrap();

    let letters = &forest[0].subcollections[1];
    assert_eq!(letters.bibitems.len(), 5);
    assert!(letters.bibitems.iter().all(|item| item.is_rendered()));
}

#[tokio::test]
async fn test_item_page_failure_aborts_with_fetch_error() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/users/7/collections/top"))
        .respond_with(listing(vec![collection_json("LEAF0000", "Leaf", None, 0, 3)]))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/7/collections/LEAF0000/items"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    let styles_dir = TempDir::new().unwrap();
    install_style(styles_dir.path(), STYLE);

    let config = config(&mock_server, styles_dir.path(), None);
    let session = session(&config, &mock_server);
    let err = get_collections(&config, &session).await.unwrap_err();
    assert!(matches!(err, BibgenError::Tree(_)), "{err}");
    assert_eq!(err.exit_code(), 4);
    assert!(err.to_string().contains("LEAF0000"), "{err}");
}

#[tokio::test]
async fn test_last_modified_version_through_session() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/users/7/items"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified-Version", "1234")
                .set_body_json(json!([])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    let styles_dir = TempDir::new().unwrap();

    let config = config(&mock_server, styles_dir.path(), None);
    let session = session(&config, &mock_server);
    assert!(!session.is_connected());
    assert_eq!(get_last_modified_version(&session).await.unwrap(), 1234);
    assert!(session.is_connected());
}
