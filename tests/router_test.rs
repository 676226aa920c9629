mod common;

use axum::http::StatusCode;
use common::{get_json, setup_seeded_db, setup_test_app};
use serde_json::Value;

fn ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|cat| cat["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_list_over_http() {
    let db = setup_seeded_db().await.expect("Failed to setup test database");
    let app = setup_test_app(db);

    let (status, body) = get_json(&app, "/cats?limit=2&page=2&sortBy=created_at:DESC&sortBy=color:ASC").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![2, 1]);

    let meta = &body["meta"];
    assert_eq!(meta["itemsPerPage"], 2);
    assert_eq!(meta["totalItems"], 5);
    assert_eq!(meta["currentPage"], 2);
    assert_eq!(meta["totalPages"], 3);
    assert_eq!(meta["sortBy"], serde_json::json!([["created_at", "DESC"], ["color", "ASC"]]));
    assert!(meta.get("search").is_none());
    assert!(meta.get("filter").is_none());

    let links = &body["links"];
    let current = links["current"].as_str().unwrap();
    assert_eq!(
        current,
        "http://localhost/cats?page=2&limit=2&sortBy=created_at:DESC&sortBy=color:ASC"
    );
    for name in ["first", "previous", "next", "last"] {
        let link = links[name].as_str().unwrap_or_else(|| panic!("missing {name} link"));
        assert_ne!(link, current);
    }
}

#[tokio::test]
async fn test_links_reproduce_the_request() {
    let db = setup_seeded_db().await.unwrap();
    let app = setup_test_app(db);

    let uri = "/cats?limit=1&page=2&sortBy=name:DESC&search=i&searchBy=name\
               &filter.age=%24gte%3A4&filter.toys.name=%24not%3A%24null";
    let (status, body) = get_json(&app, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["totalItems"], 2);
    assert_eq!(body["meta"]["totalPages"], 2);
    assert_eq!(ids(&body), vec![2]);

    let current = body["links"]["current"].as_str().unwrap();
    let relative = current.strip_prefix("http://localhost").unwrap();
    let (status, again) = get_json(&app, relative).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["data"], body["data"]);
    assert_eq!(again["links"]["current"], body["links"]["current"]);
    assert_eq!(again["meta"], body["meta"]);
}

#[tokio::test]
async fn test_filter_over_http() {
    let db = setup_seeded_db().await.unwrap();
    let app = setup_test_app(db);

    let filter = url_escape::encode_component("$in:white,black");
    let (status, body) = get_json(&app, &format!("/cats?filter.color={filter}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![3, 4, 5]);
    assert_eq!(body["meta"]["filter"]["color"], serde_json::json!(["$in:white,black"]));
    assert!(
        body["links"]["current"]
            .as_str()
            .unwrap()
            .ends_with("&filter.color=$in:white,black")
    );
}

#[tokio::test]
async fn test_malformed_parameters_fall_back() {
    let db = setup_seeded_db().await.unwrap();
    let app = setup_test_app(db);

    let (status, body) = get_json(&app, "/cats?page=abc&limit=-3&sortBy=color:SIDEWAYS").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["currentPage"], 1);
    assert_eq!(body["meta"]["itemsPerPage"], 20);
    assert_eq!(body["meta"]["sortBy"], serde_json::json!([["id", "ASC"]]));
    assert_eq!(ids(&body), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_misconfigured_endpoint_is_unavailable() {
    let db = setup_seeded_db().await.unwrap();
    let app = setup_test_app(db);

    let (status, body) = get_json(&app, "/broken").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "No sortable columns configured");
}
