//! Conformance cases for a Todo REST API.
//!
//! Runs against `URL` when it is set, otherwise against a private reference
//! server per test.

mod common;

use common::Target;
use reqwest::{Method, StatusCode};
use serde_json::json;
use todo_api::{
    models::NewTodo,
    suite::{
        expect::{self, location_regex},
        CORS_HEADERS, SAMPLE_TITLE,
    },
};

// ===========================================================================
// Cross Origin Request
// ===========================================================================

#[tokio::test]
async fn test_cors_returns_the_correct_headers() {
    let target = Target::acquire().await;
    let result = target.client.options(&target.url, "http://test.com").await;

    let response = expect::settled(&result).unwrap();
    expect::header_keys(response, &CORS_HEADERS).unwrap();
}

#[tokio::test]
async fn test_cors_allows_all_origins() {
    let target = Target::acquire().await;

    for origin in ["http://test.com", "https://another.example.org"] {
        let result = target.client.options(&target.url, origin).await;
        let response = expect::settled(&result).unwrap();
        expect::header_eq(response, "access-control-allow-origin", "*").unwrap();
    }
}

// ===========================================================================
// Create Todo item
// ===========================================================================

#[tokio::test]
async fn test_create_returns_201() {
    let target = Target::acquire().await;
    let response = target
        .client
        .post(&target.url, &NewTodo::new(SAMPLE_TITLE))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::CREATED);
    target.teardown().await;
}

#[tokio::test]
async fn test_create_returns_location_hyperlink() {
    let target = Target::acquire().await;
    let response = target
        .client
        .post(&target.url, &NewTodo::new(SAMPLE_TITLE))
        .await
        .unwrap();

    expect::header_matches(&response, "location", location_regex()).unwrap();
    target.teardown().await;
}

#[tokio::test]
async fn test_create_stores_item() {
    let target = Target::acquire().await;
    let location = target.seed(SAMPLE_TITLE).await;

    let item = target.client.get(&location).await.unwrap();
    expect::field_eq(&item, "title", SAMPLE_TITLE).unwrap();
    expect::field_eq(&item, "completed", false).unwrap();
    target.teardown().await;
}

#[tokio::test]
async fn test_created_locations_are_unique() {
    let target = Target::acquire().await;
    let first = target.seed("first").await;
    let second = target.seed("second").await;

    assert_ne!(first, second);
    target.teardown().await;
}

// ===========================================================================
// Update Todo item
// ===========================================================================

#[tokio::test]
async fn test_put_sets_completed() {
    let target = Target::acquire().await;
    let location = target.seed(SAMPLE_TITLE).await;

    let response = target
        .client
        .update(&location, Method::PUT, &json!({ "completed": true }))
        .await
        .unwrap();
    expect::field_eq(&response, "completed", true).unwrap();
    target.teardown().await;
}

#[tokio::test]
async fn test_patch_sets_completed() {
    let target = Target::acquire().await;
    let location = target.seed(SAMPLE_TITLE).await;

    let response = target
        .client
        .update(&location, Method::PATCH, &json!({ "completed": true }))
        .await
        .unwrap();
    expect::field_eq(&response, "completed", true).unwrap();
    target.teardown().await;
}

// ===========================================================================
// Delete Todo item
// ===========================================================================

#[tokio::test]
async fn test_delete_returns_204() {
    let target = Target::acquire().await;
    let location = target.seed(SAMPLE_TITLE).await;

    let response = target.client.del(&location).await.unwrap();
    expect::status(&response, StatusCode::NO_CONTENT).unwrap();
    expect::empty_body(&response).unwrap();
}

#[tokio::test]
async fn test_delete_removes_item() {
    let target = Target::acquire().await;
    let location = target.seed(SAMPLE_TITLE).await;

    target.client.del(&location).await.unwrap();
    let result = target.client.get(&location).await;
    expect::rejected_with(&result, "Not Found").unwrap();
}
