//! End-to-end CRUD scenarios over the five-object fixture
//!
//! Each test drives a single-verb controller through [`RestService`] and checks
//! the encoded body, the same way a serving runtime would see it.

mod common;

use common::fixtures::{
    delete_only, get_only, json_request, post_only, put_only, service, TestStore,
};
use std::sync::Arc;

use http::{Method, StatusCode};
use restful_dispatch::server::{RestRequest, RestResponse};
use serde_json::{json, Value};

fn json_body(res: &RestResponse) -> Value {
    assert_eq!(res.content_type(), Some("application/json"));
    serde_json::from_slice(&res.body).unwrap()
}

#[test]
fn test_get_collection() {
    let svc = service(get_only(TestStore::seeded()));
    let res = svc
        .handle(&RestRequest::from_path(Method::GET, "/").with_header("Accept", "application/json"))
        .unwrap();
    assert_eq!(res.status, StatusCode::OK);

    let body = json_body(&res);
    assert_eq!(body["totalSize"], json!(5));
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0]["ID"], json!(1));
    assert_eq!(items[0]["Title"], json!("Object 1"));
    assert_eq!(items[4]["Subtitle"], json!("Subtitle 5"));
}

#[test]
fn test_get_single_by_extension() {
    let svc = service(get_only(TestStore::seeded()));
    let res = svc
        .handle(&RestRequest::from_path(Method::GET, "/2.json"))
        .unwrap();
    assert_eq!(
        json_body(&res),
        json!({"ID": 2, "Title": "Object 2", "Subtitle": "Subtitle 2"})
    );
}

#[test]
fn test_get_missing_id_is_empty() {
    let svc = service(get_only(TestStore::seeded()));
    let res = svc
        .handle(&RestRequest::from_path(Method::GET, "/99"))
        .unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.is_empty());
}

#[test]
fn test_post_creates_object() {
    let store = TestStore::seeded();
    let svc = service(post_only(Arc::clone(&store)));
    let res = svc
        .handle(&json_request(
            Method::POST,
            "/",
            r#"{"Title":"New Object","Subtitle":"New Subtitle"}"#,
        ))
        .unwrap();
    assert_eq!(res.status, StatusCode::OK);

    let body = json_body(&res);
    assert_eq!(body["ID"], json!(6));
    assert_eq!(body["Title"], json!("New Object"));
    assert_eq!(body["Subtitle"], json!("New Subtitle"));
    assert_eq!(store.ids(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_post_yaml_body_answers_in_json_by_accept() {
    let store = TestStore::seeded();
    let svc = service(post_only(store));
    let req = RestRequest::from_path(Method::POST, "/")
        .with_header("Content-Type", "application/x-yaml")
        .with_header("Accept", "application/json")
        .with_body("Title: From YAML\nSubtitle: Sub\n");
    let body = json_body(&svc.handle(&req).unwrap());
    assert_eq!(body["Title"], json!("From YAML"));
}

#[test]
fn test_post_malformed_body_is_format_error() {
    let svc = service(post_only(TestStore::seeded()));
    let err = svc
        .handle(&json_request(Method::POST, "/", "{not json"))
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_put_updates_title() {
    let store = TestStore::seeded();
    let svc = service(put_only(Arc::clone(&store)));
    let res = svc
        .handle(&json_request(Method::PUT, "/5", r#"{"Title":"Change 1"}"#))
        .unwrap();

    let body = json_body(&res);
    assert_eq!(body["ID"], json!(5));
    assert_eq!(body["Title"], json!("Change 1"));
    assert_eq!(body["Subtitle"], json!("Subtitle 5"));
}

#[test]
fn test_put_cannot_change_id() {
    let store = TestStore::seeded();
    let svc = service(put_only(Arc::clone(&store)));
    let res = svc
        .handle(&json_request(Method::PUT, "/5", r#"{"ID":1,"Title":"Moved"}"#))
        .unwrap();
    assert_eq!(json_body(&res)["ID"], json!(5));
    assert_eq!(store.ids(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_delete_removes_object() {
    let store = TestStore::seeded();
    let svc = service(delete_only(Arc::clone(&store)));
    let res = svc
        .handle(&RestRequest::from_path(Method::DELETE, "/3"))
        .unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.is_empty());
    assert_eq!(store.ids(), vec![1, 2, 4, 5]);

    let listing = service(get_only(store))
        .handle(&RestRequest::from_path(Method::GET, "/"))
        .unwrap();
    let body = json_body(&listing);
    assert_eq!(body["totalSize"], json!(4));
    assert!(body["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|item| item["ID"] != json!(3)));
}
