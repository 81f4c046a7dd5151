use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, ServerSettings, ENVELOPE_KEY};
use serde_json::Value;
use tower::ServiceExt;

const AUTH: &str = "u=admin&p=enc%3A70617373&v=1.6.0&c=test&f=json";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(body.to_string())
        .unwrap()
}

// --- ping ---

#[tokio::test]
async fn ping_over_post_form() {
    let resp = app()
        .oneshot(form_request("/rest/ping", AUTH))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body[ENVELOPE_KEY]["status"], "ok");
    assert_eq!(body[ENVELOPE_KEY]["version"], "1.6.0");
}

#[tokio::test]
async fn ping_over_get_query() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri(format!("/rest/ping?{AUTH}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body[ENVELOPE_KEY]["status"], "ok");
}

#[tokio::test]
async fn configured_version_is_reported() {
    let settings = ServerSettings {
        version: "1.3.0".to_string(),
        ..ServerSettings::default()
    };
    let resp = app_with(settings)
        .oneshot(form_request("/rest/ping", AUTH))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body[ENVELOPE_KEY]["version"], "1.3.0");
}

// --- auth ---

#[tokio::test]
async fn wrong_credentials_fail_with_code_40() {
    let resp = app()
        .oneshot(form_request(
            "/rest/ping",
            "u=admin&p=enc%3A6e6f7065&v=1.6.0&c=test&f=json",
        ))
        .await
        .unwrap();

    // Protocol failures still travel over HTTP 200.
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body[ENVELOPE_KEY]["status"], "failed");
    assert_eq!(body[ENVELOPE_KEY]["error"]["code"], 40);
}

#[tokio::test]
async fn missing_credentials_fail_with_code_10() {
    let resp = app()
        .oneshot(form_request("/rest/ping", "v=1.6.0&c=test&f=json"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body[ENVELOPE_KEY]["error"]["code"], 10);
}

// --- methods ---

#[tokio::test]
async fn music_folders_are_listed() {
    let resp = app()
        .oneshot(form_request("/rest/getMusicFolders", AUTH))
        .await
        .unwrap();

    let body = body_json(resp).await;
    let folders = body[ENVELOPE_KEY]["musicFolders"]["musicFolder"]
        .as_array()
        .unwrap();
    assert_eq!(folders.len(), 2);
    assert_eq!(folders[0]["name"], "Music");
}

#[tokio::test]
async fn now_playing_lists_entry_with_user() {
    let resp = app()
        .oneshot(form_request("/rest/getNowPlaying", AUTH))
        .await
        .unwrap();

    let body = body_json(resp).await;
    let entry = &body[ENVELOPE_KEY]["nowPlaying"]["entry"][0];
    assert_eq!(entry["title"], "Dancing Queen");
    assert_eq!(entry["username"], "admin");
}

#[tokio::test]
async fn search2_requires_query() {
    let resp = app()
        .oneshot(form_request("/rest/search2", AUTH))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body[ENVELOPE_KEY]["error"]["code"], 10);
}

#[tokio::test]
async fn search2_finds_song_by_title() {
    let resp = app()
        .oneshot(form_request(
            "/rest/search2",
            &format!("{AUTH}&query=money&songCount=5"),
        ))
        .await
        .unwrap();

    let body = body_json(resp).await;
    let result = &body[ENVELOPE_KEY]["searchResult2"];
    assert_eq!(result["song"][0]["title"], "Money, Money, Money");
    assert!(result["artist"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_method_fails_with_code_70() {
    let resp = app()
        .oneshot(form_request("/rest/getPodcasts", AUTH))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body[ENVELOPE_KEY]["error"]["code"], 70);
}

#[tokio::test]
async fn post_without_form_content_type_is_rejected() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/rest/ping")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(String::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}
