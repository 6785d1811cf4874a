mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{parse_body, TestApp};
use serde_json::json;
use tower::ServiceExt;

async fn upload_file(app: &TestApp, session: &common::AuthSession) -> String {
    let response = app.upload(session, "meeting.wav", b"bytes").await;
    assert_eq!(response.status(), StatusCode::OK);
    parse_body(response).await["filename"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_note_roundtrip() {
    let app = TestApp::new().await;
    let session = app.register_and_login("a@x.com", "pw123").await;
    let filename = upload_file(&app, &session).await;

    let response = app
        .post_json(&session, &format!("/api/transcript/{filename}/note"), json!({"note": "follow up on budget"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get_authed(&session, &format!("/api/transcript/{filename}/note")).await;
    assert_eq!(parse_body(response).await["note"], "follow up on budget");
}

#[tokio::test]
async fn test_missing_note_is_empty_string() {
    let app = TestApp::new().await;
    let session = app.register_and_login("a@x.com", "pw123").await;
    let filename = upload_file(&app, &session).await;

    let response = app.get_authed(&session, &format!("/api/transcript/{filename}/note")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_body(response).await["note"], "");
}

#[tokio::test]
async fn test_note_of_other_user_is_forbidden() {
    let app = TestApp::new().await;
    let alice = app.register_and_login("alice@x.com", "pw123").await;
    let bob = app.register_and_login("bob@x.com", "pw123").await;
    let filename = upload_file(&app, &alice).await;

    app.post_json(&alice, &format!("/api/transcript/{filename}/note"), json!({"note": "private"})).await;

    let response = app.get_authed(&bob, &format!("/api/transcript/{filename}/note")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tag_roundtrip_and_ownership() {
    let app = TestApp::new().await;
    let alice = app.register_and_login("alice@x.com", "pw123").await;
    let bob = app.register_and_login("bob@x.com", "pw123").await;
    let filename = upload_file(&app, &alice).await;

    let response = app
        .post_json(&alice, &format!("/api/transcript/{filename}/tag"), json!({"tag": "planning"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get_authed(&alice, &format!("/api/transcript/{filename}/tag")).await;
    assert_eq!(parse_body(response).await["tag"], "planning");

    let response = app.get_authed(&bob, &format!("/api/transcript/{filename}/tag")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_quiz_lifecycle() {
    let app = TestApp::new().await;
    let session = app.register_and_login("a@x.com", "pw123").await;
    let filename = upload_file(&app, &session).await;

    // Absent quiz file reads as empty.
    let response = app.get_authed(&session, &format!("/api/quiz/{filename}")).await;
    assert!(parse_body(response).await["quiz"].as_array().unwrap().is_empty());

    // Generate appends an entry.
    let payload = json!({
        "segment_text": "Hello world.",
        "filename": filename,
        "timestamp": 0.0,
    });
    let response = app.post_json(&session, "/api/quiz/generate", payload).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        parse_body(response).await["question"],
        "What topic is covered in this segment?"
    );

    let response = app.get_authed(&session, &format!("/api/quiz/{filename}")).await;
    let body = parse_body(response).await;
    let quiz = body["quiz"].as_array().unwrap();
    assert_eq!(quiz.len(), 1);
    assert_eq!(quiz[0]["segment"], "Hello world.");

    // Edit by timestamp.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/quiz/{filename}"))
                .header(header::AUTHORIZATION, format!("Bearer {}", session.access_token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"timestamp": 0.0, "new_question": "Edited?"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get_authed(&session, &format!("/api/quiz/{filename}")).await;
    let body = parse_body(response).await;
    assert_eq!(body["quiz"][0]["question"], "Edited?");

    // Delete by timestamp.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/quiz/{filename}/0.0"))
                .header(header::AUTHORIZATION, format!("Bearer {}", session.access_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get_authed(&session, &format!("/api/quiz/{filename}")).await;
    assert!(parse_body(response).await["quiz"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_quiz_edit_unknown_timestamp_is_404() {
    let app = TestApp::new().await;
    let session = app.register_and_login("a@x.com", "pw123").await;
    let filename = upload_file(&app, &session).await;

    let payload = json!({
        "segment_text": "Hello world.",
        "filename": filename,
        "timestamp": 1.0,
    });
    app.post_json(&session, "/api/quiz/generate", payload).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/quiz/{filename}"))
                .header(header::AUTHORIZATION, format!("Bearer {}", session.access_token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"timestamp": 9.9, "new_question": "x"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/quiz/{filename}/9.9"))
                .header(header::AUTHORIZATION, format!("Bearer {}", session.access_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quiz_generate_without_filename_skips_storage() {
    let app = TestApp::new().await;
    let session = app.register_and_login("a@x.com", "pw123").await;

    let response = app
        .post_json(&session, "/api/quiz/generate", json!({"segment_text": "Hello world."}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!parse_body(response).await["question"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_suggest_improves_text() {
    let app = TestApp::new().await;
    let session = app.register_and_login("a@x.com", "pw123").await;

    let response = app.post_json(&session, "/api/suggest", json!({"text": "pls fix asap"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!parse_body(response).await["suggestion"].as_str().unwrap().is_empty());

    let response = app.post_json(&session, "/api/suggest", json!({"text": "  "})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
