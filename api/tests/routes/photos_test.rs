use crate::helpers::{
    bearer, create_user, get_request, json_body, json_request, make_test_app, multipart_request,
};
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use db::models::user::Role;
use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;
use tower::ServiceExt;
use util::config::AppConfig;
use util::paths::ticket_photo_path;

fn use_temp_storage() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    AppConfig::set_upload_storage_root(dir.path().to_string_lossy().to_string());
    dir
}

#[tokio::test]
#[serial]
async fn photo_is_stored_served_replaced_and_removed() {
    let _storage = use_temp_storage();
    let (app, state) = make_test_app().await;
    let db = state.db();
    let client = create_user(db, "cli1", Role::Client).await;
    let tech = create_user(db, "tech1", Role::Technician).await;
    let admin = create_user(db, "boss", Role::Admin).await;

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/tickets",
            Some(&bearer(&client)),
            &json!({ "title": "Printer down", "description": "No power" }),
        ))
        .await
        .unwrap();
    let id = json_body(created).await["data"]["id"].as_i64().unwrap();

    app.clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/tickets/{id}/assign"),
            Some(&bearer(&admin)),
            &json!({ "technician_id": tech.id }),
        ))
        .await
        .unwrap();

    // No photo yet.
    let none = app
        .clone()
        .oneshot(get_request(&format!("/api/tickets/{id}/photo"), Some(&bearer(&client))))
        .await
        .unwrap();
    assert_eq!(none.status(), StatusCode::NOT_FOUND);

    let resolved = app
        .clone()
        .oneshot(multipart_request(
            &format!("/api/tickets/{id}/resolve"),
            &bearer(&tech),
            &[("work_performed", "Swapped PSU"), ("visited_at", "2026-03-04T09:30")],
            Some(("photo", "../../front panel.jpg", &b"jpeg-bytes"[..])),
        ))
        .await
        .unwrap();
    assert_eq!(resolved.status(), StatusCode::OK);
    let body = json_body(resolved).await;
    let stored = body["data"]["visit_report"]["photo_filename"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(stored, format!("{id}_front_panel.jpg"));
    assert_eq!(body["data"]["visit_report"]["visited_at"], "2026-03-04T09:30:00+00:00");
    assert!(ticket_photo_path(&stored).exists());

    let photo = app
        .clone()
        .oneshot(get_request(&format!("/api/tickets/{id}/photo"), Some(&bearer(&client))))
        .await
        .unwrap();
    assert_eq!(photo.status(), StatusCode::OK);
    assert_eq!(photo.headers()[header::CONTENT_TYPE], "image/jpeg");
    let bytes = to_bytes(photo.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"jpeg-bytes");

    // A different photo replaces the old file.
    let edited = app
        .clone()
        .oneshot(multipart_request(
            &format!("/api/tickets/{id}/resolve"),
            &bearer(&tech),
            &[("work_performed", "Swapped PSU and fan")],
            Some(("photo", "after.png", &b"png-bytes"[..])),
        ))
        .await
        .unwrap();
    assert_eq!(edited.status(), StatusCode::OK);
    let replacement = format!("{id}_after.png");
    assert_eq!(
        json_body(edited).await["data"]["visit_report"]["photo_filename"],
        replacement.as_str()
    );
    assert!(!ticket_photo_path(&stored).exists());
    assert!(ticket_photo_path(&replacement).exists());

    let deleted = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/tickets/{id}"))
                .header(header::AUTHORIZATION, bearer(&admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);
    assert!(!ticket_photo_path(&replacement).exists());

    AppConfig::reset();
}

#[tokio::test]
#[serial]
async fn missing_photo_file_is_reported_as_not_found() {
    let _storage = use_temp_storage();
    let (app, state) = make_test_app().await;
    let db = state.db();
    let client = create_user(db, "cli1", Role::Client).await;
    let admin = create_user(db, "boss", Role::Admin).await;

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/tickets",
            Some(&bearer(&client)),
            &json!({ "title": "Scanner", "description": "Streaks" }),
        ))
        .await
        .unwrap();
    let id = json_body(created).await["data"]["id"].as_i64().unwrap();

    let resolved = app
        .clone()
        .oneshot(multipart_request(
            &format!("/api/tickets/{id}/resolve"),
            &bearer(&admin),
            &[("work_performed", "Cleaned glass")],
            Some(("photo", "glass.jpg", &b"img"[..])),
        ))
        .await
        .unwrap();
    let stored = json_body(resolved).await["data"]["visit_report"]["photo_filename"]
        .as_str()
        .unwrap()
        .to_string();

    std::fs::remove_file(ticket_photo_path(&stored)).unwrap();

    let photo = app
        .oneshot(get_request(&format!("/api/tickets/{id}/photo"), Some(&bearer(&client))))
        .await
        .unwrap();
    assert_eq!(photo.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(photo).await["message"], "Photo missing on disk");

    AppConfig::reset();
}

#[tokio::test]
#[serial]
async fn reuploading_same_name_swaps_content_without_leftovers() {
    let storage = use_temp_storage();
    let (app, state) = make_test_app().await;
    let db = state.db();
    let client = create_user(db, "cli1", Role::Client).await;
    let admin = create_user(db, "boss", Role::Admin).await;

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/tickets",
            Some(&bearer(&client)),
            &json!({ "title": "Router", "description": "Lights off" }),
        ))
        .await
        .unwrap();
    let id = json_body(created).await["data"]["id"].as_i64().unwrap();

    for content in [&b"first"[..], &b"second"[..]] {
        let response = app
            .clone()
            .oneshot(multipart_request(
                &format!("/api/tickets/{id}/resolve"),
                &bearer(&admin),
                &[("work_performed", "Reset router")],
                Some(("photo", "router.jpg", content)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let stored = format!("{id}_router.jpg");
    assert_eq!(std::fs::read(ticket_photo_path(&stored)).unwrap(), b"second");

    let leftovers: Vec<_> = std::fs::read_dir(storage.path().join("tickets"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(leftovers, vec![stored]);

    AppConfig::reset();
}
