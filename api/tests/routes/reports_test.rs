use crate::helpers::{
    bearer, create_user, get_request, json_body, json_request, make_test_app, multipart_request,
};
use axum::{
    Router,
    body::to_bytes,
    http::{StatusCode, header},
};
use chrono::{Duration, Utc};
use db::models::ticket;
use db::models::user::{Model as UserModel, Role};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde_json::json;
use tower::ServiceExt;

async fn file_ticket(app: &Router, client: &UserModel, title: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/tickets",
            Some(&bearer(client)),
            &json!({ "title": title, "description": "Needs a look", "location": "Lab 1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["data"]["id"].as_i64().unwrap()
}

async fn assign(app: &Router, admin: &UserModel, id: i64, tech: &UserModel) {
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/tickets/{id}/assign"),
            Some(&bearer(admin)),
            &json!({ "technician_id": tech.id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn resolve(app: &Router, tech: &UserModel, id: i64, work: &str) {
    let response = app
        .clone()
        .oneshot(multipart_request(
            &format!("/api/tickets/{id}/resolve"),
            &bearer(tech),
            &[("work_performed", work)],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn backdate(db: &DatabaseConnection, id: i64, hours: i64) {
    let found = ticket::Entity::find_by_id(id).one(db).await.unwrap().unwrap();
    let mut active: ticket::ActiveModel = found.into();
    active.created_at = Set(Utc::now() - Duration::hours(hours));
    active.update(db).await.unwrap();
}

/// Three tickets: one closed by t1, one in progress with t1 and backdated two
/// days, one open. t2 is idle.
async fn seeded() -> (Router, UserModel) {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let client = create_user(db, "cli1", Role::Client).await;
    let t1 = create_user(db, "tech1", Role::Technician).await;
    create_user(db, "tech2", Role::Technician).await;
    let admin = create_user(db, "boss", Role::Admin).await;

    let fixed = file_ticket(&app, &client, "Printer down").await;
    let stuck = file_ticket(&app, &client, "VPN drops").await;
    file_ticket(&app, &client, "New keyboard").await;

    assign(&app, &admin, fixed, &t1).await;
    resolve(&app, &t1, fixed, "Replaced cartridge").await;
    assign(&app, &admin, stuck, &t1).await;
    backdate(db, stuck, 48).await;

    (app, admin)
}

#[tokio::test]
async fn reports_are_admin_only() {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let client = create_user(db, "cli1", Role::Client).await;
    let tech = create_user(db, "tech1", Role::Technician).await;

    for user in [&client, &tech] {
        for uri in ["/api/reports/summary", "/api/reports/executive", "/api/reports/export"] {
            let response = app
                .clone()
                .oneshot(get_request(uri, Some(&bearer(user))))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    let anonymous = app
        .oneshot(get_request("/api/reports/summary", None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn summary_counts_states_overdue_and_effectiveness() {
    let (app, admin) = seeded().await;

    let response = app
        .oneshot(get_request("/api/reports/summary", Some(&bearer(&admin))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let data = json_body(response).await["data"].clone();

    assert_eq!(data["counts"]["total"], 3);
    assert_eq!(data["counts"]["open"], 1);
    assert_eq!(data["counts"]["in_progress"], 1);
    assert_eq!(data["counts"]["closed"], 1);
    assert_eq!(data["counts"]["overdue"], 1);
    // 1 of 3 overdue is above the default 20% tolerance.
    assert_eq!(data["overdue_alert"], true);

    let techs = data["technicians"].as_array().unwrap();
    assert_eq!(techs.len(), 2);
    assert_eq!(techs[0]["username"], "tech1");
    assert_eq!(techs[0]["assigned"], 2);
    assert_eq!(techs[0]["closed"], 1);
    assert_eq!(techs[0]["effectiveness"], 50.0);
    assert_eq!(techs[1]["username"], "tech2");
    assert_eq!(techs[1]["assigned"], 0);
    assert_eq!(techs[1]["effectiveness"], 0.0);

    let narrative: Vec<_> = data["narrative"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l.as_str().unwrap().to_string())
        .collect();
    assert!(narrative.iter().any(|l| l.starts_with("ALERT:")));
}

#[tokio::test]
async fn spreadsheet_export_lists_every_ticket() {
    let (app, admin) = seeded().await;

    let response = app
        .oneshot(get_request("/api/reports/export", Some(&bearer(&admin))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("tickets_") && disposition.ends_with(".csv\""));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let text = text.trim_start_matches('\u{feff}');
    let lines: Vec<_> = text.lines().collect();

    assert!(lines[0].starts_with("ID,Title,Description"));
    assert_eq!(lines.len(), 4);
    assert!(text.contains("Replaced cartridge"));
    assert!(text.contains("VPN drops"));
}

#[tokio::test]
async fn executive_summary_is_a_pdf_attachment() {
    let (app, admin) = seeded().await;

    let response = app
        .oneshot(get_request("/api/reports/executive", Some(&bearer(&admin))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("executive_summary_"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(bytes.ends_with(b"%%EOF\n"));
}
