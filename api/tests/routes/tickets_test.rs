use crate::helpers::{
    bearer, create_user, get_request, json_body, json_request, make_test_app, multipart_request,
};
use axum::{
    Router,
    body::to_bytes,
    http::{StatusCode, header},
};
use db::models::user::{Model as UserModel, Role};
use serde_json::{Value, json};
use tower::ServiceExt;

struct Cast {
    c1: UserModel,
    c2: UserModel,
    t1: UserModel,
    t2: UserModel,
    admin: UserModel,
}

async fn setup() -> (Router, Cast) {
    let (app, state) = make_test_app().await;
    let db = state.db();
    let cast = Cast {
        c1: create_user(db, "cli1", Role::Client).await,
        c2: create_user(db, "cli2", Role::Client).await,
        t1: create_user(db, "tech1", Role::Technician).await,
        t2: create_user(db, "tech2", Role::Technician).await,
        admin: create_user(db, "boss", Role::Admin).await,
    };
    (app, cast)
}

async fn create_ticket(app: &Router, owner: &UserModel, title: &str) -> Value {
    let payload = json!({
        "title": title,
        "description": "Tray 2 jams on every job",
        "location": "Office 2B",
        "priority": "high"
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/tickets", Some(&bearer(owner)), &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["data"].clone()
}

async fn list_ids(app: &Router, user: &UserModel) -> Vec<i64> {
    let response = app
        .clone()
        .oneshot(get_request("/api/tickets", Some(&bearer(user))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["data"]["tickets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect()
}

async fn assign(app: &Router, as_user: &UserModel, ticket_id: i64, tech: Option<i64>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/tickets/{ticket_id}/assign"),
            Some(&bearer(as_user)),
            &json!({ "technician_id": tech }),
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, json_body(response).await)
}

async fn resolve(app: &Router, as_user: &UserModel, ticket_id: i64, work: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(multipart_request(
            &format!("/api/tickets/{ticket_id}/resolve"),
            &bearer(as_user),
            &[("work_performed", work), ("materials_used", "1x toner")],
            None,
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, json_body(response).await)
}

#[tokio::test]
async fn printer_down_is_visible_to_owner_and_admin_only() {
    let (app, cast) = setup().await;

    let ticket = create_ticket(&app, &cast.c1, "Printer down").await;
    let id = ticket["id"].as_i64().unwrap();
    assert_eq!(ticket["status"], "open");
    assert_eq!(ticket["priority"], "high");
    assert_eq!(ticket["client_id"], cast.c1.id);
    assert!(ticket["technician_id"].is_null());

    assert_eq!(list_ids(&app, &cast.c1).await, vec![id]);
    assert_eq!(list_ids(&app, &cast.admin).await, vec![id]);
    assert!(list_ids(&app, &cast.c2).await.is_empty());
    assert!(list_ids(&app, &cast.t1).await.is_empty());

    let hidden = app
        .clone()
        .oneshot(get_request(&format!("/api/tickets/{id}"), Some(&bearer(&cast.c2))))
        .await
        .unwrap();
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    let missing = app
        .oneshot(get_request("/api/tickets/9999", Some(&bearer(&cast.c2))))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_clients_create_tickets() {
    let (app, cast) = setup().await;
    let payload = json!({ "title": "Router", "description": "Lights off" });

    for user in [&cast.t1, &cast.admin] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/tickets", Some(&bearer(user)), &payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let anonymous = app
        .clone()
        .oneshot(json_request("POST", "/api/tickets", None, &payload))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let blank = json!({ "title": "   ", "description": "x" });
    let response = app
        .oneshot(json_request("POST", "/api/tickets", Some(&bearer(&cast.c1)), &blank))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_lifecycle_through_the_api() {
    let (app, cast) = setup().await;
    let id = create_ticket(&app, &cast.c1, "Printer down").await["id"]
        .as_i64()
        .unwrap();

    // Non-admins cannot assign.
    let (status, _) = assign(&app, &cast.c1, id, Some(cast.t1.id)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Assignee must be a technician.
    let (status, _) = assign(&app, &cast.admin, id, Some(cast.c2.id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = assign(&app, &cast.admin, id, Some(cast.t1.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "in_progress");
    assert_eq!(body["data"]["technician_id"], cast.t1.id);
    assert_eq!(list_ids(&app, &cast.t1).await, vec![id]);
    assert!(list_ids(&app, &cast.t2).await.is_empty());

    // Another technician cannot even see it.
    let (status, _) = resolve(&app, &cast.t2, id, "Nothing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner sees it but may not resolve it.
    let (status, _) = resolve(&app, &cast.c1, id, "Fixed it myself").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = resolve(&app, &cast.t1, id, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = resolve(&app, &cast.t1, id, "Replaced cartridge").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "closed");
    assert_eq!(body["data"]["visit_report"]["work_performed"], "Replaced cartridge");
    assert_eq!(body["data"]["visit_report"]["materials_used"], "1x toner");

    // Detail shows the resolution to the owner.
    let detail = app
        .clone()
        .oneshot(get_request(&format!("/api/tickets/{id}"), Some(&bearer(&cast.c1))))
        .await
        .unwrap();
    assert_eq!(detail.status(), StatusCode::OK);
    let detail = json_body(detail).await;
    assert_eq!(detail["data"]["status"], "closed");
    assert_eq!(detail["data"]["visit_report"]["work_performed"], "Replaced cartridge");

    // So does the PDF.
    let pdf = app
        .clone()
        .oneshot(get_request(&format!("/api/tickets/{id}/pdf"), Some(&bearer(&cast.c1))))
        .await
        .unwrap();
    assert_eq!(pdf.status(), StatusCode::OK);
    assert_eq!(pdf.headers()[header::CONTENT_TYPE], "application/pdf");
    let bytes = to_bytes(pdf.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(
        bytes
            .windows(b"Replaced cartridge".len())
            .any(|w| w == b"Replaced cartridge")
    );

    // Closed is terminal.
    let (status, body) = assign(&app, &cast.admin, id, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Ticket is already closed");

    // Editing the report keeps it closed.
    let (status, body) = resolve(&app, &cast.admin, id, "Replaced cartridge and drum").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "closed");
    assert_eq!(
        body["data"]["visit_report"]["work_performed"],
        "Replaced cartridge and drum"
    );
}

#[tokio::test]
async fn unassigning_returns_ticket_to_open() {
    let (app, cast) = setup().await;
    let id = create_ticket(&app, &cast.c1, "Mouse").await["id"]
        .as_i64()
        .unwrap();

    assign(&app, &cast.admin, id, Some(cast.t1.id)).await;
    let (status, body) = assign(&app, &cast.admin, id, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "open");
    assert!(body["data"]["technician_id"].is_null());
    assert!(list_ids(&app, &cast.t1).await.is_empty());
}

#[tokio::test]
async fn listing_filters_by_status_and_rejects_unknown_status() {
    let (app, cast) = setup().await;
    let a = create_ticket(&app, &cast.c1, "A").await["id"].as_i64().unwrap();
    create_ticket(&app, &cast.c1, "B").await;
    assign(&app, &cast.admin, a, Some(cast.t1.id)).await;

    let response = app
        .clone()
        .oneshot(get_request(
            "/api/tickets?status=in_progress",
            Some(&bearer(&cast.c1)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["tickets"][0]["id"], a);

    let response = app
        .clone()
        .oneshot(get_request("/api/tickets?status=reopened", Some(&bearer(&cast.c1))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get_request("/api/tickets?per_page=0", Some(&bearer(&cast.c1))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pending_count_tracks_open_work() {
    let (app, cast) = setup().await;
    let a = create_ticket(&app, &cast.c1, "A").await["id"].as_i64().unwrap();
    create_ticket(&app, &cast.c1, "B").await;
    assign(&app, &cast.admin, a, Some(cast.t1.id)).await;

    let count = |user: &UserModel| {
        let app = app.clone();
        let token = bearer(user);
        async move {
            let response = app
                .oneshot(get_request("/api/me/pending-count", Some(&token)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            json_body(response).await["data"]["count"].as_u64().unwrap()
        }
    };

    assert_eq!(count(&cast.c1).await, 2);
    assert_eq!(count(&cast.t1).await, 1);
    assert_eq!(count(&cast.c2).await, 0);

    resolve(&app, &cast.t1, a, "Done").await;
    assert_eq!(count(&cast.c1).await, 1);
    assert_eq!(count(&cast.t1).await, 0);
    assert_eq!(count(&cast.admin).await, 1);
}

#[tokio::test]
async fn only_admin_deletes() {
    let (app, cast) = setup().await;
    let id = create_ticket(&app, &cast.c1, "Monitor").await["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/tickets/{id}");

    let as_owner = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("DELETE")
                .uri(&uri)
                .header(header::AUTHORIZATION, bearer(&cast.c1))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(as_owner.status(), StatusCode::FORBIDDEN);

    let as_admin = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("DELETE")
                .uri(&uri)
                .header(header::AUTHORIZATION, bearer(&cast.admin))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(as_admin.status(), StatusCode::OK);

    let gone = app
        .oneshot(get_request(&uri, Some(&bearer(&cast.admin))))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn technician_directory_is_admin_only() {
    let (app, cast) = setup().await;

    let denied = app
        .clone()
        .oneshot(get_request("/api/users/technicians", Some(&bearer(&cast.t1))))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get_request("/api/users/technicians", Some(&bearer(&cast.admin))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let names: Vec<_> = json_body(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["tech1", "tech2"]);
}
