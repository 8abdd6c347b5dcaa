use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use campus_api::{AppState, AppStateInner};

fn app() -> Router {
    app_with_upload_dir().0
}

fn app_with_upload_dir() -> (Router, std::path::PathBuf) {
    let db = campus_db::Database::open_in_memory().unwrap();
    let upload_dir = std::env::temp_dir().join(format!("campus-test-{}", uuid::Uuid::new_v4()));
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".into(),
        upload_dir: upload_dir.clone(),
    });
    (campus_api::router(state), upload_dir)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

/// PATCH /me/avatar with a hand-rolled multipart body.
async fn send_avatar(
    app: &Router,
    token: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> (StatusCode, serde_json::Value) {
    let boundary = "campus-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("PATCH")
        .uri("/api/v1/me/avatar")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Registers a user and returns a bearer token for it.
async fn login(app: &Router) -> String {
    let body = serde_json::json!({ "email": "admin@school.edu", "password": "super-secret" });
    let (status, _) = send(app, "POST", "/api/v1/users", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(app, "POST", "/api/v1/sessions", None, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    json["token"].as_str().unwrap().to_string()
}

fn teacher_body(registration: &str, email: &str, phone: &str) -> serde_json::Value {
    serde_json::json!({
        "registration": registration,
        "name": "Ana Souza",
        "email": email,
        "phone": phone,
        "coords": { "latitude": -23.55, "longitude": -46.63 }
    })
}

fn student_body(registration: &str, name: &str, email: &str, phone: &str) -> serde_json::Value {
    serde_json::json!({
        "registration": registration,
        "name": name,
        "email": email,
        "phone": phone
    })
}

#[tokio::test]
async fn register_login_me_flow() {
    let app = app();

    let creds = serde_json::json!({ "email": "Ana@School.EDU", "password": "super-secret" });
    let (status, _) = send(&app, "POST", "/api/v1/users", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    // Email uniqueness is case-insensitive
    let again = serde_json::json!({ "email": "ana@school.edu", "password": "super-secret" });
    let (status, json) = send(&app, "POST", "/api/v1/users", None, Some(again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_EXISTS");

    // Wrong password and unknown email look identical to the caller
    let wrong = serde_json::json!({ "email": "ana@school.edu", "password": "nope-nope" });
    let (status, json) = send(&app, "POST", "/api/v1/sessions", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, json) = send(&app, "POST", "/api/v1/sessions", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["email"], "ana@school.edu");
    let token = json["token"].as_str().unwrap().to_string();

    let (status, json) = send(&app, "GET", "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["email"], "ana@school.edu");
    json["user"]["id"]
        .as_str()
        .unwrap()
        .parse::<uuid::Uuid>()
        .unwrap();
}

#[tokio::test]
async fn register_validates_payload() {
    let app = app();

    let bad_email = serde_json::json!({ "email": "not-an-email", "password": "super-secret" });
    let (status, json) = send(&app, "POST", "/api/v1/users", None, Some(bad_email)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let short = serde_json::json!({ "email": "a@b.c", "password": "short" });
    let (status, json) = send(&app, "POST", "/api/v1/users", None, Some(short)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn auth_gate_rejects_bad_bearers() {
    let app = app();

    let (status, json) = send(&app, "GET", "/api/v1/teachers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, "GET", "/api/v1/teachers", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Token signed with a different secret
    let forged = campus_api::token::issue("other-secret", uuid::Uuid::new_v4()).unwrap();
    let (status, _) = send(&app, "GET", "/api/v1/teachers", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn avatar_upload_replaces_previous_file() {
    let (app, upload_dir) = app_with_upload_dir();
    let token = login(&app).await;

    let (status, json) =
        send_avatar(&app, &token, "me.png", "image/png", b"first-image-bytes").await;
    assert_eq!(status, StatusCode::OK);
    let first = json["imageUrl"].as_str().unwrap().to_string();
    assert!(first.ends_with(".png"), "extension preserved: {first}");
    assert!(upload_dir.join(&first).exists());

    let (status, json) =
        send_avatar(&app, &token, "me.jpg", "image/jpeg", b"second-image-bytes").await;
    assert_eq!(status, StatusCode::OK);
    let second = json["imageUrl"].as_str().unwrap().to_string();
    assert!(second.ends_with(".jpg"));
    assert!(upload_dir.join(&second).exists());
    // The earlier file is removed only after the new one is in place
    assert!(!upload_dir.join(&first).exists());

    let (status, json) = send(&app, "GET", "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["imageUrl"], second.as_str());

    std::fs::remove_dir_all(&upload_dir).ok();
}

#[tokio::test]
async fn avatar_upload_rejects_bad_files() {
    let (app, upload_dir) = app_with_upload_dir();
    let token = login(&app).await;

    // Not an image
    let (status, json) = send_avatar(&app, &token, "notes.txt", "text/plain", b"hello").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    // Empty payload
    let (status, json) = send_avatar(&app, &token, "me.png", "image/png", b"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    // One byte over the 5 MiB cap
    let oversized = vec![0u8; campus_api::users::MAX_AVATAR_SIZE + 1];
    let (status, json) = send_avatar(&app, &token, "big.png", "image/png", &oversized).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    // Nothing was written for any of the rejected uploads
    assert!(!upload_dir.exists());
}

#[tokio::test]
async fn teacher_crud_and_uniqueness() {
    let app = app();
    let token = login(&app).await;

    let body = teacher_body("T-001", "ana@school.edu", "555-0100");
    let (status, _) = send(&app, "POST", "/api/v1/teachers", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    // Same email, different registration/phone
    let dup = teacher_body("T-002", "ana@school.edu", "555-0101");
    let (status, json) = send(&app, "POST", "/api/v1/teachers", Some(&token), Some(dup)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "ALREADY_EXISTS");

    let (status, json) = send(&app, "GET", "/api/v1/teachers", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let teachers = json.as_array().unwrap();
    assert_eq!(teachers.len(), 1);
    let id = teachers[0]["id"].as_str().unwrap().to_string();
    assert_eq!(teachers[0]["lat"], -23.55);

    // Update keeping its own unique fields does not collide with itself
    let update = teacher_body("T-001", "ana@school.edu", "555-0100");
    let uri = format!("/api/v1/teachers/{}", id);
    let (status, _) = send(&app, "PUT", &uri, Some(&token), Some(update)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["registration"], "T-001");

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn class_roster_round_trip() {
    let app = app();
    let token = login(&app).await;

    // Class creation requires an existing teacher
    let ghost = uuid::Uuid::new_v4();
    let orphan = serde_json::json!({ "label": "Algebra I", "period": "morning", "teacher": ghost });
    let (status, json) = send(&app, "POST", "/api/v1/classes", Some(&token), Some(orphan)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "NOT_FOUND");

    let body = teacher_body("T-001", "ana@school.edu", "555-0100");
    let (status, _) = send(&app, "POST", "/api/v1/teachers", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, json) = send(&app, "GET", "/api/v1/teachers", Some(&token), None).await;
    let teacher_id = json[0]["id"].as_str().unwrap().to_string();

    let class = serde_json::json!({ "label": "Algebra I", "period": "morning", "teacher": teacher_id });
    let (status, _) = send(&app, "POST", "/api/v1/classes", Some(&token), Some(class)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, json) = send(&app, "GET", "/api/v1/classes", Some(&token), None).await;
    let class_id = json[0]["id"].as_str().unwrap().to_string();

    for (reg, name, email, phone) in [
        ("S-001", "Alice Prado", "a@school.edu", "555-0201"),
        ("S-002", "Bruno Dias", "b@school.edu", "555-0202"),
    ] {
        let body = student_body(reg, name, email, phone);
        let (status, _) = send(&app, "POST", "/api/v1/students", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (_, json) = send(&app, "GET", "/api/v1/students", Some(&token), None).await;
    let students = json.as_array().unwrap();
    let a = students.iter().find(|s| s["name"] == "Alice Prado").unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let b = students.iter().find(|s| s["name"] == "Bruno Dias").unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // A batch containing an unknown id must not enroll anyone
    let uri = format!("/api/v1/classes/{}/student", class_id);
    let bad = serde_json::json!({ "students": [a, uuid::Uuid::new_v4()] });
    let (status, json) = send(&app, "PATCH", &uri, Some(&token), Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "NOT_FOUND");

    let detail_uri = format!("/api/v1/classes/{}", class_id);
    let (_, json) = send(&app, "GET", &detail_uri, Some(&token), None).await;
    assert_eq!(json["students"].as_array().unwrap().len(), 0);

    let good = serde_json::json!({ "students": [a, b] });
    let (status, _) = send(&app, "PATCH", &uri, Some(&token), Some(good)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "GET", &detail_uri, Some(&token), None).await;
    assert_eq!(json["teacherName"], "Ana Souza");
    let mut names: Vec<&str> = json["students"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Alice Prado", "Bruno Dias"]);

    // Enrolled teacher and student are both delete-guarded
    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/v1/teachers/{}", teacher_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "CONFLICT");

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/v1/students/{}", a),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "CONFLICT");

    // Removing one student (and a non-member, silently) leaves the other
    let remove = serde_json::json!({ "students": [b, uuid::Uuid::new_v4()] });
    let (status, _) = send(&app, "DELETE", &uri, Some(&token), Some(remove)).await;
    assert_eq!(status, StatusCode::OK);

    let roster_uri = format!("/api/v1/classes/{}/students", class_id);
    let (status, json) = send(&app, "GET", &roster_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let roster = json.as_array().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0]["name"], "Alice Prado");
    assert_eq!(roster[0]["classId"].as_str().unwrap(), class_id);
}

#[tokio::test]
async fn class_delete_frees_teacher_and_students() {
    let app = app();
    let token = login(&app).await;

    let body = teacher_body("T-001", "ana@school.edu", "555-0100");
    send(&app, "POST", "/api/v1/teachers", Some(&token), Some(body)).await;
    let (_, json) = send(&app, "GET", "/api/v1/teachers", Some(&token), None).await;
    let teacher_id = json[0]["id"].as_str().unwrap().to_string();

    let class = serde_json::json!({ "label": "Algebra I", "period": "morning", "teacher": teacher_id });
    send(&app, "POST", "/api/v1/classes", Some(&token), Some(class)).await;
    let (_, json) = send(&app, "GET", "/api/v1/classes", Some(&token), None).await;
    let class_id = json[0]["id"].as_str().unwrap().to_string();

    let body = student_body("S-001", "Alice Prado", "a@school.edu", "555-0201");
    send(&app, "POST", "/api/v1/students", Some(&token), Some(body)).await;
    let (_, json) = send(&app, "GET", "/api/v1/students", Some(&token), None).await;
    let student_id = json[0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/classes/{}/student", class_id);
    let enroll = serde_json::json!({ "students": [student_id] });
    let (status, _) = send(&app, "PATCH", &uri, Some(&token), Some(enroll)).await;
    assert_eq!(status, StatusCode::OK);

    // Class delete clears memberships, so both deletes go through after
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/classes/{}", class_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/students/{}", student_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/teachers/{}", teacher_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
