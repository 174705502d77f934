//! Grant lifecycle: purchase, extension, revocation, repurchase.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_grant_creates_active_grant_and_progress() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Ada").await;
    let lesson = app.create_lesson("Intro to Rust", 60.0).await;

    let res = app
        .request(
            "POST",
            "/api/student-lessons",
            Some(json!({
                "student_id": student,
                "lesson_id": lesson,
                "duration_days": 30,
                "payment_reference": "pay-123"
            })),
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert_eq!(res.body["data"]["revoked"], json!(false));
    assert!(!res.body["data"]["expires_at"].is_null());
    assert_eq!(res.body["data"]["payment_reference"], json!("pay-123"));

    // The progress record is created in the same transaction.
    let id = app.progress_id(student, lesson).await;
    let row = app
        .request(
            "GET",
            &format!("/api/student-lessons/{id}"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(row.status, StatusCode::OK);
    assert_eq!(row.body["data"]["status"], json!("PURCHASED"));
    assert_eq!(row.body["data"]["video_view_count"], json!(0));
}

#[tokio::test]
async fn test_grant_without_duration_is_unlimited() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Grace").await;
    let lesson = app.create_lesson("Lifetime lesson", 60.0).await;

    let res = app
        .request(
            "POST",
            "/api/student-lessons",
            Some(json!({ "student_id": student, "lesson_id": lesson })),
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert!(res.body["data"]["expires_at"].is_null());
}

#[tokio::test]
async fn test_grant_while_active_conflicts() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Linus").await;
    let lesson = app.create_lesson("Kernels", 60.0).await;

    let body = json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 });
    let first = app
        .request("POST", "/api/student-lessons", Some(body.clone()), Some(&admin))
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .request("POST", "/api/student-lessons", Some(body), Some(&admin))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT, "{:?}", second.body);
    assert_eq!(second.body["error"], json!("ALREADY_ACTIVE"));
}

#[tokio::test]
async fn test_grant_for_unknown_lesson_not_found() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Edsger").await;

    let res = app
        .request(
            "POST",
            "/api/student-lessons",
            Some(json!({
                "student_id": student,
                "lesson_id": uuid::Uuid::new_v4(),
                "duration_days": 30
            })),
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_extend_pushes_expiry_forward() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Barbara").await;
    let lesson = app.create_lesson("Abstraction", 60.0).await;

    let created = app
        .request(
            "POST",
            "/api/student-lessons",
            Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
            Some(&admin),
        )
        .await;
    let before: chrono::DateTime<chrono::Utc> = created.body["data"]["expires_at"]
        .as_str()
        .expect("expiry set")
        .parse()
        .unwrap();

    let id = app.progress_id(student, lesson).await;
    let extended = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/extend?days=7"),
            None,
            Some(&admin),
        )
        .await;

    assert_eq!(extended.status, StatusCode::OK, "{:?}", extended.body);
    let after: chrono::DateTime<chrono::Utc> = extended.body["data"]["expires_at"]
        .as_str()
        .expect("expiry set")
        .parse()
        .unwrap();
    assert!(after > before, "expiry should move forward");
}

#[tokio::test]
async fn test_extend_expired_grant_reanchors_to_now() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Alan").await;
    let lesson = app.create_lesson("Computability", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;
    app.force_expire_grant(student, lesson).await;

    let id = app.progress_id(student, lesson).await;
    let extended = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/extend?days=7"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(extended.status, StatusCode::OK, "{:?}", extended.body);

    // The new expiry anchors at now, not at the stale expiry, so the
    // grant is active again.
    let expires_at: chrono::DateTime<chrono::Utc> = extended.body["data"]["expires_at"]
        .as_str()
        .expect("expiry set")
        .parse()
        .unwrap();
    assert!(expires_at > chrono::Utc::now());

    let view = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/video-view"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(view.status, StatusCode::OK, "{:?}", view.body);
}

#[tokio::test]
async fn test_extend_with_invalid_days_rejected() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Donald").await;
    let lesson = app.create_lesson("Typesetting", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;

    let id = app.progress_id(student, lesson).await;
    let res = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/extend?days=0"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_revoke_blocks_student_events() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Margaret").await;
    let lesson = app.create_lesson("Flight software", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;

    let id = app.progress_id(student, lesson).await;
    let revoked = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/revoke"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(revoked.status, StatusCode::OK, "{:?}", revoked.body);
    assert_eq!(revoked.body["data"]["revoked"], json!(true));

    let view = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/video-view"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(view.status, StatusCode::FORBIDDEN, "{:?}", view.body);
}

#[tokio::test]
async fn test_revoke_with_delete_data_removes_progress_and_attempts() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Radia").await;
    let lesson = app.create_lesson("Spanning trees", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;

    let id = app.progress_id(student, lesson).await;
    app.request(
        "POST",
        &format!("/api/student-lessons/{id}/exam"),
        Some(json!({ "score": 42.0 })),
        Some(&admin),
    )
    .await;

    let revoked = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/revoke?delete_data=true"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(revoked.status, StatusCode::OK, "{:?}", revoked.body);

    let progress_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lesson_progress WHERE student_id = $1 AND lesson_id = $2",
    )
    .bind(student)
    .bind(lesson)
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(progress_count, 0);

    let attempt_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM exam_attempts WHERE student_id = $1 AND lesson_id = $2",
    )
    .bind(student)
    .bind(lesson)
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(attempt_count, 0);
}

#[tokio::test]
async fn test_repurchase_after_expiry_reactivates_grant() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Katherine").await;
    let lesson = app.create_lesson("Trajectories", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;
    app.force_expire_grant(student, lesson).await;

    let id = app.progress_id(student, lesson).await;
    let regranted = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/grant"),
            Some(json!({ "duration_days": 60 })),
            Some(&admin),
        )
        .await;

    assert_eq!(regranted.status, StatusCode::OK, "{:?}", regranted.body);
    assert_eq!(regranted.body["data"]["revoked"], json!(false));
    let expires_at: chrono::DateTime<chrono::Utc> = regranted.body["data"]["expires_at"]
        .as_str()
        .expect("expiry set")
        .parse()
        .unwrap();
    assert!(expires_at > chrono::Utc::now());
}
