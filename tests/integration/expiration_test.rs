//! Expiration sweep, expiry reporting, and repurchase eligibility.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_sweep_claims_each_grant_once() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Sweeper").await;
    let lesson = app.create_lesson("Expiring lesson", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;
    app.force_expire_grant(student, lesson).await;

    let report = app
        .state
        .expiration_service
        .process_expired()
        .await
        .expect("sweep failed");
    assert!(report
        .grants
        .iter()
        .any(|g| g.student_id == student && g.lesson_id == lesson));

    // A second sweep must not report the same grant again.
    let again = app
        .state
        .expiration_service
        .process_expired()
        .await
        .expect("sweep failed");
    assert!(!again
        .grants
        .iter()
        .any(|g| g.student_id == student && g.lesson_id == lesson));
}

#[tokio::test]
async fn test_sweep_writes_system_audit_entries() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Audited").await;
    let lesson = app.create_lesson("Audited lesson", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;
    app.force_expire_grant(student, lesson).await;

    app.state
        .expiration_service
        .process_expired()
        .await
        .expect("sweep failed");

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_log \
         WHERE action = 'grant.expired' AND actor_id = $1 \
         AND details->>'student_id' = $2",
    )
    .bind(uuid::Uuid::nil())
    .bind(student.to_string())
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_extend_after_sweep_reactivates() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Returning").await;
    let lesson = app.create_lesson("Second chance", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;
    app.force_expire_grant(student, lesson).await;
    app.state
        .expiration_service
        .process_expired()
        .await
        .expect("sweep failed");

    let id = app.progress_id(student, lesson).await;
    let extended = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/extend?days=14"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(extended.status, StatusCode::OK, "{:?}", extended.body);

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
async fn test_statistics_count_expired_grants() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Counted").await;
    let lesson = app.create_lesson("Counted lesson", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;
    app.force_expire_grant(student, lesson).await;

    let res = app
        .request("GET", "/api/lesson-expiration/statistics", None, Some(&admin))
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert!(res.body["data"]["total_expired"].as_i64().unwrap() >= 1);
    assert!(res.body["data"]["affected_students"].as_i64().unwrap() >= 1);
}

#[tokio::test]
async fn test_expiring_soon_lists_grant_in_window() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Soon").await;
    let lesson = app.create_lesson("Soon lesson", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 3 })),
        Some(&admin),
    )
    .await;

    let res = app
        .request(
            "GET",
            "/api/lesson-expiration/expiring-soon?days=7",
            None,
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    let entries = res.body["data"].as_array().unwrap();
    // Entries are [student_id, lesson_id, lesson_title, expires_at] tuples.
    assert!(entries
        .iter()
        .any(|e| e[0] == json!(student) && e[2] == json!("Soon lesson")));
}

#[tokio::test]
async fn test_expiring_soon_rejects_invalid_window() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();

    let res = app
        .request(
            "GET",
            "/api/lesson-expiration/expiring-soon?days=0",
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_can_repurchase_follows_grant_state() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Eligible").await;
    let lesson = app.create_lesson("Eligibility lesson", 60.0).await;

    let path = format!(
        "/api/lesson-expiration/can-repurchase?student_id={student}&lesson_id={lesson}"
    );

    // Never granted.
    let res = app.request("GET", &path, None, Some(&admin)).await;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert_eq!(res.body["data"]["can_repurchase"], json!(true));
    assert_eq!(res.body["data"]["reason"], json!("no_grant"));

    // Active grant blocks repurchase.
    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;
    let res = app.request("GET", &path, None, Some(&admin)).await;
    assert_eq!(res.body["data"]["can_repurchase"], json!(false));
    assert_eq!(res.body["data"]["reason"], json!("active_grant"));

    // Expired grant is eligible again.
    app.force_expire_grant(student, lesson).await;
    let res = app.request("GET", &path, None, Some(&admin)).await;
    assert_eq!(res.body["data"]["can_repurchase"], json!(true));
    assert_eq!(res.body["data"]["reason"], json!("expired"));
}
