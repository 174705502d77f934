//! Progress state machine over HTTP: student-path events, admin
//! corrections, and the filtered table view.

use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::TestApp;

/// Grant a fresh (student, lesson) pair and return the progress ID.
async fn granted_pair(app: &TestApp, admin: &str) -> (Uuid, Uuid, Uuid) {
    let student = app.create_student("Student").await;
    let lesson = app.create_lesson("Lesson", 60.0).await;
    let res = app
        .request(
            "POST",
            "/api/student-lessons",
            Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
            Some(admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    let id = app.progress_id(student, lesson).await;
    (student, lesson, id)
}

#[tokio::test]
async fn test_video_view_advances_status() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    let res = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/video-view"),
            None,
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert_eq!(res.body["data"]["status"], json!("VIDEO_WATCHED"));
    assert_eq!(res.body["data"]["video_view_count"], json!(1));
}

#[tokio::test]
async fn test_video_view_count_caps() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    let mut last = None;
    for _ in 0..6 {
        let res = app
            .request(
                "POST",
                &format!("/api/student-lessons/{id}/video-view"),
                None,
                Some(&admin),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK);
        last = Some(res);
    }

    let last = last.unwrap();
    assert_eq!(last.body["data"]["video_view_count"], json!(4));
}

#[tokio::test]
async fn test_passing_exam_advances_status() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    app.request(
        "POST",
        &format!("/api/student-lessons/{id}/video-view"),
        None,
        Some(&admin),
    )
    .await;

    let res = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/exam"),
            Some(json!({ "score": 85.0 })),
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert_eq!(res.body["data"]["passed"], json!(true));
    assert_eq!(res.body["data"]["progress"]["status"], json!("EXAM_PASSED"));
    assert_eq!(res.body["data"]["progress"]["exam_score"], json!(85.0));
}

#[tokio::test]
async fn test_failing_exam_records_attempt_without_advancing() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    app.request(
        "POST",
        &format!("/api/student-lessons/{id}/video-view"),
        None,
        Some(&admin),
    )
    .await;

    let res = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/exam"),
            Some(json!({ "score": 30.0 })),
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["passed"], json!(false));
    assert_eq!(res.body["data"]["progress"]["status"], json!("VIDEO_WATCHED"));
    assert_eq!(res.body["data"]["progress"]["exam_score"], json!(30.0));

    let attempts = app
        .request(
            "GET",
            &format!("/api/student-lessons/{id}/attempts"),
            None,
            Some(&admin),
        )
        .await;
    let items = attempts.body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["passed"], json!(false));
}

#[tokio::test]
async fn test_exam_before_video_stores_score_only() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    let res = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/exam"),
            Some(json!({ "score": 95.0 })),
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    // The video gate is not satisfied, so the status stays put.
    assert_eq!(res.body["data"]["passed"], json!(true));
    assert_eq!(res.body["data"]["progress"]["status"], json!("PURCHASED"));
    assert_eq!(res.body["data"]["progress"]["exam_score"], json!(95.0));
}

#[tokio::test]
async fn test_exam_score_out_of_range_rejected() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    let res = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/exam"),
            Some(json!({ "score": 120.0 })),
            Some(&admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assignment_after_exam_completes_lesson() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    app.request(
        "POST",
        &format!("/api/student-lessons/{id}/video-view"),
        None,
        Some(&admin),
    )
    .await;
    app.request(
        "POST",
        &format!("/api/student-lessons/{id}/exam"),
        Some(json!({ "score": 80.0 })),
        Some(&admin),
    )
    .await;

    let res = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/assignment-graded"),
            None,
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert_eq!(res.body["data"]["status"], json!("ASSIGNMENT_DONE"));
    assert_eq!(res.body["data"]["completed"], json!(true));
}

#[tokio::test]
async fn test_assignment_before_exam_is_ignored() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    let res = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/assignment-graded"),
            None,
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["status"], json!("PURCHASED"));
    assert_eq!(res.body["data"]["completed"], json!(false));
}

#[tokio::test]
async fn test_admin_reset_clears_progress_and_attempts() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    app.request(
        "POST",
        &format!("/api/student-lessons/{id}/video-view"),
        None,
        Some(&admin),
    )
    .await;
    app.request(
        "POST",
        &format!("/api/student-lessons/{id}/exam"),
        Some(json!({ "score": 90.0 })),
        Some(&admin),
    )
    .await;

    let reset = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/reset"),
            None,
            Some(&admin),
        )
        .await;

    assert_eq!(reset.status, StatusCode::OK, "{:?}", reset.body);
    assert_eq!(reset.body["data"]["status"], json!("PURCHASED"));
    assert_eq!(reset.body["data"]["video_view_count"], json!(0));
    assert!(reset.body["data"]["exam_score"].is_null());

    let attempts = app
        .request(
            "GET",
            &format!("/api/student-lessons/{id}/attempts"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(attempts.body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_admin_override_sets_fields() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    let res = app
        .request(
            "PUT",
            &format!("/api/student-lessons/{id}"),
            Some(json!({ "status": "EXAM_PASSED", "exam_score": 77.5 })),
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert_eq!(res.body["data"]["status"], json!("EXAM_PASSED"));
    assert_eq!(res.body["data"]["exam_score"], json!(77.5));
}

#[tokio::test]
async fn test_override_can_null_exam_score() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    app.request(
        "PUT",
        &format!("/api/student-lessons/{id}"),
        Some(json!({ "exam_score": 50.0 })),
        Some(&admin),
    )
    .await;

    let res = app
        .request(
            "PUT",
            &format!("/api/student-lessons/{id}"),
            Some(json!({ "exam_score": null })),
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert!(res.body["data"]["exam_score"].is_null());
}

#[tokio::test]
async fn test_override_with_no_fields_rejected() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (_, _, id) = granted_pair(&app, &admin).await;

    let res = app
        .request(
            "PUT",
            &format!("/api/student-lessons/{id}"),
            Some(json!({})),
            Some(&admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_student_event_requires_active_grant() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let (student, lesson, id) = granted_pair(&app, &admin).await;

    app.force_expire_grant(student, lesson).await;

    let res = app
        .request(
            "POST",
            &format!("/api/student-lessons/{id}/video-view"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN, "{:?}", res.body);
}

#[tokio::test]
async fn test_list_filters_by_student_and_status() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Filtered").await;
    let watched = app.create_lesson("Watched lesson", 60.0).await;
    let untouched = app.create_lesson("Untouched lesson", 60.0).await;

    for lesson in [watched, untouched] {
        app.request(
            "POST",
            "/api/student-lessons",
            Some(json!({ "student_id": student, "lesson_id": lesson, "duration_days": 30 })),
            Some(&admin),
        )
        .await;
    }
    let id = app.progress_id(student, watched).await;
    app.request(
        "POST",
        &format!("/api/student-lessons/{id}/video-view"),
        None,
        Some(&admin),
    )
    .await;

    let res = app
        .request(
            "GET",
            &format!("/api/student-lessons?student_id={student}&status=VIDEO_WATCHED"),
            None,
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    let items = res.body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["lesson_id"], json!(watched));
    assert_eq!(items[0]["status"], json!("VIDEO_WATCHED"));
    assert_eq!(res.body["data"]["total_items"], json!(1));
}
