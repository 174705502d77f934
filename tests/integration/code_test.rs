//! Access code generation and single-use redemption.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_generate_code_batch() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let lesson = app.create_lesson("Ownership", 60.0).await;

    let res = app
        .request(
            "POST",
            &format!("/api/lessons/{lesson}/generate-codes?count=5"),
            None,
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    let codes = res.body["data"].as_array().expect("array of codes");
    assert_eq!(codes.len(), 5);
    for code in codes {
        assert_eq!(code["code"].as_str().unwrap().len(), 10);
        assert_eq!(code["is_used"], json!(false));
        assert!(code["used_by_student_id"].is_null());
    }
}

#[tokio::test]
async fn test_generate_zero_codes_rejected() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let lesson = app.create_lesson("Borrowing", 60.0).await;

    let res = app
        .request(
            "POST",
            &format!("/api/lessons/{lesson}/generate-codes?count=0"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_for_unknown_lesson_not_found() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();

    let res = app
        .request(
            "POST",
            &format!("/api/lessons/{}/generate-codes?count=1", uuid::Uuid::new_v4()),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redeem_code_grants_access() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Hedy").await;
    let lesson = app.create_lesson("Frequency hopping", 60.0).await;

    let generated = app
        .request(
            "POST",
            &format!("/api/lessons/{lesson}/generate-codes?count=1"),
            None,
            Some(&admin),
        )
        .await;
    let code = generated.body["data"][0]["code"].as_str().unwrap().to_string();

    let redeemed = app
        .request(
            "POST",
            "/api/codes/redeem",
            Some(json!({ "code": code, "student_id": student })),
            Some(&admin),
        )
        .await;

    assert_eq!(redeemed.status, StatusCode::OK, "{:?}", redeemed.body);
    assert_eq!(redeemed.body["data"]["student_id"], json!(student));
    assert_eq!(redeemed.body["data"]["revoked"], json!(false));
    assert!(!redeemed.body["data"]["expires_at"].is_null());

    // The code is consumed and the progress record exists.
    let listed = app
        .request(
            "GET",
            &format!("/api/lessons/{lesson}/codes"),
            None,
            Some(&admin),
        )
        .await;
    let entry = &listed.body["data"][0];
    assert_eq!(entry["is_used"], json!(true));
    assert_eq!(entry["used_by_student_id"], json!(student));

    let id = app.progress_id(student, lesson).await;
    let row = app
        .request(
            "GET",
            &format!("/api/student-lessons/{id}"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(row.body["data"]["status"], json!("PURCHASED"));
}

#[tokio::test]
async fn test_redeem_code_twice_conflicts() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let first = app.create_student("First").await;
    let second = app.create_student("Second").await;
    let lesson = app.create_lesson("Races", 60.0).await;

    let generated = app
        .request(
            "POST",
            &format!("/api/lessons/{lesson}/generate-codes?count=1"),
            None,
            Some(&admin),
        )
        .await;
    let code = generated.body["data"][0]["code"].as_str().unwrap().to_string();

    let ok = app
        .request(
            "POST",
            "/api/codes/redeem",
            Some(json!({ "code": code, "student_id": first })),
            Some(&admin),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);

    let conflict = app
        .request(
            "POST",
            "/api/codes/redeem",
            Some(json!({ "code": code, "student_id": second })),
            Some(&admin),
        )
        .await;
    assert_eq!(conflict.status, StatusCode::CONFLICT, "{:?}", conflict.body);
    assert_eq!(conflict.body["error"], json!("ALREADY_USED"));
}

#[tokio::test]
async fn test_redeem_unknown_code_not_found() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let student = app.create_student("Nobody").await;

    let res = app
        .request(
            "POST",
            "/api/codes/redeem",
            Some(json!({ "code": "ZZZZZZZZZZ", "student_id": student })),
            Some(&admin),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redeem_while_active_leaves_code_unused() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let admin = app.admin_token();
    let holder = app.create_student("Holder").await;
    let other = app.create_student("Other").await;
    let lesson = app.create_lesson("Conflicts", 60.0).await;

    app.request(
        "POST",
        "/api/student-lessons",
        Some(json!({ "student_id": holder, "lesson_id": lesson, "duration_days": 30 })),
        Some(&admin),
    )
    .await;

    let generated = app
        .request(
            "POST",
            &format!("/api/lessons/{lesson}/generate-codes?count=1"),
            None,
            Some(&admin),
        )
        .await;
    let code = generated.body["data"][0]["code"].as_str().unwrap().to_string();

    // The holder already has an active grant, so redemption fails and
    // must not consume the code.
    let conflict = app
        .request(
            "POST",
            "/api/codes/redeem",
            Some(json!({ "code": code, "student_id": holder })),
            Some(&admin),
        )
        .await;
    assert_eq!(conflict.status, StatusCode::CONFLICT, "{:?}", conflict.body);
    assert_eq!(conflict.body["error"], json!("ALREADY_ACTIVE"));

    let retry = app
        .request(
            "POST",
            "/api/codes/redeem",
            Some(json!({ "code": code, "student_id": other })),
            Some(&admin),
        )
        .await;
    assert_eq!(retry.status, StatusCode::OK, "{:?}", retry.body);
}
