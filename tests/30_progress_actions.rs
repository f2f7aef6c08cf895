mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn course_with_item(server: &common::TestServer, token: &str) -> Result<(Value, Value)> {
    let (_, body) = server
        .action("createCourse", Some(token), json!({ "title": "Rust Async" }))
        .await?;
    let course_id = body["data"]["course"]["id"].clone();

    let (_, body) = server
        .action("saveCourseItem", Some(token), json!({ "courseId": course_id, "title": "Futures" }))
        .await?;
    Ok((course_id, body["data"]["item"]["id"].clone()))
}

#[tokio::test]
async fn course_progress_upserts_merge_into_one_row() -> Result<()> {
    let server = common::spawn_server().await?;
    let (user_id, token) = common::new_user()?;
    let (course_id, item_id) = course_with_item(&server, &token).await?;

    let (status, body) = server.action("getCourseProgress", Some(&token), json!({ "courseId": course_id })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["progress"], Value::Null);

    let (status, body) = server
        .action(
            "upsertCourseProgress",
            Some(&token),
            json!({
                "courseId": course_id,
                "status": "in_progress",
                "completionPercent": 50,
                "lastVisitedItemId": item_id,
                "meta": { "device": "laptop" }
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let first = body["data"]["progress"].clone();
    assert_eq!(first["userId"], user_id.to_string());
    assert!(first["startedAt"].is_string());

    let (_, body) = server
        .action("upsertCourseProgress", Some(&token), json!({ "courseId": course_id, "totalItems": 4 }))
        .await?;
    let second = &body["data"]["progress"];
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["status"], "in_progress");
    assert_eq!(second["completionPercent"], 50);
    assert_eq!(second["totalItems"], 4);
    assert_eq!(second["lastVisitedItemId"], item_id);
    assert_eq!(second["meta"], json!({ "device": "laptop" }));
    assert_eq!(second["startedAt"], first["startedAt"]);

    let (_, body) = server.action("getCourseProgress", Some(&token), json!({ "courseId": course_id })).await?;
    assert_eq!(body["data"]["progress"]["id"], first["id"]);
    Ok(())
}

#[tokio::test]
async fn concurrent_first_upserts_create_a_single_row() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = common::new_user()?;
    let (course_id, _) = course_with_item(&server, &token).await?;

    let url = server.url("/api/actions/upsertCourseProgress");
    let mut handles = Vec::new();
    for percent in [10, 20, 30, 40, 50, 60] {
        let client = server.client().clone();
        let (url, token) = (url.clone(), token.clone());
        let body = json!({ "courseId": course_id, "completionPercent": percent });
        handles.push(tokio::spawn(async move {
            client.post(url).bearer_auth(token).json(&body).send().await?.json::<Value>().await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let body = handle.await??;
        assert_eq!(body["success"], true);
        ids.push(body["data"]["progress"]["id"].clone());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    Ok(())
}

#[tokio::test]
async fn progress_validation_and_ownership() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, owner) = common::new_user()?;
    let (_, stranger) = common::new_user()?;
    let (course_id, item_id) = course_with_item(&server, &owner).await?;

    let (status, body) = server
        .action("upsertCourseProgress", Some(&owner), json!({ "courseId": course_id, "completionPercent": 150 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["completionPercent"].is_string());

    let (status, _) = server
        .action("upsertCourseProgress", Some(&owner), json!({ "courseId": course_id, "status": "paused" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .action("upsertCourseProgress", Some(&stranger), json!({ "courseId": course_id }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server
        .action("updateCourseItemProgress", Some(&stranger), json!({ "itemId": item_id }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn item_progress_keeps_earlier_fields() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = common::new_user()?;
    let (_, item_id) = course_with_item(&server, &token).await?;

    let (status, body) = server
        .action(
            "updateCourseItemProgress",
            Some(&token),
            json!({ "itemId": item_id, "status": "in_progress", "notes": "pin vs box" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let first = body["data"]["progress"].clone();

    let (_, body) = server
        .action(
            "updateCourseItemProgress",
            Some(&token),
            json!({ "itemId": item_id, "status": "completed", "completedAt": "2024-05-01T12:00:00Z" }),
        )
        .await?;
    let second = &body["data"]["progress"];
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["status"], "completed");
    assert_eq!(second["notes"], "pin vs box");
    assert!(second["completedAt"].as_str().is_some_and(|s| s.starts_with("2024-05-01T12:00:00")));
    Ok(())
}
