//! Runs against a real Postgres when TEST_DATABASE_URL is set; skipped otherwise.

mod common;

use std::sync::Arc;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use course_tracker::config::{DatabaseConfig, StorageBackend};
use course_tracker::database::models::{CourseLevel, CourseProgressPatch, CourseStatus, ItemFields, ItemType, NewCourse};
use course_tracker::database::{migrations, CourseStore, DatabaseManager, PgRepository};

async fn repository() -> Result<Option<PgRepository>> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping Postgres store test");
        return Ok(None);
    };

    let config = DatabaseConfig {
        backend: StorageBackend::Postgres,
        url: Some(url),
        max_connections: 5,
        connection_timeout: 5,
        run_migrations: true,
    };
    let manager = DatabaseManager::connect(&config).await?;
    migrations::run(manager.pool()).await?;
    Ok(Some(PgRepository::new(manager.pool().clone())))
}

fn new_course(owner_id: Uuid, title: &str) -> NewCourse {
    NewCourse {
        owner_id,
        title: title.to_string(),
        description: Some("stored in postgres".to_string()),
        provider: None,
        platform: None,
        url: None,
        level: CourseLevel::Advanced,
        tags: vec!["sql".to_string(), "rust".to_string()],
        status: CourseStatus::Planned,
    }
}

#[tokio::test]
async fn migrations_are_idempotent() -> Result<()> {
    let Some(repo) = repository().await? else { return Ok(()) };

    let again = migrations::run(repo.pool()).await?;
    assert!(again.is_empty());

    let applied = migrations::applied_versions(repo.pool()).await?;
    assert!(migrations::pending(&applied).is_empty());
    Ok(())
}

#[tokio::test]
async fn enum_and_array_columns_round_trip() -> Result<()> {
    let Some(repo) = repository().await? else { return Ok(()) };
    let owner = Uuid::new_v4();

    let course = repo.insert_course(new_course(owner, "Postgres internals")).await?;
    let found = repo.find_owned_course(course.id, owner).await?.expect("course stored");
    assert_eq!(found.level, CourseLevel::Advanced);
    assert_eq!(found.tags, vec!["sql", "rust"]);
    assert!(repo.find_owned_course(course.id, Uuid::new_v4()).await?.is_none());

    let item = repo
        .insert_item(
            course.id,
            ItemFields {
                kind: ItemType::Exam,
                title: "Final".to_string(),
                description: None,
                position: 9,
                due_date: None,
                estimated_minutes: Some(90),
                is_required: false,
            },
        )
        .await?;
    let items = repo.list_items(course.id).await?;
    assert_eq!(items, vec![item]);
    Ok(())
}

#[tokio::test]
async fn concurrent_upserts_share_one_row() -> Result<()> {
    let Some(repo) = repository().await? else { return Ok(()) };
    let repo = Arc::new(repo);
    let learner = Uuid::new_v4();
    let course = repo.insert_course(new_course(learner, "Race me")).await?;

    let mut handles = Vec::new();
    for percent in [5, 15, 25, 35, 45, 55, 65, 75] {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            let patch = CourseProgressPatch { completion_percent: Some(percent), ..Default::default() };
            repo.upsert_course_progress(course.id, learner, &patch).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??.id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM course_progress WHERE course_id = $1 AND user_id = $2")
        .bind(course.id)
        .bind(learner)
        .fetch_one(repo.pool())
        .await?;
    assert_eq!(rows, 1);
    Ok(())
}

#[tokio::test]
async fn deleting_an_item_clears_last_visited() -> Result<()> {
    let Some(repo) = repository().await? else { return Ok(()) };
    let learner = Uuid::new_v4();
    let course = repo.insert_course(new_course(learner, "Cascade")).await?;
    let item = repo
        .insert_item(
            course.id,
            ItemFields {
                kind: ItemType::Lesson,
                title: "Gone soon".to_string(),
                description: None,
                position: 0,
                due_date: None,
                estimated_minutes: None,
                is_required: true,
            },
        )
        .await?;

    let patch = CourseProgressPatch { last_visited_item_id: Some(item.id), ..Default::default() };
    repo.upsert_course_progress(course.id, learner, &patch).await?;
    repo.delete_item(item.id, course.id).await?.expect("item deleted");

    let progress = repo.find_course_progress(course.id, learner).await?.expect("progress kept");
    assert_eq!(progress.last_visited_item_id, None);
    Ok(())
}

#[tokio::test]
async fn http_flow_against_postgres() -> Result<()> {
    let Some(repo) = repository().await? else { return Ok(()) };
    let server = common::spawn_server_with(Arc::new(repo)).await?;
    let (_, token) = common::new_user()?;

    let (status, body) = server
        .action("createCourse", Some(&token), json!({ "title": "Intro to Go", "tags": ["go"] }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let course_id = body["data"]["course"]["id"].clone();

    let (status, body) = server
        .action("updateCourse", Some(&token), json!({ "id": course_id, "description": null, "status": "in_progress" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["course"]["status"], "in_progress");
    assert_eq!(body["data"]["course"]["description"], serde_json::Value::Null);
    assert_eq!(body["data"]["course"]["tags"], json!(["go"]));

    let (status, body) = server
        .action("upsertCourseProgress", Some(&token), json!({ "courseId": course_id, "status": "completed" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["progress"]["completedAt"].is_string());
    Ok(())
}
