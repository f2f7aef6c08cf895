use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::{owned_course, timestamp_or_date, ActionError, FieldErrors, Validate, ValidationError};
use crate::auth::AuthUser;
use crate::database::models::{
    CourseItemProgress, CourseProgress, CourseProgressPatch, ItemProgressPatch, ItemProgressStatus,
    ProgressStatus,
};
use crate::database::CourseStore;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCourseProgressInput {
    pub course_id: Uuid,
    pub status: Option<ProgressStatus>,
    pub completion_percent: Option<i32>,
    pub total_items: Option<i32>,
    pub completed_items: Option<i32>,
    pub last_visited_item_id: Option<Uuid>,
    pub meta: Option<Value>,
}

impl Validate for UpsertCourseProgressInput {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        if let Some(percent) = self.completion_percent {
            errors.check("completionPercent", (0..=100).contains(&percent), "Must be between 0 and 100");
        }
        if let Some(total) = self.total_items {
            errors.check("totalItems", total >= 0, "Must be zero or greater");
        }
        if let Some(completed) = self.completed_items {
            errors.check("completedItems", completed >= 0, "Must be zero or greater");
        }
        errors.finish()
    }
}

impl UpsertCourseProgressInput {
    fn patch(self) -> CourseProgressPatch {
        CourseProgressPatch {
            status: self.status,
            completion_percent: self.completion_percent,
            total_items: self.total_items,
            completed_items: self.completed_items,
            last_visited_item_id: self.last_visited_item_id,
            meta: self.meta,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemProgressInput {
    pub item_id: Uuid,
    pub status: Option<ItemProgressStatus>,
    #[serde(default, deserialize_with = "timestamp_or_date")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp_or_date")]
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl UpdateItemProgressInput {
    fn patch(self) -> ItemProgressPatch {
        ItemProgressPatch {
            status: self.status,
            started_at: self.started_at,
            completed_at: self.completed_at,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCourseProgressInput {
    pub course_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressOutput<P> {
    pub progress: P,
}

pub async fn upsert_course_progress(
    store: &dyn CourseStore,
    user: &AuthUser,
    input: UpsertCourseProgressInput,
) -> Result<ProgressOutput<CourseProgress>, ActionError> {
    input.validate()?;
    let course = owned_course(store, input.course_id, user).await?;

    if let Some(item_id) = input.last_visited_item_id {
        let belongs = store
            .find_item(item_id)
            .await?
            .is_some_and(|item| item.course_id == course.id);
        if !belongs {
            return Err(ActionError::NotFound("Course item"));
        }
    }

    let progress = store
        .upsert_course_progress(course.id, user.user_id, &input.patch())
        .await?;
    info!(
        "Progress on course {} for {} is {} ({}%)",
        course.id, user.user_id, progress.status, progress.completion_percent
    );

    Ok(ProgressOutput { progress })
}

pub async fn update_course_item_progress(
    store: &dyn CourseStore,
    user: &AuthUser,
    input: UpdateItemProgressInput,
) -> Result<ProgressOutput<CourseItemProgress>, ActionError> {
    let item = store
        .find_item(input.item_id)
        .await?
        .ok_or(ActionError::NotFound("Course item"))?;
    owned_course(store, item.course_id, user).await?;

    let progress = store
        .upsert_item_progress(item.id, user.user_id, &input.patch())
        .await?;
    info!("Progress on item {} for {} is {}", item.id, user.user_id, progress.status);

    Ok(ProgressOutput { progress })
}

pub async fn get_course_progress(
    store: &dyn CourseStore,
    user: &AuthUser,
    input: GetCourseProgressInput,
) -> Result<ProgressOutput<Option<CourseProgress>>, ActionError> {
    let course = owned_course(store, input.course_id, user).await?;
    let progress = store.find_course_progress(course.id, user.user_id).await?;
    debug!("Progress lookup on course {} for {}: {}", course.id, user.user_id, progress.is_some());

    Ok(ProgressOutput { progress })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::{course_for, store, user};
    use crate::actions::{parse_input, save_course_item, SaveCourseItemInput};
    use serde_json::json;

    #[tokio::test]
    async fn sequential_upserts_touch_one_row_and_keep_unsupplied_fields() {
        let store = store();
        let learner = user();
        let course = course_for(&store, &learner, "Intro to Go").await;

        let input = parse_input(json!({
            "courseId": course.id,
            "status": "in_progress",
            "completionPercent": 25,
            "totalItems": 8,
            "meta": { "streak": 3 }
        }))
        .unwrap();
        let first = upsert_course_progress(&store, &learner, input).await.unwrap().progress;

        let input = parse_input(json!({ "courseId": course.id, "completedItems": 2 })).unwrap();
        let second = upsert_course_progress(&store, &learner, input).await.unwrap().progress;

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, ProgressStatus::InProgress);
        assert_eq!(second.completion_percent, 25);
        assert_eq!(second.total_items, 8);
        assert_eq!(second.completed_items, 2);
        assert_eq!(second.meta, Some(json!({ "streak": 3 })));
        assert_eq!(second.started_at, first.started_at);
        assert_eq!(store.course_progress_rows(course.id, learner.user_id).await, 1);
    }

    #[tokio::test]
    async fn first_upsert_fills_defaults() {
        let store = store();
        let learner = user();
        let course = course_for(&store, &learner, "Intro to Go").await;

        let input = parse_input(json!({ "courseId": course.id })).unwrap();
        let progress = upsert_course_progress(&store, &learner, input).await.unwrap().progress;

        assert_eq!(progress.status, ProgressStatus::NotStarted);
        assert_eq!(progress.completion_percent, 0);
        assert_eq!(progress.total_items, 0);
        assert_eq!(progress.completed_items, 0);
        assert!(progress.started_at.is_some());
        assert_eq!(progress.user_id, learner.user_id);
    }

    #[tokio::test]
    async fn upsert_validates_ranges_and_ownership() {
        let store = store();
        let owner = user();
        let course = course_for(&store, &owner, "Intro to Go").await;

        let input = parse_input(json!({ "courseId": course.id, "completionPercent": 101 })).unwrap();
        match upsert_course_progress(&store, &owner, input).await {
            Err(ActionError::Validation(err)) => assert!(err.field_errors.contains_key("completionPercent")),
            other => panic!("expected validation error, got {:?}", other),
        }

        let input = parse_input(json!({ "courseId": course.id })).unwrap();
        assert!(matches!(
            upsert_course_progress(&store, &user(), input).await,
            Err(ActionError::NotFound("Course"))
        ));
    }

    #[tokio::test]
    async fn last_visited_item_must_belong_to_the_course() {
        let store = store();
        let owner = user();
        let course = course_for(&store, &owner, "Go").await;
        let other = course_for(&store, &owner, "Rust").await;

        let input: SaveCourseItemInput = parse_input(json!({ "courseId": other.id, "title": "Borrowck" })).unwrap();
        let foreign = save_course_item(&store, &owner, input).await.unwrap().item;

        let input = parse_input(json!({ "courseId": course.id, "lastVisitedItemId": foreign.id })).unwrap();
        assert!(matches!(
            upsert_course_progress(&store, &owner, input).await,
            Err(ActionError::NotFound("Course item"))
        ));

        let input: SaveCourseItemInput = parse_input(json!({ "courseId": course.id, "title": "Goroutines" })).unwrap();
        let own = save_course_item(&store, &owner, input).await.unwrap().item;
        let input = parse_input(json!({ "courseId": course.id, "lastVisitedItemId": own.id })).unwrap();
        let progress = upsert_course_progress(&store, &owner, input).await.unwrap().progress;
        assert_eq!(progress.last_visited_item_id, Some(own.id));
    }

    #[tokio::test]
    async fn item_progress_merges_over_existing_values() {
        let store = store();
        let owner = user();
        let course = course_for(&store, &owner, "Go").await;
        let input: SaveCourseItemInput = parse_input(json!({ "courseId": course.id, "title": "Lesson 1" })).unwrap();
        let item = save_course_item(&store, &owner, input).await.unwrap().item;

        let input = parse_input(json!({
            "itemId": item.id,
            "status": "in_progress",
            "startedAt": "2024-03-01T10:00:00Z",
            "notes": "halfway"
        }))
        .unwrap();
        let first = update_course_item_progress(&store, &owner, input).await.unwrap().progress;

        let input = parse_input(json!({ "itemId": item.id, "status": "completed" })).unwrap();
        let second = update_course_item_progress(&store, &owner, input).await.unwrap().progress;

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, ItemProgressStatus::Completed);
        assert_eq!(second.started_at, first.started_at);
        assert_eq!(second.notes.as_deref(), Some("halfway"));
        assert_eq!(second.completed_at, None);
    }

    #[tokio::test]
    async fn item_progress_requires_item_and_course_ownership() {
        let store = store();
        let owner = user();
        let course = course_for(&store, &owner, "Go").await;
        let input: SaveCourseItemInput = parse_input(json!({ "courseId": course.id, "title": "Lesson 1" })).unwrap();
        let item = save_course_item(&store, &owner, input).await.unwrap().item;

        let input = parse_input(json!({ "itemId": Uuid::new_v4() })).unwrap();
        assert!(matches!(
            update_course_item_progress(&store, &owner, input).await,
            Err(ActionError::NotFound("Course item"))
        ));

        let input = parse_input(json!({ "itemId": item.id })).unwrap();
        assert!(matches!(
            update_course_item_progress(&store, &user(), input).await,
            Err(ActionError::NotFound("Course"))
        ));
    }

    #[tokio::test]
    async fn get_progress_is_null_until_first_upsert() {
        let store = store();
        let owner = user();
        let course = course_for(&store, &owner, "Go").await;

        let input = GetCourseProgressInput { course_id: course.id };
        assert!(get_course_progress(&store, &owner, input.clone()).await.unwrap().progress.is_none());

        let upsert = parse_input(json!({ "courseId": course.id, "status": "completed" })).unwrap();
        upsert_course_progress(&store, &owner, upsert).await.unwrap();

        let progress = get_course_progress(&store, &owner, input).await.unwrap().progress.unwrap();
        assert_eq!(progress.status, ProgressStatus::Completed);
        assert!(progress.completed_at.is_some());
    }
}
