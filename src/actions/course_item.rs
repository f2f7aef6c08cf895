use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{is_blank, owned_course, timestamp_or_date, ActionError, FieldErrors, Validate, ValidationError};
use crate::auth::AuthUser;
use crate::database::models::{CourseItem, ItemFields, ItemType};
use crate::database::CourseStore;

/// Create an item, or fully replace one when `id` is present
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCourseItemInput {
    pub id: Option<Uuid>,
    pub course_id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: Option<ItemType>,
    pub description: Option<String>,
    pub position: Option<i32>,
    #[serde(default, deserialize_with = "timestamp_or_date")]
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i32>,
    pub is_required: Option<bool>,
}

impl Validate for SaveCourseItemInput {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.check("title", !is_blank(&self.title), "Title is required");
        if let Some(position) = self.position {
            errors.check("position", position >= 0, "Must be zero or greater");
        }
        if let Some(minutes) = self.estimated_minutes {
            errors.check("estimatedMinutes", minutes >= 0, "Must be zero or greater");
        }
        errors.finish()
    }
}

impl SaveCourseItemInput {
    fn into_fields(self) -> ItemFields {
        ItemFields {
            kind: self.kind.unwrap_or_default(),
            title: self.title,
            description: self.description,
            position: self.position.unwrap_or(0),
            due_date: self.due_date,
            estimated_minutes: self.estimated_minutes,
            is_required: self.is_required.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCourseItemInput {
    pub id: Uuid,
    pub course_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemOutput {
    pub item: CourseItem,
}

pub async fn save_course_item(
    store: &dyn CourseStore,
    user: &AuthUser,
    input: SaveCourseItemInput,
) -> Result<ItemOutput, ActionError> {
    input.validate()?;
    let course = owned_course(store, input.course_id, user).await?;

    let item = match input.id {
        Some(id) => {
            // The item has to already live under this course; items never move.
            store
                .replace_item(id, course.id, input.into_fields())
                .await?
                .ok_or(ActionError::NotFound("Course item"))?
        }
        None => store.insert_item(course.id, input.into_fields()).await?,
    };
    info!("Item {} saved on course {}", item.id, course.id);

    Ok(ItemOutput { item })
}

pub async fn delete_course_item(
    store: &dyn CourseStore,
    user: &AuthUser,
    input: DeleteCourseItemInput,
) -> Result<ItemOutput, ActionError> {
    let course = owned_course(store, input.course_id, user).await?;

    let item = store
        .delete_item(input.id, course.id)
        .await?
        .ok_or(ActionError::NotFound("Course item"))?;
    info!("Item {} deleted from course {}", item.id, course.id);

    Ok(ItemOutput { item })
}
