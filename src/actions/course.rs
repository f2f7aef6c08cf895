use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{explicit_null, is_blank, is_valid_url, owned_course, ActionError, FieldErrors, Validate, ValidationError};
use crate::auth::AuthUser;
use crate::database::models::{Course, CourseChanges, CourseItem, CourseLevel, CourseStatus, NewCourse};
use crate::database::CourseStore;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseInput {
    pub title: String,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub platform: Option<String>,
    pub url: Option<String>,
    pub level: Option<CourseLevel>,
    pub tags: Option<Vec<String>>,
    pub status: Option<CourseStatus>,
}

impl Validate for CreateCourseInput {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.check("title", !is_blank(&self.title), "Title is required");
        if let Some(url) = &self.url {
            errors.check("url", is_valid_url(url), "Must be a valid URL");
        }
        errors.finish()
    }
}

impl CreateCourseInput {
    fn into_new_course(self, owner_id: Uuid) -> NewCourse {
        NewCourse {
            owner_id,
            title: self.title,
            description: self.description,
            provider: self.provider,
            platform: self.platform,
            url: self.url,
            level: self.level.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
        }
    }
}

/// Partial course update; keys that are absent are left alone
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseInput {
    pub id: Uuid,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub provider: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub platform: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub url: Option<Option<String>>,
    pub level: Option<CourseLevel>,
    pub tags: Option<Vec<String>>,
    pub status: Option<CourseStatus>,
}

impl Validate for UpdateCourseInput {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        if let Some(title) = &self.title {
            errors.check("title", !is_blank(title), "Title must not be empty");
        }
        if let Some(Some(url)) = &self.url {
            errors.check("url", is_valid_url(url), "Must be a valid URL");
        }
        errors.finish()
    }
}

impl UpdateCourseInput {
    fn changes(&self) -> CourseChanges {
        CourseChanges {
            title: self.title.clone(),
            description: self.description.clone(),
            provider: self.provider.clone(),
            platform: self.platform.clone(),
            url: self.url.clone(),
            level: self.level,
            tags: self.tags.clone(),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCoursesInput {
    pub status: Option<CourseStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseIdInput {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseOutput {
    pub course: Course,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoursesOutput {
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseWithItemsOutput {
    pub course: Course,
    pub items: Vec<CourseItem>,
}

pub async fn create_course(
    store: &dyn CourseStore,
    user: &AuthUser,
    input: CreateCourseInput,
) -> Result<CourseOutput, ActionError> {
    input.validate()?;

    let course = store.insert_course(input.into_new_course(user.user_id)).await?;
    info!("Course {} created by {}", course.id, user.user_id);

    Ok(CourseOutput { course })
}

pub async fn update_course(
    store: &dyn CourseStore,
    user: &AuthUser,
    input: UpdateCourseInput,
) -> Result<CourseOutput, ActionError> {
    input.validate()?;

    let changes = input.changes();
    if changes.is_empty() {
        debug!("No changes supplied for course {}", input.id);
        let course = owned_course(store, input.id, user).await?;
        return Ok(CourseOutput { course });
    }

    let course = store
        .update_course(input.id, user.user_id, &changes)
        .await?
        .ok_or(ActionError::NotFound("Course"))?;
    info!("Course {} updated by {}", course.id, user.user_id);

    Ok(CourseOutput { course })
}

pub async fn list_my_courses(
    store: &dyn CourseStore,
    user: &AuthUser,
    input: ListCoursesInput,
) -> Result<CoursesOutput, ActionError> {
    let courses = store.list_courses(user.user_id, input.status).await?;
    debug!("Listed {} courses for {}", courses.len(), user.user_id);

    Ok(CoursesOutput { courses })
}

pub async fn get_course_with_items(
    store: &dyn CourseStore,
    user: &AuthUser,
    input: CourseIdInput,
) -> Result<CourseWithItemsOutput, ActionError> {
    let course = owned_course(store, input.id, user).await?;
    let items = store.list_items(course.id).await?;

    Ok(CourseWithItemsOutput { course, items })
}
