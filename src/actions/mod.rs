//! Authorization-scoped use cases over the course store.
//!
//! Every action takes the acting user explicitly and a typed, already
//! deserialized input. Inputs are validated before any storage access.

pub mod course;
pub mod course_item;
pub mod progress;

pub use course::{
    create_course, get_course_with_items, list_my_courses, update_course, CourseIdInput,
    CourseOutput, CourseWithItemsOutput, CoursesOutput, CreateCourseInput, ListCoursesInput,
    UpdateCourseInput,
};
pub use course_item::{
    delete_course_item, save_course_item, DeleteCourseItemInput, ItemOutput, SaveCourseItemInput,
};
pub use progress::{
    get_course_progress, update_course_item_progress, upsert_course_progress,
    GetCourseProgressInput, ProgressOutput, UpdateItemProgressInput, UpsertCourseProgressInput,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::Course;
use crate::database::{CourseStore, DatabaseError};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: HashMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: HashMap::new(),
        }
    }
}

/// Collects per-field problems and turns them into one `ValidationError`
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn check(&mut self, field: &str, ok: bool, problem: &str) {
        if !ok {
            self.0.entry(field.to_string()).or_insert_with(|| problem.to_string());
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                message: "Invalid input".to_string(),
                field_errors: self.0,
            })
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Deserialize an action payload; shape and enum errors become validation errors
pub fn parse_input<T: DeserializeOwned>(payload: Value) -> Result<T, ValidationError> {
    serde_json::from_value(payload).map_err(|e| ValidationError::new(format!("Invalid input: {}", e)))
}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
/// Use together with `#[serde(default)]`.
pub(crate) fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
/// Use together with `#[serde(default)]`.
pub(crate) fn timestamp_or_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| D::Error::custom(format!("expected an RFC 3339 timestamp or YYYY-MM-DD date, got `{}`", raw)))
}

pub(crate) fn is_valid_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Load a course only if the acting user owns it
pub(crate) async fn owned_course(
    store: &dyn CourseStore,
    course_id: Uuid,
    user: &AuthUser,
) -> Result<Course, ActionError> {
    store
        .find_owned_course(course_id, user.user_id)
        .await?
        .ok_or(ActionError::NotFound("Course"))
}
