use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// Difficulty a course is pitched at
    CourseLevel as "course level" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

text_enum! {
    /// Owner-facing lifecycle of a course
    CourseStatus as "course status" {
        Planned => "planned",
        InProgress => "in_progress",
        Completed => "completed",
        Dropped => "dropped",
    }
}

impl Default for CourseLevel {
    fn default() -> Self {
        CourseLevel::Beginner
    }
}

impl Default for CourseStatus {
    fn default() -> Self {
        CourseStatus::Planned
    }
}

/// A trackable course, owned and exclusively mutated by `owner_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub platform: Option<String>,
    pub url: Option<String>,
    pub level: CourseLevel,
    pub tags: Vec<String>,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values for a course about to be inserted
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub platform: Option<String>,
    pub url: Option<String>,
    pub level: CourseLevel,
    pub tags: Vec<String>,
    pub status: CourseStatus,
}

impl NewCourse {
    /// Materialize the row with a fresh id; both timestamps are `now`
    pub fn into_course(self, id: Uuid, now: DateTime<Utc>) -> Course {
        Course {
            id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            provider: self.provider,
            platform: self.platform,
            url: self.url,
            level: self.level,
            tags: self.tags,
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a course.
///
/// `None` leaves the column untouched. Nullable columns use a nested option so
/// that `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub provider: Option<Option<String>>,
    pub platform: Option<Option<String>>,
    pub url: Option<Option<String>>,
    pub level: Option<CourseLevel>,
    pub tags: Option<Vec<String>>,
    pub status: Option<CourseStatus>,
}

impl CourseChanges {
    pub fn is_empty(&self) -> bool {
        self == &CourseChanges::default()
    }

    /// Apply the present fields onto an in-memory course and stamp `updated_at`
    pub fn apply_to(&self, course: &mut Course, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            course.title = title.clone();
        }
        if let Some(description) = &self.description {
            course.description = description.clone();
        }
        if let Some(provider) = &self.provider {
            course.provider = provider.clone();
        }
        if let Some(platform) = &self.platform {
            course.platform = platform.clone();
        }
        if let Some(url) = &self.url {
            course.url = url.clone();
        }
        if let Some(level) = self.level {
            course.level = level;
        }
        if let Some(tags) = &self.tags {
            course.tags = tags.clone();
        }
        if let Some(status) = self.status {
            course.status = status;
        }
        course.updated_at = now;
    }
}
