use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// Kind of content a course item represents
    ItemType as "item type" {
        Lesson => "lesson",
        Module => "module",
        Assignment => "assignment",
        Quiz => "quiz",
        Exam => "exam",
        Other => "other",
    }
}

impl Default for ItemType {
    fn default() -> Self {
        ItemType::Lesson
    }
}

/// A unit of content inside a course. `course_id` is fixed for the item's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CourseItem {
    pub id: Uuid,
    pub course_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: ItemType,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i32>,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
}

/// Every writable column of an item. Saving an existing item replaces all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub kind: ItemType,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i32>,
    pub is_required: bool,
}

impl ItemFields {
    pub fn into_item(self, id: Uuid, course_id: Uuid, created_at: DateTime<Utc>) -> CourseItem {
        CourseItem {
            id,
            course_id,
            kind: self.kind,
            title: self.title,
            description: self.description,
            position: self.position,
            due_date: self.due_date,
            estimated_minutes: self.estimated_minutes,
            is_required: self.is_required,
            created_at,
        }
    }
}
