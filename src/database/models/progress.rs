use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// A learner's aggregate state on a course
    ProgressStatus as "progress status" {
        NotStarted => "not_started",
        InProgress => "in_progress",
        Completed => "completed",
        Dropped => "dropped",
    }
}

text_enum! {
    /// A learner's state on a single item
    ItemProgressStatus as "item progress status" {
        NotStarted => "not_started",
        InProgress => "in_progress",
        Completed => "completed",
        Skipped => "skipped",
    }
}

impl Default for ProgressStatus {
    fn default() -> Self {
        ProgressStatus::NotStarted
    }
}

impl Default for ItemProgressStatus {
    fn default() -> Self {
        ItemProgressStatus::NotStarted
    }
}

/// One learner's progress on a course, unique per `(course_id, user_id)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub status: ProgressStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_percent: i32,
    pub total_items: i32,
    pub completed_items: i32,
    pub last_visited_item_id: Option<Uuid>,
    pub meta: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One learner's progress on an item, unique per `(item_id, user_id)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CourseItemProgress {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub status: ItemProgressStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied course progress fields; `None` means "keep what is stored"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseProgressPatch {
    pub status: Option<ProgressStatus>,
    pub completion_percent: Option<i32>,
    pub total_items: Option<i32>,
    pub completed_items: Option<i32>,
    pub last_visited_item_id: Option<Uuid>,
    pub meta: Option<Value>,
}

impl CourseProgressPatch {
    /// Row produced when no progress exists yet for the key
    pub fn to_new_row(&self, id: Uuid, course_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> CourseProgress {
        let status = self.status.unwrap_or_default();
        CourseProgress {
            id,
            course_id,
            user_id,
            status,
            started_at: Some(now),
            completed_at: (status == ProgressStatus::Completed).then_some(now),
            completion_percent: self.completion_percent.unwrap_or(0),
            total_items: self.total_items.unwrap_or(0),
            completed_items: self.completed_items.unwrap_or(0),
            last_visited_item_id: self.last_visited_item_id,
            meta: self.meta.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overlay supplied fields onto an existing row. `started_at` is preserved;
    /// `completed_at` is stamped once, the first time the status is completed.
    pub fn merge_into(&self, row: &mut CourseProgress, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            row.status = status;
        }
        if let Some(percent) = self.completion_percent {
            row.completion_percent = percent;
        }
        if let Some(total) = self.total_items {
            row.total_items = total;
        }
        if let Some(completed) = self.completed_items {
            row.completed_items = completed;
        }
        if let Some(item_id) = self.last_visited_item_id {
            row.last_visited_item_id = Some(item_id);
        }
        if let Some(meta) = &self.meta {
            row.meta = Some(meta.clone());
        }
        if row.completed_at.is_none() && row.status == ProgressStatus::Completed {
            row.completed_at = Some(now);
        }
        row.updated_at = now;
    }
}

/// Caller-supplied item progress fields; `None` means "keep what is stored"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemProgressPatch {
    pub status: Option<ItemProgressStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl ItemProgressPatch {
    pub fn to_new_row(&self, id: Uuid, item_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> CourseItemProgress {
        CourseItemProgress {
            id,
            item_id,
            user_id,
            status: self.status.unwrap_or_default(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            notes: self.notes.clone(),
            created_at: now,
        }
    }

    pub fn merge_into(&self, row: &mut CourseItemProgress) {
        if let Some(status) = self.status {
            row.status = status;
        }
        if let Some(started_at) = self.started_at {
            row.started_at = Some(started_at);
        }
        if let Some(completed_at) = self.completed_at {
            row.completed_at = Some(completed_at);
        }
        if let Some(notes) = &self.notes {
            row.notes = Some(notes.clone());
        }
    }
}
