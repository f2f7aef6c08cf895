use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Course, CourseChanges, CourseItem, CourseItemProgress, CourseProgress, CourseProgressPatch,
    CourseStatus, ItemFields, ItemProgressPatch, NewCourse,
};

/// Storage boundary for the course tables.
///
/// Every method is a single statement against the backing store. Ownership
/// rules live in the actions layer; the store only filters by the keys it is
/// handed. Progress upserts are atomic per `(parent id, user id)` key.
#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn insert_course(&self, course: NewCourse) -> Result<Course, DatabaseError>;

    /// Course matching both id and owner
    async fn find_owned_course(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Course>, DatabaseError>;

    /// Apply `changes` to the owned course and stamp `updated_at`
    async fn update_course(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: &CourseChanges,
    ) -> Result<Option<Course>, DatabaseError>;

    /// Owner's courses, oldest first, optionally restricted to one status
    async fn list_courses(
        &self,
        owner_id: Uuid,
        status: Option<CourseStatus>,
    ) -> Result<Vec<Course>, DatabaseError>;

    /// Items of a course ordered by position, then creation time
    async fn list_items(&self, course_id: Uuid) -> Result<Vec<CourseItem>, DatabaseError>;

    async fn find_item(&self, id: Uuid) -> Result<Option<CourseItem>, DatabaseError>;

    async fn insert_item(&self, course_id: Uuid, fields: ItemFields) -> Result<CourseItem, DatabaseError>;

    /// Overwrite every writable column of the item matching `(id, course_id)`
    async fn replace_item(
        &self,
        id: Uuid,
        course_id: Uuid,
        fields: ItemFields,
    ) -> Result<Option<CourseItem>, DatabaseError>;

    /// Delete the item matching `(id, course_id)` and return it
    async fn delete_item(&self, id: Uuid, course_id: Uuid) -> Result<Option<CourseItem>, DatabaseError>;

    async fn find_course_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CourseProgress>, DatabaseError>;

    /// Insert or merge the learner's course progress in one atomic step
    async fn upsert_course_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        patch: &CourseProgressPatch,
    ) -> Result<CourseProgress, DatabaseError>;

    /// Insert or merge the learner's item progress in one atomic step
    async fn upsert_item_progress(
        &self,
        item_id: Uuid,
        user_id: Uuid,
        patch: &ItemProgressPatch,
    ) -> Result<CourseItemProgress, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
