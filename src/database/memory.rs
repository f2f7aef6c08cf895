use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Course, CourseChanges, CourseItem, CourseItemProgress, CourseProgress, CourseProgressPatch,
    CourseStatus, ItemFields, ItemProgressPatch, NewCourse,
};
use super::store::CourseStore;

#[derive(Default)]
struct Tables {
    courses: HashMap<Uuid, Course>,
    items: HashMap<Uuid, CourseItem>,
    progress: HashMap<(Uuid, Uuid), CourseProgress>,
    item_progress: HashMap<(Uuid, Uuid), CourseItemProgress>,
}

/// In-process store with the same semantics as the Postgres tables.
///
/// All writes go through one lock, so progress upserts are atomic per key.
/// Item deletion mirrors the foreign keys: item progress is removed and
/// `last_visited_item_id` references are cleared.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn course_progress_rows(&self, course_id: Uuid, user_id: Uuid) -> usize {
        let tables = self.tables.read().await;
        tables
            .progress
            .values()
            .filter(|row| row.course_id == course_id && row.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    async fn insert_course(&self, course: NewCourse) -> Result<Course, DatabaseError> {
        let course = course.into_course(Uuid::new_v4(), Utc::now());
        let mut tables = self.tables.write().await;
        tables.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn find_owned_course(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Course>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .courses
            .get(&id)
            .filter(|c| c.owner_id == owner_id)
            .cloned())
    }

    async fn update_course(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: &CourseChanges,
    ) -> Result<Option<Course>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(course) = tables.courses.get_mut(&id).filter(|c| c.owner_id == owner_id) else {
            return Ok(None);
        };
        changes.apply_to(course, Utc::now());
        Ok(Some(course.clone()))
    }

    async fn list_courses(
        &self,
        owner_id: Uuid,
        status: Option<CourseStatus>,
    ) -> Result<Vec<Course>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut courses: Vec<Course> = tables
            .courses
            .values()
            .filter(|c| c.owner_id == owner_id)
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect();
        courses.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(courses)
    }

    async fn list_items(&self, course_id: Uuid) -> Result<Vec<CourseItem>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut items: Vec<CourseItem> = tables
            .items
            .values()
            .filter(|i| i.course_id == course_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(items)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<CourseItem>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.items.get(&id).cloned())
    }

    async fn insert_item(&self, course_id: Uuid, fields: ItemFields) -> Result<CourseItem, DatabaseError> {
        let item = fields.into_item(Uuid::new_v4(), course_id, Utc::now());
        let mut tables = self.tables.write().await;
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn replace_item(
        &self,
        id: Uuid,
        course_id: Uuid,
        fields: ItemFields,
    ) -> Result<Option<CourseItem>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables.items.get_mut(&id).filter(|i| i.course_id == course_id) else {
            return Ok(None);
        };
        *item = fields.into_item(item.id, item.course_id, item.created_at);
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: Uuid, course_id: Uuid) -> Result<Option<CourseItem>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.items.get(&id).is_some_and(|i| i.course_id == course_id) {
            return Ok(None);
        }
        let removed = tables.items.remove(&id);

        tables.item_progress.retain(|(item_id, _), _| *item_id != id);
        for progress in tables.progress.values_mut() {
            if progress.last_visited_item_id == Some(id) {
                progress.last_visited_item_id = None;
            }
        }

        Ok(removed)
    }

    async fn find_course_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CourseProgress>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.progress.get(&(course_id, user_id)).cloned())
    }

    async fn upsert_course_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        patch: &CourseProgressPatch,
    ) -> Result<CourseProgress, DatabaseError> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let row = tables
            .progress
            .entry((course_id, user_id))
            .and_modify(|row| patch.merge_into(row, now))
            .or_insert_with(|| patch.to_new_row(Uuid::new_v4(), course_id, user_id, now));
        Ok(row.clone())
    }

    async fn upsert_item_progress(
        &self,
        item_id: Uuid,
        user_id: Uuid,
        patch: &ItemProgressPatch,
    ) -> Result<CourseItemProgress, DatabaseError> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let row = tables
            .item_progress
            .entry((item_id, user_id))
            .and_modify(|row| patch.merge_into(row))
            .or_insert_with(|| patch.to_new_row(Uuid::new_v4(), item_id, user_id, now));
        Ok(row.clone())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
