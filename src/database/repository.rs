use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Course, CourseChanges, CourseItem, CourseItemProgress, CourseProgress, CourseProgressPatch,
    CourseStatus, ItemFields, ItemProgressPatch, NewCourse, ProgressStatus,
};
use super::store::CourseStore;

const COURSE_COLUMNS: &str = "id, owner_id, title, description, provider, platform, url, level, tags, status, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, course_id, type, title, description, position, due_date, estimated_minutes, is_required, created_at";
const PROGRESS_COLUMNS: &str = "id, course_id, user_id, status, started_at, completed_at, completion_percent, total_items, completed_items, last_visited_item_id, meta, created_at, updated_at";
const ITEM_PROGRESS_COLUMNS: &str = "id, item_id, user_id, status, started_at, completed_at, notes, created_at";

/// Postgres-backed course store
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CourseStore for PgRepository {
    async fn insert_course(&self, course: NewCourse) -> Result<Course, DatabaseError> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO courses ({COURSE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
             RETURNING {COURSE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Course>(&sql)
            .bind(Uuid::new_v4())
            .bind(course.owner_id)
            .bind(course.title)
            .bind(course.description)
            .bind(course.provider)
            .bind(course.platform)
            .bind(course.url)
            .bind(course.level)
            .bind(course.tags)
            .bind(course.status)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_owned_course(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Course>, DatabaseError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 AND owner_id = $2");
        let row = sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_course(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: &CourseChanges,
    ) -> Result<Option<Course>, DatabaseError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE courses SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(title) = &changes.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &changes.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(provider) = &changes.provider {
            qb.push(", provider = ").push_bind(provider.clone());
        }
        if let Some(platform) = &changes.platform {
            qb.push(", platform = ").push_bind(platform.clone());
        }
        if let Some(url) = &changes.url {
            qb.push(", url = ").push_bind(url.clone());
        }
        if let Some(level) = changes.level {
            qb.push(", level = ").push_bind(level);
        }
        if let Some(tags) = &changes.tags {
            qb.push(", tags = ").push_bind(tags.clone());
        }
        if let Some(status) = changes.status {
            qb.push(", status = ").push_bind(status);
        }

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND owner_id = ")
            .push_bind(owner_id)
            .push(" RETURNING ")
            .push(COURSE_COLUMNS);

        let row = qb.build_query_as::<Course>().fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn list_courses(
        &self,
        owner_id: Uuid,
        status: Option<CourseStatus>,
    ) -> Result<Vec<Course>, DatabaseError> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses \
             WHERE owner_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, Course>(&sql)
            .bind(owner_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_items(&self, course_id: Uuid) -> Result<Vec<CourseItem>, DatabaseError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM course_items WHERE course_id = $1 ORDER BY position, created_at, id"
        );
        let rows = sqlx::query_as::<_, CourseItem>(&sql)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<CourseItem>, DatabaseError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM course_items WHERE id = $1");
        let row = sqlx::query_as::<_, CourseItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_item(&self, course_id: Uuid, fields: ItemFields) -> Result<CourseItem, DatabaseError> {
        let sql = format!(
            "INSERT INTO course_items ({ITEM_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CourseItem>(&sql)
            .bind(Uuid::new_v4())
            .bind(course_id)
            .bind(fields.kind)
            .bind(fields.title)
            .bind(fields.description)
            .bind(fields.position)
            .bind(fields.due_date)
            .bind(fields.estimated_minutes)
            .bind(fields.is_required)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn replace_item(
        &self,
        id: Uuid,
        course_id: Uuid,
        fields: ItemFields,
    ) -> Result<Option<CourseItem>, DatabaseError> {
        let sql = format!(
            "UPDATE course_items SET \
                type = $3, title = $4, description = $5, position = $6, \
                due_date = $7, estimated_minutes = $8, is_required = $9 \
             WHERE id = $1 AND course_id = $2 \
             RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CourseItem>(&sql)
            .bind(id)
            .bind(course_id)
            .bind(fields.kind)
            .bind(fields.title)
            .bind(fields.description)
            .bind(fields.position)
            .bind(fields.due_date)
            .bind(fields.estimated_minutes)
            .bind(fields.is_required)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_item(&self, id: Uuid, course_id: Uuid) -> Result<Option<CourseItem>, DatabaseError> {
        let sql = format!("DELETE FROM course_items WHERE id = $1 AND course_id = $2 RETURNING {ITEM_COLUMNS}");
        let row = sqlx::query_as::<_, CourseItem>(&sql)
            .bind(id)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_course_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CourseProgress>, DatabaseError> {
        let sql = format!("SELECT {PROGRESS_COLUMNS} FROM course_progress WHERE course_id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, CourseProgress>(&sql)
            .bind(course_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert_course_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        patch: &CourseProgressPatch,
    ) -> Result<CourseProgress, DatabaseError> {
        // $4 status, $5 now, $6..$8 counters, $9 last visited item, $10 meta, $11 completed literal
        let sql = format!(
            "INSERT INTO course_progress ({PROGRESS_COLUMNS}) \
             VALUES ( \
                $1, $2, $3, COALESCE($4, 'not_started'), $5, \
                CASE WHEN COALESCE($4, 'not_started') = $11 THEN $5 END, \
                COALESCE($6, 0), COALESCE($7, 0), COALESCE($8, 0), $9, $10, $5, $5 \
             ) \
             ON CONFLICT (course_id, user_id) DO UPDATE SET \
                status = COALESCE($4, course_progress.status), \
                completion_percent = COALESCE($6, course_progress.completion_percent), \
                total_items = COALESCE($7, course_progress.total_items), \
                completed_items = COALESCE($8, course_progress.completed_items), \
                last_visited_item_id = COALESCE($9, course_progress.last_visited_item_id), \
                meta = COALESCE($10, course_progress.meta), \
                completed_at = CASE \
                    WHEN course_progress.completed_at IS NULL \
                         AND COALESCE($4, course_progress.status) = $11 THEN $5 \
                    ELSE course_progress.completed_at \
                END, \
                updated_at = $5 \
             RETURNING {PROGRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CourseProgress>(&sql)
            .bind(Uuid::new_v4())
            .bind(course_id)
            .bind(user_id)
            .bind(patch.status)
            .bind(Utc::now())
            .bind(patch.completion_percent)
            .bind(patch.total_items)
            .bind(patch.completed_items)
            .bind(patch.last_visited_item_id)
            .bind(patch.meta.clone())
            .bind(ProgressStatus::Completed)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert_item_progress(
        &self,
        item_id: Uuid,
        user_id: Uuid,
        patch: &ItemProgressPatch,
    ) -> Result<CourseItemProgress, DatabaseError> {
        let sql = format!(
            "INSERT INTO course_item_progress ({ITEM_PROGRESS_COLUMNS}) \
             VALUES ($1, $2, $3, COALESCE($4, 'not_started'), $5, $6, $7, $8) \
             ON CONFLICT (item_id, user_id) DO UPDATE SET \
                status = COALESCE($4, course_item_progress.status), \
                started_at = COALESCE($5, course_item_progress.started_at), \
                completed_at = COALESCE($6, course_item_progress.completed_at), \
                notes = COALESCE($7, course_item_progress.notes) \
             RETURNING {ITEM_PROGRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CourseItemProgress>(&sql)
            .bind(Uuid::new_v4())
            .bind(item_id)
            .bind(user_id)
            .bind(patch.status)
            .bind(patch.started_at)
            .bind(patch.completed_at)
            .bind(patch.notes.clone())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
