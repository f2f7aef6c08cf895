//! Versioned schema for the course tables.
//!
//! Migrations are applied in order, each inside its own transaction, and
//! recorded in `schema_migrations`. Never edit a released migration; append a
//! new one.

use sqlx::{Executor, PgPool, Row};
use tracing::info;

use super::manager::DatabaseError;

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

const CREATE_MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version BIGINT PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_courses",
        sql: r#"
CREATE TABLE IF NOT EXISTS courses (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    provider TEXT,
    platform TEXT,
    url TEXT,
    level TEXT NOT NULL DEFAULT 'beginner'
        CHECK (level IN ('beginner', 'intermediate', 'advanced')),
    tags TEXT[] NOT NULL DEFAULT '{}',
    status TEXT NOT NULL DEFAULT 'planned'
        CHECK (status IN ('planned', 'in_progress', 'completed', 'dropped')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS courses_owner_id_idx ON courses (owner_id);
"#,
    },
    Migration {
        version: 2,
        name: "create_course_items",
        sql: r#"
CREATE TABLE IF NOT EXISTS course_items (
    id UUID PRIMARY KEY,
    course_id UUID NOT NULL REFERENCES courses (id),
    type TEXT NOT NULL DEFAULT 'lesson'
        CHECK (type IN ('lesson', 'module', 'assignment', 'quiz', 'exam', 'other')),
    title TEXT NOT NULL,
    description TEXT,
    position INTEGER NOT NULL DEFAULT 0,
    due_date TIMESTAMPTZ,
    estimated_minutes INTEGER,
    is_required BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS course_items_course_id_idx ON course_items (course_id, position);
"#,
    },
    Migration {
        version: 3,
        name: "create_course_progress",
        sql: r#"
CREATE TABLE IF NOT EXISTS course_progress (
    id UUID PRIMARY KEY,
    course_id UUID NOT NULL REFERENCES courses (id),
    user_id UUID NOT NULL,
    status TEXT NOT NULL DEFAULT 'not_started'
        CHECK (status IN ('not_started', 'in_progress', 'completed', 'dropped')),
    started_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ,
    completion_percent INTEGER NOT NULL DEFAULT 0
        CHECK (completion_percent BETWEEN 0 AND 100),
    total_items INTEGER NOT NULL DEFAULT 0,
    completed_items INTEGER NOT NULL DEFAULT 0,
    last_visited_item_id UUID REFERENCES course_items (id) ON DELETE SET NULL,
    meta JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT course_progress_course_user_key UNIQUE (course_id, user_id)
);
"#,
    },
    Migration {
        version: 4,
        name: "create_course_item_progress",
        sql: r#"
CREATE TABLE IF NOT EXISTS course_item_progress (
    id UUID PRIMARY KEY,
    item_id UUID NOT NULL REFERENCES course_items (id) ON DELETE CASCADE,
    user_id UUID NOT NULL,
    status TEXT NOT NULL DEFAULT 'not_started'
        CHECK (status IN ('not_started', 'in_progress', 'completed', 'skipped')),
    started_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT course_item_progress_item_user_key UNIQUE (item_id, user_id)
);
"#,
    },
];

/// Versions already recorded in `schema_migrations`, ascending
pub async fn applied_versions(pool: &PgPool) -> Result<Vec<i64>, DatabaseError> {
    pool.execute(CREATE_MIGRATIONS_TABLE).await?;
    let rows = sqlx::query("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| row.try_get::<i64, _>("version").map_err(DatabaseError::from))
        .collect()
}

/// Migrations not yet applied, in the order they would run
pub fn pending(applied: &[i64]) -> Vec<&'static Migration> {
    MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect()
}

/// Apply every pending migration and return the versions that ran
pub async fn run(pool: &PgPool) -> Result<Vec<i64>, DatabaseError> {
    let applied = applied_versions(pool).await?;
    let mut ran = Vec::new();

    for migration in pending(&applied) {
        let mut tx = pool.begin().await?;

        (&mut *tx).execute(migration.sql).await.map_err(|e| {
            DatabaseError::MigrationError(format!(
                "{} ({}) failed: {}",
                migration.version, migration.name, e
            ))
        })?;

        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("Applied migration {} ({})", migration.version, migration.name);
        ran.push(migration.version);
    }

    Ok(ran)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_strictly_increasing() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]), "{:?}", versions);
        assert!(versions[0] > 0);
    }

    #[test]
    fn creates_every_table() {
        for table in ["courses", "course_items", "course_progress", "course_item_progress"] {
            assert!(
                MIGRATIONS
                    .iter()
                    .any(|m| m.sql.contains(&format!("CREATE TABLE IF NOT EXISTS {} ", table))),
                "missing table: {}",
                table
            );
        }
    }

    #[test]
    fn progress_tables_are_unique_per_learner() {
        let all: String = MIGRATIONS.iter().map(|m| m.sql).collect();
        assert!(all.contains("UNIQUE (course_id, user_id)"));
        assert!(all.contains("UNIQUE (item_id, user_id)"));
    }

    #[test]
    fn pending_skips_applied_versions() {
        let left: Vec<i64> = pending(&[1, 2]).iter().map(|m| m.version).collect();
        assert_eq!(left, vec![3, 4]);
        assert_eq!(pending(&[]).len(), MIGRATIONS.len());
    }
}
