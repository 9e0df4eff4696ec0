// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite storage with typed operations.
//!
//! Provides high-level operations for:
//! - Users (upserted on every sign-in)
//! - Projects (owned by a user)
//! - Integrations (one per project and type)
//! - Integration secrets (sealed credential bags)

use crate::db::schema::SQLITE_INIT;
use crate::error::AppError;
use crate::models::{Integration, IntegrationStatus, Project, ProjectType, User};
use crate::registry::IntegrationKind;
use crate::time_utils::now_rfc3339;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Pool, Row, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

pub type SqlitePool = Pool<Sqlite>;

const MAX_CONNECTIONS: u32 = 5;

const USER_COLUMNS: &str = "id, provider, provider_id, email, name, created_at, updated_at";
const PROJECT_COLUMNS: &str =
    "id, user_id, name, description, project_type, created_at, updated_at";
const INTEGRATION_COLUMNS: &str =
    "id, project_id, integration_type, status, display_name, created_at, updated_at";

/// SQLite database handle. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `url` and apply the schema.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        if url.contains(":memory:") {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        tracing::info!(url = %url, "Connected to SQLite");
        Ok(db)
    }

    /// Private in-memory database, used by tests.
    ///
    /// Every connection to `:memory:` is a separate database, so the pool is
    /// pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), AppError> {
        // sqlx::query runs a single statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Insert a Google user, or refresh email (and name, when supplied) of
    /// the existing row with the same provider id.
    pub async fn upsert_google_user(
        &self,
        provider_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<User, AppError> {
        let now = now_rfc3339();
        let sql = format!(
            r#"
            INSERT INTO users (id, provider, provider_id, email, name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(provider_id) DO UPDATE SET
                email = excluded.email,
                name = COALESCE(excluded.name, users.name),
                updated_at = excluded.updated_at
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(crate::models::user::GOOGLE_PROVIDER)
            .bind(provider_id)
            .bind(email)
            .bind(name)
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await?;
        user_from_row(&row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn get_user_by_provider_id(&self, provider_id: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE provider_id = ?");
        let row = sqlx::query(&sql)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ─── Project Operations ──────────────────────────────────────

    pub async fn insert_project(
        &self,
        user_id: Uuid,
        name: &str,
        description: Option<&str>,
        project_type: ProjectType,
    ) -> Result<Project, AppError> {
        let now = now_rfc3339();
        let sql = format!(
            r#"
            INSERT INTO projects (id, user_id, name, description, project_type, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {PROJECT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(user_id.to_string())
            .bind(name)
            .bind(description)
            .bind(project_type.as_str())
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await?;
        project_from_row(&row)
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(project_from_row).transpose()
    }

    /// Projects owned by `user_id`, newest first.
    pub async fn list_projects_for_user(&self, user_id: Uuid) -> Result<Vec<Project>, AppError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ? \
             ORDER BY created_at DESC, rowid DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(project_from_row).collect()
    }

    pub async fn count_projects(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ─── Integration Operations ──────────────────────────────────

    pub async fn list_integrations(&self, project_id: Uuid) -> Result<Vec<Integration>, AppError> {
        let sql = format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations WHERE project_id = ? \
             ORDER BY created_at ASC, rowid ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(project_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(integration_from_row).collect()
    }

    pub async fn get_integration(
        &self,
        project_id: Uuid,
        kind: IntegrationKind,
    ) -> Result<Option<Integration>, AppError> {
        let sql = format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations \
             WHERE project_id = ? AND integration_type = ?"
        );
        let row = sqlx::query(&sql)
            .bind(project_id.to_string())
            .bind(kind.backend_type())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(integration_from_row).transpose()
    }

    /// Create a PENDING integration with no credentials.
    ///
    /// Returns [`AppError::Conflict`] when the project already has one of
    /// this type.
    pub async fn insert_pending_integration(
        &self,
        project_id: Uuid,
        kind: IntegrationKind,
        display_name: &str,
    ) -> Result<Integration, AppError> {
        let now = now_rfc3339();
        let sql = format!(
            r#"
            INSERT INTO integrations (id, project_id, integration_type, status, display_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(project_id, integration_type) DO NOTHING
            RETURNING {INTEGRATION_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(project_id.to_string())
            .bind(kind.backend_type())
            .bind(IntegrationStatus::Pending.as_str())
            .bind(display_name)
            .bind(&now)
            .bind(&now)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => integration_from_row(&row),
            None => Err(AppError::Conflict(format!(
                "{} integration already exists for this project",
                kind.name()
            ))),
        }
    }

    /// Mark the (project, type) integration CONNECTED and store its sealed
    /// credentials, in one transaction.
    ///
    /// `seal` receives the integration id (new or existing) and returns the
    /// sealed bag. If it fails nothing is written.
    pub async fn save_connected_integration<F>(
        &self,
        project_id: Uuid,
        kind: IntegrationKind,
        display_name: &str,
        seal: F,
    ) -> Result<Integration, AppError>
    where
        F: FnOnce(Uuid) -> Result<String, AppError>,
    {
        let now = now_rfc3339();
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO integrations (id, project_id, integration_type, status, display_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(project_id, integration_type) DO UPDATE SET
                status = excluded.status,
                display_name = excluded.display_name,
                updated_at = excluded.updated_at
            RETURNING {INTEGRATION_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(project_id.to_string())
            .bind(kind.backend_type())
            .bind(IntegrationStatus::Connected.as_str())
            .bind(display_name)
            .bind(&now)
            .bind(&now)
            .fetch_one(&mut *tx)
            .await?;
        let integration = integration_from_row(&row)?;

        let sealed = seal(integration.id)?;
        write_secret(&mut *tx, integration.id, kind, &sealed, &now).await?;

        tx.commit().await?;
        Ok(integration)
    }

    /// Replace the sealed credentials of an existing integration and mark it
    /// CONNECTED. Callers verify the credentials first.
    pub async fn update_integration_secret(
        &self,
        integration_id: Uuid,
        kind: IntegrationKind,
        sealed: &str,
    ) -> Result<Integration, AppError> {
        let now = now_rfc3339();
        let mut tx = self.pool.begin().await?;

        write_secret(&mut *tx, integration_id, kind, sealed, &now).await?;

        let sql = format!(
            "UPDATE integrations SET status = ?, updated_at = ? WHERE id = ? RETURNING {INTEGRATION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(IntegrationStatus::Connected.as_str())
            .bind(&now)
            .bind(integration_id.to_string())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        integration_from_row(&row)
    }

    /// Sealed credential bag for an integration, if one was stored.
    pub async fn get_integration_secret(
        &self,
        integration_id: Uuid,
    ) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT secret FROM integration_secrets WHERE integration_id = ?")
                .bind(integration_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(secret,)| secret))
    }

    pub async fn set_integration_status(
        &self,
        integration_id: Uuid,
        status: IntegrationStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE integrations SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now_rfc3339())
            .bind(integration_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_integrations(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM integrations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// ─── Helper Methods ────────────────────────────────────────────

async fn write_secret<'e, E>(
    executor: E,
    integration_id: Uuid,
    kind: IntegrationKind,
    sealed: &str,
    now: &str,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO integration_secrets (integration_id, provider, secret, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(integration_id) DO UPDATE SET
            secret = excluded.secret,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(integration_id.to_string())
    .bind(kind.backend_type())
    .bind(sealed)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid, AppError> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw)
        .map_err(|e| AppError::Database(format!("Invalid uuid in column {}: {}", column, e)))
}

fn user_from_row(row: &SqliteRow) -> Result<User, AppError> {
    Ok(User {
        id: uuid_column(row, "id")?,
        provider: row.try_get("provider")?,
        provider_id: row.try_get("provider_id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn project_from_row(row: &SqliteRow) -> Result<Project, AppError> {
    let project_type: String = row.try_get("project_type")?;
    Ok(Project {
        id: uuid_column(row, "id")?,
        user_id: uuid_column(row, "user_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        project_type: project_type.parse::<ProjectType>().map_err(AppError::Database)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn integration_from_row(row: &SqliteRow) -> Result<Integration, AppError> {
    let integration_type: String = row.try_get("integration_type")?;
    let status: String = row.try_get("status")?;
    Ok(Integration {
        id: uuid_column(row, "id")?,
        project_id: uuid_column(row, "project_id")?,
        integration_type: integration_type.parse::<IntegrationKind>().map_err(AppError::Database)?,
        status: status.parse::<IntegrationStatus>().map_err(AppError::Database)?,
        display_name: row.try_get("display_name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
