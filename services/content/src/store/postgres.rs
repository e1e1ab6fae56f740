//! Postgres-backed implementation of the content repository.
//!
//! # Data model
//! Two tables (see `migrations/0001_content.sql`):
//! - `namespace`: one row per distinct namespace name, created on first use and
//!   never removed automatically.
//! - `content`: one row per record, referencing its namespace by id. `slug`
//!   carries a unique constraint, which is what turns a duplicate insert into
//!   [`StoreError::Conflict`].
//!
//! # Consistency / atomicity
//! - `add` resolves (or creates) the namespace and inserts the content row in a
//!   single transaction. If anything fails before commit the transaction is
//!   dropped, which rolls it back, so a failed insert never leaves a fresh
//!   namespace row behind.
//! - `edit` updates the row and re-reads its namespace name inside one
//!   transaction so the returned record is a consistent snapshot.
//! - Namespace find-or-create uses `ON CONFLICT (name) DO UPDATE ... RETURNING`
//!   so two concurrent writers racing on a new namespace both get its id.
//!
//! # Operational notes
//! - Migrations are executed at connect via `sqlx::migrate!("./migrations")`.
//! - Pool sizing and acquire timeouts come from [`PostgresConfig`]; avoid logging
//!   `url` as it may contain credentials.
use super::{ContentRepository, StoreError, StoreResult, validate_new, validate_update};
use crate::config::PostgresConfig;
use crate::model::{Content, ContentUpdate, NewContent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::str::FromStr;
use std::time::Duration;

/// Durable content repository backed by Postgres.
pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape of `content` joined with `namespace`.
#[derive(Debug, Clone, FromRow)]
struct DbContent {
    content_id: i64,
    name: String,
    namespace: String,
    slug: String,
    content: String,
    created_by: String,
    updated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DbContent> for Content {
    fn from(row: DbContent) -> Self {
        Content {
            id: row.content_id,
            name: row.name,
            namespace: row.namespace,
            slug: row.slug,
            content: row.content,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Columns returned by `INSERT`/`UPDATE ... RETURNING` before the namespace
/// name is attached.
#[derive(Debug, Clone, FromRow)]
struct DbContentRow {
    content_id: i64,
    name: String,
    namespace_id: i64,
    slug: String,
    content: String,
    created_by: String,
    updated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DbContentRow {
    fn with_namespace(self, namespace: String) -> Content {
        Content {
            id: self.content_id,
            name: self.name,
            namespace,
            slug: self.slug,
            content: self.content,
            created_by: self.created_by,
            updated_by: self.updated_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_CONTENT: &str = r#"SELECT c.content_id, c.name, n.name AS namespace, c.slug, c.content,
           c.created_by, c.updated_by, c.created_at, c.updated_at
      FROM content c
      JOIN namespace n ON n.namespace_id = c.namespace_id"#;

const RETURNING_ROW: &str = "RETURNING content_id, name, namespace_id, slug, content, created_by, updated_by, created_at, updated_at";

impl PostgresStore {
    /// Connect to Postgres and apply the embedded migrations.
    ///
    /// # Errors
    /// - Malformed URL, connection, or migration failures.
    ///
    /// # Example
    /// ```rust,no_run
    /// use modware_content::config::PostgresConfig;
    /// use modware_content::store::postgres::PostgresStore;
    ///
    /// async fn open(pg: PostgresConfig) {
    ///     let _ = PostgresStore::connect(&pg).await;
    /// }
    /// ```
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;

        // Handlers assume the schema exists; fail startup instead.
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Return the id of `name`, creating the namespace row if needed.
    async fn find_or_create_namespace(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> StoreResult<i64> {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT namespace_id FROM namespace WHERE name = $1")
                .bind(name)
                .fetch_optional(&mut **tx)
                .await?;
        if let Some(id) = existing {
            return Ok(id);
        }
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO namespace (name) VALUES ($1)
               ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
               RETURNING namespace_id"#,
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }
}

#[async_trait]
impl ContentRepository for PostgresStore {
    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Content>> {
        let row = sqlx::query_as::<_, DbContent>(&format!("{SELECT_CONTENT} WHERE c.slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Content::from))
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<Content>> {
        let row =
            sqlx::query_as::<_, DbContent>(&format!("{SELECT_CONTENT} WHERE c.content_id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Content::from))
    }

    async fn add(&self, content: NewContent) -> StoreResult<Content> {
        validate_new(&content)?;
        let mut tx = self.pool.begin().await?;
        let namespace_id = Self::find_or_create_namespace(&mut tx, &content.namespace).await?;

        let insert = sqlx::query_as::<_, DbContentRow>(&format!(
            r#"INSERT INTO content (name, slug, namespace_id, content, created_by, updated_by, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $5, now(), now())
               {RETURNING_ROW}"#
        ))
        .bind(&content.name)
        .bind(&content.slug)
        .bind(namespace_id)
        .bind(&content.content)
        .bind(&content.created_by)
        .fetch_one(&mut *tx)
        .await;
        let row = match insert {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => {
                return Err(StoreError::Conflict(format!(
                    "slug {} already exists",
                    content.slug
                )));
            }
            Err(err) => return Err(err.into()),
        };

        tx.commit().await?;
        Ok(row.with_namespace(content.namespace))
    }

    async fn edit(&self, id: i64, update: ContentUpdate) -> StoreResult<Content> {
        validate_update(&update)?;
        let mut tx = self.pool.begin().await?;
        // `now()` is the transaction start; keep updates strictly after creation.
        let row = sqlx::query_as::<_, DbContentRow>(&format!(
            r#"UPDATE content
                  SET content = $1,
                      updated_by = $2,
                      updated_at = GREATEST(now(), created_at + interval '1 microsecond')
                WHERE content_id = $3
                {RETURNING_ROW}"#
        ))
        .bind(&update.content)
        .bind(&update.updated_by)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("content {id}")))?;

        let namespace: String =
            sqlx::query_scalar("SELECT name FROM namespace WHERE namespace_id = $1")
                .bind(row.namespace_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(row.with_namespace(namespace))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let removed = sqlx::query("DELETE FROM content WHERE content_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if removed.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("content {id}")));
        }
        Ok(())
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM content WHERE content_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}
