//! ArangoDB-backed implementation of the content repository.
//!
//! # Purpose
//! Stores every record as one document in a single collection, spoken over the
//! ArangoDB HTTP API with `reqwest`.
//!
//! # Collection layout
//! - Documents carry `name`, `namespace`, `slug`, `content`, `created_by`,
//!   `updated_by`, `created_on` and `updated_on`; the numeric `_key` is the
//!   record id (`autoincrement` key generator).
//! - A JSON schema (level `strict`) is attached at creation and rejects
//!   structurally invalid documents with error 1620.
//! - `content_slug_idx` is a unique persistent index on `slug`; a duplicate
//!   insert fails with error 1210, surfaced as [`StoreError::Conflict`].
//! - `content_namespace_idx` is a plain persistent index on `namespace`.
//!
//! # Startup
//! [`ArangoStore::connect`] creates the database, collection and indexes when
//! missing. Index creation is idempotent on the server side, so restarting the
//! service against an existing collection is a no-op.
use super::{ContentRepository, StoreError, StoreResult, validate_new, validate_update};
use crate::config::ArangoConfig;
use crate::model::{Content, ContentUpdate, NewContent};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

const ERROR_DOCUMENT_NOT_FOUND: i64 = 1202;
const ERROR_UNIQUE_CONSTRAINT_VIOLATED: i64 = 1210;
const ERROR_SCHEMA_VIOLATION: i64 = 1620;

const FIND_BY_SLUG: &str = r#"
    FOR c IN @@collection
        FILTER c.slug == @slug
        LIMIT 1
        RETURN c
"#;

const INSERT_CONTENT: &str = r#"
    LET now = DATE_ISO8601(DATE_NOW())
    INSERT {
        name: @name,
        slug: @slug,
        namespace: @namespace,
        created_by: @created_by,
        updated_by: @created_by,
        content: @content,
        created_on: now,
        updated_on: now
    } INTO @@collection
    RETURN NEW
"#;

// DATE_NOW has millisecond resolution; bump past created_on when they collide.
const UPDATE_CONTENT: &str = r#"
    FOR c IN @@collection
        FILTER c._key == @key
        UPDATE c WITH {
            content: @content,
            updated_by: @updated_by,
            updated_on: DATE_ISO8601(MAX([DATE_NOW(), DATE_TIMESTAMP(c.created_on) + 1]))
        } IN @@collection
        RETURN NEW
"#;

/// Document shape as stored in the collection.
#[derive(Debug, Clone, Deserialize)]
struct ContentDoc {
    #[serde(rename = "_key")]
    key: String,
    name: String,
    namespace: String,
    slug: String,
    content: String,
    created_by: String,
    #[serde(default)]
    updated_by: Option<String>,
    created_on: DateTime<Utc>,
    #[serde(default)]
    updated_on: Option<DateTime<Utc>>,
}

impl TryFrom<ContentDoc> for Content {
    type Error = StoreError;

    fn try_from(doc: ContentDoc) -> StoreResult<Self> {
        let id = doc
            .key
            .parse::<i64>()
            .map_err(|_| StoreError::Unexpected(anyhow!("non-numeric document key {}", doc.key)))?;
        Ok(Content {
            id,
            name: doc.name,
            namespace: doc.namespace,
            slug: doc.slug,
            content: doc.content,
            updated_by: doc.updated_by.unwrap_or_else(|| doc.created_by.clone()),
            created_by: doc.created_by,
            created_at: doc.created_on,
            updated_at: doc.updated_on.unwrap_or(doc.created_on),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ArangoErrorBody {
    #[serde(rename = "errorNum")]
    error_num: i64,
    #[serde(rename = "errorMessage", default)]
    error_message: String,
}

#[derive(Debug, Deserialize)]
struct CursorResponse<T> {
    result: Vec<T>,
}

/// Durable content repository backed by an ArangoDB collection.
pub struct ArangoStore {
    client: reqwest::Client,
    server_url: String,
    database: String,
    collection: String,
    username: String,
    password: String,
}

impl ArangoStore {
    /// Connect to ArangoDB and make sure the database, collection and indexes
    /// exist.
    pub async fn connect(config: &ArangoConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        let store = Self {
            client,
            server_url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            collection: config.collection.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        };
        store.ensure_database().await?;
        store.ensure_collection().await?;
        store
            .ensure_index(json!({
                "type": "persistent",
                "fields": ["slug"],
                "unique": true,
                "inBackground": true,
                "name": "content_slug_idx",
            }))
            .await?;
        store
            .ensure_index(json!({
                "type": "persistent",
                "fields": ["namespace"],
                "inBackground": true,
                "name": "content_namespace_idx",
            }))
            .await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/_db/{}{}", self.server_url, self.database, path);
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    fn document_path(&self, id: i64) -> String {
        format!("/_api/document/{}/{}", self.collection, id)
    }

    async fn ensure_database(&self) -> StoreResult<()> {
        let response = self
            .request(Method::GET, "/_api/database/current")
            .send()
            .await?;
        if response.status() != StatusCode::NOT_FOUND {
            check(response).await?;
            return Ok(());
        }
        let url = format!("{}/_db/_system/_api/database", self.server_url);
        let response = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&json!({ "name": self.database }))
            .send()
            .await?;
        // A concurrent starter may have created it first.
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        check(response).await?;
        tracing::info!(database = %self.database, "created arangodb database");
        Ok(())
    }

    async fn ensure_collection(&self) -> StoreResult<()> {
        let response = self
            .request(
                Method::GET,
                &format!("/_api/collection/{}", self.collection),
            )
            .send()
            .await?;
        if response.status() != StatusCode::NOT_FOUND {
            check(response).await?;
            return Ok(());
        }
        let response = self
            .request(Method::POST, "/_api/collection")
            .json(&json!({
                "name": self.collection,
                "keyOptions": { "type": "autoincrement", "allowUserKeys": false },
                "schema": {
                    "rule": content_schema(),
                    "level": "strict",
                    "message": "content document failed schema validation",
                },
            }))
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        check(response).await?;
        tracing::info!(collection = %self.collection, "created arangodb collection");
        Ok(())
    }

    async fn ensure_index(&self, definition: Value) -> StoreResult<()> {
        let response = self
            .request(Method::POST, "/_api/index")
            .query(&[("collection", self.collection.as_str())])
            .json(&definition)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, bind_vars: Value) -> StoreResult<Vec<T>> {
        let response = self
            .request(Method::POST, "/_api/cursor")
            .json(&json!({ "query": query, "bindVars": bind_vars }))
            .send()
            .await?;
        let cursor: CursorResponse<T> = check(response).await?.json().await?;
        Ok(cursor.result)
    }

    async fn single(&self, query: &str, bind_vars: Value) -> StoreResult<Option<Content>> {
        self.query::<ContentDoc>(query, bind_vars)
            .await?
            .into_iter()
            .next()
            .map(Content::try_from)
            .transpose()
    }
}

#[async_trait]
impl ContentRepository for ArangoStore {
    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Content>> {
        self.single(
            FIND_BY_SLUG,
            json!({ "@collection": self.collection, "slug": slug }),
        )
        .await
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<Content>> {
        let response = self
            .request(Method::GET, &self.document_path(id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: ContentDoc = check(response).await?.json().await?;
        Content::try_from(doc).map(Some)
    }

    async fn add(&self, content: NewContent) -> StoreResult<Content> {
        validate_new(&content)?;
        self.single(
            INSERT_CONTENT,
            json!({
                "@collection": self.collection,
                "name": content.name,
                "slug": content.slug,
                "namespace": content.namespace,
                "created_by": content.created_by,
                "content": content.content,
            }),
        )
        .await?
        .ok_or_else(|| StoreError::Unexpected(anyhow!("insert returned no document")))
    }

    async fn edit(&self, id: i64, update: ContentUpdate) -> StoreResult<Content> {
        validate_update(&update)?;
        self.single(
            UPDATE_CONTENT,
            json!({
                "@collection": self.collection,
                "key": id.to_string(),
                "content": update.content,
                "updated_by": update.updated_by,
            }),
        )
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("content {id}")))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let response = self
            .request(Method::DELETE, &self.document_path(id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("content {id}")));
        }
        check(response).await?;
        Ok(())
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        let response = self
            .request(Method::HEAD, &self.document_path(id))
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(StoreError::Unexpected(anyhow!(
                "document head request failed with {status}"
            ))),
        }
    }

    async fn health_check(&self) -> StoreResult<()> {
        let response = self.request(Method::GET, "/_api/version").send().await?;
        check(response).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "arangodb"
    }
}

/// Pass successful responses through, translate ArangoDB error bodies.
async fn check(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(match serde_json::from_str::<ArangoErrorBody>(&body) {
        Ok(error) => classify(error),
        Err(_) => StoreError::Unexpected(anyhow!("arangodb returned {status}: {body}")),
    })
}

fn classify(error: ArangoErrorBody) -> StoreError {
    match error.error_num {
        ERROR_UNIQUE_CONSTRAINT_VIOLATED => StoreError::Conflict(error.error_message),
        ERROR_SCHEMA_VIOLATION => StoreError::Validation(error.error_message),
        ERROR_DOCUMENT_NOT_FOUND => StoreError::NotFound(error.error_message),
        num => StoreError::Unexpected(anyhow!("arangodb error {num}: {}", error.error_message)),
    }
}

fn content_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "namespace": { "type": "string", "minLength": 1 },
            "slug": { "type": "string", "minLength": 1 },
            "content": { "type": "string" },
            "created_by": { "type": "string", "format": "email" },
            "updated_by": { "type": "string", "format": "email" },
            "created_on": { "type": "string", "format": "date-time" },
            "updated_on": { "type": "string", "format": "date-time" }
        },
        "required": ["name", "namespace", "slug", "content", "created_by", "created_on"]
    })
}
