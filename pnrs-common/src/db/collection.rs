//! Named collections of stored documents
//!
//! A collection is one SQLite table holding JSON documents. The phone number
//! and investigation tag are mirrored into indexed columns for lookup.
//! Destination collections carry a unique index on `phone`, which is what
//! makes concurrent transfers of the same number safe.
//!
//! Source collections are managed outside this service: [`Collection::open`]
//! only checks that their table exists and never issues DDL against them.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use super::models::Document;
use crate::{Error, Result};

/// How a collection is used, which decides its indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionRole {
    /// Externally managed records, looked up by phone
    Source,
    /// Tagged copies, at most one per phone
    Destination,
}

impl CollectionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionRole::Source => "source",
            CollectionRole::Destination => "destination",
        }
    }
}

/// Result of inserting into a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored under the returned identifier
    Inserted(String),
    /// Rejected by the unique phone index
    Duplicate,
}

/// Handle to one collection
#[derive(Debug, Clone)]
pub struct Collection {
    pool: SqlitePool,
    name: String,
    role: CollectionRole,
}

impl Collection {
    /// Open the collection `name`.
    ///
    /// A destination gets its table and indexes created if missing. A source
    /// must already exist; a missing source table is a configuration error.
    pub async fn open(pool: SqlitePool, name: &str, role: CollectionRole) -> Result<Self> {
        validate_name(name)?;

        match role {
            CollectionRole::Source => {
                let exists: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                )
                .bind(name)
                .fetch_one(&pool)
                .await?;

                if exists == 0 {
                    return Err(Error::Config(format!(
                        "Source collection '{}' does not exist",
                        name
                    )));
                }
            }
            CollectionRole::Destination => create_schema(&pool, name, role).await?,
        }

        info!("Opened {} collection '{}'", role.as_str(), name);

        Ok(Self {
            pool,
            name: name.to_string(),
            role,
        })
    }

    /// Create the table and indexes for `name` if missing, then open it.
    ///
    /// Used to provision a collection of either role, e.g. to seed a source.
    pub async fn create(pool: SqlitePool, name: &str, role: CollectionRole) -> Result<Self> {
        validate_name(name)?;
        create_schema(&pool, name, role).await?;
        Self::open(pool, name, role).await
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> CollectionRole {
        self.role
    }

    /// Every document whose phone is in `phone_numbers`.
    ///
    /// Unmatched numbers yield nothing; repeated numbers match once.
    pub async fn find_by_phones(&self, phone_numbers: &[String]) -> Result<Vec<Document>> {
        if phone_numbers.is_empty() {
            return Ok(Vec::new());
        }

        let phones_json = serde_json::to_string(phone_numbers)?;
        let sql = format!(
            r#"SELECT id, document FROM "{}"
               WHERE phone IN (SELECT value FROM json_each(?))"#,
            self.name
        );
        let rows = sqlx::query(&sql)
            .bind(phones_json)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(document_from_row).collect()
    }

    /// The first document with this phone, if any
    pub async fn find_one_by_phone(&self, phone: &str) -> Result<Option<Document>> {
        let sql = format!(
            r#"SELECT id, document FROM "{}" WHERE phone = ? LIMIT 1"#,
            self.name
        );
        let row = sqlx::query(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(document_from_row).transpose()
    }

    /// Every document tagged with `invest_id`
    pub async fn find_by_investigation_id(&self, invest_id: &str) -> Result<Vec<Document>> {
        let sql = format!(
            r#"SELECT id, document FROM "{}" WHERE invest_id = ?"#,
            self.name
        );
        let rows = sqlx::query(&sql)
            .bind(invest_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(document_from_row).collect()
    }

    /// Store `document` under a freshly generated identifier.
    ///
    /// Any identifier already on the document is ignored. On a destination
    /// collection a second document for the same phone is reported as
    /// [`InsertOutcome::Duplicate`].
    pub async fn insert(&self, document: &Document) -> Result<InsertOutcome> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(&document.fields)?;

        // Conflict target must match a unique index, which only destinations have
        let on_conflict = match self.role {
            CollectionRole::Destination => "ON CONFLICT (phone) DO NOTHING",
            CollectionRole::Source => "",
        };
        let sql = format!(
            r#"INSERT INTO "{}" (id, phone, invest_id, document, inserted_at)
               VALUES (?, ?, ?, ?, ?) {}"#,
            self.name, on_conflict
        );

        let result = sqlx::query(&sql)
            .bind(&id)
            .bind(document.phone())
            .bind(document.invest_id())
            .bind(body)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted(id))
        }
    }

    /// Number of documents in the collection
    pub async fn count(&self) -> Result<i64> {
        let sql = format!(r#"SELECT COUNT(*) FROM "{}""#, self.name);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

async fn create_schema(pool: &SqlitePool, name: &str, role: CollectionRole) -> Result<()> {
    let create_table = format!(
        r#"CREATE TABLE IF NOT EXISTS "{name}" (
            id TEXT PRIMARY KEY,
            phone TEXT NOT NULL,
            invest_id TEXT,
            document TEXT NOT NULL,
            inserted_at TEXT NOT NULL
        )"#
    );
    sqlx::query(&create_table).execute(pool).await?;

    let phone_index = match role {
        CollectionRole::Source => {
            format!(r#"CREATE INDEX IF NOT EXISTS "idx_{name}_phone" ON "{name}" (phone)"#)
        }
        CollectionRole::Destination => format!(
            r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_{name}_phone" ON "{name}" (phone)"#
        ),
    };
    sqlx::query(&phone_index).execute(pool).await?;

    let invest_index =
        format!(r#"CREATE INDEX IF NOT EXISTS "idx_{name}_invest_id" ON "{name}" (invest_id)"#);
    sqlx::query(&invest_index).execute(pool).await?;

    Ok(())
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Document> {
    let id: String = row.try_get("id")?;
    let body: String = row.try_get("document")?;

    let mut document: Document = serde_json::from_str(&body)?;
    document.id = Some(id);
    Ok(document)
}

/// Collection names are spliced into SQL, so only plain identifiers pass
pub fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!("Invalid collection name: '{}'", name)))
    }
}
