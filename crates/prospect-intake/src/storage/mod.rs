//! SQLite-backed implementation of the repository ports.

mod seed;

pub use seed::seed_attorneys;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::prospects::domain::{
    Attorney, AttorneyId, EmailAddress, PageRequest, Prospect, ProspectId, ProspectState, Resume,
    ResumeId,
};
use crate::prospects::repository::{AttorneyDirectory, ProspectRepository, RepositoryError};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS resume (
        id TEXT PRIMARY KEY NOT NULL,
        resume_data TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS prospect (
        id TEXT PRIMARY KEY NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        resume_id TEXT NOT NULL UNIQUE REFERENCES resume (id),
        state TEXT NOT NULL CHECK (state IN ('CREATED', 'PENDING', 'REACHED_OUT')),
        version INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS prospect_updated_at_idx ON prospect (updated_at)",
    "CREATE TABLE IF NOT EXISTS attorney (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        salted_hashed_password TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
];

const PROSPECT_COLUMNS: &str = "p.id, p.first_name, p.last_name, p.email, p.state, p.version, \
     p.created_at, p.updated_at, r.id AS resume_id, r.resume_data, \
     r.created_at AS resume_created_at, r.updated_at AS resume_updated_at";

/// Store over a shared sqlx pool. Implements both repository ports.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Private in-memory database. The pool is pinned to one connection
    /// because every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Creates tables and indexes that do not exist yet.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProspectRepository for SqliteStore {
    async fn insert(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO resume (id, resume_data, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(prospect.resume.id.0.to_string())
        .bind(&prospect.resume.content)
        .bind(encode_timestamp(prospect.resume.created_at))
        .bind(encode_timestamp(prospect.resume.updated_at))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO prospect \
             (id, first_name, last_name, email, resume_id, state, version, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(prospect.id.0.to_string())
        .bind(&prospect.first_name)
        .bind(&prospect.last_name)
        .bind(prospect.email.as_str())
        .bind(prospect.resume.id.0.to_string())
        .bind(prospect.state.label())
        .bind(prospect.version)
        .bind(encode_timestamp(prospect.created_at))
        .bind(encode_timestamp(prospect.updated_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(prospect)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Prospect>, RepositoryError> {
        let sql = format!(
            "SELECT {PROSPECT_COLUMNS} FROM prospect p JOIN resume r ON r.id = p.resume_id \
             WHERE p.email = ? ORDER BY p.updated_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, ProspectRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Prospect::try_from).transpose()
    }

    async fn update(&self, prospect: Prospect) -> Result<Prospect, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE prospect SET first_name = ?, last_name = ?, state = ?, \
             version = version + 1, updated_at = ? WHERE id = ? AND version = ?",
        )
        .bind(&prospect.first_name)
        .bind(&prospect.last_name)
        .bind(prospect.state.label())
        .bind(encode_timestamp(prospect.updated_at))
        .bind(prospect.id.0.to_string())
        .bind(prospect.version)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::Stale);
        }

        sqlx::query("UPDATE resume SET resume_data = ?, updated_at = ? WHERE id = ?")
            .bind(&prospect.resume.content)
            .bind(encode_timestamp(prospect.resume.updated_at))
            .bind(prospect.resume.id.0.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Prospect {
            version: prospect.version + 1,
            ..prospect
        })
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Prospect>, RepositoryError> {
        let sql = format!(
            "SELECT {PROSPECT_COLUMNS} FROM prospect p JOIN resume r ON r.id = p.resume_id \
             ORDER BY p.updated_at DESC, p.rowid DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, ProspectRow>(&sql)
            .bind(i64::from(page.limit()))
            .bind(i64::from(page.offset()))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Prospect::try_from).collect()
    }
}

#[async_trait]
impl AttorneyDirectory for SqliteStore {
    async fn all(&self) -> Result<Vec<Attorney>, RepositoryError> {
        let rows = sqlx::query_as::<_, AttorneyRow>(
            "SELECT id, name, email, salted_hashed_password, created_at, updated_at \
             FROM attorney ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Attorney::try_from).collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Attorney>, RepositoryError> {
        let row = sqlx::query_as::<_, AttorneyRow>(
            "SELECT id, name, email, salted_hashed_password, created_at, updated_at \
             FROM attorney WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Attorney::try_from).transpose()
    }

    async fn insert_if_absent(&self, attorney: Attorney) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO attorney (id, name, email, salted_hashed_password, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) ON CONFLICT (email) DO NOTHING",
        )
        .bind(attorney.id.0.to_string())
        .bind(&attorney.name)
        .bind(&attorney.email)
        .bind(&attorney.password_hash)
        .bind(encode_timestamp(attorney.created_at))
        .bind(encode_timestamp(attorney.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
            other => RepositoryError::Unavailable(other.to_string()),
        }
    }
}

/// Fixed-width UTC text so lexical order in SQL equals chronological order.
fn encode_timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| corrupt("timestamp", raw, err))
}

fn decode_uuid(raw: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(raw).map_err(|err| corrupt("id", raw, err))
}

fn corrupt(column: &str, raw: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Unavailable(format!("corrupt {column} value '{raw}': {err}"))
}

#[derive(Debug, FromRow)]
struct ProspectRow {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    state: String,
    version: i64,
    created_at: String,
    updated_at: String,
    resume_id: String,
    resume_data: String,
    resume_created_at: String,
    resume_updated_at: String,
}

impl TryFrom<ProspectRow> for Prospect {
    type Error = RepositoryError;

    fn try_from(row: ProspectRow) -> Result<Self, Self::Error> {
        Ok(Prospect {
            id: ProspectId(decode_uuid(&row.id)?),
            first_name: row.first_name,
            last_name: row.last_name,
            email: EmailAddress::parse(&row.email).map_err(|err| corrupt("email", &row.email, err))?,
            state: ProspectState::from_str(&row.state)
                .map_err(|err| corrupt("state", &row.state, err))?,
            resume: Resume {
                id: ResumeId(decode_uuid(&row.resume_id)?),
                content: row.resume_data,
                created_at: decode_timestamp(&row.resume_created_at)?,
                updated_at: decode_timestamp(&row.resume_updated_at)?,
            },
            version: row.version,
            created_at: decode_timestamp(&row.created_at)?,
            updated_at: decode_timestamp(&row.updated_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct AttorneyRow {
    id: String,
    name: String,
    email: String,
    salted_hashed_password: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<AttorneyRow> for Attorney {
    type Error = RepositoryError;

    fn try_from(row: AttorneyRow) -> Result<Self, Self::Error> {
        Ok(Attorney {
            id: AttorneyId(decode_uuid(&row.id)?),
            name: row.name,
            email: row.email,
            password_hash: row.salted_hashed_password,
            created_at: decode_timestamp(&row.created_at)?,
            updated_at: decode_timestamp(&row.updated_at)?,
        })
    }
}
