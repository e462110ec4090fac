//! SQLite-backed store
//!
//! Safe with several writers: the UNIQUE(scope, reference) constraint, not the
//! tracker's in-memory check, decides which duplicate insert wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{NewSubmission, RosterEdit, RosterStore, Scope, Submission, SubmissionStore};
use crate::db;
use crate::error::{RosterUpdateError, StoreError};
use crate::roster::{AdminRoster, AdminRosterEntry, Principal};
use crate::symbol::Symbol;

type SubmissionRow = (String, String, String, String, String, i64, DateTime<Utc>);

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap a pool whose schema is already in place
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open or create the database file at `db_path`
    pub async fn open(db_path: &Path) -> crate::Result<Self> {
        Ok(Self::new(db::init_database(db_path).await?))
    }

    /// Fresh in-memory database
    pub async fn memory() -> crate::Result<Self> {
        Ok(Self::new(db::connect_memory().await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn submission_from_row(row: SubmissionRow) -> Result<Submission, StoreError> {
    let (guid, scope, reference, symbol, identity, sequence_index, created_at) = row;

    Ok(Submission {
        id: Uuid::parse_str(&guid)
            .map_err(|e| StoreError::Corrupt(format!("Invalid submission guid {}: {}", guid, e)))?,
        scope: scope.parse()?,
        reference,
        symbol: symbol
            .parse::<Symbol>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        identity,
        sequence_index: u32::try_from(sequence_index).map_err(|_| {
            StoreError::Corrupt(format!("Invalid sequence index {}", sequence_index))
        })?,
        created_at,
    })
}

fn admin_from_row((principal, label): (String, String)) -> Result<AdminRosterEntry, StoreError> {
    let principal = principal
        .parse::<Principal>()
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(AdminRosterEntry::new(principal, label))
}

#[async_trait]
impl SubmissionStore for SqliteStore {
    async fn insert_submission(&self, record: NewSubmission) -> Result<Submission, StoreError> {
        let submission = record.into_submission(Uuid::new_v4(), Utc::now());

        sqlx::query(
            r#"
            INSERT INTO submissions (guid, scope, reference, symbol, identity, sequence_index, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(submission.id.to_string())
        .bind(submission.scope.key())
        .bind(&submission.reference)
        .bind(submission.symbol.to_string())
        .bind(&submission.identity)
        .bind(i64::from(submission.sequence_index))
        .bind(submission.created_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Stored submission {} ({} for {})",
            submission.id, submission.symbol, submission.scope
        );
        Ok(submission)
    }

    async fn list_submissions(&self, scope: Option<&Scope>) -> Result<Vec<Submission>, StoreError> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(
            r#"
            SELECT guid, scope, reference, symbol, identity, sequence_index, created_at
            FROM submissions
            WHERE ?1 IS NULL OR scope = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(scope.map(Scope::key))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(submission_from_row).collect()
    }

    async fn clear_submissions(&self, scope: Option<&Scope>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM submissions WHERE ?1 IS NULL OR scope = ?1")
            .bind(scope.map(Scope::key))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_admins(&self) -> Result<Vec<AdminRosterEntry>, StoreError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT principal, label FROM admins ORDER BY position ASC, rowid ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(admin_from_row).collect()
    }

    async fn is_admin_principal(&self, principal: &Principal) -> Result<bool, StoreError> {
        let found: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admins WHERE principal = ?)")
                .bind(principal.to_string())
                .fetch_one(&self.pool)
                .await?;

        Ok(found != 0)
    }
}

#[async_trait]
impl RosterStore for SqliteStore {
    async fn load_roster(&self) -> Result<AdminRoster, StoreError> {
        let entries = self.list_admins().await?;
        Ok(roster_or_default(entries))
    }

    async fn save_roster(&self, roster: &AdminRoster) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        write_roster(&mut tx, roster).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_roster(&self, edit: RosterEdit) -> Result<AdminRoster, RosterUpdateError> {
        let mut conn = self.pool.acquire().await?;

        // IMMEDIATE takes the write lock up front, so a second editor waits
        // instead of reading the roster this edit is about to replace
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result = edit_roster(&mut conn, edit).await;
        let finish = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };

        if let Err(e) = sqlx::query(finish).execute(&mut *conn).await {
            warn!("Roster transaction {} failed: {}", finish, e);
            if result.is_ok() {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            }
            return Err(e.into());
        }

        result
    }
}

fn roster_or_default(entries: Vec<AdminRosterEntry>) -> AdminRoster {
    AdminRoster::from_entries(entries).unwrap_or_else(|_| {
        warn!("Admin table is empty, using default roster");
        AdminRoster::default()
    })
}

async fn write_roster(conn: &mut SqliteConnection, roster: &AdminRoster) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM admins").execute(&mut *conn).await?;
    for (position, entry) in roster.entries().iter().enumerate() {
        sqlx::query("INSERT INTO admins (principal, label, position) VALUES (?, ?, ?)")
            .bind(entry.principal.to_string())
            .bind(&entry.label)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn edit_roster(
    conn: &mut SqliteConnection,
    edit: RosterEdit,
) -> Result<AdminRoster, RosterUpdateError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT principal, label FROM admins ORDER BY position ASC, rowid ASC")
            .fetch_all(&mut *conn)
            .await?;
    let entries = rows
        .into_iter()
        .map(admin_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let mut roster = roster_or_default(entries);
    edit(&mut roster)?;
    write_roster(conn, &roster).await?;

    debug!("Roster updated to {} admins", roster.len());
    Ok(roster)
}
