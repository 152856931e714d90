//! Defines the core data model and database queries for ledger records.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::Error;

// ============================================================================
// MODELS
// ============================================================================

/// Alias for the integer type used for mapping to database IDs.
pub type RecordId = i64;

/// Whether a record represents money received or money spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl RecordType {
    /// The wire representation of the record type.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Income => "INCOME",
            RecordType::Expense => "EXPENSE",
        }
    }
}

impl std::str::FromStr for RecordType {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "INCOME" => Ok(RecordType::Income),
            "EXPENSE" => Ok(RecordType::Expense),
            other => Err(Error::InvalidRecordType(other.to_owned())),
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for RecordType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RecordType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse::<RecordType>()
            .map_err(|error| FromSqlError::Other(error.to_string().into()))
    }
}

/// A dated income or expense entry, optionally referencing an attached image.
///
/// To create a new `Record`, use [Record::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The ID of the record.
    pub id: RecordId,
    /// The day the money moved.
    pub date: Date,
    /// Whether the record is income or an expense.
    #[serde(rename = "type")]
    pub kind: RecordType,
    /// The category the record belongs to.
    ///
    /// Drawn from a client-defined list; the service stores it verbatim.
    pub category: String,
    /// The non-negative amount of money; its meaning is given by the type.
    pub amount: f64,
    /// Optional free-text notes.
    pub notes: Option<String>,
    /// The public URL of the attached image, if any.
    pub attachment_url: Option<String>,
    /// When the record was inserted. Assigned by the store and immutable;
    /// the tie-breaker when ordering records with equal dates.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Record {
    /// Create a new record.
    ///
    /// Shortcut for [RecordBuilder] for discoverability.
    pub fn build(date: Date, kind: RecordType, category: &str, amount: f64) -> RecordBuilder {
        RecordBuilder {
            date,
            kind,
            category: category.to_owned(),
            amount,
            notes: None,
            attachment_url: None,
        }
    }
}

/// The caller-controlled fields of a record.
///
/// Used both to insert a new record and to rewrite an existing record's
/// fields on update; `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBuilder {
    /// The day the money moved.
    pub date: Date,
    /// Whether the record is income or an expense.
    pub kind: RecordType,
    /// The category the record belongs to.
    pub category: String,
    /// The non-negative amount of money.
    pub amount: f64,
    /// Optional free-text notes.
    pub notes: Option<String>,
    /// The public URL of the attached image, if any.
    pub attachment_url: Option<String>,
}

impl RecordBuilder {
    /// Set the notes for the record.
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Set the attachment URL for the record.
    pub fn attachment_url(mut self, attachment_url: Option<String>) -> Self {
        self.attachment_url = attachment_url;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new record in the database from a builder.
///
/// The store assigns `id` and `created_at`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_record(builder: RecordBuilder, connection: &Connection) -> Result<Record, Error> {
    let created_at = timestamp_millis(OffsetDateTime::now_utc());

    let record = connection
        .prepare(
            "INSERT INTO records (date, type, category, amount, notes, attachment_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, date, type, category, amount, notes, attachment_url, created_at",
        )?
        .query_row(
            (
                builder.date,
                builder.kind,
                builder.category,
                builder.amount,
                builder.notes,
                builder.attachment_url,
                created_at,
            ),
            map_record_row,
        )?;

    Ok(record)
}

/// Retrieve a record from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid record,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_record(id: RecordId, connection: &Connection) -> Result<Record, Error> {
    let record = connection
        .prepare(
            "SELECT id, date, type, category, amount, notes, attachment_url, created_at
             FROM records WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_record_row)?;

    Ok(record)
}

/// Rewrite the caller-controlled fields of the record `id`.
///
/// `created_at` is never touched, so the stored insertion order survives
/// updates.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingRecord] if `id` does not refer to a valid record,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_record(
    id: RecordId,
    builder: &RecordBuilder,
    connection: &Connection,
) -> Result<Record, Error> {
    let rows_affected = connection.execute(
        "UPDATE records
         SET date = ?1, type = ?2, category = ?3, amount = ?4, notes = ?5, attachment_url = ?6
         WHERE id = ?7",
        (
            &builder.date,
            &builder.kind,
            &builder.category,
            builder.amount,
            &builder.notes,
            &builder.attachment_url,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRecord);
    }

    get_record(id, connection)
}

/// Delete the record `id` from the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingRecord] if `id` does not refer to a valid record,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_record(id: RecordId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM records WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecord);
    }

    Ok(())
}

/// Create the records table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_records_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                type TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                notes TEXT,
                attachment_url TEXT,
                created_at INTEGER NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('records', 0)",
        (),
    )?;

    // Composite index matching the fixed query order.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_records_date_created_at ON records(date, created_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Record.
pub fn map_record_row(row: &Row) -> Result<Record, rusqlite::Error> {
    let created_at_millis: i64 = row.get(7)?;
    let created_at = OffsetDateTime::from_unix_timestamp_nanos(created_at_millis as i128 * 1_000_000)
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                rusqlite::types::Type::Integer,
                Box::new(error),
            )
        })?;

    Ok(Record {
        id: row.get(0)?,
        date: row.get(1)?,
        kind: row.get(2)?,
        category: row.get(3)?,
        amount: row.get(4)?,
        notes: row.get(5)?,
        attachment_url: row.get(6)?,
        created_at,
    })
}

/// Milliseconds since the Unix epoch, the storage form of `created_at`.
///
/// Stored as an integer so the ordering comparison is numeric.
fn timestamp_millis(datetime: OffsetDateTime) -> i64 {
    (datetime.unix_timestamp_nanos() / 1_000_000) as i64
}

// ============================================================================
// TESTS
// ============================================================================
