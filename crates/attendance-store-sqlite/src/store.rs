// crates/attendance-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Attendance Store
// Description: Catalog and enrollment persistence backed by SQLite.
// Purpose: Serve enrollment reads and atomic writes with durable storage.
// Dependencies: attendance-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteAttendanceStore`] keeps one writer connection behind a mutex and a
//! small round-robin pool of reader connections. All writes run on the writer
//! inside a transaction. Enrollment inserts use `BEGIN IMMEDIATE` and an
//! `ON CONFLICT DO NOTHING` guard on the `(program_id, account_id)` primary
//! key; a zero-row insert reads back the existing status in the same
//! transaction and reports [`InsertOutcome::AlreadyEnrolled`].
//!
//! Stored identifiers are decoded fail-closed: a non-positive
//! key surfaces as [`SqliteStoreError::Corrupt`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use attendance_core::AccountId;
use attendance_core::AttendeeView;
use attendance_core::CatalogSnapshot;
use attendance_core::EnrolledProgramView;
use attendance_core::Enrollment;
use attendance_core::EnrollmentStatus;
use attendance_core::EnrollmentStore;
use attendance_core::InsertOutcome;
use attendance_core::Program;
use attendance_core::ProgramCatalog;
use attendance_core::ProgramId;
use attendance_core::StoreError;
use attendance_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default number of reader connections.
const DEFAULT_READ_POOL_SIZE: usize = 4;
/// Upper bound on reader connections.
pub const MAX_READ_POOL_SIZE: usize = 64;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Program columns in [`ProgramRow::read`] order.
const PROGRAM_COLUMNS: &str = "p.program_id, p.program_name, p.program_type, p.program_date, \
                               p.description, p.organizer, p.location, p.url, p.image_url, \
                               p.is_disabled";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` attendance store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Number of reader connections.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default tuning.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            read_pool_size: DEFAULT_READ_POOL_SIZE,
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default read connection pool size.
const fn default_read_pool_size() -> usize {
    DEFAULT_READ_POOL_SIZE
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Messages carry engine detail for operators and are never sent to clients.
#[derive(Debug, Clone, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored data failed integrity checks.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid configuration or input.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps an engine error into [`SqliteStoreError::Db`].
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Rows written by a catalog import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogImportSummary {
    /// Programs inserted or updated.
    pub programs: usize,
    /// Accounts inserted or updated.
    pub accounts: usize,
}

/// `SQLite`-backed catalog and enrollment store.
#[derive(Clone)]
pub struct SqliteAttendanceStore {
    /// Writer connection guarded by a mutex.
    write_connection: Arc<Mutex<Connection>>,
    /// Reader connections used round-robin.
    read_connections: Arc<Vec<Mutex<Connection>>>,
    /// Next reader index.
    read_cursor: Arc<AtomicUsize>,
}

impl SqliteAttendanceStore {
    /// Opens the store, creating the schema when the file is new.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path or tuning is invalid, or the
    /// database cannot be opened or initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        validate_read_pool_size(config.read_pool_size)?;
        ensure_parent_dir(&config.path)?;
        let mut write_connection = open_connection(&config)?;
        initialize_schema(&mut write_connection)?;
        let mut read_connections = Vec::with_capacity(config.read_pool_size);
        for _ in 0 .. config.read_pool_size {
            let mut read_connection = open_connection(&config)?;
            initialize_schema(&mut read_connection)?;
            read_connections.push(Mutex::new(read_connection));
        }
        Ok(Self {
            write_connection: Arc::new(Mutex::new(write_connection)),
            read_connections: Arc::new(read_connections),
            read_cursor: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Upserts every program and account in a snapshot in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when any row fails to write; no rows are
    /// written in that case.
    pub fn import_catalog(
        &self,
        snapshot: &CatalogSnapshot,
    ) -> Result<CatalogImportSummary, SqliteStoreError> {
        let mut guard = self
            .write_connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("writer mutex poisoned".to_string()))?;
        let tx = guard.transaction().map_err(db_error)?;
        for program in &snapshot.programs {
            tx.execute(
                "INSERT INTO programs (program_id, program_name, program_type, program_date, \
                 description, organizer, location, url, image_url, is_disabled) VALUES (?1, ?2, \
                 ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) ON CONFLICT(program_id) DO UPDATE SET \
                 program_name = excluded.program_name, program_type = excluded.program_type, \
                 program_date = excluded.program_date, description = excluded.description, \
                 organizer = excluded.organizer, location = excluded.location, url = \
                 excluded.url, image_url = excluded.image_url, is_disabled = excluded.is_disabled",
                params![
                    encode_program_id(program.program_id)?,
                    program.program_name,
                    program.program_type,
                    program.date.map(Timestamp::as_unix_millis),
                    program.description,
                    program.organizer,
                    program.location,
                    program.url,
                    program.image_url,
                    program.is_disabled
                ],
            )
            .map_err(db_error)?;
        }
        for account in &snapshot.accounts {
            tx.execute(
                "INSERT INTO accounts (account_id, username, full_name) VALUES (?1, ?2, ?3) ON \
                 CONFLICT(account_id) DO UPDATE SET username = excluded.username, full_name = \
                 excluded.full_name",
                params![encode_account_id(account.account_id)?, account.username, account.full_name],
            )
            .map_err(db_error)?;
        }
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(CatalogImportSummary {
            programs: snapshot.programs.len(),
            accounts: snapshot.accounts.len(),
        })
    }

    /// Returns the next read connection using round-robin selection.
    fn read_connection(&self) -> &Mutex<Connection> {
        let len = self.read_connections.len();
        let index = self.read_cursor.fetch_add(1, Ordering::Relaxed) % len;
        &self.read_connections[index]
    }

    /// Runs a read-only operation on a pooled reader.
    fn with_reader<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let guard = self
            .read_connection()
            .lock()
            .map_err(|_| SqliteStoreError::Db("reader mutex poisoned".to_string()))?;
        op(&guard)
    }

    /// Inserts an enrollment unless the pair already exists.
    fn insert_enrollment_row(
        &self,
        enrollment: &Enrollment,
    ) -> Result<InsertOutcome, SqliteStoreError> {
        let program_id = encode_program_id(enrollment.program_id)?;
        let account_id = encode_account_id(enrollment.account_id)?;
        let mut guard = self
            .write_connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("writer mutex poisoned".to_string()))?;
        let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_error)?;
        let inserted = tx
            .execute(
                "INSERT INTO program_attendees (program_id, account_id, registration_date, \
                 status) VALUES (?1, ?2, ?3, ?4) ON CONFLICT(program_id, account_id) DO NOTHING",
                params![
                    program_id,
                    account_id,
                    enrollment.registration_date.as_unix_millis(),
                    enrollment.status.as_str()
                ],
            )
            .map_err(db_error)?;
        let outcome = if inserted == 0 {
            let existing: String = tx
                .query_row(
                    "SELECT status FROM program_attendees WHERE program_id = ?1 AND account_id = \
                     ?2",
                    params![program_id, account_id],
                    |row| row.get(0),
                )
                .map_err(db_error)?;
            InsertOutcome::AlreadyEnrolled(EnrollmentStatus::from(existing))
        } else {
            InsertOutcome::Created
        };
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(outcome)
    }

    /// Deletes an enrollment row.
    fn delete_enrollment_row(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<bool, SqliteStoreError> {
        let program_id = encode_program_id(program_id)?;
        let account_id = encode_account_id(account_id)?;
        let guard = self
            .write_connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("writer mutex poisoned".to_string()))?;
        let deleted = guard
            .execute(
                "DELETE FROM program_attendees WHERE program_id = ?1 AND account_id = ?2",
                params![program_id, account_id],
            )
            .map_err(db_error)?;
        drop(guard);
        Ok(deleted > 0)
    }

    /// Loads an active program.
    fn find_active_program(
        &self,
        program_id: ProgramId,
    ) -> Result<Option<Program>, SqliteStoreError> {
        let key = encode_program_id(program_id)?;
        let row = self.with_reader(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {PROGRAM_COLUMNS} FROM programs p WHERE p.program_id = ?1 AND \
                     p.is_disabled = 0"
                ),
                params![key],
                |row| ProgramRow::read(row, 0),
            )
            .optional()
            .map_err(db_error)
        })?;
        row.map(ProgramRow::into_program).transpose()
    }

    /// Lists active programs, latest date first and undated last.
    fn list_active_programs(&self) -> Result<Vec<Program>, SqliteStoreError> {
        let rows = self.with_reader(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {PROGRAM_COLUMNS} FROM programs p WHERE p.is_disabled = 0 ORDER BY \
                     p.program_date IS NULL, p.program_date DESC, p.program_id ASC"
                ))
                .map_err(db_error)?;
            let rows = stmt
                .query_map(params![], |row| ProgramRow::read(row, 0))
                .map_err(db_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_error)?;
            Ok(rows)
        })?;
        rows.into_iter().map(ProgramRow::into_program).collect()
    }

    /// Loads the enrollment row for a pair.
    fn find_enrollment_row(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<Enrollment>, SqliteStoreError> {
        let program_key = encode_program_id(program_id)?;
        let account_key = encode_account_id(account_id)?;
        let row = self.with_reader(|conn| {
            conn.query_row(
                "SELECT registration_date, status FROM program_attendees WHERE program_id = ?1 \
                 AND account_id = ?2",
                params![program_key, account_key],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(db_error)
        })?;
        Ok(row.map(|(registration_date, status)| Enrollment {
            program_id,
            account_id,
            registration_date: Timestamp::from_unix_millis(registration_date),
            status: EnrollmentStatus::from(status),
        }))
    }

    /// Lists active programs joined with the account's enrollments.
    fn list_enrolled_rows(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<EnrolledProgramView>, SqliteStoreError> {
        let account_key = encode_account_id(account_id)?;
        let rows = self.with_reader(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {PROGRAM_COLUMNS}, pa.registration_date, pa.status FROM \
                     program_attendees pa JOIN programs p ON p.program_id = pa.program_id WHERE \
                     pa.account_id = ?1 AND p.is_disabled = 0 ORDER BY pa.registration_date \
                     DESC, p.program_id ASC"
                ))
                .map_err(db_error)?;
            let rows = stmt
                .query_map(params![account_key], |row| {
                    let program = ProgramRow::read(row, 0)?;
                    let registration_date: i64 = row.get(10)?;
                    let status: String = row.get(11)?;
                    Ok((program, registration_date, status))
                })
                .map_err(db_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_error)?;
            Ok(rows)
        })?;
        rows.into_iter()
            .map(|(program, registration_date, status)| {
                Ok(EnrolledProgramView {
                    program: program.into_program()?,
                    registration_date: Timestamp::from_unix_millis(registration_date),
                    status: EnrollmentStatus::from(status),
                })
            })
            .collect()
    }

    /// Lists attendee rows, optionally scoped to one program.
    fn list_attendee_rows(
        &self,
        program_id: Option<ProgramId>,
    ) -> Result<Vec<AttendeeView>, SqliteStoreError> {
        let program_key = program_id.map(encode_program_id).transpose()?;
        let rows = self.with_reader(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT pa.program_id, pa.account_id, pa.registration_date, pa.status, \
                     p.program_name, a.username, a.full_name FROM program_attendees pa JOIN \
                     programs p ON p.program_id = pa.program_id JOIN accounts a ON a.account_id = \
                     pa.account_id WHERE (?1 IS NULL OR pa.program_id = ?1) ORDER BY \
                     pa.registration_date DESC, pa.program_id ASC, pa.account_id ASC",
                )
                .map_err(db_error)?;
            let rows = stmt
                .query_map(params![program_key], AttendeeRow::read)
                .map_err(db_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_error)?;
            Ok(rows)
        })?;
        rows.into_iter().map(AttendeeRow::into_view).collect()
    }

    /// Loads one attendee row.
    fn find_attendee_row(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<AttendeeView>, SqliteStoreError> {
        let program_key = encode_program_id(program_id)?;
        let account_key = encode_account_id(account_id)?;
        let row = self.with_reader(|conn| {
            conn.query_row(
                "SELECT pa.program_id, pa.account_id, pa.registration_date, pa.status, \
                 p.program_name, a.username, a.full_name FROM program_attendees pa JOIN programs \
                 p ON p.program_id = pa.program_id JOIN accounts a ON a.account_id = \
                 pa.account_id WHERE pa.program_id = ?1 AND pa.account_id = ?2",
                params![program_key, account_key],
                AttendeeRow::read,
            )
            .optional()
            .map_err(db_error)
        })?;
        row.map(AttendeeRow::into_view).transpose()
    }

    /// Counts enrollments for a program.
    fn count_attendee_rows(&self, program_id: ProgramId) -> Result<u64, SqliteStoreError> {
        let program_key = encode_program_id(program_id)?;
        let count: i64 = self.with_reader(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM program_attendees WHERE program_id = ?1",
                params![program_key],
                |row| row.get(0),
            )
            .map_err(db_error)
        })?;
        u64::try_from(count)
            .map_err(|_| SqliteStoreError::Corrupt(format!("negative attendee count: {count}")))
    }

    /// Executes a trivial statement on the writer connection.
    fn ping(&self) -> Result<(), SqliteStoreError> {
        let guard = self
            .write_connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("writer mutex poisoned".to_string()))?;
        guard.query_row("SELECT 1", params![], |row| row.get::<_, i64>(0)).map_err(db_error)?;
        drop(guard);
        Ok(())
    }
}

impl ProgramCatalog for SqliteAttendanceStore {
    fn find_active_by_id(&self, program_id: ProgramId) -> Result<Option<Program>, StoreError> {
        self.find_active_program(program_id).map_err(StoreError::from)
    }

    fn list_active(&self) -> Result<Vec<Program>, StoreError> {
        self.list_active_programs().map_err(StoreError::from)
    }
}

impl EnrollmentStore for SqliteAttendanceStore {
    fn find_enrollment(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<Enrollment>, StoreError> {
        self.find_enrollment_row(program_id, account_id).map_err(StoreError::from)
    }

    fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<InsertOutcome, StoreError> {
        self.insert_enrollment_row(enrollment).map_err(StoreError::from)
    }

    fn delete_enrollment(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<bool, StoreError> {
        self.delete_enrollment_row(program_id, account_id).map_err(StoreError::from)
    }

    fn list_enrolled_programs(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<EnrolledProgramView>, StoreError> {
        self.list_enrolled_rows(account_id).map_err(StoreError::from)
    }

    fn list_attendees(
        &self,
        program_id: Option<ProgramId>,
    ) -> Result<Vec<AttendeeView>, StoreError> {
        self.list_attendee_rows(program_id).map_err(StoreError::from)
    }

    fn find_attendee(
        &self,
        program_id: ProgramId,
        account_id: AccountId,
    ) -> Result<Option<AttendeeView>, StoreError> {
        self.find_attendee_row(program_id, account_id).map_err(StoreError::from)
    }

    fn count_attendees(&self, program_id: ProgramId) -> Result<u64, StoreError> {
        self.count_attendee_rows(program_id).map_err(StoreError::from)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.ping().map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Raw program columns read from a result row.
struct ProgramRow {
    /// Stored program key.
    program_id: i64,
    /// Display name.
    program_name: String,
    /// Category label.
    program_type: Option<String>,
    /// Program date in unix milliseconds.
    program_date: Option<i64>,
    /// Description.
    description: Option<String>,
    /// Organizer.
    organizer: Option<String>,
    /// Location.
    location: Option<String>,
    /// External link.
    url: Option<String>,
    /// Image link.
    image_url: Option<String>,
    /// Disabled flag.
    is_disabled: bool,
}

impl ProgramRow {
    /// Reads [`PROGRAM_COLUMNS`] starting at `offset`.
    fn read(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            program_id: row.get(offset)?,
            program_name: row.get(offset + 1)?,
            program_type: row.get(offset + 2)?,
            program_date: row.get(offset + 3)?,
            description: row.get(offset + 4)?,
            organizer: row.get(offset + 5)?,
            location: row.get(offset + 6)?,
            url: row.get(offset + 7)?,
            image_url: row.get(offset + 8)?,
            is_disabled: row.get(offset + 9)?,
        })
    }

    /// Validates keys and builds the catalog record.
    fn into_program(self) -> Result<Program, SqliteStoreError> {
        Ok(Program {
            program_id: decode_program_id(self.program_id)?,
            program_name: self.program_name,
            program_type: self.program_type,
            date: self.program_date.map(Timestamp::from_unix_millis),
            description: self.description,
            organizer: self.organizer,
            location: self.location,
            url: self.url,
            image_url: self.image_url,
            is_disabled: self.is_disabled,
        })
    }
}

/// Raw attendee join columns.
struct AttendeeRow {
    /// Stored program key.
    program_id: i64,
    /// Stored account key.
    account_id: i64,
    /// Registration instant in unix milliseconds.
    registration_date: i64,
    /// Status label.
    status: String,
    /// Program name.
    program_name: String,
    /// Account username.
    username: String,
    /// Account full name.
    full_name: Option<String>,
}

impl AttendeeRow {
    /// Reads the attendee join columns.
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            program_id: row.get(0)?,
            account_id: row.get(1)?,
            registration_date: row.get(2)?,
            status: row.get(3)?,
            program_name: row.get(4)?,
            username: row.get(5)?,
            full_name: row.get(6)?,
        })
    }

    /// Validates keys and builds the reporting row.
    fn into_view(self) -> Result<AttendeeView, SqliteStoreError> {
        Ok(AttendeeView {
            program_id: decode_program_id(self.program_id)?,
            account_id: decode_account_id(self.account_id)?,
            registration_date: Timestamp::from_unix_millis(self.registration_date),
            status: EnrollmentStatus::from(self.status),
            program_name: self.program_name,
            username: self.username,
            full_name: self.full_name,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Encodes a program identifier as a storage key.
fn encode_program_id(program_id: ProgramId) -> Result<i64, SqliteStoreError> {
    program_id.to_i64().map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Encodes an account identifier as a storage key.
fn encode_account_id(account_id: AccountId) -> Result<i64, SqliteStoreError> {
    account_id.to_i64().map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Decodes a stored program key.
fn decode_program_id(raw: i64) -> Result<ProgramId, SqliteStoreError> {
    ProgramId::from_i64(raw)
        .map_err(|_| SqliteStoreError::Corrupt(format!("invalid stored program_id {raw}")))
}

/// Decodes a stored account key.
fn decode_account_id(raw: i64) -> Result<AccountId, SqliteStoreError> {
    AccountId::from_i64(raw)
        .map_err(|_| SqliteStoreError::Corrupt(format!("invalid stored account_id {raw}")))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Validates the reader pool size.
fn validate_read_pool_size(size: usize) -> Result<(), SqliteStoreError> {
    if size == 0 || size > MAX_READ_POOL_SIZE {
        return Err(SqliteStoreError::Invalid(format!(
            "read_pool_size must be between 1 and {MAX_READ_POOL_SIZE}"
        )));
    }
    Ok(())
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS programs (
                    program_id INTEGER PRIMARY KEY,
                    program_name TEXT NOT NULL,
                    program_type TEXT,
                    program_date INTEGER,
                    description TEXT,
                    organizer TEXT,
                    location TEXT,
                    url TEXT,
                    image_url TEXT,
                    is_disabled INTEGER NOT NULL DEFAULT 0
                );
                CREATE TABLE IF NOT EXISTS accounts (
                    account_id INTEGER PRIMARY KEY,
                    username TEXT NOT NULL,
                    full_name TEXT
                );
                CREATE TABLE IF NOT EXISTS program_attendees (
                    program_id INTEGER NOT NULL,
                    account_id INTEGER NOT NULL,
                    registration_date INTEGER NOT NULL,
                    status TEXT NOT NULL,
                    PRIMARY KEY (program_id, account_id),
                    FOREIGN KEY (program_id) REFERENCES programs(program_id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_program_attendees_account
                    ON program_attendees (account_id, registration_date);",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}
