use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("sqlite open failed at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create history database parent {path}: {source}")]
    CreateParent {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sqlite statement failed: {source}")]
    Sql {
        #[source]
        source: rusqlite::Error,
    },
    #[error("invalid task status `{value}` in database")]
    InvalidStatus { value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    Error,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, HistoryError> {
        match raw {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(HistoryError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One persisted execution attempt. Rows are append-only for the lifetime
/// of the process; nothing updates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: i64,
    pub description: String,
    pub status: TaskStatus,
    pub output: String,
    pub created_at: i64,
}

pub struct TaskHistory {
    db_path: PathBuf,
}

impl TaskHistory {
    /// Creates parent directories, verifies the database opens, and ensures
    /// the schema, so later `record` calls fail only on real write errors.
    pub fn open(db_path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|source| HistoryError::CreateParent {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let history = Self {
            db_path: db_path.to_path_buf(),
        };
        let connection = history.connect()?;
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY,
                    description TEXT NOT NULL,
                    status TEXT NOT NULL,
                    output TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                ",
            )
            .map_err(|source| HistoryError::Sql { source })?;
        Ok(history)
    }

    /// Appends one row in its own implicit transaction. Concurrent callers
    /// each open their own connection, so no write is lost or interleaved;
    /// insertion order across callers is not meaningful.
    pub fn record(
        &self,
        description: &str,
        status: TaskStatus,
        output: &str,
    ) -> Result<i64, HistoryError> {
        let connection = self.connect()?;
        connection
            .execute(
                "INSERT INTO tasks (description, status, output, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    description,
                    status.as_str(),
                    output,
                    chrono::Utc::now().timestamp()
                ],
            )
            .map_err(|source| HistoryError::Sql { source })?;
        Ok(connection.last_insert_rowid())
    }

    /// Read-only reporting surface; the dispatch core never calls this.
    pub fn recent(&self, limit: usize) -> Result<Vec<TaskRecord>, HistoryError> {
        let connection = self.connect()?;
        let mut statement = connection
            .prepare(
                "SELECT id, description, status, output, created_at
                 FROM tasks ORDER BY id DESC LIMIT ?1",
            )
            .map_err(|source| HistoryError::Sql { source })?;
        let rows = statement
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .map_err(|source| HistoryError::Sql { source })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, description, status, output, created_at) =
                row.map_err(|source| HistoryError::Sql { source })?;
            records.push(TaskRecord {
                id,
                description,
                status: TaskStatus::parse(&status)?,
                output,
                created_at,
            });
        }
        Ok(records)
    }

    fn connect(&self) -> Result<Connection, HistoryError> {
        let connection =
            Connection::open(&self.db_path).map_err(|source| HistoryError::Open {
                path: self.db_path.display().to_string(),
                source,
            })?;
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|source| HistoryError::Sql { source })?;
        Ok(connection)
    }
}
