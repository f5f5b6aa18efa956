//! SQLite persistence for boards.
//!
//! `BoardDb` owns a single connection. Operations are grouped by aggregate in
//! the submodules, each adding an `impl BoardDb` block. Public mutations that
//! touch more than one row run inside [`BoardDb::in_transaction`]; private
//! `insert_*`/`detach_*` helpers never open their own transaction so they can
//! be composed.

mod boards;
mod comments;
mod memberships;
mod reorder;
mod sprints;
mod statuses;
mod tickets;
mod users;
mod views;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};

use super::models::*;
use crate::errors::{BoardError, Entity};

/// Async-safe handle to the board database.
///
/// Wraps `BoardDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`. The mutex also serializes
/// writers, so two reorder batches never interleave.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<BoardDb>>,
}

impl DbHandle {
    pub fn new(db: BoardDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&BoardDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }

    /// Acquire the database mutex synchronously. Only for startup, CLI
    /// commands and tests; never from a request handler.
    pub fn lock_sync(&self) -> Result<std::sync::MutexGuard<'_, BoardDb>> {
        self.inner
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))
    }
}

pub struct BoardDb {
    conn: Connection,
}

impl BoardDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    email TEXT NOT NULL DEFAULT '',
                    first_name TEXT NOT NULL DEFAULT '',
                    last_name TEXT NOT NULL DEFAULT ''
                );

                CREATE TABLE IF NOT EXISTS boards (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS board_memberships (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    board_id INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    is_owner INTEGER NOT NULL DEFAULT 0,
                    UNIQUE(board_id, user_id)
                );

                CREATE TABLE IF NOT EXISTS ticket_statuses (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    board_id INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    sort_order INTEGER NOT NULL DEFAULT 0,
                    colour TEXT NOT NULL DEFAULT 'grey',
                    version INTEGER NOT NULL DEFAULT 0,
                    UNIQUE(board_id, name)
                );

                CREATE TABLE IF NOT EXISTS sprints (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    board_id INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    start_date TEXT,
                    completed_date TEXT
                );

                CREATE TABLE IF NOT EXISTS tickets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    board_id INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    status_id INTEGER REFERENCES ticket_statuses(id) ON DELETE SET NULL,
                    sprint_id INTEGER REFERENCES sprints(id) ON DELETE SET NULL,
                    assignee_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                    author_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                    sort_order INTEGER NOT NULL DEFAULT 0,
                    version INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS comments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
                    author_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                    text TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_memberships_user ON board_memberships(user_id);
                CREATE INDEX IF NOT EXISTS idx_statuses_board ON ticket_statuses(board_id, sort_order);
                CREATE INDEX IF NOT EXISTS idx_sprints_board ON sprints(board_id);
                CREATE INDEX IF NOT EXISTS idx_tickets_board ON tickets(board_id, sort_order);
                CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status_id);
                CREATE INDEX IF NOT EXISTS idx_tickets_sprint ON tickets(sprint_id);
                CREATE INDEX IF NOT EXISTS idx_comments_ticket ON comments(ticket_id, created_at);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    /// Run `f` inside a transaction: committed when `f` succeeds, rolled back
    /// when it returns an error.
    pub fn in_transaction<R>(&self, f: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        // unchecked_transaction is sound here: DbHandle's Mutex guarantees
        // single-threaded access to the connection.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let out = f(self)?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(out)
    }
}

// ── Internal row helpers ──────────────────────────────────────────────

const USER_COLUMNS: &str = "id, username, email, first_name, last_name";
const BOARD_COLUMNS: &str = "id, name, created_at, updated_at";
const MEMBERSHIP_COLUMNS: &str = "id, board_id, user_id, is_owner";
const STATUS_COLUMNS: &str = "id, board_id, name, sort_order, colour, version";
const SPRINT_COLUMNS: &str = "id, board_id, name, start_date, completed_date";
const TICKET_COLUMNS: &str = "id, board_id, title, description, status_id, sprint_id, \
     assignee_id, author_id, sort_order, version, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, ticket_id, author_id, text, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
    })
}

fn board_from_row(row: &Row<'_>) -> rusqlite::Result<Board> {
    Ok(Board {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<BoardMembership> {
    Ok(BoardMembership {
        id: row.get(0)?,
        board_id: row.get(1)?,
        user_id: row.get(2)?,
        is_owner: row.get(3)?,
    })
}

fn sprint_from_row(row: &Row<'_>) -> rusqlite::Result<Sprint> {
    Ok(Sprint {
        id: row.get(0)?,
        board_id: row.get(1)?,
        name: row.get(2)?,
        start_date: row.get(3)?,
        completed_date: row.get(4)?,
    })
}

fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        board_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status_id: row.get(4)?,
        sprint_id: row.get(5)?,
        assignee_id: row.get(6)?,
        author_id: row.get(7)?,
        order: row.get(8)?,
        version: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        author_id: row.get(2)?,
        text: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Intermediate row struct for statuses, converting the stored colour
/// string into a typed value.
struct StatusRow {
    id: i64,
    board_id: i64,
    name: String,
    sort_order: i64,
    colour: String,
    version: i64,
}

impl StatusRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            board_id: row.get(1)?,
            name: row.get(2)?,
            sort_order: row.get(3)?,
            colour: row.get(4)?,
            version: row.get(5)?,
        })
    }

    fn into_status(self) -> Result<TicketStatus> {
        let colour = StatusColour::from_str(&self.colour)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to parse status colour")?;
        Ok(TicketStatus {
            id: self.id,
            board_id: self.board_id,
            name: self.name,
            order: self.sort_order,
            colour,
            version: self.version,
        })
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Turn a missing row into the typed not-found error.
fn require<T>(value: Option<T>, entity: Entity, id: i64) -> Result<T> {
    value.ok_or_else(|| BoardError::not_found(entity, id).into())
}

/// Map a UNIQUE constraint violation onto a `Conflict`, leaving other
/// errors untouched.
fn conflict_on_unique(err: rusqlite::Error, message: impl Into<String>) -> anyhow::Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            BoardError::Conflict(message.into()).into()
        }
        other => anyhow::Error::new(other),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Fresh database with one user and one board created by that user.
    pub fn seeded() -> (BoardDb, User, Board) {
        let db = BoardDb::new_in_memory().unwrap();
        let user = db
            .create_user("owner", "owner@example.com", "Olive", "Owner")
            .unwrap();
        let board = db.create_board("Alpha", user.id).unwrap();
        (db, user, board)
    }

    pub fn status_named(db: &BoardDb, board_id: i64, name: &str) -> TicketStatus {
        db.list_statuses(board_id)
            .unwrap()
            .into_iter()
            .find(|s| s.name == name)
            .unwrap()
    }

    pub fn ticket(
        db: &BoardDb,
        board_id: i64,
        title: &str,
        status_id: Option<i64>,
        sprint_id: Option<i64>,
    ) -> Ticket {
        db.create_ticket(&NewTicket {
            board_id,
            title: title.to_string(),
            description: format!("{} description", title),
            status_id,
            sprint_id,
            assignee_id: None,
            author_id: None,
        })
        .unwrap()
    }
}
