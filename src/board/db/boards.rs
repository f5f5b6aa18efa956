use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};

use super::{BOARD_COLUMNS, BoardDb, board_from_row, now, require};
use crate::board::models::{Board, DEFAULT_STATUSES};
use crate::errors::{BoardError, Entity};

impl BoardDb {
    /// Create a board with the default columns and an owner membership for
    /// `owner_id`, all in one transaction.
    pub fn create_board(&self, name: &str, owner_id: i64) -> Result<Board> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::invalid("name", "Please enter a board name").into());
        }
        require(self.get_user(owner_id)?, Entity::User, owner_id)?;

        self.in_transaction(|db| {
            let stamp = now();
            db.conn
                .execute(
                    "INSERT INTO boards (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
                    params![name, stamp],
                )
                .context("Failed to insert board")?;
            let board_id = db.conn.last_insert_rowid();

            for (order, (status_name, colour)) in DEFAULT_STATUSES.iter().enumerate() {
                db.insert_status(board_id, status_name, order as i64, *colour)?;
            }
            db.insert_membership(board_id, owner_id, true)?;

            tracing::info!(board_id, owner_id, "Created board");
            db.get_board(board_id)?
                .context("Board not found after insert")
        })
    }

    pub fn get_board(&self, id: i64) -> Result<Option<Board>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM boards WHERE id = ?1", BOARD_COLUMNS),
                params![id],
                board_from_row,
            )
            .optional()
            .context("Failed to query board")
    }

    pub(crate) fn board_or_not_found(&self, id: i64) -> Result<Board> {
        require(self.get_board(id)?, Entity::Board, id)
    }

    pub fn list_boards(&self) -> Result<Vec<Board>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM boards ORDER BY id", BOARD_COLUMNS))
            .context("Failed to prepare list_boards")?;
        let rows = stmt
            .query_map([], board_from_row)
            .context("Failed to query boards")?;
        let mut boards = Vec::new();
        for row in rows {
            boards.push(row.context("Failed to read board row")?);
        }
        Ok(boards)
    }

    /// Boards the user holds a membership on.
    pub fn list_boards_for_user(&self, user_id: i64) -> Result<Vec<Board>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT b.id, b.name, b.created_at, b.updated_at
                 FROM boards b JOIN board_memberships m ON m.board_id = b.id
                 WHERE m.user_id = ?1 ORDER BY b.id",
            )
            .context("Failed to prepare list_boards_for_user")?;
        let boards = stmt
            .query_map(params![user_id], board_from_row)
            .context("Failed to query boards for user")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read board row")?;
        Ok(boards)
    }

    pub fn rename_board(&self, id: i64, name: &str) -> Result<Board> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::invalid("name", "Please enter a board name").into());
        }
        let count = self
            .conn
            .execute(
                "UPDATE boards SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now(), id],
            )
            .context("Failed to rename board")?;
        if count == 0 {
            return Err(BoardError::not_found(Entity::Board, id).into());
        }
        self.board_or_not_found(id)
    }
}
