use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};

use super::{BoardDb, SPRINT_COLUMNS, now, require, sprint_from_row};
use crate::board::models::{BasicStatus, Sprint, SprintState};
use crate::errors::{BoardError, Entity};

impl BoardDb {
    pub fn create_sprint(&self, board_id: i64, name: &str) -> Result<Sprint> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::invalid("name", "Please enter a sprint name").into());
        }
        self.board_or_not_found(board_id)?;
        self.conn
            .execute(
                "INSERT INTO sprints (board_id, name) VALUES (?1, ?2)",
                params![board_id, name],
            )
            .context("Failed to insert sprint")?;
        let id = self.conn.last_insert_rowid();
        self.get_sprint(id)?.context("Sprint not found after insert")
    }

    pub fn get_sprint(&self, id: i64) -> Result<Option<Sprint>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM sprints WHERE id = ?1", SPRINT_COLUMNS),
                params![id],
                sprint_from_row,
            )
            .optional()
            .context("Failed to query sprint")
    }

    pub(crate) fn sprint_or_not_found(&self, id: i64) -> Result<Sprint> {
        require(self.get_sprint(id)?, Entity::Sprint, id)
    }

    pub fn list_sprints(&self, board_id: i64) -> Result<Vec<Sprint>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM sprints WHERE board_id = ?1 ORDER BY id",
                SPRINT_COLUMNS
            ))
            .context("Failed to prepare list_sprints")?;
        let sprints = stmt
            .query_map(params![board_id], sprint_from_row)
            .context("Failed to query sprints")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read sprint row")?;
        Ok(sprints)
    }

    /// The board's started-but-not-completed sprint, if any.
    pub fn active_sprint(&self, board_id: i64) -> Result<Option<Sprint>> {
        Ok(self
            .list_sprints(board_id)?
            .into_iter()
            .find(Sprint::is_active))
    }

    /// Start a not-started sprint.
    ///
    /// In one transaction: deactivate any other active sprint on the board,
    /// take every ticket off the board's columns, stamp the start date, then
    /// put this sprint's tickets into the board's first column. Tickets kept
    /// by completed sprints are the archive and are left as they are.
    pub fn start_sprint(&self, sprint_id: i64) -> Result<Sprint> {
        let sprint = self.sprint_or_not_found(sprint_id)?;
        if sprint.state() != SprintState::NotStarted {
            return Err(BoardError::InvalidTransition {
                sprint_id,
                action: "start",
                state: sprint.state().as_str(),
            }
            .into());
        }
        let board_id = sprint.board_id;
        let first = self.first_status(board_id)?.ok_or_else(|| {
            BoardError::invalid("board", "Add a column to the board before starting a sprint")
        })?;

        self.in_transaction(|db| {
            let stamp = now();
            let deactivated = db
                .conn
                .execute(
                    "UPDATE sprints SET start_date = NULL
                     WHERE board_id = ?1 AND id != ?2
                       AND start_date IS NOT NULL AND completed_date IS NULL",
                    params![board_id, sprint_id],
                )
                .context("Failed to deactivate previous sprint")?;
            db.conn
                .execute(
                    "UPDATE tickets SET status_id = NULL, version = version + 1, updated_at = ?2
                     WHERE board_id = ?1 AND status_id IS NOT NULL
                       AND (sprint_id IS NULL OR sprint_id NOT IN
                            (SELECT id FROM sprints WHERE completed_date IS NOT NULL))",
                    params![board_id, stamp],
                )
                .context("Failed to clear board columns")?;
            db.conn
                .execute(
                    "UPDATE sprints SET start_date = ?1 WHERE id = ?2",
                    params![stamp, sprint_id],
                )
                .context("Failed to stamp sprint start")?;
            let moved = db
                .conn
                .execute(
                    "UPDATE tickets SET status_id = ?1, version = version + 1, updated_at = ?2
                     WHERE sprint_id = ?3",
                    params![first.id, stamp, sprint_id],
                )
                .context("Failed to move sprint tickets to first column")?;
            tracing::info!(board_id, sprint_id, deactivated, moved, "Started sprint");
            db.sprint_or_not_found(sprint_id)
        })
    }

    /// Complete an active sprint. Tickets not in "Done" go back to the
    /// backlog (no status, no sprint); done tickets stay with the sprint.
    pub fn complete_sprint(&self, sprint_id: i64) -> Result<Sprint> {
        let sprint = self.sprint_or_not_found(sprint_id)?;
        if sprint.state() != SprintState::Active {
            return Err(BoardError::InvalidTransition {
                sprint_id,
                action: "complete",
                state: sprint.state().as_str(),
            }
            .into());
        }
        let done_id = self.done_status(sprint.board_id)?.map(|s| s.id);

        self.in_transaction(|db| {
            let stamp = now();
            let returned = db
                .conn
                .execute(
                    "UPDATE tickets
                     SET status_id = NULL, sprint_id = NULL, version = version + 1, updated_at = ?2
                     WHERE sprint_id = ?1 AND (status_id IS NULL OR status_id IS NOT ?3)",
                    params![sprint_id, stamp, done_id],
                )
                .context("Failed to return unfinished tickets to backlog")?;
            db.conn
                .execute(
                    "UPDATE sprints SET completed_date = ?1 WHERE id = ?2",
                    params![stamp, sprint_id],
                )
                .context("Failed to stamp sprint completion")?;
            tracing::info!(
                board_id = sprint.board_id,
                sprint_id,
                returned,
                done_column = BasicStatus::DONE,
                "Completed sprint"
            );
            db.sprint_or_not_found(sprint_id)
        })
    }
}
