//! Drag-and-drop reordering batches.
//!
//! Each batch runs in one transaction. An entry that names a `version`
//! different from the stored row aborts the whole batch with a conflict;
//! entries without a version overwrite unconditionally.

use anyhow::{Context, Result};
use rusqlite::params;

use super::{BoardDb, now};
use crate::board::models::{
    StatusOrderMove, Ticket, TicketSprintMove, TicketStatus, TicketStatusMove,
};
use crate::errors::BoardError;

fn check_version(kind: &str, id: i64, expected: Option<i64>, stored: i64) -> Result<()> {
    match expected {
        Some(v) if v != stored => Err(BoardError::Conflict(format!(
            "{} {} was modified concurrently (expected version {}, found {})",
            kind, id, v, stored
        ))
        .into()),
        _ => Ok(()),
    }
}

impl BoardDb {
    fn apply_status_move(&self, mv: &TicketStatusMove) -> Result<Ticket> {
        let ticket = self.ticket_or_not_found(mv.id)?;
        check_version("Ticket", mv.id, mv.version, ticket.version)?;
        self.check_status_on_board(ticket.board_id, mv.status)?;
        self.conn
            .execute(
                "UPDATE tickets
                 SET status_id = ?1, sort_order = ?2, version = version + 1, updated_at = ?3
                 WHERE id = ?4",
                params![mv.status, mv.order, now(), mv.id],
            )
            .context("Failed to move ticket status")?;
        self.ticket_or_not_found(mv.id)
    }

    fn apply_sprint_move(&self, mv: &TicketSprintMove) -> Result<Ticket> {
        let ticket = self.ticket_or_not_found(mv.id)?;
        check_version("Ticket", mv.id, mv.version, ticket.version)?;
        self.check_sprint_on_board(ticket.board_id, mv.sprint)?;
        self.conn
            .execute(
                "UPDATE tickets
                 SET sprint_id = ?1, sort_order = ?2, version = version + 1, updated_at = ?3
                 WHERE id = ?4",
                params![mv.sprint, mv.order, now(), mv.id],
            )
            .context("Failed to move ticket sprint")?;
        self.ticket_or_not_found(mv.id)
    }

    fn apply_order_move(&self, mv: &StatusOrderMove) -> Result<TicketStatus> {
        let status = self.status_or_not_found(mv.id)?;
        check_version("Status", mv.id, mv.version, status.version)?;
        self.conn
            .execute(
                "UPDATE ticket_statuses SET sort_order = ?1, version = version + 1 WHERE id = ?2",
                params![mv.order, mv.id],
            )
            .context("Failed to reorder status")?;
        self.status_or_not_found(mv.id)
    }

    /// Move one ticket to a column (or the backlog when `status` is null).
    pub fn move_ticket_status(&self, mv: &TicketStatusMove) -> Result<Ticket> {
        self.in_transaction(|db| db.apply_status_move(mv))
    }

    pub fn bulk_move_ticket_status(&self, moves: &[TicketStatusMove]) -> Result<Vec<Ticket>> {
        let updated = self.in_transaction(|db| {
            moves
                .iter()
                .map(|mv| db.apply_status_move(mv))
                .collect::<Result<Vec<_>>>()
        })?;
        tracing::debug!(count = updated.len(), "Moved tickets between columns");
        Ok(updated)
    }

    pub fn bulk_move_ticket_sprint(&self, moves: &[TicketSprintMove]) -> Result<Vec<Ticket>> {
        let updated = self.in_transaction(|db| {
            moves
                .iter()
                .map(|mv| db.apply_sprint_move(mv))
                .collect::<Result<Vec<_>>>()
        })?;
        tracing::debug!(count = updated.len(), "Moved tickets between sprints");
        Ok(updated)
    }

    pub fn bulk_reorder_statuses(&self, moves: &[StatusOrderMove]) -> Result<Vec<TicketStatus>> {
        let updated = self.in_transaction(|db| {
            moves
                .iter()
                .map(|mv| db.apply_order_move(mv))
                .collect::<Result<Vec<_>>>()
        })?;
        tracing::debug!(count = updated.len(), "Reordered columns");
        Ok(updated)
    }
}
