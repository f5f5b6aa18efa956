use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};

use super::{BoardDb, STATUS_COLUMNS, StatusRow, conflict_on_unique, now, require};
use crate::board::models::{BasicStatus, ColumnDeletion, StatusColour, TicketStatus};
use crate::errors::{BoardError, Entity};

impl BoardDb {
    pub(crate) fn insert_status(
        &self,
        board_id: i64,
        name: &str,
        order: i64,
        colour: StatusColour,
    ) -> Result<TicketStatus> {
        self.conn
            .execute(
                "INSERT INTO ticket_statuses (board_id, name, sort_order, colour) VALUES (?1, ?2, ?3, ?4)",
                params![board_id, name, order, colour.as_str()],
            )
            .map_err(|e| conflict_on_unique(e, format!("A column named '{}' already exists", name)))
            .context("Failed to insert status")?;
        let id = self.conn.last_insert_rowid();
        self.get_status(id)?.context("Status not found after insert")
    }

    /// Append a new column after the board's current last column.
    pub fn create_status(
        &self,
        board_id: i64,
        name: &str,
        colour: StatusColour,
    ) -> Result<TicketStatus> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::invalid("name", "Please enter a column name").into());
        }
        self.board_or_not_found(board_id)?;
        let next_order: i64 = self
            .conn
            .query_row(
                "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM ticket_statuses WHERE board_id = ?1",
                params![board_id],
                |row| row.get(0),
            )
            .context("Failed to get max status order")?;
        self.insert_status(board_id, name, next_order, colour)
    }

    pub fn get_status(&self, id: i64) -> Result<Option<TicketStatus>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM ticket_statuses WHERE id = ?1", STATUS_COLUMNS),
                params![id],
                StatusRow::from_row,
            )
            .optional()
            .context("Failed to query status")?;
        row.map(StatusRow::into_status).transpose()
    }

    pub(crate) fn status_or_not_found(&self, id: i64) -> Result<TicketStatus> {
        require(self.get_status(id)?, Entity::Status, id)
    }

    /// Statuses of a board in display order.
    pub fn list_statuses(&self, board_id: i64) -> Result<Vec<TicketStatus>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM ticket_statuses WHERE board_id = ?1 ORDER BY sort_order, id",
                STATUS_COLUMNS
            ))
            .context("Failed to prepare list_statuses")?;
        let rows = stmt
            .query_map(params![board_id], StatusRow::from_row)
            .context("Failed to query statuses")?;
        let mut statuses = Vec::new();
        for row in rows {
            let r = row.context("Failed to read status row")?;
            statuses.push(r.into_status()?);
        }
        Ok(statuses)
    }

    /// The lowest-ordered column, where a started sprint's tickets land.
    pub fn first_status(&self, board_id: i64) -> Result<Option<TicketStatus>> {
        Ok(self.list_statuses(board_id)?.into_iter().next())
    }

    pub fn status_by_name(&self, board_id: i64, name: &str) -> Result<Option<TicketStatus>> {
        Ok(self
            .list_statuses(board_id)?
            .into_iter()
            .find(|s| s.name == name))
    }

    pub fn todo_status(&self, board_id: i64) -> Result<Option<TicketStatus>> {
        self.status_by_name(board_id, BasicStatus::TODO)
    }

    pub fn done_status(&self, board_id: i64) -> Result<Option<TicketStatus>> {
        self.status_by_name(board_id, BasicStatus::DONE)
    }

    pub fn rename_status(&self, id: i64, name: &str) -> Result<TicketStatus> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::invalid("name", "Please enter a column name").into());
        }
        self.status_or_not_found(id)?;
        self.conn
            .execute(
                "UPDATE ticket_statuses SET name = ?1, version = version + 1 WHERE id = ?2",
                params![name, id],
            )
            .map_err(|e| conflict_on_unique(e, format!("A column named '{}' already exists", name)))
            .context("Failed to rename status")?;
        self.status_or_not_found(id)
    }

    pub fn count_tickets_in_status(&self, status_id: i64) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM tickets WHERE status_id = ?1",
                params![status_id],
                |row| row.get(0),
            )
            .context("Failed to count tickets in status")
    }

    /// Bulk-delete columns of a board. Protected columns and ids that do not
    /// belong to the board are skipped; tickets of removed columns fall back
    /// to the backlog. Runs in one transaction.
    pub fn delete_statuses(&self, board_id: i64, status_ids: &[i64]) -> Result<ColumnDeletion> {
        self.board_or_not_found(board_id)?;
        self.in_transaction(|db| {
            let mut outcome = ColumnDeletion::default();
            for &id in status_ids {
                let Some(status) = db.get_status(id)? else {
                    continue;
                };
                if status.board_id != board_id {
                    continue;
                }
                if BasicStatus::is_protected(&status.name) {
                    outcome.protected.push(status.name);
                    continue;
                }
                let detached = db
                    .conn
                    .execute(
                        "UPDATE tickets SET status_id = NULL, version = version + 1, updated_at = ?2
                         WHERE status_id = ?1",
                        params![id, now()],
                    )
                    .context("Failed to detach tickets from status")?;
                db.conn
                    .execute("DELETE FROM ticket_statuses WHERE id = ?1", params![id])
                    .context("Failed to delete status")?;
                tracing::info!(board_id, status_id = id, detached, "Deleted column");
                outcome.removed.push(status.name);
            }
            Ok(outcome)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::db::test_support::{seeded, status_named, ticket};

    #[test]
    fn test_create_status_appends_after_last() -> Result<()> {
        let (db, _, board) = seeded();
        let review = db.create_status(board.id, "Review", StatusColour::Purple)?;
        assert_eq!(review.order, 4);
        assert_eq!(review.colour, StatusColour::Purple);
        let names: Vec<_> = db
            .list_statuses(board.id)?
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names.last().map(String::as_str), Some("Review"));
        Ok(())
    }

    #[test]
    fn test_create_status_on_empty_board_starts_at_zero() -> Result<()> {
        let (db, _, board) = seeded();
        let all: Vec<i64> = db.list_statuses(board.id)?.iter().map(|s| s.id).collect();
        db.conn
            .execute("DELETE FROM ticket_statuses WHERE board_id = ?1", params![board.id])?;
        assert_eq!(all.len(), 4);
        let first = db.create_status(board.id, "Only", StatusColour::Grey)?;
        assert_eq!(first.order, 0);
        Ok(())
    }

    #[test]
    fn test_duplicate_status_name_is_conflict() -> Result<()> {
        let (db, _, board) = seeded();
        let err = db
            .create_status(board.id, "Blocked", StatusColour::Grey)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BoardError>(),
            Some(BoardError::Conflict(_))
        ));
        Ok(())
    }

    #[test]
    fn test_rename_status_bumps_version() -> Result<()> {
        let (db, _, board) = seeded();
        let blocked = status_named(&db, board.id, "Blocked");
        let renamed = db.rename_status(blocked.id, "Waiting")?;
        assert_eq!(renamed.name, "Waiting");
        assert_eq!(renamed.version, blocked.version + 1);
        assert_eq!(renamed.order, blocked.order);
        Ok(())
    }

    #[test]
    fn test_delete_statuses_detaches_tickets() -> Result<()> {
        let (db, _, board) = seeded();
        let blocked = status_named(&db, board.id, "Blocked");
        let t = ticket(&db, board.id, "Stuck", Some(blocked.id), None);
        let earlier = chrono::Utc::now() - chrono::Duration::hours(1);
        db.conn.execute(
            "UPDATE tickets SET updated_at = ?1 WHERE id = ?2",
            params![earlier, t.id],
        )?;

        let outcome = db.delete_statuses(board.id, &[blocked.id])?;
        assert_eq!(outcome.removed, vec!["Blocked".to_string()]);
        assert!(db.get_status(blocked.id)?.is_none());
        let after = db.get_ticket(t.id)?.unwrap();
        assert_eq!(after.status_id, None);
        assert_eq!(after.version, t.version + 1);
        assert!(after.updated_at > earlier);
        Ok(())
    }

    #[test]
    fn test_delete_statuses_skips_protected() -> Result<()> {
        let (db, _, board) = seeded();
        let todo = status_named(&db, board.id, "To do");
        let done = status_named(&db, board.id, "Done");
        let progress = status_named(&db, board.id, "In progress");

        let outcome = db.delete_statuses(board.id, &[todo.id, progress.id, done.id])?;
        assert_eq!(outcome.removed, vec!["In progress".to_string()]);
        assert_eq!(outcome.protected, vec!["To do".to_string(), "Done".to_string()]);
        assert!(db.get_status(todo.id)?.is_some());
        assert!(db.get_status(done.id)?.is_some());
        Ok(())
    }

    #[test]
    fn test_delete_last_unprotected_status_is_allowed() -> Result<()> {
        let (db, _, board) = seeded();
        let ids: Vec<i64> = db.list_statuses(board.id)?.iter().map(|s| s.id).collect();
        db.delete_statuses(board.id, &ids)?;
        let names: Vec<_> = db
            .list_statuses(board.id)?
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["To do", "Done"]);
        Ok(())
    }

    #[test]
    fn test_delete_statuses_ignores_other_boards() -> Result<()> {
        let (db, owner, board) = seeded();
        let other = db.create_board("Beta", owner.id)?;
        let foreign = status_named(&db, other.id, "Blocked");
        let outcome = db.delete_statuses(board.id, &[foreign.id, 9999])?;
        assert!(outcome.removed.is_empty());
        assert!(db.get_status(foreign.id)?.is_some());
        Ok(())
    }

    #[test]
    fn test_todo_and_done_lookup() -> Result<()> {
        let (db, _, board) = seeded();
        assert_eq!(db.todo_status(board.id)?.unwrap().name, "To do");
        assert_eq!(db.done_status(board.id)?.unwrap().name, "Done");
        assert_eq!(db.first_status(board.id)?.unwrap().name, "To do");
        Ok(())
    }
}
