use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Params, ToSql, params};

use super::{BoardDb, TICKET_COLUMNS, now, require, ticket_from_row};
use crate::board::models::{
    BacklogAction, FieldUpdate, MAX_TITLE_CHARS, NewTicket, Ticket, TicketCard, TicketChanges,
};
use crate::errors::{BoardError, Entity, FieldErrors};

const UNASSIGNED: &str = "Unassigned";

/// Collect title/description problems into one validation error.
fn validate_text(title: &str, description: &str) -> Result<()> {
    let mut errors = FieldErrors::new();
    if title.trim().is_empty() {
        errors
            .entry("title".into())
            .or_default()
            .push("Please enter a title".into());
    } else if title.chars().count() > MAX_TITLE_CHARS {
        errors
            .entry("title".into())
            .or_default()
            .push(format!("Title must be at most {} characters", MAX_TITLE_CHARS));
    }
    if description.trim().is_empty() {
        errors
            .entry("description".into())
            .or_default()
            .push("Please enter a description".into());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BoardError::Validation(errors).into())
    }
}

impl BoardDb {
    /// Status ids on a form or reorder payload must belong to the ticket's board.
    pub(crate) fn check_status_on_board(&self, board_id: i64, status_id: Option<i64>) -> Result<()> {
        let Some(id) = status_id else {
            return Ok(());
        };
        match self.get_status(id)? {
            Some(status) if status.board_id == board_id => Ok(()),
            _ => Err(BoardError::invalid("status", format!("Status {} is not on this board", id)).into()),
        }
    }

    pub(crate) fn check_sprint_on_board(&self, board_id: i64, sprint_id: Option<i64>) -> Result<()> {
        let Some(id) = sprint_id else {
            return Ok(());
        };
        match self.get_sprint(id)? {
            Some(sprint) if sprint.board_id == board_id => Ok(()),
            _ => Err(BoardError::invalid("sprint", format!("Sprint {} is not on this board", id)).into()),
        }
    }

    fn check_assignee(&self, assignee_id: Option<i64>) -> Result<()> {
        let Some(id) = assignee_id else {
            return Ok(());
        };
        if self.get_user(id)?.is_none() {
            return Err(BoardError::invalid("assignee", format!("User {} does not exist", id)).into());
        }
        Ok(())
    }

    /// Insert a ticket at the end of the board's ticket order.
    pub fn create_ticket(&self, new: &NewTicket) -> Result<Ticket> {
        validate_text(&new.title, &new.description)?;
        self.board_or_not_found(new.board_id)?;
        self.check_status_on_board(new.board_id, new.status_id)?;
        self.check_sprint_on_board(new.board_id, new.sprint_id)?;
        self.check_assignee(new.assignee_id)?;

        let next_order: i64 = self
            .conn
            .query_row(
                "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM tickets WHERE board_id = ?1",
                params![new.board_id],
                |row| row.get(0),
            )
            .context("Failed to get max ticket order")?;
        let stamp = now();
        self.conn
            .execute(
                "INSERT INTO tickets
                 (board_id, title, description, status_id, sprint_id, assignee_id, author_id,
                  sort_order, version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?9)",
                params![
                    new.board_id,
                    new.title.trim(),
                    new.description,
                    new.status_id,
                    new.sprint_id,
                    new.assignee_id,
                    new.author_id,
                    next_order,
                    stamp,
                ],
            )
            .context("Failed to insert ticket")?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(board_id = new.board_id, ticket_id = id, "Created ticket");
        self.get_ticket(id)?.context("Ticket not found after insert")
    }

    pub fn get_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM tickets WHERE id = ?1", TICKET_COLUMNS),
                params![id],
                ticket_from_row,
            )
            .optional()
            .context("Failed to query ticket")
    }

    pub(crate) fn ticket_or_not_found(&self, id: i64) -> Result<Ticket> {
        require(self.get_ticket(id)?, Entity::Ticket, id)
    }

    /// Tickets matching a `WHERE` clause, in display order.
    pub(crate) fn query_tickets<P: Params>(&self, clause: &str, params: P) -> Result<Vec<Ticket>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM tickets WHERE {} ORDER BY sort_order, id",
                TICKET_COLUMNS, clause
            ))
            .context("Failed to prepare ticket query")?;
        let tickets = stmt
            .query_map(params, ticket_from_row)
            .context("Failed to query tickets")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read ticket row")?;
        Ok(tickets)
    }

    pub fn list_tickets(&self, board_id: i64) -> Result<Vec<Ticket>> {
        self.query_tickets("board_id = ?1", params![board_id])
    }

    /// Decorate a ticket with its assignee's display name and initials.
    pub fn ticket_card(&self, ticket: Ticket) -> Result<TicketCard> {
        let assignee = match ticket.assignee_id {
            Some(id) => self.get_user(id)?,
            None => None,
        };
        Ok(TicketCard {
            assignee_name: assignee
                .as_ref()
                .map(|u| u.full_name())
                .unwrap_or_else(|| UNASSIGNED.to_string()),
            assignee_initials: assignee.map(|u| u.initials()),
            ticket,
        })
    }

    pub(crate) fn ticket_cards(&self, tickets: Vec<Ticket>) -> Result<Vec<TicketCard>> {
        tickets.into_iter().map(|t| self.ticket_card(t)).collect()
    }

    /// Apply a single-field edit. A comment is attached to the ticket and
    /// leaves the ticket row itself untouched.
    pub fn apply_field_update(
        &self,
        ticket_id: i64,
        update: FieldUpdate,
        author_id: Option<i64>,
    ) -> Result<Ticket> {
        let ticket = self.ticket_or_not_found(ticket_id)?;
        let field = update.form_name();
        match update {
            FieldUpdate::Title(title) => {
                validate_text(&title, &ticket.description)?;
                self.touch_ticket(ticket_id, "title", &title.trim())?;
            }
            FieldUpdate::Description(description) => {
                validate_text(&ticket.title, &description)?;
                self.touch_ticket(ticket_id, "description", &description)?;
            }
            FieldUpdate::Status(status_id) => {
                self.check_status_on_board(ticket.board_id, status_id)?;
                self.touch_ticket(ticket_id, "status_id", &status_id)?;
            }
            FieldUpdate::Assignee(assignee_id) => {
                self.check_assignee(assignee_id)?;
                self.touch_ticket(ticket_id, "assignee_id", &assignee_id)?;
            }
            FieldUpdate::Comment(text) => {
                let author_id = author_id.ok_or(BoardError::Unauthenticated)?;
                self.add_comment(ticket_id, author_id, &text)?;
            }
        }
        tracing::debug!(ticket_id, field, "Updated ticket field");
        self.ticket_or_not_found(ticket_id)
    }

    /// Set one column of a ticket, bumping version and `updated_at`.
    fn touch_ticket(&self, ticket_id: i64, column: &str, value: &dyn ToSql) -> Result<()> {
        let count = self
            .conn
            .execute(
                &format!(
                    "UPDATE tickets SET {} = ?1, version = version + 1, updated_at = ?2 WHERE id = ?3",
                    column
                ),
                params![value, now(), ticket_id],
            )
            .with_context(|| format!("Failed to update ticket {}", column))?;
        if count == 0 {
            return Err(BoardError::not_found(Entity::Ticket, ticket_id).into());
        }
        Ok(())
    }

    /// Overwrite every editable field of a ticket in one write.
    pub fn update_ticket(&self, id: i64, changes: &TicketChanges) -> Result<Ticket> {
        let ticket = self.ticket_or_not_found(id)?;
        validate_text(&changes.title, &changes.description)?;
        self.check_status_on_board(ticket.board_id, changes.status_id)?;
        self.check_sprint_on_board(ticket.board_id, changes.sprint_id)?;
        self.check_assignee(changes.assignee_id)?;
        self.conn
            .execute(
                "UPDATE tickets
                 SET title = ?1, description = ?2, status_id = ?3, sprint_id = ?4,
                     assignee_id = ?5, version = version + 1, updated_at = ?6
                 WHERE id = ?7",
                params![
                    changes.title.trim(),
                    changes.description,
                    changes.status_id,
                    changes.sprint_id,
                    changes.assignee_id,
                    now(),
                    id,
                ],
            )
            .context("Failed to update ticket")?;
        self.ticket_or_not_found(id)
    }

    /// Delete or re-status the selected tickets of a board in one
    /// transaction. Tickets of other boards are ignored. Returns how many
    /// tickets were affected.
    pub fn apply_backlog_action(
        &self,
        board_id: i64,
        ticket_ids: &[i64],
        action: BacklogAction,
    ) -> Result<usize> {
        self.board_or_not_found(board_id)?;
        if let BacklogAction::UpdateStatus(status_id) = action {
            self.check_status_on_board(board_id, status_id)?;
        }
        self.in_transaction(|db| {
            let stamp = now();
            let mut affected = 0;
            for &id in ticket_ids {
                affected += match action {
                    BacklogAction::Delete => db
                        .conn
                        .execute(
                            "DELETE FROM tickets WHERE id = ?1 AND board_id = ?2",
                            params![id, board_id],
                        )
                        .context("Failed to delete backlog ticket")?,
                    BacklogAction::UpdateStatus(status_id) => db
                        .conn
                        .execute(
                            "UPDATE tickets
                             SET status_id = ?1, version = version + 1, updated_at = ?2
                             WHERE id = ?3 AND board_id = ?4",
                            params![status_id, stamp, id, board_id],
                        )
                        .context("Failed to update backlog ticket status")?,
                };
            }
            tracing::info!(board_id, ?action, affected, "Applied backlog action");
            Ok(affected)
        })
    }
}
