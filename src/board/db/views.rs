//! Read models assembled for the page handlers.

use anyhow::Result;
use rusqlite::params;

use super::BoardDb;
use crate::board::models::{
    ArchiveView, BacklogView, BasicStatus, BoardView, ColumnSummary, ColumnView, EditColumnsView,
    HomeView, MembershipsView, SettingsView, Sprint, SprintView, TicketDetail,
};

impl BoardDb {
    /// All boards, plus the ones the user belongs to when identified.
    pub fn home_view(&self, user_id: Option<i64>) -> Result<HomeView> {
        let your_boards = match user_id {
            Some(id) => self.list_boards_for_user(id)?,
            None => Vec::new(),
        };
        Ok(HomeView {
            all_boards: self.list_boards()?,
            your_boards,
        })
    }

    fn membership_flags(&self, board_id: i64, user_id: Option<i64>) -> Result<(bool, bool)> {
        let membership = match user_id {
            Some(id) => self.membership_for(board_id, id)?,
            None => None,
        };
        Ok((
            membership.is_some(),
            membership.is_some_and(|m| m.is_owner),
        ))
    }

    pub fn board_view(&self, board_id: i64, user_id: Option<i64>) -> Result<BoardView> {
        let board = self.board_or_not_found(board_id)?;
        let mut columns = Vec::new();
        for status in self.list_statuses(board_id)? {
            let tickets = self.query_tickets("status_id = ?1", params![status.id])?;
            columns.push(ColumnView {
                status,
                tickets: self.ticket_cards(tickets)?,
            });
        }
        let (is_member, is_owner) = self.membership_flags(board_id, user_id)?;
        Ok(BoardView {
            board,
            columns,
            active_sprint: self.active_sprint(board_id)?,
            is_member,
            is_owner,
        })
    }

    pub fn settings_view(&self, board_id: i64, user_id: Option<i64>) -> Result<SettingsView> {
        let board = self.board_or_not_found(board_id)?;
        let (is_member, is_owner) = self.membership_flags(board_id, user_id)?;
        Ok(SettingsView {
            status_count: self.list_statuses(board_id)?.len(),
            sprint_count: self.list_sprints(board_id)?.len(),
            ticket_count: self.list_tickets(board_id)?.len(),
            member_count: self.list_memberships(board_id)?.len(),
            board,
            is_member,
            is_owner,
        })
    }

    pub fn edit_columns_view(&self, board_id: i64) -> Result<EditColumnsView> {
        let board = self.board_or_not_found(board_id)?;
        let mut statuses = Vec::new();
        for status in self.list_statuses(board_id)? {
            statuses.push(ColumnSummary {
                ticket_count: self.count_tickets_in_status(status.id)?,
                protected: BasicStatus::is_protected(&status.name),
                status,
            });
        }
        Ok(EditColumnsView { board, statuses })
    }

    fn sprint_view(&self, sprint: Sprint) -> Result<SprintView> {
        let tickets = self.query_tickets("sprint_id = ?1", params![sprint.id])?;
        Ok(SprintView {
            state: sprint.state(),
            tickets: self.ticket_cards(tickets)?,
            sprint,
        })
    }

    /// Open sprints with their tickets, and the tickets in no sprint at all.
    pub fn backlog_view(&self, board_id: i64) -> Result<BacklogView> {
        let board = self.board_or_not_found(board_id)?;
        let sprints = self
            .list_sprints(board_id)?
            .into_iter()
            .filter(|s| s.completed_date.is_none())
            .map(|s| self.sprint_view(s))
            .collect::<Result<Vec<_>>>()?;
        let backlog = self.query_tickets("board_id = ?1 AND sprint_id IS NULL", params![board_id])?;
        Ok(BacklogView {
            board,
            sprints,
            backlog: self.ticket_cards(backlog)?,
            statuses: self.list_statuses(board_id)?,
        })
    }

    pub fn archive_view(&self, board_id: i64) -> Result<ArchiveView> {
        let board = self.board_or_not_found(board_id)?;
        let sprints = self
            .list_sprints(board_id)?
            .into_iter()
            .filter(|s| s.completed_date.is_some())
            .map(|s| self.sprint_view(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(ArchiveView { board, sprints })
    }

    pub fn memberships_view(&self, board_id: i64) -> Result<MembershipsView> {
        let board = self.board_or_not_found(board_id)?;
        Ok(MembershipsView {
            board,
            members: self.list_members(board_id)?,
            candidates: self.membership_candidates(board_id)?,
        })
    }

    pub fn ticket_detail(&self, ticket_id: i64) -> Result<TicketDetail> {
        let ticket = self.ticket_or_not_found(ticket_id)?;
        let status = match ticket.status_id {
            Some(id) => self.get_status(id)?,
            None => None,
        };
        let sprint = match ticket.sprint_id {
            Some(id) => self.get_sprint(id)?,
            None => None,
        };
        let author = match ticket.author_id {
            Some(id) => self.get_user(id)?,
            None => None,
        };
        let statuses = self.list_statuses(ticket.board_id)?;
        let comments = self.comment_views(ticket.id)?;
        Ok(TicketDetail {
            ticket: self.ticket_card(ticket)?,
            status,
            sprint,
            author,
            comments,
            statuses,
        })
    }
}
