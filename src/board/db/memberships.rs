use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};

use super::{BoardDb, MEMBERSHIP_COLUMNS, conflict_on_unique, membership_from_row, require};
use crate::board::models::{BoardMembership, MemberView, MembershipAction, User};
use crate::errors::{BoardError, Entity};

impl BoardDb {
    pub(crate) fn insert_membership(
        &self,
        board_id: i64,
        user_id: i64,
        is_owner: bool,
    ) -> Result<BoardMembership> {
        self.conn
            .execute(
                "INSERT INTO board_memberships (board_id, user_id, is_owner) VALUES (?1, ?2, ?3)",
                params![board_id, user_id, is_owner],
            )
            .map_err(|e| conflict_on_unique(e, format!("User {} is already a member", user_id)))
            .context("Failed to insert membership")?;
        let id = self.conn.last_insert_rowid();
        self.get_membership(id)?
            .context("Membership not found after insert")
    }

    /// Add an existing user to a board as a non-owner member.
    pub fn add_member(&self, board_id: i64, user_id: i64) -> Result<BoardMembership> {
        self.board_or_not_found(board_id)?;
        require(self.get_user(user_id)?, Entity::User, user_id)?;
        let membership = self.insert_membership(board_id, user_id, false)?;
        tracing::info!(board_id, user_id, "Added board member");
        Ok(membership)
    }

    pub fn get_membership(&self, id: i64) -> Result<Option<BoardMembership>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM board_memberships WHERE id = ?1",
                    MEMBERSHIP_COLUMNS
                ),
                params![id],
                membership_from_row,
            )
            .optional()
            .context("Failed to query membership")
    }

    pub fn membership_for(&self, board_id: i64, user_id: i64) -> Result<Option<BoardMembership>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM board_memberships WHERE board_id = ?1 AND user_id = ?2",
                    MEMBERSHIP_COLUMNS
                ),
                params![board_id, user_id],
                membership_from_row,
            )
            .optional()
            .context("Failed to query membership for user")
    }

    pub fn list_memberships(&self, board_id: i64) -> Result<Vec<BoardMembership>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM board_memberships WHERE board_id = ?1 ORDER BY id",
                MEMBERSHIP_COLUMNS
            ))
            .context("Failed to prepare list_memberships")?;
        let memberships = stmt
            .query_map(params![board_id], membership_from_row)
            .context("Failed to query memberships")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read membership row")?;
        Ok(memberships)
    }

    pub fn list_members(&self, board_id: i64) -> Result<Vec<MemberView>> {
        let mut members = Vec::new();
        for membership in self.list_memberships(board_id)? {
            let user = require(self.get_user(membership.user_id)?, Entity::User, membership.user_id)?;
            members.push(MemberView { membership, user });
        }
        Ok(members)
    }

    /// Users who could still be added to the board.
    pub fn membership_candidates(&self, board_id: i64) -> Result<Vec<User>> {
        let member_ids: Vec<i64> = self
            .list_memberships(board_id)?
            .into_iter()
            .map(|m| m.user_id)
            .collect();
        Ok(self
            .list_users()?
            .into_iter()
            .filter(|u| !member_ids.contains(&u.id))
            .collect())
    }

    /// Remove or promote the selected memberships of a board and return the
    /// affected users' names. Memberships of other boards are ignored.
    ///
    /// A removal that would leave the board without any owner is refused as a
    /// whole with [`BoardError::LastOwner`].
    pub fn apply_membership_action(
        &self,
        board_id: i64,
        membership_ids: &[i64],
        action: MembershipAction,
    ) -> Result<Vec<String>> {
        self.board_or_not_found(board_id)?;
        self.in_transaction(|db| {
            let all = db.list_memberships(board_id)?;
            let selected: Vec<&BoardMembership> = all
                .iter()
                .filter(|m| membership_ids.contains(&m.id))
                .collect();

            if action == MembershipAction::Remove {
                let removes_owner = selected.iter().any(|m| m.is_owner);
                let owners_left = all
                    .iter()
                    .filter(|m| m.is_owner && !membership_ids.contains(&m.id))
                    .count();
                if removes_owner && owners_left == 0 {
                    return Err(BoardError::LastOwner { board_id }.into());
                }
            }

            let mut affected = Vec::new();
            for membership in selected {
                match action {
                    MembershipAction::Remove => {
                        db.conn
                            .execute(
                                "DELETE FROM board_memberships WHERE id = ?1",
                                params![membership.id],
                            )
                            .context("Failed to delete membership")?;
                    }
                    MembershipAction::MakeOwner => {
                        db.conn
                            .execute(
                                "UPDATE board_memberships SET is_owner = 1 WHERE id = ?1",
                                params![membership.id],
                            )
                            .context("Failed to promote membership")?;
                    }
                }
                let user = require(
                    db.get_user(membership.user_id)?,
                    Entity::User,
                    membership.user_id,
                )?;
                affected.push(user.full_name());
            }
            tracing::info!(board_id, ?action, count = affected.len(), "Applied membership action");
            Ok(affected)
        })
    }
}
