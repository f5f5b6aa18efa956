use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};

use super::{BoardDb, COMMENT_COLUMNS, comment_from_row, now, require};
use crate::board::models::{Comment, CommentView};
use crate::errors::{BoardError, Entity};

impl BoardDb {
    /// Comments are immutable once written; there is no edit or delete.
    pub fn add_comment(&self, ticket_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        if text.trim().is_empty() {
            return Err(BoardError::invalid("value", "Please enter a comment").into());
        }
        self.ticket_or_not_found(ticket_id)?;
        require(self.get_user(author_id)?, Entity::User, author_id)?;
        let stamp = now();
        self.conn
            .execute(
                "INSERT INTO comments (ticket_id, author_id, text, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![ticket_id, author_id, text, stamp],
            )
            .context("Failed to insert comment")?;
        let id = self.conn.last_insert_rowid();
        self.get_comment(id)?.context("Comment not found after insert")
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_COLUMNS),
                params![id],
                comment_from_row,
            )
            .optional()
            .context("Failed to query comment")
    }

    /// Oldest first.
    pub fn list_comments(&self, ticket_id: i64) -> Result<Vec<Comment>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM comments WHERE ticket_id = ?1 ORDER BY created_at, id",
                COMMENT_COLUMNS
            ))
            .context("Failed to prepare list_comments")?;
        let comments = stmt
            .query_map(params![ticket_id], comment_from_row)
            .context("Failed to query comments")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read comment row")?;
        Ok(comments)
    }

    pub(crate) fn comment_views(&self, ticket_id: i64) -> Result<Vec<CommentView>> {
        let mut views = Vec::new();
        for comment in self.list_comments(ticket_id)? {
            let author_name = match comment.author_id {
                Some(id) => self.get_user(id)?.map(|u| u.full_name()),
                None => None,
            };
            views.push(CommentView {
                comment,
                author_name,
            });
        }
        Ok(views)
    }
}
