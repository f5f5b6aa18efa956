use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};

use super::{BoardDb, USER_COLUMNS, conflict_on_unique, user_from_row};
use crate::board::models::User;

impl BoardDb {
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        self.conn
            .execute(
                "INSERT INTO users (username, email, first_name, last_name) VALUES (?1, ?2, ?3, ?4)",
                params![username, email, first_name, last_name],
            )
            .map_err(|e| conflict_on_unique(e, format!("Username '{}' is taken", username)))
            .context("Failed to insert user")?;
        let id = self.conn.last_insert_rowid();
        self.get_user(id)?.context("User not found after insert")
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                user_from_row,
            )
            .optional()
            .context("Failed to query user")
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE email = ?1 ORDER BY id LIMIT 1",
                    USER_COLUMNS
                ),
                params![email],
                user_from_row,
            )
            .optional()
            .context("Failed to query user by email")
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
            .context("Failed to prepare list_users")?;
        let rows = stmt
            .query_map([], user_from_row)
            .context("Failed to query users")?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row.context("Failed to read user row")?);
        }
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BoardError;

    #[test]
    fn test_create_and_find_user() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let user = db.create_user("ada", "ada@example.com", "Ada", "Lovelace")?;
        assert!(user.id > 0);
        assert_eq!(db.get_user(user.id)?, Some(user.clone()));
        assert_eq!(db.find_user_by_email("ada@example.com")?, Some(user));
        assert_eq!(db.find_user_by_email("nobody@example.com")?, None);
        Ok(())
    }

    #[test]
    fn test_duplicate_username_is_conflict() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        db.create_user("ada", "ada@example.com", "", "")?;
        let err = db.create_user("ada", "other@example.com", "", "").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BoardError>(),
            Some(BoardError::Conflict(_))
        ));
        Ok(())
    }
}
