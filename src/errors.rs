//! Typed error hierarchy for the board service.
//!
//! `BoardError` is raised by the storage layer and travels inside
//! `anyhow::Error` through `DbHandle::call`; the API layer downcasts it back
//! to pick a status code.

use std::collections::BTreeMap;

use thiserror::Error;

/// Field name → human-readable messages, in a stable order for rendering.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Which entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Board,
    Status,
    Sprint,
    Ticket,
    User,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Board => "Board",
            Entity::Status => "Status",
            Entity::Sprint => "Sprint",
            Entity::Ticket => "Ticket",
            Entity::User => "User",
        };
        f.write_str(name)
    }
}

/// Errors from board mutations and lookups.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("Validation failed: {}", summarize(.0))]
    Validation(FieldErrors),

    #[error("Sprint {sprint_id} cannot {action}: it is {state}")]
    InvalidTransition {
        sprint_id: i64,
        action: &'static str,
        state: &'static str,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Board {board_id} must keep at least one owner")]
    LastOwner { board_id: i64 },

    #[error("An identified user is required for this action")]
    Unauthenticated,
}

impl BoardError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}
