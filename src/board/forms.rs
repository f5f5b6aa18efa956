//! Urlencoded form payloads and their conversion into domain values.
//!
//! Empty optional fields mean "none". Field-level problems surface as
//! [`BoardError::Validation`] so the API layer can answer 422 with the
//! offending field names.

use std::str::FromStr;

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use super::models::{
    BacklogAction, FieldUpdate, MAX_TITLE_CHARS, MembershipAction, NewTicket, StatusColour,
    TicketChanges,
};
use crate::errors::{BoardError, FieldErrors};

fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

/// Flatten `validator`'s report into field → messages.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

fn check<T: Validate>(form: &T) -> Result<(), BoardError> {
    form.validate()
        .map_err(|e| BoardError::Validation(field_errors(&e)))
}

/// Parse an optional id field; the empty string means "none".
fn optional_id(field: &str, value: Option<&str>) -> Result<Option<i64>, BoardError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| BoardError::invalid(field, format!("'{}' is not a valid choice", raw))),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BoardForm {
    #[validate(length(max = 200, message = "Board name must be at most 200 characters"))]
    #[validate(custom(function = "validate_not_blank", message = "Please enter a board name"))]
    pub name: String,
}

impl BoardForm {
    pub fn into_name(self) -> Result<String, BoardError> {
        check(&self)?;
        Ok(self.name.trim().to_string())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ColumnForm {
    #[validate(length(max = 200, message = "Column name must be at most 200 characters"))]
    #[validate(custom(function = "validate_not_blank", message = "Please enter a column name"))]
    pub name: String,
    #[serde(default)]
    pub colour: Option<String>,
}

impl ColumnForm {
    pub fn into_parts(self) -> Result<(String, StatusColour), BoardError> {
        check(&self)?;
        let colour = match self.colour.as_deref().map(str::trim) {
            None | Some("") => StatusColour::default(),
            Some(raw) => StatusColour::from_str(raw).map_err(|e| BoardError::invalid("colour", e))?,
        };
        Ok((self.name.trim().to_string(), colour))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SprintForm {
    #[validate(length(max = 200, message = "Sprint name must be at most 200 characters"))]
    #[validate(custom(function = "validate_not_blank", message = "Please enter a sprint name"))]
    pub name: String,
}

impl SprintForm {
    pub fn into_name(self) -> Result<String, BoardError> {
        check(&self)?;
        Ok(self.name.trim().to_string())
    }
}

/// Create and full-edit form for tickets.
#[derive(Debug, Deserialize, Validate)]
pub struct TicketForm {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    #[validate(custom(function = "validate_not_blank", message = "Please enter a title"))]
    pub title: String,
    #[validate(custom(function = "validate_not_blank", message = "Please enter a description"))]
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sprint: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
}

impl TicketForm {
    pub fn into_changes(self) -> Result<TicketChanges, BoardError> {
        check(&self)?;
        Ok(TicketChanges {
            status_id: optional_id("status", self.status.as_deref())?,
            sprint_id: optional_id("sprint", self.sprint.as_deref())?,
            assignee_id: optional_id("assignee", self.assignee.as_deref())?,
            title: self.title,
            description: self.description,
        })
    }

    pub fn into_new_ticket(
        self,
        board_id: i64,
        author_id: Option<i64>,
    ) -> Result<NewTicket, BoardError> {
        let changes = self.into_changes()?;
        Ok(NewTicket {
            board_id,
            title: changes.title,
            description: changes.description,
            status_id: changes.status_id,
            sprint_id: changes.sprint_id,
            assignee_id: changes.assignee_id,
            author_id,
        })
    }
}

/// Single-field ticket edit: `form_name` picks the field, `value` carries it.
#[derive(Debug, Deserialize)]
pub struct TicketFieldForm {
    pub form_name: String,
    #[serde(default)]
    pub value: String,
}

impl TryFrom<TicketFieldForm> for FieldUpdate {
    type Error = BoardError;

    fn try_from(form: TicketFieldForm) -> Result<Self, Self::Error> {
        let value = form.value;
        match form.form_name.as_str() {
            "title" => {
                if value.trim().is_empty() {
                    Err(BoardError::invalid("value", "Please enter a title"))
                } else if value.chars().count() > MAX_TITLE_CHARS {
                    Err(BoardError::invalid(
                        "value",
                        format!("Title must be at most {} characters", MAX_TITLE_CHARS),
                    ))
                } else {
                    Ok(FieldUpdate::Title(value))
                }
            }
            "description" => {
                if value.trim().is_empty() {
                    Err(BoardError::invalid("value", "Please enter a description"))
                } else {
                    Ok(FieldUpdate::Description(value))
                }
            }
            "status" => Ok(FieldUpdate::Status(optional_id("value", Some(&value))?)),
            "assignee" => Ok(FieldUpdate::Assignee(optional_id("value", Some(&value))?)),
            "comment" => {
                if value.trim().is_empty() {
                    Err(BoardError::invalid("value", "Please enter a comment"))
                } else {
                    Ok(FieldUpdate::Comment(value))
                }
            }
            other => Err(BoardError::invalid(
                "form_name",
                format!("Unknown field '{}'", other),
            )),
        }
    }
}

/// Confirmation checkbox for sprint start/complete.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirm: Option<String>,
}

impl ConfirmForm {
    pub fn require_confirmed(&self) -> Result<(), BoardError> {
        match self.confirm.as_deref().map(str::trim) {
            Some("yes" | "true" | "on") => Ok(()),
            _ => Err(BoardError::invalid("confirm", "Please confirm this action")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddMemberForm {
    pub user: String,
}

impl AddMemberForm {
    pub fn user_id(&self) -> Result<i64, BoardError> {
        optional_id("user", Some(&self.user))?
            .ok_or_else(|| BoardError::invalid("user", "Please select a user"))
    }
}

/// A urlencoded body with repeated keys, as sent by multi-select forms.
#[derive(Debug, Default)]
pub struct MultiForm(pub Vec<(String, String)>);

impl MultiForm {
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted under `key`, parsed as ids.
    pub fn ids(&self, key: &str) -> Result<Vec<i64>, BoardError> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| {
                v.trim()
                    .parse()
                    .map_err(|_| BoardError::invalid(key, format!("'{}' is not a valid id", v)))
            })
            .collect()
    }

    fn action(&self) -> Result<&str, BoardError> {
        self.first("form-action")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| BoardError::invalid("form-action", "Please choose an action"))
    }

    /// `selected_status` ids of a column delete form.
    pub fn column_deletion(&self) -> Result<Vec<i64>, BoardError> {
        match self.action()? {
            "delete" => self.ids("selected_status"),
            other => Err(BoardError::invalid(
                "form-action",
                format!("Unknown action '{}'", other),
            )),
        }
    }

    pub fn backlog_action(&self) -> Result<(Vec<i64>, BacklogAction), BoardError> {
        let action = match self.action()? {
            "delete" => BacklogAction::Delete,
            "update-status" => BacklogAction::UpdateStatus(optional_id("status", self.first("status"))?),
            other => {
                return Err(BoardError::invalid(
                    "form-action",
                    format!("Unknown action '{}'", other),
                ));
            }
        };
        Ok((self.ids("selected_tickets")?, action))
    }

    pub fn membership_action(&self) -> Result<(Vec<i64>, MembershipAction), BoardError> {
        let action =
            MembershipAction::from_str(self.action()?).map_err(|e| BoardError::invalid("form-action", e))?;
        Ok((self.ids("selected_members")?, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_of(err: BoardError) -> FieldErrors {
        match err {
            BoardError::Validation(errors) => errors,
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    fn multi(pairs: &[(&str, &str)]) -> MultiForm {
        MultiForm(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_board_form_trims_and_rejects_blank() {
        let name = BoardForm { name: "  Alpha ".into() }.into_name().unwrap();
        assert_eq!(name, "Alpha");

        let errors = errors_of(BoardForm { name: "   ".into() }.into_name().unwrap_err());
        assert_eq!(errors["name"], vec!["Please enter a board name".to_string()]);

        let errors = errors_of(BoardForm { name: "x".repeat(201) }.into_name().unwrap_err());
        assert!(errors.contains_key("name"));
    }

    #[test]
    fn test_column_form_colour_defaults_to_grey() {
        let (name, colour) = ColumnForm {
            name: "Review".into(),
            colour: Some(String::new()),
        }
        .into_parts()
        .unwrap();
        assert_eq!(name, "Review");
        assert_eq!(colour, StatusColour::Grey);

        let err = ColumnForm {
            name: "Review".into(),
            colour: Some("mauve".into()),
        }
        .into_parts()
        .unwrap_err();
        assert!(errors_of(err).contains_key("colour"));
    }

    #[test]
    fn test_ticket_form_empty_optionals_mean_none() {
        let changes = TicketForm {
            title: "T".into(),
            description: "d".into(),
            status: Some("".into()),
            sprint: None,
            assignee: Some("4".into()),
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.status_id, None);
        assert_eq!(changes.sprint_id, None);
        assert_eq!(changes.assignee_id, Some(4));
    }

    #[test]
    fn test_ticket_form_reports_every_bad_field() {
        let err = TicketForm {
            title: "".into(),
            description: " ".into(),
            status: None,
            sprint: None,
            assignee: None,
        }
        .into_changes()
        .unwrap_err();
        let errors = errors_of(err);
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("description"));
    }

    #[test]
    fn test_ticket_form_rejects_non_numeric_status() {
        let err = TicketForm {
            title: "T".into(),
            description: "d".into(),
            status: Some("doing".into()),
            sprint: None,
            assignee: None,
        }
        .into_new_ticket(1, None)
        .unwrap_err();
        assert!(errors_of(err).contains_key("status"));
    }

    #[test]
    fn test_field_form_decodes_each_variant() {
        let decode = |name: &str, value: &str| {
            FieldUpdate::try_from(TicketFieldForm {
                form_name: name.into(),
                value: value.into(),
            })
        };
        assert_eq!(decode("title", "New").unwrap(), FieldUpdate::Title("New".into()));
        assert_eq!(
            decode("description", "Body").unwrap(),
            FieldUpdate::Description("Body".into())
        );
        assert_eq!(decode("status", "").unwrap(), FieldUpdate::Status(None));
        assert_eq!(decode("status", "3").unwrap(), FieldUpdate::Status(Some(3)));
        assert_eq!(decode("assignee", "").unwrap(), FieldUpdate::Assignee(None));
        assert_eq!(decode("comment", "hi").unwrap(), FieldUpdate::Comment("hi".into()));
        assert!(decode("title", "").is_err());
        assert!(decode("comment", "  ").is_err());
        assert!(errors_of(decode("priority", "high").unwrap_err()).contains_key("form_name"));
    }

    #[test]
    fn test_confirm_form() {
        for ok in ["yes", "true", "on"] {
            let form = ConfirmForm {
                confirm: Some(ok.into()),
            };
            assert!(form.require_confirmed().is_ok());
        }
        assert!(ConfirmForm::default().require_confirmed().is_err());
        let form = ConfirmForm {
            confirm: Some("no".into()),
        };
        assert!(form.require_confirmed().is_err());
    }

    #[test]
    fn test_multi_form_collects_repeated_keys() {
        let form = multi(&[
            ("selected_status", "3"),
            ("selected_status", "5"),
            ("form-action", "delete"),
        ]);
        assert_eq!(form.column_deletion().unwrap(), vec![3, 5]);
    }

    #[test]
    fn test_backlog_action_parsing() {
        let form = multi(&[
            ("selected_tickets", "1"),
            ("form-action", "update-status"),
            ("status", ""),
        ]);
        let (ids, action) = form.backlog_action().unwrap();
        assert_eq!(ids, vec![1]);
        assert_eq!(action, BacklogAction::UpdateStatus(None));

        let form = multi(&[("form-action", "archive")]);
        assert!(form.backlog_action().is_err());
        assert!(MultiForm::default().backlog_action().is_err());
    }

    #[test]
    fn test_membership_action_parsing() {
        let form = multi(&[("selected_members", "8"), ("form-action", "make-owner")]);
        let (ids, action) = form.membership_action().unwrap();
        assert_eq!(ids, vec![8]);
        assert_eq!(action, MembershipAction::MakeOwner);

        let form = multi(&[("selected_members", "x"), ("form-action", "remove")]);
        assert!(errors_of(form.membership_action().unwrap_err()).contains_key("selected_members"));
    }
}
