use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Columns every new board starts with, in display order.
pub const DEFAULT_STATUSES: [(&str, StatusColour); 4] = [
    (BasicStatus::TODO, StatusColour::Grey),
    (BasicStatus::IN_PROGRESS, StatusColour::Blue),
    (BasicStatus::BLOCKED, StatusColour::Red),
    (BasicStatus::DONE, StatusColour::Green),
];

/// Upper bound on ticket titles and board, column and sprint names.
pub const MAX_TITLE_CHARS: usize = 200;

/// Well-known status names.
pub struct BasicStatus;

impl BasicStatus {
    pub const TODO: &'static str = "To do";
    pub const IN_PROGRESS: &'static str = "In progress";
    pub const BLOCKED: &'static str = "Blocked";
    pub const DONE: &'static str = "Done";

    /// Columns that the bulk delete action never removes.
    pub fn is_protected(name: &str) -> bool {
        name == Self::TODO || name == Self::DONE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    pub fn initials(&self) -> String {
        let first = self.first_name.chars().next();
        let last = self.last_name.chars().next();
        match (first, last) {
            (None, None) => self
                .username
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_default(),
            (f, l) => f.into_iter().chain(l).flat_map(char::to_uppercase).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardMembership {
    pub id: i64,
    pub board_id: i64,
    pub user_id: i64,
    pub is_owner: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StatusColour {
    #[default]
    Grey,
    Green,
    Turquoise,
    Blue,
    LightBlue,
    Purple,
    Pink,
    Red,
    Orange,
    Yellow,
}

impl StatusColour {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grey => "grey",
            Self::Green => "green",
            Self::Turquoise => "turquoise",
            Self::Blue => "blue",
            Self::LightBlue => "light-blue",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
        }
    }
}

impl FromStr for StatusColour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grey" => Ok(Self::Grey),
            "green" => Ok(Self::Green),
            "turquoise" => Ok(Self::Turquoise),
            "blue" => Ok(Self::Blue),
            "light-blue" => Ok(Self::LightBlue),
            "purple" => Ok(Self::Purple),
            "pink" => Ok(Self::Pink),
            "red" => Ok(Self::Red),
            "orange" => Ok(Self::Orange),
            "yellow" => Ok(Self::Yellow),
            _ => Err(format!("Invalid colour: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketStatus {
    pub id: i64,
    pub board_id: i64,
    pub name: String,
    pub order: i64,
    pub colour: StatusColour,
    pub version: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SprintState {
    NotStarted,
    Active,
    Completed,
}

impl SprintState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sprint {
    pub id: i64,
    pub board_id: i64,
    pub name: String,
    pub start_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
}

impl Sprint {
    pub fn state(&self) -> SprintState {
        match (self.start_date, self.completed_date) {
            (_, Some(_)) => SprintState::Completed,
            (Some(_), None) => SprintState::Active,
            (None, None) => SprintState::NotStarted,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == SprintState::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: i64,
    pub board_id: i64,
    pub title: String,
    pub description: String,
    pub status_id: Option<i64>,
    pub sprint_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub author_id: Option<i64>,
    pub order: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub ticket_id: i64,
    pub author_id: Option<i64>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One field edit on a ticket, decoded from a `form_name` + `value` pair.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Title(String),
    Description(String),
    Status(Option<i64>),
    Assignee(Option<i64>),
    Comment(String),
}

impl FieldUpdate {
    pub fn form_name(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Description(_) => "description",
            Self::Status(_) => "status",
            Self::Assignee(_) => "assignee",
            Self::Comment(_) => "comment",
        }
    }
}

/// Full-row ticket edit; `None` on the optional links clears them.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketChanges {
    pub title: String,
    pub description: String,
    pub status_id: Option<i64>,
    pub sprint_id: Option<i64>,
    pub assignee_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub board_id: i64,
    pub title: String,
    pub description: String,
    pub status_id: Option<i64>,
    pub sprint_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub author_id: Option<i64>,
}

// ── Reorder payload entries ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketStatusMove {
    pub id: i64,
    pub status: Option<i64>,
    pub order: i64,
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketSprintMove {
    pub id: i64,
    pub sprint: Option<i64>,
    pub order: i64,
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusOrderMove {
    pub id: i64,
    pub order: i64,
    #[serde(default)]
    pub version: Option<i64>,
}

// ── Bulk action outcomes ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ColumnDeletion {
    pub removed: Vec<String>,
    pub protected: Vec<String>,
}

impl ColumnDeletion {
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.removed.is_empty() {
            parts.push(format!("Removed columns: {}", self.removed.join(", ")));
        }
        if !self.protected.is_empty() {
            parts.push(format!("Cannot remove: {}", self.protected.join(", ")));
        }
        if parts.is_empty() {
            "No columns were removed".to_string()
        } else {
            parts.join(". ")
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MembershipAction {
    Remove,
    MakeOwner,
}

impl FromStr for MembershipAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remove" => Ok(Self::Remove),
            "make-owner" => Ok(Self::MakeOwner),
            _ => Err(format!("Invalid membership action: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BacklogAction {
    Delete,
    UpdateStatus(Option<i64>),
}

// ── View types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCard {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub assignee_name: String,
    pub assignee_initials: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnView {
    pub status: TicketStatus,
    pub tickets: Vec<TicketCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    pub board: Board,
    pub columns: Vec<ColumnView>,
    pub active_sprint: Option<Sprint>,
    pub is_member: bool,
    pub is_owner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeView {
    pub all_boards: Vec<Board>,
    pub your_boards: Vec<Board>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsView {
    pub board: Board,
    pub status_count: usize,
    pub sprint_count: usize,
    pub ticket_count: usize,
    pub member_count: usize,
    pub is_member: bool,
    pub is_owner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    #[serde(flatten)]
    pub status: TicketStatus,
    pub ticket_count: i64,
    pub protected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditColumnsView {
    pub board: Board,
    pub statuses: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintView {
    pub sprint: Sprint,
    pub state: SprintState,
    pub tickets: Vec<TicketCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogView {
    pub board: Board,
    pub sprints: Vec<SprintView>,
    pub backlog: Vec<TicketCard>,
    pub statuses: Vec<TicketStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveView {
    pub board: Board,
    pub sprints: Vec<SprintView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberView {
    pub membership: BoardMembership,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipsView {
    pub board: Board,
    pub members: Vec<MemberView>,
    pub candidates: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
    pub ticket: TicketCard,
    pub status: Option<TicketStatus>,
    pub sprint: Option<Sprint>,
    pub author: Option<User>,
    pub comments: Vec<CommentView>,
    pub statuses: Vec<TicketStatus>,
}
