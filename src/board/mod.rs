//! Sprint board service.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, ServerConfig)          │
//! │          │ <─────── │    └─ api/   (pages, form actions, ajax)         │
//! └──────────┘          │         │                                        │
//!                       │         │ forms.rs  (validated form payloads)    │
//!                       │         v                                        │
//!                       │  db/  (BoardDb behind DbHandle, one connection)  │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module   | Responsibility                                            |
//! |----------|-----------------------------------------------------------|
//! | `models` | Rows, view models, reorder entries and `FieldUpdate`       |
//! | `forms`  | `validator`-derived forms and their domain conversions     |
//! | `db`     | SQLite access, one submodule per aggregate                 |
//! | `api`    | Handlers, `ApiError` and the `x-user-id` request context   |
//! | `seed`   | Demo users, board and tickets for `kanban seed`            |
//!
//! ## Sprint start, step by step
//!
//! 1. `POST /sprints/{id}/start` with `confirm=yes` → `api::start_sprint`
//! 2. `BoardDb::start_sprint` opens one transaction: any other active sprint
//!    loses its start date and the board's column tickets return to the
//!    backlog (archived tickets stay put). The sprint is then stamped and its
//!    tickets land in the first column.
//! 3. The handler redirects to the board with an `x-flash` message.

pub mod api;
pub mod db;
pub mod forms;
pub mod models;
pub mod seed;
pub mod server;
