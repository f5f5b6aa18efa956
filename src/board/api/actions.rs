//! Form posts. Every successful action answers with a 303 redirect; bulk
//! actions attach a flash summary.

use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};

use super::{ApiError, RequestContext, SharedState, redirect};
use crate::board::forms::{
    AddMemberForm, BoardForm, ColumnForm, ConfirmForm, MultiForm, SprintForm, TicketFieldForm,
    TicketForm,
};
use crate::board::models::{BacklogAction, FieldUpdate, MembershipAction};

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

// ── Boards ────────────────────────────────────────────────────────────

pub(super) async fn create_board(
    State(state): State<SharedState>,
    ctx: RequestContext,
    Form(form): Form<BoardForm>,
) -> Result<Response, ApiError> {
    let owner_id = ctx.require_user()?;
    let name = form.into_name()?;
    let board = state
        .db
        .call(move |db| db.create_board(&name, owner_id))
        .await?;
    Ok(redirect(&format!("/boards/{}", board.id), None))
}

pub(super) async fn edit_board(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<BoardForm>,
) -> Result<Response, ApiError> {
    let name = form.into_name()?;
    state.db.call(move |db| db.rename_board(id, &name)).await?;
    Ok(redirect(&format!("/boards/{}", id), None))
}

// ── Columns ───────────────────────────────────────────────────────────

pub(super) async fn create_column(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<ColumnForm>,
) -> Result<Response, ApiError> {
    let (name, colour) = form.into_parts()?;
    state
        .db
        .call(move |db| db.create_status(id, &name, colour))
        .await?;
    Ok(redirect(&format!("/boards/{}/columns", id), None))
}

pub(super) async fn rename_column(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<ColumnForm>,
) -> Result<Response, ApiError> {
    let (name, _) = form.into_parts()?;
    let status = state.db.call(move |db| db.rename_status(id, &name)).await?;
    Ok(redirect(&format!("/boards/{}/columns", status.board_id), None))
}

pub(super) async fn delete_columns(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let status_ids = MultiForm(pairs).column_deletion()?;
    let outcome = state
        .db
        .call(move |db| db.delete_statuses(id, &status_ids))
        .await?;
    Ok(redirect(
        &format!("/boards/{}/columns", id),
        Some(&outcome.summary()),
    ))
}

// ── Backlog ───────────────────────────────────────────────────────────

pub(super) async fn backlog_action(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let (ticket_ids, action) = MultiForm(pairs).backlog_action()?;
    let message = match action {
        BacklogAction::Delete => "Deleted",
        BacklogAction::UpdateStatus(_) => "Updated status of",
    };
    let affected = state
        .db
        .call(move |db| db.apply_backlog_action(id, &ticket_ids, action))
        .await?;
    Ok(redirect(
        &format!("/boards/{}/backlog", id),
        Some(&format!("{} {}", message, plural(affected, "ticket"))),
    ))
}

// ── Memberships ───────────────────────────────────────────────────────

pub(super) async fn membership_action(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let (membership_ids, action) = MultiForm(pairs).membership_action()?;
    let names = state
        .db
        .call(move |db| db.apply_membership_action(id, &membership_ids, action))
        .await?;
    let flash = if names.is_empty() {
        "No members were changed".to_string()
    } else {
        match action {
            MembershipAction::Remove => format!("Removed from board: {}", names.join(", ")),
            MembershipAction::MakeOwner => format!("Now owners: {}", names.join(", ")),
        }
    };
    Ok(redirect(&format!("/boards/{}/memberships", id), Some(&flash)))
}

pub(super) async fn add_member(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<AddMemberForm>,
) -> Result<Response, ApiError> {
    let user_id = form.user_id()?;
    let name = state
        .db
        .call(move |db| {
            db.add_member(id, user_id)?;
            Ok(db.get_user(user_id)?.map(|u| u.full_name()).unwrap_or_default())
        })
        .await?;
    Ok(redirect(
        &format!("/boards/{}/memberships", id),
        Some(&format!("Added {} to the board", name)),
    ))
}

// ── Tickets ───────────────────────────────────────────────────────────

pub(super) async fn create_ticket(
    State(state): State<SharedState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Form(form): Form<TicketForm>,
) -> Result<Response, ApiError> {
    let new = form.into_new_ticket(id, ctx.user_id)?;
    let ticket = state.db.call(move |db| db.create_ticket(&new)).await?;
    let to = if ticket.status_id.is_some() {
        format!("/boards/{}", id)
    } else {
        format!("/boards/{}/backlog", id)
    };
    Ok(redirect(&to, None))
}

pub(super) async fn update_ticket_field(
    State(state): State<SharedState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
    Form(form): Form<TicketFieldForm>,
) -> Result<Response, ApiError> {
    let update = FieldUpdate::try_from(form)?;
    state
        .db
        .call(move |db| db.apply_field_update(id, update, ctx.user_id))
        .await?;
    Ok(redirect(&format!("/tickets/{}", id), None))
}

pub(super) async fn edit_ticket(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<TicketForm>,
) -> Result<Response, ApiError> {
    let changes = form.into_changes()?;
    state
        .db
        .call(move |db| db.update_ticket(id, &changes))
        .await?;
    Ok(redirect(&format!("/tickets/{}", id), None))
}

// ── Sprints ───────────────────────────────────────────────────────────

pub(super) async fn create_sprint(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<SprintForm>,
) -> Result<Response, ApiError> {
    let name = form.into_name()?;
    state.db.call(move |db| db.create_sprint(id, &name)).await?;
    Ok(redirect(&format!("/boards/{}/backlog", id), None))
}

pub(super) async fn start_sprint(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<ConfirmForm>,
) -> Result<Response, ApiError> {
    form.require_confirmed()?;
    let sprint = state.db.call(move |db| db.start_sprint(id)).await?;
    Ok(redirect(
        &format!("/boards/{}", sprint.board_id),
        Some(&format!("Sprint {} started", sprint.name)),
    ))
}

pub(super) async fn complete_sprint(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<ConfirmForm>,
) -> Result<Response, ApiError> {
    form.require_confirmed()?;
    let sprint = state.db.call(move |db| db.complete_sprint(id)).await?;
    Ok(redirect(
        &format!("/boards/{}", sprint.board_id),
        Some(&format!("Sprint {} completed", sprint.name)),
    ))
}
