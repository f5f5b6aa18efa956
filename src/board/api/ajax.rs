//! JSON endpoints behind drag-and-drop on the board and backlog pages.

use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use super::{ApiError, SharedState};
use crate::board::models::{StatusOrderMove, TicketSprintMove, TicketStatusMove};

#[derive(Deserialize)]
pub struct TicketStatusBatch {
    pub tickets: Vec<TicketStatusMove>,
}

#[derive(Deserialize)]
pub struct TicketSprintBatch {
    pub tickets: Vec<TicketSprintMove>,
}

#[derive(Deserialize)]
pub struct StatusOrderBatch {
    pub statuses: Vec<StatusOrderMove>,
}

#[derive(Serialize)]
pub struct Updated<T> {
    pub updated: Vec<T>,
}

pub(super) async fn update_ticket_status(
    State(state): State<SharedState>,
    Json(mv): Json<TicketStatusMove>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = state.db.call(move |db| db.move_ticket_status(&mv)).await?;
    Ok(Json(ticket))
}

pub(super) async fn bulk_update_ticket_status(
    State(state): State<SharedState>,
    Json(batch): Json<TicketStatusBatch>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .db
        .call(move |db| db.bulk_move_ticket_status(&batch.tickets))
        .await?;
    Ok(Json(Updated { updated }))
}

pub(super) async fn bulk_update_ticket_sprint(
    State(state): State<SharedState>,
    Json(batch): Json<TicketSprintBatch>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .db
        .call(move |db| db.bulk_move_ticket_sprint(&batch.tickets))
        .await?;
    Ok(Json(Updated { updated }))
}

pub(super) async fn bulk_update_status_order(
    State(state): State<SharedState>,
    Json(batch): Json<StatusOrderBatch>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .db
        .call(move |db| db.bulk_reorder_statuses(&batch.statuses))
        .await?;
    Ok(Json(Updated { updated }))
}
