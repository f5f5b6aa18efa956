//! Read-only board pages, rendered as JSON view models.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use super::{ApiError, RequestContext, SharedState};

pub(super) async fn home(
    State(state): State<SharedState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.db.call(move |db| db.home_view(ctx.user_id)).await?;
    Ok(Json(view))
}

pub(super) async fn board_detail(
    State(state): State<SharedState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .db
        .call(move |db| db.board_view(id, ctx.user_id))
        .await?;
    Ok(Json(view))
}

pub(super) async fn board_settings(
    State(state): State<SharedState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .db
        .call(move |db| db.settings_view(id, ctx.user_id))
        .await?;
    Ok(Json(view))
}

pub(super) async fn edit_columns(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.db.call(move |db| db.edit_columns_view(id)).await?;
    Ok(Json(view))
}

pub(super) async fn backlog(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.db.call(move |db| db.backlog_view(id)).await?;
    Ok(Json(view))
}

pub(super) async fn archive(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.db.call(move |db| db.archive_view(id)).await?;
    Ok(Json(view))
}

pub(super) async fn memberships(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.db.call(move |db| db.memberships_view(id)).await?;
    Ok(Json(view))
}

pub(super) async fn ticket_detail(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.db.call(move |db| db.ticket_detail(id)).await?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_home_lists_your_boards_for_identified_user() {
        let (app, _, owner, board) = seeded_app();
        let response = app
            .clone()
            .oneshot(get("/", Some(owner.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(view["all_boards"][0]["name"], "Alpha");
        assert_eq!(view["your_boards"][0]["id"], board.id);

        let response = app.oneshot(get("/", None)).await.unwrap();
        let view: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(view["your_boards"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_board_detail_has_default_columns() {
        let (app, _, owner, board) = seeded_app();
        let response = app
            .oneshot(get(&format!("/boards/{}", board.id), Some(owner.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view: serde_json::Value = body_json(response.into_body()).await;
        let names: Vec<_> = view["columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["status"]["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["To do", "In progress", "Blocked", "Done"]);
        assert_eq!(view["is_owner"], true);
        assert_eq!(view["columns"][0]["status"]["colour"], "grey");
    }

    #[tokio::test]
    async fn test_missing_board_is_404() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/boards/99", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "Board 99 not found");
    }

    #[tokio::test]
    async fn test_settings_and_columns_pages() {
        let (app, _, _, board) = seeded_app();
        let response = app
            .clone()
            .oneshot(get(&format!("/boards/{}/settings", board.id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(view["status_count"], 4);
        assert_eq!(view["is_member"], false);

        let response = app
            .oneshot(get(&format!("/boards/{}/columns", board.id), None))
            .await
            .unwrap();
        let view: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(view["statuses"][0]["protected"], true);
        assert_eq!(view["statuses"][0]["ticket_count"], 0);
    }

    #[tokio::test]
    async fn test_memberships_page_lists_candidates() {
        let (app, handle, _, board) = seeded_app();
        handle
            .lock_sync()
            .unwrap()
            .create_user("dev", "dev@example.com", "", "")
            .unwrap();
        let response = app
            .oneshot(get(&format!("/boards/{}/memberships", board.id), None))
            .await
            .unwrap();
        let view: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(view["members"].as_array().unwrap().len(), 1);
        assert_eq!(view["members"][0]["membership"]["is_owner"], true);
        assert_eq!(view["candidates"][0]["username"], "dev");
    }

    #[tokio::test]
    async fn test_backlog_and_archive_pages() {
        let (app, _, _, board) = seeded_app();
        for page in ["backlog", "archive"] {
            let response = app
                .clone()
                .oneshot(get(&format!("/boards/{}/{}", board.id, page), None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let view: serde_json::Value = body_json(response.into_body()).await;
            assert_eq!(view["sprints"].as_array().unwrap().len(), 0);
        }
    }
}
