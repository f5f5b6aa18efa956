//! HTTP surface: page reads, form actions and the AJAX reorder endpoints.

mod actions;
mod ajax;
mod context;
mod error;
mod pages;

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use super::db::DbHandle;

pub use context::{RequestContext, USER_HEADER};
pub use error::ApiError;

/// Response header carrying the one-shot message shown after a redirect.
pub const FLASH_HEADER: &str = "x-flash";

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
}

pub type SharedState = Arc<AppState>;

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(pages::home))
        .route("/boards", post(actions::create_board))
        .route("/boards/{id}", get(pages::board_detail))
        .route("/boards/{id}/edit", post(actions::edit_board))
        .route("/boards/{id}/settings", get(pages::board_settings))
        .route(
            "/boards/{id}/columns",
            get(pages::edit_columns).post(actions::create_column),
        )
        .route("/boards/{id}/columns/delete", post(actions::delete_columns))
        .route(
            "/boards/{id}/backlog",
            get(pages::backlog).post(actions::backlog_action),
        )
        .route("/boards/{id}/archive", get(pages::archive))
        .route(
            "/boards/{id}/memberships",
            get(pages::memberships).post(actions::membership_action),
        )
        .route("/boards/{id}/memberships/new", post(actions::add_member))
        .route("/boards/{id}/tickets", post(actions::create_ticket))
        .route("/boards/{id}/sprints", post(actions::create_sprint))
        .route("/statuses/{id}/rename", post(actions::rename_column))
        .route(
            "/tickets/{id}",
            get(pages::ticket_detail).post(actions::update_ticket_field),
        )
        .route("/tickets/{id}/edit", post(actions::edit_ticket))
        .route("/sprints/{id}/start", post(actions::start_sprint))
        .route("/sprints/{id}/complete", post(actions::complete_sprint))
        .route("/ajax/tickets/update-status", post(ajax::update_ticket_status))
        .route(
            "/ajax/tickets/bulk-update-status",
            post(ajax::bulk_update_ticket_status),
        )
        .route(
            "/ajax/tickets/bulk-update-sprint",
            post(ajax::bulk_update_ticket_sprint),
        )
        .route(
            "/ajax/statuses/bulk-update-order",
            post(ajax::bulk_update_status_order),
        )
}

// ── Helpers ───────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

/// 303 redirect, optionally carrying a flash message.
fn redirect(to: &str, flash: Option<&str>) -> Response {
    let mut response = Redirect::to(to).into_response();
    if let Some(message) = flash {
        match HeaderValue::from_bytes(message.as_bytes()) {
            Ok(value) => {
                response.headers_mut().insert(FLASH_HEADER, value);
            }
            Err(e) => tracing::warn!(error = %e, "Dropping flash message that is not a valid header"),
        }
    }
    response
}


#[cfg(test)]
mod tests {
    use super::redirect;
    use super::test_support::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[test]
    fn test_redirect_carries_flash() {
        let response = redirect("/boards/1", Some("Removed columns: Blocked"));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/boards/1");
        assert_eq!(flash(&response).as_deref(), Some("Removed columns: Blocked"));
    }

    #[test]
    fn test_redirect_drops_invalid_flash() {
        let response = redirect("/", Some("line\nbreak"));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(flash(&response).is_none());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/nowhere", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
