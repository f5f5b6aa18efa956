use axum::{extract::FromRequestParts, http::request::Parts};

use super::ApiError;

/// Header set by the authenticating proxy with the signed-in user's id.
pub const USER_HEADER: &str = "x-user-id";

/// Who is making the request. Anonymous when the header is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Option<i64>,
}

impl RequestContext {
    pub fn require_user(&self) -> Result<i64, ApiError> {
        self.user_id.ok_or_else(|| {
            ApiError::Unauthenticated("An identified user is required for this action".into())
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_HEADER) else {
            return Ok(Self::default());
        };
        let user_id = value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid {} header", USER_HEADER)))?;
        Ok(Self {
            user_id: Some(user_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<RequestContext, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        RequestContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_missing_header_is_anonymous() {
        let ctx = extract(None).await.ok().unwrap();
        assert_eq!(ctx.user_id, None);
        assert!(ctx.require_user().is_err());
    }

    #[tokio::test]
    async fn test_header_is_parsed() {
        let ctx = extract(Some(" 42 ")).await.ok().unwrap();
        assert_eq!(ctx.user_id, Some(42));
        assert_eq!(ctx.require_user().ok(), Some(42));
    }

    #[tokio::test]
    async fn test_garbage_header_is_rejected() {
        assert!(matches!(extract(Some("alice")).await, Err(ApiError::BadRequest(_))));
    }
}
