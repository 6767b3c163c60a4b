//! HTTP handlers for the gateway

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::catalog::UserContext;
use crate::error::CatalogError;
use crate::server::ServerState;

/// Tool call request body
#[derive(Debug, Default, Deserialize)]
pub struct ToolCallRequest {
    #[serde(default)]
    pub arguments: Value,
    /// Overrides identity headers when present
    #[serde(default)]
    pub context: Option<UserContext>,
}

#[derive(Debug, Deserialize)]
pub struct ReadResourceQuery {
    pub uri: String,
}

/// Hard failure rendered as `{ error, code }` with a mapped status
pub struct ApiError(pub CatalogError);

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::UserContextRequired(_) => StatusCode::UNAUTHORIZED,
        CatalogError::InvalidArguments(_)
        | CatalogError::UnknownResource(_)
        | CatalogError::UnknownTool(_)
        | CatalogError::NotDirectView { .. } => StatusCode::BAD_REQUEST,
        CatalogError::ConcurrentWrite { .. } => StatusCode::CONFLICT,
        CatalogError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        CatalogError::Collaborator(_) => StatusCode::BAD_GATEWAY,
        CatalogError::LockPoisoned(_) | CatalogError::Io(_) | CatalogError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(json!({
                "error": self.0.to_string(),
                "code": self.0.code(),
            })),
        )
            .into_response()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Identity forwarded by the session layer in `X-User-Id` and friends
pub fn user_from_headers(headers: &HeaderMap) -> Option<UserContext> {
    let user_id = header_str(headers, "x-user-id")?;
    let mut user = UserContext::new(user_id);
    user.site_id = header_str(headers, "x-site-id").map(str::to_string);
    user.locale = header_str(headers, header::ACCEPT_LANGUAGE.as_str()).map(str::to_string);
    user.auth_token = header_str(headers, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    if let Some(roles) = header_str(headers, "x-user-roles") {
        user.roles = roles
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
    }
    Some(user)
}

pub async fn status_handler(State(state): State<ServerState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.gateway.status()?))
}

pub async fn list_resources_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(state.gateway.list_resources())
}

pub async fn read_resource_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<ReadResourceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = user_from_headers(&headers);
    let value = state.gateway.read_resource(&query.uri, user.as_ref()).await?;
    Ok(Json(value))
}

pub async fn list_tools_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(state.gateway.list_tools().to_vec())
}

pub async fn call_tool_handler(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Option<Json<ToolCallRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let user = request.context.or_else(|| user_from_headers(&headers));
    let result = state.gateway.call_tool(&name, request.arguments, user.as_ref()).await?;
    Ok((StatusCode::OK, Json(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&CatalogError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&CatalogError::UserContextRequired("t")), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&CatalogError::UnknownTool("t".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&CatalogError::Timeout(10)), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(&CatalogError::Collaborator(anyhow::anyhow!("down"))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&CatalogError::LockPoisoned("read")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_user_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(user_from_headers(&headers).is_none());

        headers.insert("x-user-id", HeaderValue::from_static("u1"));
        headers.insert("x-site-id", HeaderValue::from_static("acme"));
        headers.insert("x-user-roles", HeaderValue::from_static("Manager, developer,"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));

        let user = user_from_headers(&headers).unwrap();
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.site_id.as_deref(), Some("acme"));
        assert_eq!(user.auth_token.as_deref(), Some("tok"));
        assert_eq!(user.roles, vec!["Manager", "developer"]);
    }
}
