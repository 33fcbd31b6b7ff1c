//! Bearer-token authentication. Tokens are issued by the external identity
//! provider; this side only verifies them (HS256) and extracts the user.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::AppState;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// User context extracted from JWT
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: Option<AuthUser>,
}

/// Verify JWT token and extract claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| format!("JWT verification failed: {}", e))
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[utoipa::path(
    get,
    path = "/auth/status",
    responses((status = 200, description = "Auth service status", body = AuthResponse)),
    tag = "auth"
)]
pub async fn auth_status() -> Json<AuthResponse> {
    Json(AuthResponse {
        message: "Auth service ready. Send a Bearer token issued by the identity provider."
            .to_string(),
        user: None,
    })
}

fn unauthorized(message: &str) -> (StatusCode, Json<AuthResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthResponse {
            message: message.to_string(),
            user: None,
        }),
    )
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = (StatusCode, Json<AuthResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = extract_bearer_token(auth_header)
            .ok_or_else(|| unauthorized("Invalid Authorization header format"))?;

        let claims = verify_token(token, &state.config.jwt_secret).map_err(|e| {
            tracing::warn!("⚠️ Auth failed: {}", e);
            unauthorized("Invalid or expired token")
        })?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role.unwrap_or_else(|| "user".to_string()),
        })
    }
}
