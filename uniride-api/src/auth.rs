use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// The authenticated caller, decoded once at the edge and passed explicitly
/// into handlers. There is no ambient current-user; authorization against
/// trips and reservations happens in the service with this id.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub role: String,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthenticationError("missing Authorization header".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::AuthenticationError("expected Bearer token".to_string())
        })?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.auth.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::AuthenticationError(format!("invalid token: {}", e)))?;

        let user_id = Uuid::parse_str(&token_data.claims.sub).map_err(|_| {
            AppError::AuthenticationError("token subject is not a user id".to_string())
        })?;

        Ok(Session {
            user_id,
            role: token_data.claims.role,
        })
    }
}
