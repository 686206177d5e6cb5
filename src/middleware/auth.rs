use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::error::AppError;
use crate::utils::jwt::TokenService;

/// Structure qui contient les infos de l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
}

impl AuthUser {
    /// Jeton d'identité utilisé par le panier et les commandes
    pub fn token(&self) -> String {
        self.user_id.to_string()
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract(req))
    }
}

fn extract(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| AppError::Internal("token service not configured".into()))?;

    // 1. Header Authorization
    let auth_str = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    // 2. Format: "Bearer <token>"
    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization format (expected: Bearer <token>)".into())
        })?;

    // 3. Vérifier le JWT
    let claims = tokens.verify_token(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    Ok(AuthUser {
        user_id: claims.sub,
        email: claims.email,
        username: claims.username,
    })
}
