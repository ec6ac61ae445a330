use crate::auth::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// The caller identified by the `Authorization` header.
///
/// Accepts `Bearer <jwt>` as well as the `Token <jwt>` form older clients send.
/// Handlers that also serve anonymous callers take `Option<AuthenticatedUser>`.
pub struct AuthenticatedUser {
    pub user_id: i64,
    #[allow(dead_code)]
    pub email: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ApiError> {
    let header_str = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    let token = header_str
        .strip_prefix("Bearer ")
        .or_else(|| header_str.strip_prefix("Token "))
        .ok_or(ApiError::Unauthenticated)?;

    let config = req.app_data::<web::Data<Config>>().ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!("Config is not registered as app data"))
    })?;

    let claims = verify_token(token.trim(), &config.jwt.secret).map_err(|e| {
        log::debug!("Rejected token: {:?}", e);
        ApiError::Unauthenticated
    })?;

    let user_id = claims.user_id().ok_or(ApiError::Unauthenticated)?;
    Ok(AuthenticatedUser {
        user_id,
        email: claims.email,
    })
}
