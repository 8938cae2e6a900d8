use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

use crate::app::AppState;
use crate::auth::auth::AuthUser;
use crate::services::auth_service::{get_auth_token, validate_jwt};

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Get the auth token from the request
    let token = match get_auth_token(&req) {
        Ok(token) => token,
        Err(e) => {
            debug!("Rejecting unauthenticated request: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 2. Validate token
    let secret = match &state.jwt_secret {
        Some(secret) => secret,
        None => {
            error!("Auth JWT secret not configured");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let token_data = match validate_jwt(&token, secret) {
        Ok(token_data) => token_data,
        Err(e) => {
            error!("JWT validation failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 3. Resolve the caller and hand it to downstream handlers
    let user = AuthUser::from_claims(&token_data.claims).map_err(|e| {
        error!("{}", e);
        StatusCode::UNAUTHORIZED
    })?;
    debug!("Authenticated user {} (staff: {})", user.user.id, user.is_staff);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
