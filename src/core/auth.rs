use crate::core::{AppError, AppState};
use crate::entities::{User, UserRole};
use crate::repositories::Read;
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Name of the cookie set at login
pub const TOKEN_COOKIE: &str = "token";

/// Content of the JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: i64,
    pub username: String,
}

#[instrument(skip(secret), fields(username = %username, id = %id))]
pub fn encode_jwt(
    username: String,
    id: i64,
    secret: &str,
    lifetime_hours: i64,
) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let expire = Duration::hours(lifetime_hours);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        username,
        id,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    decode(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// Finds the token in, by priority: `Authorization: Bearer`, the `token`
/// cookie, the `token` query parameter (browsers cannot set headers on a
/// WebSocket handshake).
fn extract_token(req: &Request) -> Option<String> {
    let headers = req.headers();

    if let Some(value) = headers.get(http::header::AUTHORIZATION) {
        let value = value.to_str().ok()?;
        let mut parts = value.split_whitespace();
        return match (parts.next(), parts.next()) {
            (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
                Some(token.to_string())
            }
            _ => None,
        };
    }

    let from_cookie = headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.to_string());
    if from_cookie.is_some() {
        return from_cookie;
    }

    req.uri()
        .query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == "token")
        .map(|(_, value)| value.to_string())
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let token = extract_token(&req).ok_or_else(|| {
        warn!("Missing or malformed credentials");
        AppError::unauthorized("Please provide a bearer token")
    })?;

    let token_data = decode_jwt(&token, &state.jwt_secret)
        .map_err(|_| AppError::unauthorized("Unable to decode token"))?;

    let current_user = match state.user.read(&token_data.claims.id).await? {
        Some(user) if !user.password.is_empty() => user,
        _ => {
            warn!(user_id = token_data.claims.id, "Token refers to an unknown or deleted user");
            return Err(AppError::unauthorized("You are not an authorized user"));
        }
    };
    debug!("User authenticated: {}", current_user.username);

    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}

/// Checks that `user` holds at least `minimum`
#[instrument(skip(user), fields(user_id = user.user_id))]
pub fn require_role(user: &User, minimum: UserRole) -> Result<(), AppError> {
    if !user.has_role(minimum) {
        warn!(
            "User {} has insufficient role {:?}, required {:?}",
            user.user_id, user.role, minimum
        );
        return Err(AppError::forbidden("Insufficient role").with_details(format!(
            "This action requires the {:?} role or higher",
            minimum
        )));
    }

    info!("Role check passed for user {} with role {:?}", user.user_id, user.role);
    Ok(())
}
