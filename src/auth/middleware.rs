//! Authentication middleware that validates bearer tokens.

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    AppState, Error,
    auth::token::{JwtKeys, decode_token},
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys used to verify tokens.
    pub jwt_keys: JwtKeys,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
        }
    }
}

/// Middleware function that checks for a valid `Authorization: Bearer` header.
///
/// The token's [Claims](crate::auth::Claims) are placed into the request
/// extensions and the request is executed normally if the token is valid,
/// otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(claims): Extension<Claims>` to receive the claims.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) => {
            tracing::debug!("missing bearer token: {rejection}");
            return Error::InvalidToken.into_response();
        }
    };

    let claims = match decode_token(bearer.token(), &state.jwt_keys) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(claims);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
