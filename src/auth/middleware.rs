//! Authentication middleware that validates bearer tokens.

use axum::{
    RequestPartsExt,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{Error, auth::TokenConfig};

/// Middleware function that checks for a valid bearer token in the `Authorization` header.
///
/// The user ID from the token is placed into the request extensions and the request executed
/// normally if the token is valid, otherwise a 401 response is returned and the handler never
/// runs.
///
/// Verification is stateless: only the signature and expiry are checked, the store is not
/// consulted.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(
    State(token_config): State<TokenConfig>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(error) => {
            tracing::debug!("Missing or malformed authorization header: {error}");
            return Error::Unauthorized.into_response();
        }
    };

    let claims = match token_config.decode(bearer.token()) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(claims.user_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
