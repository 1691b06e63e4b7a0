use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header carrying the user id resolved by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the caller, if the auth layer resolved one.
#[derive(Debug, Clone)]
pub struct UserIdentity(pub Option<String>);

impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(Self(user_id))
    }
}
