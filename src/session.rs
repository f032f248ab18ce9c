use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

pub const SESSION_HEADER: &str = "x-session-user";

/// The current user, passed explicitly wherever bookings are made.
/// The HTTP edge materializes it from a header; CLI clients build it
/// from arguments. Nothing reads it from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: String,
}

impl Session {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(SESSION_HEADER) {
            Some(value) => {
                let user = value
                    .to_str()
                    .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid session".to_string()))?;
                if user.is_empty() {
                    return Err((StatusCode::UNAUTHORIZED, "Invalid session".to_string()));
                }
                Ok(Session::new(user))
            }
            None => Err((StatusCode::UNAUTHORIZED, "Missing session".to_string())),
        }
    }
}
