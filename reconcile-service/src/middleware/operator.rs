use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

/// Header carrying the authenticated operator's email, set by the gateway.
pub const OPERATOR_HEADER: &str = "X-User-Email";

/// Email address of the back-office operator making the request.
///
/// Authentication happens upstream; the gateway asserts the identity in
/// `X-User-Email`. Reports and notifications are mailed to this address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator(pub String);

impl Operator {
    pub fn email(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Operator
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Missing X-User-Email header (required from gateway)"
                ))
            })?;

        tracing::Span::current().record("operator", email);

        Ok(Operator(email.to_string()))
    }
}
