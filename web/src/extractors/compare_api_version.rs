use crate::extractors::RejectionType;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use service::config::ApiVersion;

/// Rejects requests whose `x-version` header is missing, malformed, or names
/// an API version this build no longer serves.
pub(crate) struct CompareApiVersion(pub ApiVersion);

#[async_trait]
impl<S> FromRequestParts<S> for CompareApiVersion
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(ApiVersion::field_name())
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Missing {} header", ApiVersion::field_name()),
                )
            })?;

        let api_version = ApiVersion::parse_supported(header_value).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("Unsupported API version: {header_value}"),
            )
        })?;

        Ok(CompareApiVersion(api_version))
    }
}
