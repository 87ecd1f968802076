//! Zid customer extractor.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::zid::CUSTOMER_TOKEN_HEADER;

/// Extractor that optionally gets the logged-in customer's Zid token.
///
/// The theme's scripts send the token Zid issued at login in the
/// `X-Customer-Token` header. Blank or missing means a guest.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalCustomer(token): OptionalCustomer) -> impl IntoResponse {
///     match token {
///         Some(_) => "Customer",
///         None => "Guest visitor",
///     }
/// }
/// ```
pub struct OptionalCustomer(pub Option<String>);

impl<S> FromRequestParts<S> for OptionalCustomer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(CUSTOMER_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(String::from);

        Ok(Self(token))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(request: Request<()>) -> Option<String> {
        let (mut parts, ()) = request.into_parts();
        let OptionalCustomer(token) = OptionalCustomer::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        token
    }

    #[tokio::test]
    async fn test_header_token() {
        let request = Request::builder()
            .header(CUSTOMER_TOKEN_HEADER, " tok-1 ")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_blank_header_is_guest() {
        let request = Request::builder()
            .header(CUSTOMER_TOKEN_HEADER, "")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, None);
    }

    #[tokio::test]
    async fn test_missing_header_is_guest() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(request).await, None);
    }
}
