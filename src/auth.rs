use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{error, FromRequest, HttpRequest};

/// Bearer token pulled from the Authorization header. Tokens are minted and
/// verified by the external identity provider; this extractor only refuses
/// requests that carry no credential at all.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequest for BearerToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => ready(Ok(BearerToken(token.to_string()))),
            None => ready(Err(error::ErrorUnauthorized(
                "Missing or invalid Authorization header",
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn extracts_bearer_token() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc123"))
            .to_http_request();
        let token = BearerToken::extract(&req).await.unwrap();
        assert_eq!(token.0, "abc123");
    }

    #[actix_web::test]
    async fn rejects_missing_or_malformed_header() {
        let req = TestRequest::default().to_http_request();
        assert!(BearerToken::extract(&req).await.is_err());

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Token abc123"))
            .to_http_request();
        assert!(BearerToken::extract(&req).await.is_err());

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer   "))
            .to_http_request();
        assert!(BearerToken::extract(&req).await.is_err());
    }
}
