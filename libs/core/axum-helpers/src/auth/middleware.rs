use super::jwt::{AuthError, JwtAuth};
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects the request with 401 unless it carries a valid bearer token.
///
/// On success the decoded [`JwtClaims`](super::JwtClaims) are inserted into
/// the request extensions for handlers to pick up with `Extension`.
pub async fn jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;
    let claims = auth.verify_token(token)?;

    tracing::debug!(principal = claims.principal(), "Bearer token accepted");
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtClaims, JwtConfig};
    use axum::{
        Extension, Router, body::Body, http::Request as HttpRequest, http::StatusCode,
        middleware::from_fn_with_state, routing::post,
    };
    use chrono::Duration;
    use tower::ServiceExt;

    fn app(auth: JwtAuth) -> Router {
        Router::new()
            .route(
                "/products",
                post(|Extension(claims): Extension<JwtClaims>| async move { claims.sub }),
            )
            .route_layer(from_fn_with_state(auth, jwt_auth_middleware))
    }

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("catalog-test-secret-with-at-least-32-chars"))
    }

    fn request(authorization: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().method("POST").uri("/products");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app(auth()).oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let response = app(auth())
            .oneshot(request(Some("Bearer not-a-jwt")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let auth = auth();
        let token = auth
            .issue_token("operator@example.com", &["ROLE_OPERATOR"], Duration::minutes(5))
            .unwrap();

        let response = app(auth)
            .oneshot(request(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
