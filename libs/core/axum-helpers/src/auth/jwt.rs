use super::config::JwtConfig;
use crate::errors::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Claims accepted on catalog bearer tokens.
///
/// `user_name` and `authorities` follow the OAuth2 password-grant tokens
/// used by the admin front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub authorities: Vec<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl JwtClaims {
    /// Name to record in audit logs.
    pub fn principal(&self) -> &str {
        self.user_name.as_deref().unwrap_or(&self.sub)
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No bearer token provided")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => AppError::Unauthorized("Authentication required".to_string()),
            AuthError::InvalidToken(e) => {
                tracing::debug!("JWT verification failed: {}", e);
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
        }
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// HS256 token verifier. Cheap to clone.
#[derive(Clone)]
pub struct JwtAuth {
    keys: Arc<Keys>,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);

        tracing::info!("JWT auth initialized");
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(config.secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            }),
            validation,
        }
    }

    /// Verify signature and expiry, returning the decoded claims.
    pub fn verify_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.keys.decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// Sign a token for `subject`. Used by tooling and tests; production
    /// tokens come from the authorization server.
    pub fn issue_token(
        &self,
        subject: &str,
        authorities: &[&str],
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: subject.to_string(),
            user_name: Some(subject.to_string()),
            authorities: authorities.iter().map(|a| a.to_string()).collect(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "catalog-test-secret-with-at-least-32-chars";

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(SECRET))
    }

    #[test]
    fn test_issue_and_verify() {
        let auth = auth();
        let token = auth
            .issue_token("alex@example.com", &["ROLE_OPERATOR"], Duration::minutes(5))
            .unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.principal(), "alex@example.com");
        assert!(claims.has_authority("ROLE_OPERATOR"));
        assert!(!claims.has_authority("ROLE_ADMIN"));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let auth = auth();
        let token = auth
            .issue_token("alex@example.com", &[], Duration::minutes(-10))
            .unwrap();

        assert!(matches!(auth.verify_token(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let other = JwtAuth::new(&JwtConfig::new("another-secret-that-is-also-32-chars-long"));
        let token = other
            .issue_token("mallory", &["ROLE_ADMIN"], Duration::minutes(5))
            .unwrap();

        assert!(auth().verify_token(&token).is_err());
    }
}
