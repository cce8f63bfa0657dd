use core_config::{ConfigError, FromEnv, env_parse_or, env_required};

const MIN_SECRET_LEN: usize = 32;

/// Settings for verifying bearer tokens.
///
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `JWT_LEEWAY_SECS` (default 30) - clock skew tolerated on `exp`
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub leeway_secs: u64,
}

impl JwtConfig {
    /// # Panics
    /// Panics if the secret is shorter than 32 characters.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(
            secret.len() >= MIN_SECRET_LEN,
            "JWT secret must be at least 32 characters"
        );
        Self {
            secret,
            leeway_secs: 30,
        }
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::ParseError {
                key: "JWT_SECRET".to_string(),
                details: format!(
                    "must be at least 32 characters (got {}). Generate one with: openssl rand -base64 32",
                    secret.len()
                ),
            });
        }

        Ok(Self {
            secret,
            leeway_secs: env_parse_or("JWT_LEEWAY_SECS", 30)?,
        })
    }
}
