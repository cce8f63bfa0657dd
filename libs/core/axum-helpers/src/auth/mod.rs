//! Bearer-token authentication for write endpoints.
//!
//! Tokens are HS256 JWTs issued by the external authorization server and
//! verified here with the shared secret. There is no server-side session
//! state.
//!
//! ```ignore
//! use axum_helpers::auth::{JwtAuth, JwtConfig, jwt_auth_middleware};
//! use core_config::FromEnv;
//!
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//! let writes = Router::new()
//!     .route("/", post(create))
//!     .route_layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use jwt::{AuthError, JwtAuth, JwtClaims};
pub use middleware::jwt_auth_middleware;
