//! Bearer token verification.
//!
//! Lectern does not log users in. Tokens are minted by the platform's
//! identity service with a shared HS256 secret; this module checks them and
//! exposes [`Claims`] to the auth extractor. [`issue_token`] mints tokens in
//! the same shape for tests and local tooling.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lectern_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of a Lectern bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Acting user id.
    pub sub: DbId,
    /// One of the role names in [`lectern_core::roles`].
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    /// Token id, unique per issue.
    pub jti: String,
}

/// Token verification settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,
    /// Lifetime of tokens minted by [`issue_token`].
    pub token_ttl_mins: i64,
}

const DEFAULT_LEEWAY_SECS: u64 = 30;
const DEFAULT_TOKEN_TTL_MINS: i64 = 15;

impl JwtConfig {
    /// Read token settings from the environment.
    ///
    /// | Env Var           | Required | Default |
    /// |-------------------|----------|---------|
    /// | `JWT_SECRET`      | **yes**  |         |
    /// | `JWT_LEEWAY_SECS` | no       | `30`    |
    /// | `JWT_TTL_MINS`    | no       | `15`    |
    ///
    /// # Panics
    ///
    /// Panics when `JWT_SECRET` is missing or empty, or a number fails to
    /// parse.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set to a non-empty value");

        let leeway_secs = std::env::var("JWT_LEEWAY_SECS")
            .map(|v| v.parse().expect("JWT_LEEWAY_SECS must be a valid u64"))
            .unwrap_or(DEFAULT_LEEWAY_SECS);
        let token_ttl_mins = std::env::var("JWT_TTL_MINS")
            .map(|v| v.parse().expect("JWT_TTL_MINS must be a valid i64"))
            .unwrap_or(DEFAULT_TOKEN_TTL_MINS);

        Self {
            secret,
            leeway_secs,
            token_ttl_mins,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_secs;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }
}

/// Mint an HS256 token for `user_id` acting as `role`.
pub fn issue_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let issued_at = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.to_owned(),
        exp: issued_at + config.token_ttl_mins * 60,
        iat: issued_at,
        jti: Uuid::new_v4().to_string(),
    };
    let key = EncodingKey::from_secret(config.secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key)
}

/// Check signature, algorithm, and expiry, returning the claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(config.secret.as_bytes());
    decode::<Claims>(token, &key, &config.validation()).map(|data| data.claims)
}
