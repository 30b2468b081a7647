//! HS256 access-token validation.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use twyn_core::types::DbId;

/// Claims read from an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the owner's UUID.
    pub sub: DbId,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Configuration for token validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret of the identity provider.
    pub secret: String,
    /// Required `aud` claim.
    pub audience: String,
}

const DEFAULT_AUDIENCE: &str = "authenticated";

impl JwtConfig {
    /// Load from the environment.
    ///
    /// | Env Var                 | Required | Default         |
    /// |-------------------------|----------|-----------------|
    /// | `SUPABASE_JWT_SECRET`   | **yes**  | --              |
    /// | `SUPABASE_JWT_AUDIENCE` | no       | `authenticated` |
    ///
    /// # Panics
    ///
    /// Panics if `SUPABASE_JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret = std::env::var("SUPABASE_JWT_SECRET")
            .expect("SUPABASE_JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "SUPABASE_JWT_SECRET must not be empty");

        let audience =
            std::env::var("SUPABASE_JWT_AUDIENCE").unwrap_or_else(|_| DEFAULT_AUDIENCE.into());

        Self { secret, audience }
    }
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Checks the signature, expiry and audience.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default(); // HS256, validates exp
    validation.set_audience(&[config.audience.as_str()]);
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}
