//! JWT access-token verification
//!
//! Tokens come from the identity provider and carry the user id and role.
//! `issue_access_token` exists for local tooling and tests.

use chrono::{Duration, Utc};
use folio_core::{Actor, Role, Snowflake};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Role name; absent or unknown roles are treated as `member`
    #[serde(default)]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Snowflake, AppError> {
        match self.sub.parse::<Snowflake>() {
            Ok(id) if !id.is_zero() => Ok(id),
            _ => Err(AppError::InvalidToken),
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role.as_deref().map(Role::parse_lenient).unwrap_or_default()
    }

    /// The engine-facing identity these claims describe
    pub fn actor(&self) -> Result<Actor, AppError> {
        Ok(Actor::new(self.user_id()?, self.role()))
    }
}

/// Encodes and verifies HS256 access tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: i64,
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str, access_token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry,
        }
    }

    pub fn issue_access_token(&self, actor: &Actor) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: actor.user_id.to_string(),
            role: Some(actor.role.as_str().to_string()),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to encode JWT")))
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            })
    }

    /// Decode a bearer token straight into an [`Actor`]
    pub fn authenticate(&self, token: &str) -> Result<Actor, AppError> {
        self.decode_token(token)?.actor()
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expiry", &self.access_token_expiry)
            .finish_non_exhaustive()
    }
}
