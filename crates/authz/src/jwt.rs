//! HS256 JSON Web Tokens

use std::fmt::Debug;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, get_current_timestamp, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::{AuthError, Identity, TokenVerifier};

const ACCESS_TOKEN_TYPE: &str = "access";

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: String,
    pub user_id: i64,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: u64,
    pub leeway_seconds: u64,
}

/// Issues and verifies access tokens signed with a shared secret
#[derive(Clone)]
pub struct JwtVerifier {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("ttl_minutes", &self.config.ttl_minutes)
            .field("leeway_seconds", &self.config.leeway_seconds)
            .field("keys", &"[hidden]")
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Sign an access token for `user_id`, valid for the configured lifetime
    pub fn issue(&self, user_id: i64) -> Result<String, AuthError> {
        let now = get_current_timestamp();
        let claims = Claims {
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            user_id,
            iat: now,
            exp: now + self.config.ttl_minutes * 60,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Issue(e.to_string()))
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.config.leeway_seconds;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::InvalidToken(format!(
                "unexpected token type '{}'",
                data.claims.token_type
            )));
        }

        tracing::debug!(user_id = data.claims.user_id, "bearer token verified");

        Ok(Identity {
            user_id: data.claims.user_id,
        })
    }
}
