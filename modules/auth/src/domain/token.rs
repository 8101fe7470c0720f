//! HS256 tokens: user access tokens and the signed OAuth `state` value
//! that carries the front-end origin through the provider round trip.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        }
    }
}

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Payload of the OAuth `state` parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthState {
    pub origin: String,
    pub nonce: String,
    pub iat: i64,
    pub exp: i64,
}

/// Shared HS256 signing/verification for one secret.
#[derive(Clone)]
struct Hs256 {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256 {
    fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        Ok(decode::<T>(token, &self.decoding, &self.validation)?.claims)
    }
}

/// Issues and verifies user access tokens.
#[derive(Clone)]
pub struct JwtService {
    keys: Hs256,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            keys: Hs256::new(secret),
            ttl: Duration::seconds(ttl_secs.min(i32::MAX as u64) as i64),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    pub(crate) fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.keys.sign(&claims)
    }

    /// Verify signature and expiry; returns the subject user id.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims: Claims = self.keys.verify(token)?;
        Uuid::parse_str(&claims.sub).map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

/// Signs and verifies short-lived OAuth `state` values.
#[derive(Clone)]
pub struct StateSigner {
    keys: Hs256,
    ttl: Duration,
}

impl StateSigner {
    pub const DEFAULT_TTL_SECS: i64 = 600;

    pub fn new(secret: &str) -> Self {
        Self {
            keys: Hs256::new(secret),
            ttl: Duration::seconds(Self::DEFAULT_TTL_SECS),
        }
    }

    pub fn sign(&self, origin: &str) -> Result<String, TokenError> {
        self.sign_at(origin, Utc::now())
    }

    pub(crate) fn sign_at(&self, origin: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let state = OAuthState {
            origin: origin.to_string(),
            nonce: nanoid::nanoid!(16),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.keys.sign(&state)
    }

    /// Verify a state value and return the origin it carries.
    pub fn verify(&self, state: &str) -> Result<String, TokenError> {
        let state: OAuthState = self.keys.verify(state)?;
        Ok(state.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trip() {
        let jwt = JwtService::new("secret", 3600);
        let id = Uuid::new_v4();
        let token = jwt.issue(id).unwrap();
        assert_eq!(jwt.verify(&token).unwrap(), id);
    }

    #[test]
    fn expired_token_rejected() {
        let jwt = JwtService::new("secret", 60);
        let token = jwt
            .issue_at(Uuid::new_v4(), Utc::now() - Duration::hours(1))
            .unwrap();
        assert!(matches!(jwt.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn wrong_secret_or_tampering_rejected() {
        let token = JwtService::new("secret", 60).issue(Uuid::new_v4()).unwrap();
        let other = JwtService::new("other", 60);
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));

        let jwt = JwtService::new("secret", 60);
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(jwt.verify(&tampered).is_err());
        assert!(jwt.verify("garbage").is_err());
    }

    #[test]
    fn state_round_trip_and_expiry() {
        let signer = StateSigner::new("session");
        let state = signer.sign("http://localhost:3000").unwrap();
        assert_eq!(signer.verify(&state).unwrap(), "http://localhost:3000");

        let old = signer
            .sign_at("http://localhost:3000", Utc::now() - Duration::minutes(11))
            .unwrap();
        assert!(matches!(signer.verify(&old), Err(TokenError::Expired)));

        let forged = StateSigner::new("attacker").sign("https://evil.example").unwrap();
        assert!(signer.verify(&forged).is_err());
    }

    #[test]
    fn access_tokens_are_not_states() {
        let token = JwtService::new("shared", 60).issue(Uuid::new_v4()).unwrap();
        assert!(StateSigner::new("shared").verify(&token).is_err());
    }
}
