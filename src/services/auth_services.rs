// Token verification for identities issued by the external identity provider.
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("parse uuid error")]
    UuidError(#[from] uuid::Error),
    #[error("token carries no username")]
    MissingUsername,
}

/// Claims shared with the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// subject / user id
    pub sub: String,
    pub username: String,
    pub exp: i64,
}

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Clone)]
pub struct AuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mints a token the same way the identity provider does. Used by local
    /// tooling and tests.
    pub fn issue_token(
        &self,
        user_id: Uuid,
        username: &str,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let claims = JwtClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding, &self.validation)?;
        let username = data.claims.username.trim();
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }
        Ok(Identity {
            user_id: Uuid::parse_str(&data.claims.sub)?,
            username: username.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let svc = AuthService::new("test-secret");
        let id = Uuid::new_v4();
        let token = svc.issue_token(id, "auth", Duration::hours(1)).unwrap();

        let identity = svc.verify(&token).unwrap();
        assert_eq!(identity.user_id, id);
        assert_eq!(identity.username, "auth");
    }

    #[test]
    fn rejects_foreign_secret_and_expired_tokens() {
        let svc = AuthService::new("test-secret");
        let other = AuthService::new("other-secret");
        let id = Uuid::new_v4();

        let foreign = other.issue_token(id, "auth", Duration::hours(1)).unwrap();
        assert!(matches!(svc.verify(&foreign), Err(AuthError::InvalidToken(_))));

        let expired = svc.issue_token(id, "auth", Duration::hours(-2)).unwrap();
        assert!(matches!(svc.verify(&expired), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn rejects_bad_subject_and_blank_username() {
        let svc = AuthService::new("test-secret");
        let claims = JwtClaims {
            sub: "not-a-uuid".into(),
            username: "auth".into(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &svc.encoding).unwrap();
        assert!(matches!(svc.verify(&token), Err(AuthError::UuidError(_))));

        let blank = svc
            .issue_token(Uuid::new_v4(), "  ", Duration::hours(1))
            .unwrap();
        assert!(matches!(svc.verify(&blank), Err(AuthError::MissingUsername)));
    }
}
