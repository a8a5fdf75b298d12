use crate::auth::models::TokenClaims;
use crate::error::{Result, ServerError};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};

const ISSUER: &str = "authgate";
const REFRESH_AUDIENCE: &str = "authgate-refresh";
const ACCESS_AUDIENCE: &str = "authgate-access";

/// Clock-skew tolerance when checking embedded expiries, in seconds.
const EXPIRY_LEEWAY_SECS: u64 = 30;

/// Issues short-lived access tokens for a verified subject.
///
/// Kept as a seam: the session manager never constructs access tokens,
/// only the gateway does, through this trait.
pub trait AccessTokenIssuer: Send + Sync {
    fn issue_access(&self, user_id: i64) -> Result<String>;
}

/// JWT signing and verification service (HS256, symmetric secret).
///
/// Stateless: `verify_refresh` checks signature and embedded expiry only
/// and never consults session storage. The signing secret is read once at
/// construction and has no mutation path afterwards.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
}

impl JwtService {
    /// Create the service. Fails with a configuration error when the
    /// secret is empty; callers treat that as fatal at startup.
    pub fn new(secret: &str, access_ttl_secs: i64) -> Result<Self> {
        if secret.is_empty() {
            return Err(ServerError::Configuration(
                "JWT signing secret is not set".to_string(),
            ));
        }
        if secret.len() < 32 {
            tracing::warn!("⚠️ JWT signing secret is shorter than 32 bytes");
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_secs,
        })
    }

    /// Issue a refresh token bound to an absolute expiry.
    ///
    /// The embedded lifetime is derived from `expires_at - now`, so a
    /// rotated token never outlives the session's fixed deadline.
    pub fn issue_refresh(&self, user_id: i64, expires_at: DateTime<Utc>) -> Result<String> {
        let now = Utc::now();
        if expires_at <= now {
            return Err(ServerError::Validation(
                "refresh expiry already elapsed".to_string(),
            ));
        }

        let claims = TokenClaims {
            iss: ISSUER.to_string(),
            aud: REFRESH_AUDIENCE.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Internal(format!("JWT encoding failed: {}", e)))
    }

    /// Verify a refresh token and return its claims.
    ///
    /// Maps jsonwebtoken failures onto the credential taxonomy: elapsed
    /// embedded expiry, bad signature, or unparseable structure.
    pub fn verify_refresh(&self, raw: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[REFRESH_AUDIENCE]);
        validation.leeway = EXPIRY_LEEWAY_SECS;

        let data = decode::<TokenClaims>(raw, &self.decoding_key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => ServerError::TokenExpired,
                ErrorKind::InvalidSignature => ServerError::TokenSignature,
                _ => ServerError::TokenMalformed,
            }
        })?;

        Ok(data.claims)
    }

    /// sha256 hex fingerprint of a raw token.
    ///
    /// Storage and lookup key only; never an authorization decision by
    /// itself, the validation path always pairs it with `verify_refresh`.
    pub fn fingerprint(raw: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl AccessTokenIssuer for JwtService {
    fn issue_access(&self, user_id: i64) -> Result<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            iss: ISSUER.to_string(),
            aud: ACCESS_AUDIENCE.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + self.access_ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Internal(format!("JWT encoding failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-chars";

    #[test]
    fn test_empty_secret_rejected() {
        let result = JwtService::new("", 900);
        assert!(matches!(result, Err(ServerError::Configuration(_))));
    }

    #[test]
    fn test_refresh_round_trip() {
        let service = JwtService::new(SECRET, 900).unwrap();
        let expires_at = Utc::now() + Duration::days(7);

        let token = service.issue_refresh(42, expires_at).unwrap();
        let claims = service.verify_refresh(&token).unwrap();

        assert_eq!(claims.user_id(), Some(42));
        // Embedded expiry is never later than requested.
        assert!(claims.exp <= expires_at.timestamp());
    }

    #[test]
    fn test_elapsed_expiry_rejected_at_issue() {
        let service = JwtService::new(SECRET, 900).unwrap();
        let result = service.issue_refresh(42, Utc::now() - Duration::seconds(1));
        assert!(matches!(result, Err(ServerError::Validation(_))));
    }

    #[test]
    fn test_tampered_token_fails_signature() {
        let service = JwtService::new(SECRET, 900).unwrap();
        let other = JwtService::new("another-secret-key-also-32-chars!", 900).unwrap();

        let token = other.issue_refresh(42, Utc::now() + Duration::days(1)).unwrap();
        let result = service.verify_refresh(&token);
        assert!(matches!(result, Err(ServerError::TokenSignature)));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let service = JwtService::new(SECRET, 900).unwrap();
        let result = service.verify_refresh("not.a.jwt");
        assert!(matches!(result, Err(ServerError::TokenMalformed)));
    }

    #[test]
    fn test_expired_embedded_claim() {
        let service = JwtService::new(SECRET, 900).unwrap();

        // Craft a token whose exp is well past the leeway window.
        let now = Utc::now();
        let claims = TokenClaims {
            iss: ISSUER.to_string(),
            aud: REFRESH_AUDIENCE.to_string(),
            sub: "42".to_string(),
            iat: now.timestamp() - 600,
            exp: now.timestamp() - 300,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = service.verify_refresh(&token);
        assert!(matches!(result, Err(ServerError::TokenExpired)));
    }

    #[test]
    fn test_access_token_not_accepted_as_refresh() {
        let service = JwtService::new(SECRET, 900).unwrap();
        let access = service.issue_access(42).unwrap();
        assert!(service.verify_refresh(&access).is_err());
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = JwtService::fingerprint("some-token");
        let b = JwtService::fingerprint("some-token");
        let c = JwtService::fingerprint("other-token");
        assert_eq!(a, b);
        assert_ne!(a, c);
        // sha256 hex
        assert_eq!(a.len(), 64);
    }
}
