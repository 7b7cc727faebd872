use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config;

/// Access token claims. `roles` carries the tenant-level role set so the
/// role guard can run without a database round trip.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, tenant_id: Uuid, email: String, roles: Vec<String>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            tenant_id,
            email,
            roles,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug)]
pub enum TokenError {
    Expired,
    Invalid(String),
    MissingSecret,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Invalid(msg) => write!(f, "invalid token: {}", msg),
            TokenError::MissingSecret => write!(f, "JWT secret not configured"),
        }
    }
}

impl std::error::Error for TokenError {}

pub fn generate_access_token(claims: &Claims) -> Result<String, TokenError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| TokenError::Invalid(e.to_string()))
}

pub fn decode_access_token(token: &str) -> Result<Claims, TokenError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            _ => Err(TokenError::Invalid(e.to_string())),
        },
    }
}

/// Generate opaque refresh-token material. The raw value goes to the client;
/// only its hash is persisted.
pub fn new_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// Deterministic digest for refresh-token storage and lookup.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Signature for presigned upload URLs and scan callbacks: a digest over the
/// app secret, object key, and expiry so the callback endpoint can verify
/// provenance without a session.
pub fn sign_upload_key(key: &str, expires_at: i64) -> String {
    let secret = &config::config().security.jwt_secret;
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b"|");
    hasher.update(key.as_bytes());
    hasher.update(b"|");
    hasher.update(expires_at.to_string().as_bytes());
    hex_encode(&hasher.finalize())
}

pub fn verify_upload_signature(key: &str, expires_at: i64, signature: &str) -> bool {
    if Utc::now().timestamp() > expires_at {
        return false;
    }
    sign_upload_key(key, expires_at) == signature
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trip() {
        let user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let claims = Claims::new(
            user_id,
            tenant_id,
            "dev@example.com".to_string(),
            vec!["member".to_string()],
        );

        let token = generate_access_token(&claims).expect("token");
        let decoded = decode_access_token(&token).expect("decode");

        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.tenant_id, tenant_id);
        assert_eq!(decoded.roles, vec!["member".to_string()]);
    }

    #[test]
    fn tampered_token_rejected() {
        let claims = Claims::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "dev@example.com".to_string(),
            vec!["member".to_string()],
        );
        let mut token = generate_access_token(&claims).expect("token");
        token.push('x');

        assert!(decode_access_token(&token).is_err());
    }

    #[test]
    fn refresh_tokens_are_unique_and_hash_stable() {
        let a = new_refresh_token();
        let b = new_refresh_token();
        assert_ne!(a, b);
        assert_eq!(hash_refresh_token(&a), hash_refresh_token(&a));
        assert_ne!(hash_refresh_token(&a), hash_refresh_token(&b));
    }

    #[test]
    fn upload_signature_round_trip() {
        let expires = Utc::now().timestamp() + 600;
        let sig = sign_upload_key("uploads/abc", expires);
        assert!(verify_upload_signature("uploads/abc", expires, &sig));
        assert!(!verify_upload_signature("uploads/other", expires, &sig));

        let expired = Utc::now().timestamp() - 1;
        let stale = sign_upload_key("uploads/abc", expired);
        assert!(!verify_upload_signature("uploads/abc", expired, &stale));
    }
}
