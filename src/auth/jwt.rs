use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, role: Role, ttl_hours: i64) -> Self {
        Self {
            sub: user_id,
            role,
            exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp(),
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

/// Signature and expiry check only. Never touches the store.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT decode failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_identity_and_role() {
        let user_id = Uuid::now_v7();
        let claims = Claims::new(user_id, Role::Manager, 24);
        let token = encode_token(&claims, "test-secret").unwrap();

        let decoded = decode_token(&token, "test-secret").unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.role, Role::Manager);
    }

    #[test]
    fn wrong_secret_rejected() {
        let claims = Claims::new(Uuid::now_v7(), Role::Coworker, 24);
        let token = encode_token(&claims, "test-secret").unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let claims = Claims {
            sub: Uuid::now_v7(),
            role: Role::Coworker,
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
        };
        let token = encode_token(&claims, "test-secret").unwrap();
        assert!(decode_token(&token, "test-secret").is_err());
    }
}
