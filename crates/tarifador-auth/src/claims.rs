//! Token payload

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an access token says about its bearer
///
/// The subject is the username; `uid` carries the user's id so handlers
/// can act on it without a user lookup. Instants are Unix timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to
    pub sub: String,

    /// Id of that user
    pub uid: Uuid,

    /// When the token was issued
    pub iat: i64,

    /// When the token stops being accepted
    pub exp: i64,
}

impl Claims {
    /// Claims for `username`, expiring `ttl_secs` from now
    pub fn new(username: &str, user_id: Uuid, ttl_secs: i64) -> Self {
        let now = Utc::now();

        Self {
            sub: username.to_string(),
            uid: user_id,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_issue_and_expiry_instants() {
        let before = Utc::now().timestamp();
        let claims = Claims::new("mariazinha", Uuid::new_v4(), 1800);
        let after = Utc::now().timestamp();

        assert!(claims.iat >= before && claims.iat <= after);
        assert_eq!(claims.exp, claims.iat + 1800);
    }

    #[test]
    fn test_negative_ttl_is_already_expired() {
        let claims = Claims::new("ghost", Uuid::new_v4(), -60);
        assert!(claims.exp < Utc::now().timestamp());
    }

    #[test]
    fn test_wire_field_names() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new("mariazinha", user_id, 300);

        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["sub"], "mariazinha");
        assert_eq!(value["uid"], user_id.to_string());
        assert!(value["iat"].is_i64());
        assert!(value["exp"].is_i64());

        let back: Claims = serde_json::from_value(value).unwrap();
        assert_eq!(back, claims);
    }
}
