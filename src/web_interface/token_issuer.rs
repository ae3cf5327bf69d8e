use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde_json::Value;
use uuid::Uuid;

use crate::error_handling::types::DirectoryError;
use crate::models::User;
use crate::token_management::claims::{decode_claims, issue_unsigned, TokenClaims};

/// Mints and checks the mock server's unsigned bearer tokens.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: i64::try_from(ttl_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }

    pub fn issue(&self, user: &User) -> String {
        self.mint(TokenClaims {
            sub: Some(Value::from(user.id)),
            username: Some(user.username.clone()),
            role: Some(user.role.as_str().to_string()),
            ..Default::default()
        })
    }

    /// A new token for the same subject, with a fresh expiry and id.
    pub fn reissue(&self, claims: &TokenClaims) -> String {
        self.mint(TokenClaims {
            sub: claims.sub.clone(),
            username: claims.username.clone(),
            role: claims.role.clone(),
            ..Default::default()
        })
    }

    /// Reads the claims of an `Authorization: Bearer` header value, refusing
    /// missing, unreadable and expired tokens.
    pub fn verify(&self, authorization: Option<&str>) -> Result<TokenClaims, DirectoryError> {
        let header = authorization
            .ok_or_else(|| DirectoryError::Unauthorized("No bearer token".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .unwrap_or(header)
            .trim();

        let claims = decode_claims(token)
            .ok_or_else(|| DirectoryError::Unauthorized("Token is invalid".to_string()))?;
        if claims.is_expired_at(Utc::now()) {
            debug!("Refusing expired token {:?}", claims.jti);
            return Err(DirectoryError::Unauthorized("Token has expired".to_string()));
        }
        Ok(claims)
    }

    fn mint(&self, mut claims: TokenClaims) -> String {
        let now = Utc::now();
        claims.iat = Some(now.timestamp());
        let expiry = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        claims.exp = Some(expiry.timestamp());
        claims.jti = Some(Uuid::new_v4().to_string());
        issue_unsigned(&claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, UserStatus};

    fn user() -> User {
        User {
            id: 2,
            username: "teacher001".into(),
            real_name: "李老师".into(),
            email: "li.teacher@yunmeng.edu.cn".into(),
            role: Role::Teacher,
            status: UserStatus::Active,
            create_time: Utc::now(),
            last_login: None,
            phone: String::new(),
            department: String::new(),
            student_id: None,
            update_time: None,
        }
    }

    #[test]
    fn issued_token_verifies_with_subject() {
        let issuer = TokenIssuer::new(3600);
        let token = issuer.issue(&user());
        let claims = issuer.verify(Some(&format!("Bearer {}", token))).unwrap();

        assert_eq!(claims.sub, Some(Value::from(2)));
        assert_eq!(claims.role.as_deref(), Some("teacher"));
        assert!(claims.exp.unwrap() > Utc::now().timestamp() + 3500);
    }

    #[test]
    fn reissue_changes_token_but_keeps_subject() {
        let issuer = TokenIssuer::new(3600);
        let token = issuer.issue(&user());
        let claims = issuer.verify(Some(&token)).unwrap();
        let renewed = issuer.reissue(&claims);

        assert_ne!(renewed, token);
        assert_eq!(issuer.verify(Some(&renewed)).unwrap().username, claims.username);
    }

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        let issuer = TokenIssuer::new(u64::MAX);
        let token = issuer.issue(&user());
        let claims = issuer.verify(Some(&token)).unwrap();
        assert_eq!(claims.exp, Some(DateTime::<Utc>::MAX_UTC.timestamp()));
    }

    #[test]
    fn expired_and_garbage_tokens_are_refused() {
        let expired = TokenIssuer::new(0).issue(&user());
        let issuer = TokenIssuer::new(3600);

        assert!(issuer.verify(Some(&format!("Bearer {}", expired))).is_err());
        assert!(issuer.verify(Some("Bearer nope")).is_err());
        assert_eq!(
            issuer.verify(None),
            Err(DirectoryError::Unauthorized("No bearer token".to_string()))
        );
    }
}
