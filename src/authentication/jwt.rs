use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::error::{Error, HtmlError};
use crate::schema::{Id, User, UserRole};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, role: UserRole, lifetime: Duration) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + lifetime).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.authenticate(self) {
            return Err(
                HtmlError::Forbidden.new("You do not have permission to perform this action.")
            );
        }
        Ok(())
    }

    /// Authors manage their own recipes; anything else needs the wider permission.
    pub fn authenticate_owner(&self, owner_id: Id) -> Result<(), Error> {
        if owner_id == self.user_id {
            self.authenticate(ActionType::ManageOwnRecipes)
        } else {
            self.authenticate(ActionType::ManageAllRecipes)
        }
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            username: value.username,
            user_id: value.user_id,
            role: value.role,
        }
    }
}

/// Signs and checks session tokens with the server secret.
#[derive(Clone)]
pub struct SessionSigner {
    key: Hmac<Sha256>,
    lifetime: Duration,
}

impl SessionSigner {
    pub fn new(secret: &[u8], lifetime_hours: i64) -> Result<Self, Error> {
        let key = Hmac::new_from_slice(secret)
            .map_err(|_| HtmlError::Internal.new("Invalid session secret"))?;

        let lifetime = Duration::try_hours(lifetime_hours)
            .ok_or_else(|| HtmlError::Internal.new("Invalid session lifetime"))?;

        Ok(Self { key, lifetime })
    }

    pub fn generate_jwt_session(&self, user: &User) -> Result<String, Error> {
        let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role, self.lifetime);

        claims.sign_with_key(&self.key).map_err(|e| {
            log::error!("Failed to sign session: {e}");
            HtmlError::Internal.new("Internal server error")
        })
    }

    pub fn verify_jwt_session(&self, token: &str) -> Result<JwtSessionData, Error> {
        let session: JwtSessionData = token
            .verify_with_key(&self.key)
            .map_err(|_| HtmlError::InvalidSession.new("Invalid token."))?;

        if session.exp < Utc::now().timestamp() {
            return Err(HtmlError::InvalidSession.new("Token expired."));
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: 4,
            email: "cook@example.com".into(),
            username: "cook".into(),
            first_name: "Ann".into(),
            last_name: "Cook".into(),
            password: String::new(),
            role,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn signed_session_verifies() {
        let signer = SessionSigner::new(b"test-secret", 1).unwrap();
        let token = signer.generate_jwt_session(&user(UserRole::Admin)).unwrap();
        let session: SessionData = signer.verify_jwt_session(&token).unwrap().into();

        assert_eq!(session.user_id, 4);
        assert_eq!(session.username, "cook");
        assert_eq!(session.role, UserRole::Admin);
    }

    #[test]
    fn foreign_and_expired_tokens_are_rejected() {
        let signer = SessionSigner::new(b"test-secret", 1).unwrap();
        let other = SessionSigner::new(b"other-secret", 1).unwrap();
        let expired = SessionSigner::new(b"test-secret", -1).unwrap();

        let token = other.generate_jwt_session(&user(UserRole::User)).unwrap();
        assert!(signer.verify_jwt_session(&token).is_err());

        let token = expired.generate_jwt_session(&user(UserRole::User)).unwrap();
        assert!(signer.verify_jwt_session(&token).is_err());
        assert!(signer.verify_jwt_session("garbage").is_err());
    }

    #[test]
    fn unrepresentable_lifetime_is_an_error() {
        assert!(SessionSigner::new(b"test-secret", i64::MAX).is_err());
    }
}
