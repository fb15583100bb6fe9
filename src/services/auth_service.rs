use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, SignupRequest, TokenResponse};
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::services::user_service::UserStore;
use crate::utils::{crypto, token};

/// Identity attached to a request once its bearer token checks out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub token_id: Uuid,
    pub expires_at: usize,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_secret: String,
    ttl_minutes: i64,
    // jti -> exp, pruned as entries expire
    revoked: Arc<Mutex<HashMap<Uuid, usize>>>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_secret: String, ttl_minutes: i64) -> Self {
        Self {
            users,
            jwt_secret,
            ttl_minutes,
            revoked: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<User> {
        req.validate()?;
        let email = req.email.trim();

        if self.users.find_by_email(email).await?.is_some() {
            return Err(Error::Conflict("Email already registered".to_string()));
        }

        let password_hash = crypto::hash_password(&req.password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;
        let user = self.users.create_user(email, &password_hash).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse> {
        req.validate()?;
        let invalid = || Error::Unauthorized("Invalid email or password".to_string());

        let user = self
            .users
            .find_by_email(req.email.trim())
            .await?
            .ok_or_else(invalid)?;

        let matches = crypto::verify_password(&req.password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Stored password hash is unreadable: {}", e)))?;
        if !matches {
            return Err(invalid());
        }
        if !user.is_active {
            return Err(Error::Unauthorized("Account is disabled".to_string()));
        }

        let access_token =
            token::issue_access_token(user.id, &user.email, &self.jwt_secret, self.ttl_minutes)
                .map_err(|e| Error::Internal(format!("Failed to issue token: {}", e)))?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl_minutes * 60,
        })
    }

    pub fn logout(&self, user: &AuthUser) {
        let mut revoked = self.revoked.lock().expect("token denylist mutex poisoned");
        let now = Utc::now().timestamp().max(0) as usize;
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(user.token_id, user.expires_at);
        tracing::info!(user_id = %user.id, "User logged out");
    }

    /// Resolves a bearer token to an active user.
    pub async fn authenticate(&self, bearer: &str) -> Result<AuthUser> {
        let claims = token::decode_access_token(bearer, &self.jwt_secret)
            .map_err(|_| Error::Unauthorized("invalid_token".to_string()))?;

        if self.is_revoked(&claims.jti) {
            return Err(Error::Unauthorized("token_revoked".to_string()));
        }

        match self.users.find_by_id(claims.sub).await? {
            Some(user) if user.is_active => Ok(AuthUser {
                id: user.id,
                email: user.email,
                token_id: claims.jti,
                expires_at: claims.exp,
            }),
            _ => Err(Error::Unauthorized("unknown_user".to_string())),
        }
    }

    fn is_revoked(&self, jti: &Uuid) -> bool {
        self.revoked
            .lock()
            .expect("token denylist mutex poisoned")
            .contains_key(jti)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    #[derive(Default)]
    struct OneUserStore {
        user: Mutex<Option<User>>,
    }

    #[async_trait]
    impl UserStore for OneUserStore {
        async fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
            let user = User {
                id: Uuid::new_v4(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                is_active: true,
                created_at: Utc::now(),
            };
            *self.user.lock().unwrap() = Some(user.clone());
            Ok(user)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            Ok(self.user.lock().unwrap().clone().filter(|u| u.email == email))
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
            Ok(self.user.lock().unwrap().clone().filter(|u| u.id == id))
        }
    }

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            confirm_password: "password123".to_string(),
        }
    }

    async fn logged_in(service: &AuthService) -> (AuthUser, String) {
        assert_ok!(service.signup(signup_request("a@example.com")).await);
        let token = service
            .login(LoginRequest {
                email: " a@example.com ".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();
        let user = service.authenticate(&token.access_token).await.unwrap();
        (user, token.access_token)
    }

    #[tokio::test]
    async fn duplicate_signup_is_a_conflict() {
        let service = AuthService::new(Arc::new(OneUserStore::default()), "s".into(), 5);
        assert_ok!(service.signup(signup_request("a@example.com")).await);
        let err = assert_err!(service.signup(signup_request("a@example.com")).await);
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn revoked_tokens_stop_authenticating() {
        let service = AuthService::new(Arc::new(OneUserStore::default()), "s".into(), 5);
        let (user, bearer) = logged_in(&service).await;
        assert_eq!(user.email, "a@example.com");

        service.logout(&user);
        let err = assert_err!(service.authenticate(&bearer).await);
        assert_eq!(err.to_string(), "Unauthorized: token_revoked");
        let reissued = token::issue_access_token(user.id, &user.email, "s", 5).unwrap();
        assert_ok!(service.authenticate(&reissued).await);
    }

    #[tokio::test]
    async fn disabled_accounts_cannot_authenticate() {
        let store = Arc::new(OneUserStore::default());
        let service = AuthService::new(store.clone(), "s".into(), 5);
        let (user, _) = logged_in(&service).await;

        store.user.lock().unwrap().as_mut().unwrap().is_active = false;
        let token = token::issue_access_token(user.id, &user.email, "s", 5).unwrap();
        let err = assert_err!(service.authenticate(&token).await);
        assert_eq!(err.to_string(), "Unauthorized: unknown_user");
    }

    #[tokio::test]
    async fn tokens_signed_elsewhere_are_invalid() {
        let service = AuthService::new(Arc::new(OneUserStore::default()), "s".into(), 5);
        let forged = token::issue_access_token(Uuid::new_v4(), "x@example.com", "other", 5).unwrap();
        let err = assert_err!(service.authenticate(&forged).await);
        assert_eq!(err.to_string(), "Unauthorized: invalid_token");
    }
}
