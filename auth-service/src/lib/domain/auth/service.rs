use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use auth::Claims;
use auth::PasswordHasher;
use auth::TokenKind;
use auth::TokenPair;
use auth::TokenSigner;
use chrono::Utc;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::TokenRejection;
use crate::domain::auth::models::placeholder_avatar;
use crate::domain::auth::models::NewUser;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::models::User;
use crate::domain::auth::models::UserId;
use crate::domain::auth::models::UserProfile;
use crate::domain::auth::models::Username;
use crate::domain::auth::models::DEFAULT_ROLE;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::auth::ports::CredentialStore;

/// Authentication use cases over a credential store.
///
/// Holds no per-user state; every session fact lives in the store as the
/// user's refresh token hash (one slot per user).
pub struct AuthService<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    password_hasher: PasswordHasher,
    token_signer: Arc<TokenSigner>,
    /// Verified against when the username is unknown, so both failure paths cost one hash.
    decoy_hash: OnceLock<String>,
}

impl<S> AuthService<S>
where
    S: CredentialStore,
{
    pub fn new(
        store: Arc<S>,
        password_hasher: PasswordHasher,
        token_signer: Arc<TokenSigner>,
    ) -> Self {
        Self {
            store,
            password_hasher,
            token_signer,
            decoy_hash: OnceLock::new(),
        }
    }

    fn decoy_hash(&self) -> &str {
        self.decoy_hash.get_or_init(|| {
            self.password_hasher
                .hash("decoy-password-for-unknown-users")
                .unwrap_or_default()
        })
    }

    fn verify_token(&self, kind: TokenKind, token: &str) -> Result<Claims, AuthError> {
        self.token_signer.verify(kind, token).map_err(|e| {
            tracing::debug!(kind = ?kind, error = %e, "Token verification failed");
            AuthError::from(e)
        })
    }

    /// Sign a pair for the user and return it together with the refresh token hash.
    fn mint_session(&self, user: &User) -> Result<(TokenPair, String), AuthError> {
        let pair = self.token_signer.issue_pair(&user.identity())?;
        let refresh_hash = self.password_hasher.hash(&pair.refresh_token)?;
        Ok((pair, refresh_hash))
    }
}

fn invalid_payload() -> AuthError {
    AuthError::BadRequest("Invalid token payload".to_string())
}

fn subject_of(claims: &Claims) -> Result<UserId, AuthError> {
    let subject = claims.sub.as_deref().ok_or_else(invalid_payload)?;
    UserId::from_string(subject).map_err(|_| invalid_payload())
}

#[async_trait]
impl<S> AuthServicePort for AuthService<S>
where
    S: CredentialStore,
{
    async fn register(&self, command: RegisterCommand) -> Result<User, AuthError> {
        if self
            .store
            .find_by_username(&command.username)
            .await?
            .is_some()
        {
            return Err(AuthError::Conflict(command.username.to_string()));
        }

        let password_hash = self.password_hasher.hash(command.password.expose())?;
        let role = self.store.upsert_role(DEFAULT_ROLE).await?;

        let mut user = self
            .store
            .create_user(NewUser {
                id: UserId::new(),
                avatar: placeholder_avatar(&command.username),
                username: command.username,
                email: command.email,
                password_hash,
                created_at: Utc::now(),
            })
            .await?;

        self.store.attach_role(&user.id, &role.name).await?;
        if !user.roles.contains(&role) {
            user.roles.push(role);
        }

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let user = match Username::new(username.to_string()) {
            Ok(username) => self.store.find_by_username(&username).await?,
            Err(_) => None,
        };

        match user {
            Some(user) if self.password_hasher.verify(password, &user.password_hash) => Ok(user),
            Some(_) => {
                tracing::warn!("Rejected credentials");
                Err(AuthError::Forbidden)
            }
            None => {
                self.password_hasher.verify(password, self.decoy_hash());
                tracing::warn!("Rejected credentials");
                Err(AuthError::Forbidden)
            }
        }
    }

    async fn login(&self, user: &User) -> Result<TokenPair, AuthError> {
        let (pair, refresh_hash) = self.mint_session(user)?;

        if !self
            .store
            .update_refresh_hash(&user.id, Some(refresh_hash))
            .await?
        {
            return Err(AuthError::NotFound(user.id.to_string()));
        }

        tracing::info!(user_id = %user.id, "Session started");

        Ok(pair)
    }

    async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let claims = self.verify_token(TokenKind::Access, access_token)?;
        let user_id = subject_of(&claims)?;

        if !self.store.update_refresh_hash(&user_id, None).await? {
            return Err(invalid_payload());
        }

        tracing::info!(user_id = %user_id, "Session ended");

        Ok(())
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.verify_token(TokenKind::Refresh, refresh_token)?;
        let user_id = subject_of(&claims)?;

        let user = self
            .store
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound(user_id.to_string()))?;

        let stored_hash = user
            .refresh_token_hash
            .as_deref()
            .ok_or_else(|| AuthError::NotFound(format!("no active session for {}", user_id)))?;

        if !self.password_hasher.verify(refresh_token, stored_hash) {
            tracing::warn!(user_id = %user_id, "Refresh token does not match the active session");
            return Err(AuthError::Forbidden);
        }

        let (pair, refresh_hash) = self.mint_session(&user)?;

        if !self
            .store
            .rotate_refresh_hash(&user_id, stored_hash, &refresh_hash)
            .await?
        {
            tracing::warn!(user_id = %user_id, "Refresh token lost a concurrent rotation");
            return Err(AuthError::Forbidden);
        }

        tracing::debug!(user_id = %user_id, "Refresh token rotated");

        Ok(pair)
    }

    async fn profile(&self, id: &UserId) -> Result<UserProfile, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .map(|ref user| UserProfile::from(user))
            .ok_or_else(|| AuthError::NotFound(id.to_string()))
    }

    async fn authorize(&self, access_token: &str) -> Result<UserId, AuthError> {
        let claims = self.verify_token(TokenKind::Access, access_token)?;
        let user_id =
            subject_of(&claims).map_err(|_| AuthError::Unauthorized(TokenRejection::Malformed))?;

        self.store
            .find_by_id(&user_id)
            .await?
            .map(|user| user.id)
            .ok_or_else(|| AuthError::NotFound(user_id.to_string()))
    }
}
