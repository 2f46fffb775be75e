use async_trait::async_trait;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::NewUser;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::models::Role;
use crate::domain::auth::models::User;
use crate::domain::auth::models::UserId;
use crate::domain::auth::models::UserProfile;
use crate::domain::auth::models::Username;

/// Port for authentication use cases.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new user with the default role.
    ///
    /// # Errors
    /// * `Conflict` - Username (or email) is already taken
    /// * `Store` - Store operation failed
    async fn register(&self, command: RegisterCommand) -> Result<User, AuthError>;

    /// Look up a user by username and check the password.
    ///
    /// # Errors
    /// * `Forbidden` - Unknown username or wrong password (indistinguishable)
    /// * `Store` - Store operation failed
    async fn validate_credentials(&self, username: &str, password: &str)
        -> Result<User, AuthError>;

    /// Start a session: mint a token pair and store the refresh token hash.
    ///
    /// Replaces any earlier session of the same user.
    ///
    /// # Errors
    /// * `Internal` - Signing or hashing failed
    /// * `Store` - Store operation failed
    async fn login(&self, user: &User) -> Result<auth::TokenPair, AuthError>;

    /// End the session identified by an access token.
    ///
    /// # Errors
    /// * `Unauthorized` - Token expired or malformed
    /// * `BadRequest` - Token carries no usable subject
    /// * `Store` - Store operation failed
    async fn logout(&self, access_token: &str) -> Result<(), AuthError>;

    /// Exchange a refresh token for a new pair, invalidating the old one.
    ///
    /// # Errors
    /// * `Unauthorized` - Token expired or malformed
    /// * `BadRequest` - Token carries no usable subject
    /// * `NotFound` - No active session for the subject
    /// * `Forbidden` - Token is stale, replayed, or lost a concurrent rotation
    /// * `Store` - Store operation failed
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<auth::TokenPair, AuthError>;

    /// Public profile of a user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Store` - Store operation failed
    async fn profile(&self, id: &UserId) -> Result<UserProfile, AuthError>;

    /// Resolve a bearer access token to an existing user.
    ///
    /// # Errors
    /// * `Unauthorized` - Token expired, malformed, or without a valid subject
    /// * `NotFound` - Subject no longer exists
    /// * `Store` - Store operation failed
    async fn authorize(&self, access_token: &str) -> Result<UserId, AuthError>;
}

/// Credential persistence needed by the authentication service.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Retrieve user by identifier, roles included.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;

    /// Retrieve user by username, roles included.
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, AuthError>;

    /// Persist a new user without roles.
    ///
    /// # Errors
    /// * `Conflict` - Username or email already taken
    async fn create_user(&self, user: NewUser) -> Result<User, AuthError>;

    /// Overwrite (or clear with `None`) the stored refresh token hash.
    ///
    /// # Returns
    /// `false` when no user has this id
    async fn update_refresh_hash(
        &self,
        id: &UserId,
        refresh_hash: Option<String>,
    ) -> Result<bool, AuthError>;

    /// Replace the refresh token hash only if it still equals `expected`.
    ///
    /// # Returns
    /// `false` when the stored hash changed (or was cleared) meanwhile
    async fn rotate_refresh_hash(
        &self,
        id: &UserId,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AuthError>;

    /// Fetch the role with this name, creating it on first use.
    async fn upsert_role(&self, name: &str) -> Result<Role, AuthError>;

    /// Grant an existing role to a user. Granting twice is a no-op.
    async fn attach_role(&self, user_id: &UserId, role_name: &str) -> Result<(), AuthError>;
}
