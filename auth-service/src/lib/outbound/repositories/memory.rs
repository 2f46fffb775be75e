use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::NewUser;
use crate::domain::auth::models::Role;
use crate::domain::auth::models::User;
use crate::domain::auth::models::UserId;
use crate::domain::auth::models::Username;
use crate::domain::auth::ports::CredentialStore;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    roles: Vec<Role>,
}

/// Process-local credential store.
///
/// Same contract as the PostgreSQL store, including unique usernames and
/// emails and compare-and-swap rotation under a single write lock.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, AuthError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|user| &user.username == username)
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let mut tables = self.tables.write().await;

        for existing in tables.users.values() {
            if existing.username == new_user.username {
                return Err(AuthError::Conflict(new_user.username.to_string()));
            }
            if existing.email == new_user.email {
                return Err(AuthError::Conflict(new_user.email.as_str().to_string()));
            }
        }

        let user = User {
            id: new_user.id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            refresh_token_hash: None,
            display_name: None,
            bio: None,
            avatar: Some(new_user.avatar),
            roles: Vec::new(),
            created_at: new_user.created_at,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_refresh_hash(
        &self,
        id: &UserId,
        refresh_hash: Option<String>,
    ) -> Result<bool, AuthError> {
        match self.tables.write().await.users.get_mut(id) {
            Some(user) => {
                user.refresh_token_hash = refresh_hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rotate_refresh_hash(
        &self,
        id: &UserId,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AuthError> {
        let mut tables = self.tables.write().await;

        match tables.users.get_mut(id) {
            Some(user) if user.refresh_token_hash.as_deref() == Some(expected) => {
                user.refresh_token_hash = Some(replacement.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn upsert_role(&self, name: &str) -> Result<Role, AuthError> {
        let mut tables = self.tables.write().await;

        if let Some(role) = tables.roles.iter().find(|role| role.name == name) {
            return Ok(role.clone());
        }

        let role = Role::new(name);
        tables.roles.push(role.clone());
        Ok(role)
    }

    async fn attach_role(&self, user_id: &UserId, role_name: &str) -> Result<(), AuthError> {
        let mut tables = self.tables.write().await;

        let role = tables
            .roles
            .iter()
            .find(|role| role.name == role_name)
            .cloned()
            .ok_or_else(|| AuthError::NotFound(format!("role {}", role_name)))?;

        let user = tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| AuthError::NotFound(user_id.to_string()))?;

        if !user.roles.contains(&role) {
            user.roles.push(role);
        }

        Ok(())
    }
}
