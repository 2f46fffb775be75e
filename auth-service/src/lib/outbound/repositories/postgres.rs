use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::EmailAddress;
use crate::domain::auth::models::NewUser;
use crate::domain::auth::models::Role;
use crate::domain::auth::models::User;
use crate::domain::auth::models::UserId;
use crate::domain::auth::models::Username;
use crate::domain::auth::ports::CredentialStore;

const USER_COLUMNS: &str = r#"
    u.id, u.username, u.email, u.password_hash, u.refresh_token_hash,
    u.display_name, u.bio, u.avatar, u.created_at,
    COALESCE(
        ARRAY_AGG(r.name ORDER BY r.name) FILTER (WHERE r.name IS NOT NULL),
        '{}'
    ) AS roles
"#;

const USER_JOINS: &str = r#"
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
"#;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    refresh_token_hash: Option<String>,
    display_name: Option<String>,
    bio: Option<String>,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    roles: Vec<String>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(row.id),
            username: Username::new(row.username)?,
            email: EmailAddress::new(row.email)?,
            password_hash: row.password_hash,
            refresh_token_hash: row.refresh_token_hash,
            display_name: row.display_name,
            bio: row.bio,
            avatar: row.avatar,
            roles: row.roles.into_iter().map(Role::new).collect(),
            created_at: row.created_at,
        })
    }
}

fn database_error(e: sqlx::Error) -> AuthError {
    tracing::error!(error = %e, "Credential store query failed");
    AuthError::Store(e.to_string())
}

/// PostgreSQL-backed credential store.
///
/// Queries are checked at runtime, so building the crate needs no live database.
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        predicate: &str,
        key: QueryKey<'_>,
    ) -> Result<Option<User>, AuthError> {
        let sql = format!(
            "SELECT {} {} WHERE {} GROUP BY u.id",
            USER_COLUMNS, USER_JOINS, predicate
        );
        let query = sqlx::query_as::<_, UserRow>(&sql);
        let query = match key {
            QueryKey::Id(id) => query.bind(id),
            QueryKey::Username(username) => query.bind(username),
        };

        query
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn has_role(&self, user_id: &UserId, role_name: &str) -> Result<bool, AuthError> {
        let (attached,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_roles ur
                JOIN roles r ON r.id = ur.role_id
                WHERE ur.user_id = $1 AND r.name = $2
            )
            "#,
        )
        .bind(user_id.0)
        .bind(role_name)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(attached)
    }
}

enum QueryKey<'a> {
    Id(Uuid),
    Username(&'a str),
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        self.find_one("u.id = $1", QueryKey::Id(id.0)).await
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, AuthError> {
        self.find_one("u.username = $1", QueryKey::Username(username.as_str()))
            .await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, avatar, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.0)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    if db_err.constraint() == Some("users_email_key") {
                        return AuthError::Conflict(user.email.as_str().to_string());
                    }
                    return AuthError::Conflict(user.username.as_str().to_string());
                }
            }
            database_error(e)
        })?;

        Ok(User {
            id: user.id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            refresh_token_hash: None,
            display_name: None,
            bio: None,
            avatar: Some(user.avatar),
            roles: Vec::new(),
            created_at: user.created_at,
        })
    }

    async fn update_refresh_hash(
        &self,
        id: &UserId,
        refresh_hash: Option<String>,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $2
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(refresh_hash)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn rotate_refresh_hash(
        &self,
        id: &UserId,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $3
            WHERE id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(id.0)
        .bind(expected)
        .bind(replacement)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn upsert_role(&self, name: &str) -> Result<Role, AuthError> {
        // The no-op update makes RETURNING yield the row on conflict as well.
        let (name,): (String,) = sqlx::query_as(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(Role::new(name))
    }

    async fn attach_role(&self, user_id: &UserId, role_name: &str) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, id FROM roles WHERE name = $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id.0)
        .bind(role_name)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_foreign_key_violation() {
                    return AuthError::NotFound(user_id.to_string());
                }
            }
            database_error(e)
        })?;

        if result.rows_affected() == 0 && !self.has_role(user_id, role_name).await? {
            return Err(AuthError::NotFound(format!("role {}", role_name)));
        }

        Ok(())
    }
}
