use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Identity claims carried by access and refresh tokens.
///
/// `sub` stays optional on the decoding side: a correctly signed token
/// without a subject is a payload error the caller must be able to see.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Unique token identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// The identity a token pair is minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub username: String,
    pub email: String,
}

impl Identity {
    pub fn new(subject: impl ToString, username: impl ToString, email: impl ToString) -> Self {
        Self {
            subject: subject.to_string(),
            username: username.to_string(),
            email: email.to_string(),
        }
    }
}

impl Claims {
    /// Create claims for an identity expiring `ttl` from now.
    ///
    /// Every call draws a fresh `jti`, so two tokens minted within the same
    /// second for the same identity never encode to the same string.
    pub fn for_identity(identity: &Identity, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: Some(identity.subject.clone()),
            username: identity.username.clone(),
            email: identity.email.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
        }
    }

    /// Drop the subject claim.
    pub fn without_subject(mut self) -> Self {
        self.sub = None;
        self
    }
}
