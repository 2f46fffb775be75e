use chrono::Duration;
use serde::Serialize;

use super::claims::Claims;
use super::claims::Identity;
use super::errors::JwtError;
use super::handler::JwtHandler;

/// Which of the two token families a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Access/refresh token pair handed to the client after login or rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies access and refresh tokens.
///
/// Each kind has its own secret and lifetime. A token signed for one kind
/// never verifies as the other, so leaking one secret cannot forge the
/// other family.
pub struct TokenSigner {
    access: JwtHandler,
    refresh: JwtHandler,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;
    pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

    /// Create a signer with the default lifetimes (15 minutes / 7 days).
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access: JwtHandler::new(access_secret),
            refresh: JwtHandler::new(refresh_secret),
            access_ttl: Duration::minutes(Self::DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(Self::DEFAULT_REFRESH_TTL_DAYS),
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    fn handler(&self, kind: TokenKind) -> &JwtHandler {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Sign a token of the given kind for an identity.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn sign(&self, kind: TokenKind, identity: &Identity) -> Result<String, JwtError> {
        self.sign_claims(kind, &Claims::for_identity(identity, self.ttl(kind)))
    }

    /// Sign prepared claims with the secret of the given kind.
    pub fn sign_claims(&self, kind: TokenKind, claims: &Claims) -> Result<String, JwtError> {
        self.handler(kind).encode(claims)
    }

    /// Mint a fresh access and refresh token for an identity.
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.sign(TokenKind::Access, identity)?,
            refresh_token: self.sign(TokenKind::Refresh, identity)?,
        })
    }

    /// Verify a token against the secret of the given kind.
    ///
    /// # Errors
    /// * `TokenExpired` - Token was valid but its `exp` has passed
    /// * `InvalidToken` - Bad signature (including the other kind's secret) or structure
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, JwtError> {
        self.handler(kind).decode(token)
    }
}
