//! Credential primitives for the authentication service
//!
//! - Password and refresh-token hashing (Argon2id)
//! - Signed, time-bound access and refresh tokens (HS256 JWT) with
//!   independent secrets and lifetimes
//!
//! Nothing here touches storage; the service composes these pieces.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## Token Pairs
//! ```
//! use auth::{Identity, TokenKind, TokenSigner};
//!
//! let signer = TokenSigner::new(
//!     b"access_secret_at_least_32_bytes_long!",
//!     b"refresh_secret_at_least_32_bytes_long",
//! );
//! let identity = Identity::new("user123", "alice", "a@x.com");
//! let pair = signer.issue_pair(&identity).unwrap();
//!
//! let claims = signer.verify(TokenKind::Access, &pair.access_token).unwrap();
//! assert_eq!(claims.sub.as_deref(), Some("user123"));
//! assert!(signer.verify(TokenKind::Refresh, &pair.access_token).is_err());
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::Claims;
pub use jwt::Identity;
pub use jwt::JwtError;
pub use jwt::TokenKind;
pub use jwt::TokenPair;
pub use jwt::TokenSigner;
pub use password::PasswordError;
pub use password::PasswordHasher;
