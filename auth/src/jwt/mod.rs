pub mod claims;
pub mod errors;
mod handler;
pub mod signer;

pub use claims::Claims;
pub use claims::Identity;
pub use errors::JwtError;
pub use signer::TokenKind;
pub use signer::TokenPair;
pub use signer::TokenSigner;
