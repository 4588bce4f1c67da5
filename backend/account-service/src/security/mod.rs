/// Security primitives for account-service
///
/// - **password**: Argon2id credential hashing and verification
/// - **codes**: uniformly random 6-digit activation codes from the OS RNG
/// - **token**: HS256 access tokens for logged-in users
pub mod codes;
pub mod password;
pub mod token;

pub use codes::{CodeGenerator, OsRngCodeGenerator};
pub use password::{Argon2CredentialVerifier, CredentialError, CredentialVerifier};
pub use token::{AccessToken, Claims, JwtTokenIssuer, TokenError, TokenIssuer};
