pub mod factory;
pub mod key_store;
pub mod token;
pub mod verifier;

pub use factory::build_token_validator;
pub use token::{Claims, Stage, TokenError};
pub use verifier::{JwtVerifier, TokenValidator};
