//! Bearer token handling.
//!
//! Components:
//! - `claims`: reads the expiry out of JWT-shaped tokens and mints the unsigned
//!   tokens the mock server hands out.
//! - `token_guard`: the single-flight refresh shared by every request.

pub mod claims;
pub mod token_guard;

pub use claims::{decode_claims, TokenClaims};
pub use token_guard::{TokenGuard, DEFAULT_REFRESH_WINDOW_SECS, REFRESH_PATH};
