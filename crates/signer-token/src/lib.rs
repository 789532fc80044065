//! # signer-token
//!
//! Bearer token handling for the app signing service.
//!
//! This crate provides:
//! - Loading the service's P-256 signing key
//! - Issuing ES256 tokens carrying a list of scope claims
//! - Verifying presented tokens (signature, header, claims, time window)
//! - Matching scope claims against requested actions
//!
//! ## Scope grammar
//!
//! | Claim | Grants |
//! |-------|--------|
//! | `sign:*` | `sign:<any app>` |
//! | `sign:theme-example` | only `sign:theme-example` |
//!
//! Tokens are stateless: nothing is stored server-side and validity is a
//! function of the signature and the embedded timestamps alone.

pub mod claims;
pub mod error;
pub mod keys;
pub mod matcher;
pub mod token;

pub use claims::{Scope, TokenClaims};
pub use error::TokenError;
pub use keys::SigningKey;
pub use matcher::matches;
pub use token::{Clock, SystemClock, TokenService, extract_token};
