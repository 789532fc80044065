//! # signer-server
//!
//! HTTP interface of the app signing service.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/sign` | multipart upload of one `.tar.gz`; returns the signed package |
//! | `GET` | `/health` | liveness check |
//!
//! Errors are returned as `{"error": "...", "code": <status>}`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ServerError};
pub use routes::create_router;
pub use server::SignerServer;
pub use state::AppState;
