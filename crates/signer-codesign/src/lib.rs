//! # signer-codesign
//!
//! Hashing, signing and the sign workflow for app packages.
//!
//! A sign request runs these steps in order, stopping at the first failure:
//!
//! 1. authenticate the bearer token
//! 2. extract the uploaded `.tar.gz` into a scratch directory
//! 3. read `appinfo/info.xml` from the single app directory
//! 4. require the token scope to grant `sign:<id>`
//! 5. resolve the app's key set
//! 6. hash every file (SHA-512) and sign the canonical manifest (RSA-PSS)
//! 7. write `appinfo/signature.json` and re-pack as `<id>-<version>.tar.gz`
//!
//! ## Signature record
//!
//! ```json
//! {
//!     "hashes": { "README.md": "ee26b0dd..." },
//!     "signature": "shFUFrqv...",
//!     "certificate": "-----BEGIN CERTIFICATE-----\n..."
//! }
//! ```

pub mod app;
pub mod archive;
pub mod canonical;
pub mod error;
pub mod hash;
pub mod orchestrator;
pub mod signature;

pub use app::{AppInfo, read_app};
pub use archive::ArchiveService;
pub use error::SignError;
pub use hash::{HashManifest, compute_manifest};
pub use orchestrator::{SignedPackage, SigningService};
pub use signature::{SignatureRecord, sign, write_signature_record};
