//! Key material for one app.

use crate::error::KeyError;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use x509_cert::Certificate;
use x509_cert::der::asn1::ObjectIdentifier;
use x509_cert::der::pem::LineEnding;
use x509_cert::der::{DecodePem, Encode, EncodePem};

/// id-at-commonName
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Private key and certificate used to sign on behalf of one app.
///
/// Produced fresh by each resolution call and owned by the caller.
pub struct KeySet {
    app_id: String,
    private_key: RsaPrivateKey,
    certificate: Certificate,
}

impl std::fmt::Debug for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySet")
            .field("app_id", &self.app_id)
            .field("common_name", &self.common_name())
            .finish_non_exhaustive()
    }
}

impl KeySet {
    /// Parse PEM key material for `app_id`.
    ///
    /// The key may be PKCS#1 (`RSA PRIVATE KEY`) or PKCS#8 (`PRIVATE KEY`).
    /// The certificate's public key must belong to the private key.
    pub fn from_pem(app_id: &str, key_pem: &str, cert_pem: &str) -> Result<Self, KeyError> {
        let key_pem = key_pem.trim();
        let private_key = RsaPrivateKey::from_pkcs1_pem(key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(key_pem))
            .map_err(|e| KeyError::invalid(app_id, format!("unreadable private key: {}", e)))?;

        let certificate = Certificate::from_pem(cert_pem.trim().as_bytes())
            .map_err(|e| KeyError::invalid(app_id, format!("unreadable certificate: {}", e)))?;

        let certified_key = certificate
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .ok()
            .and_then(|der| RsaPublicKey::from_public_key_der(&der).ok())
            .ok_or_else(|| KeyError::invalid(app_id, "certificate does not hold an RSA key"))?;

        if certified_key != private_key.to_public_key() {
            return Err(KeyError::invalid(
                app_id,
                "certificate does not match private key",
            ));
        }

        Ok(Self {
            app_id: app_id.to_string(),
            private_key,
            certificate,
        })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Subject common name of the certificate, if it has one.
    pub fn common_name(&self) -> Option<String> {
        self.certificate
            .tbs_certificate
            .subject
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|atv| atv.oid == COMMON_NAME)
            .and_then(|atv| std::str::from_utf8(atv.value.value()).ok())
            .map(str::to_string)
    }

    /// Require the certificate subject CN to name this app.
    pub fn ensure_common_name(&self) -> Result<(), KeyError> {
        match self.common_name() {
            Some(cn) if cn == self.app_id => Ok(()),
            Some(cn) => Err(KeyError::invalid(
                &self.app_id,
                format!("certificate issued for '{}'", cn),
            )),
            None => Err(KeyError::invalid(
                &self.app_id,
                "certificate has no common name",
            )),
        }
    }

    /// Certificate re-encoded as PEM with LF line endings.
    pub fn certificate_pem(&self) -> Result<String, KeyError> {
        self.certificate
            .to_pem(LineEnding::LF)
            .map_err(|e| KeyError::invalid(&self.app_id, format!("cannot encode certificate: {}", e)))
    }
}
