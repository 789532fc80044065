//! Token issuance and verification.

use crate::claims::{MANDATORY_CLAIMS, Scope, TokenClaims};
use crate::error::TokenError;
use crate::keys::SigningKey;
use chrono::Utc;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use jsonwebtoken::{Algorithm, Header, Validation, decode, decode_header, encode};
use serde_json::{Map, Value};
use signer_core::{SERVICE_NAME, TokenConfig};
use std::sync::Arc;
use uuid::Uuid;

/// The only algorithm issued or accepted.
pub const ALGORITHM: Algorithm = Algorithm::ES256;

const AUTH_SCHEME: &str = "Bearer";

/// Source of the current time in seconds since the epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Issues and verifies bearer tokens with the service's own key.
#[derive(Clone)]
pub struct TokenService {
    key: SigningKey,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a token service using the wall clock.
    pub fn new(key: SigningKey) -> Self {
        Self::with_clock(key, Arc::new(SystemClock))
    }

    /// Create a token service with a custom time source.
    pub fn with_clock(key: SigningKey, clock: Arc<dyn Clock>) -> Self {
        Self { key, clock }
    }

    /// Build the service from configuration. A missing key is a startup error.
    pub fn from_config(config: &TokenConfig) -> Result<Self, TokenError> {
        let pem = config.resolve_signing_key()?.ok_or_else(|| {
            TokenError::InvalidSigningKey(
                "no signing key configured (set token.signing_key_file or token.signing_key_env)"
                    .into(),
            )
        })?;
        let key = SigningKey::from_pem(&pem)?.with_key_id(config.key_id.clone());
        Ok(Self::new(key))
    }

    /// Issue a signed token granting `scope` for `validity_secs` seconds.
    pub fn issue_token(
        &self,
        scope: &[String],
        validity_secs: u64,
        issuer: &str,
        subject: &str,
    ) -> Result<String, TokenError> {
        if validity_secs == 0 {
            return Err(TokenError::TokenCreationFailed(
                "validity must be at least one second".into(),
            ));
        }
        let validity = i64::try_from(validity_secs)
            .map_err(|_| TokenError::TokenCreationFailed("validity out of range".into()))?;

        let now = self.clock.now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            nbf: now,
            exp: Some(now.saturating_add(validity)),
            iss: issuer.to_string(),
            aud: SERVICE_NAME.to_string(),
            scope: Scope::List(scope.to_vec()),
        };

        let mut header = Header::new(ALGORITHM);
        header.kid = self.key.key_id().map(str::to_string);

        let token = encode(&header, &claims, self.key.encoding_key())
            .map_err(|e| TokenError::TokenCreationFailed(e.to_string()))?;

        tracing::info!(
            subject,
            issuer,
            jti = %claims.jti,
            scope = ?scope,
            expires_at = ?claims.exp,
            "Issued token"
        );

        Ok(token)
    }

    /// Verify a raw token: signature, header, mandatory claims, audience and time window.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let payload = self.decode_verified(token)?;

        for claim in MANDATORY_CLAIMS {
            if !payload.contains_key(claim) {
                return Err(TokenError::missing_claim(claim));
            }
        }

        let claims: TokenClaims = serde_json::from_value(Value::Object(payload))
            .map_err(|e| TokenError::InvalidToken(format!("malformed claims: {}", e)))?;

        self.validate_claims(&claims)?;
        Ok(claims)
    }

    /// Authenticate the request's bearer token, returning its claims.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<TokenClaims, TokenError> {
        let token = extract_token(headers).ok_or(TokenError::MissingToken)?;
        self.verify(&token)
    }

    /// Whether the request carries a valid token. Never reveals why not.
    pub fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        match self.authenticate(headers) {
            Ok(claims) => {
                tracing::debug!(subject = %claims.sub, jti = %claims.jti, "Token accepted");
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                false
            }
        }
    }

    /// Whether the request's token scope grants `action`.
    ///
    /// Re-reads the token independently of [`is_authenticated`](Self::is_authenticated):
    /// the signature must verify, but the time window is not checked here, so
    /// callers need both checks.
    pub fn is_authorized_to_perform(&self, headers: &HeaderMap, action: &str) -> bool {
        let Some(token) = extract_token(headers) else {
            return false;
        };

        let payload = match self.decode_verified(&token) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected during authorization");
                return false;
            }
        };

        let Some(scope) = payload.get("scope") else {
            tracing::debug!(action, "Token has no scope claim");
            return false;
        };

        match serde_json::from_value::<Scope>(scope.clone()) {
            Ok(scope) => {
                let granted = scope.grants(action);
                if !granted {
                    tracing::debug!(action, scope = ?scope, "Scope does not grant action");
                }
                granted
            }
            Err(_) => {
                tracing::debug!(action, "Token scope claim has an unsupported type");
                false
            }
        }
    }

    fn decode_verified(&self, token: &str) -> Result<Map<String, Value>, TokenError> {
        let header = decode_header(token)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::InvalidAlgorithm(format!("{:?}", header.alg)));
        }
        if header.kid.as_deref() != self.key.key_id() {
            return Err(TokenError::InvalidKeyId);
        }

        // Time and audience checks run against the injected clock instead.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Map<String, Value>>(token, self.key.decoding_key(), &validation)?;
        Ok(data.claims)
    }

    fn validate_claims(&self, claims: &TokenClaims) -> Result<(), TokenError> {
        let now = self.clock.now();

        if claims.aud != SERVICE_NAME {
            return Err(TokenError::InvalidAudience(format!(
                "expected '{}', got '{}'",
                SERVICE_NAME, claims.aud
            )));
        }

        if claims.iat > now || claims.nbf > now {
            return Err(TokenError::NotYetValid);
        }

        match claims.exp {
            Some(exp) if now > exp => Err(TokenError::Expired { expired_at: exp }),
            _ => Ok(()),
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The header must consist of exactly two space-separated parts, the first
/// being the scheme name in any case.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case(AUTH_SCHEME) && !token.is_empty() => {
            Some((*token).to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use std::sync::atomic::{AtomicI64, Ordering};

    const TOKEN_KEY: &str = include_str!("../../../testdata/token.pem");

    struct FixedClock(AtomicI64);

    impl FixedClock {
        fn at(now: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(now)))
        }

        fn advance(&self, secs: i64) {
            self.0.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn service() -> TokenService {
        TokenService::new(SigningKey::from_pem(TOKEN_KEY).unwrap())
    }

    fn bearer(token: &str) -> HeaderMap {
        header_map(&format!("Bearer {}", token))
    }

    fn header_map(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_token_cases() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        assert_eq!(extract_token(&header_map("")), None);
        assert_eq!(extract_token(&header_map("Bearer")), None);
        assert_eq!(extract_token(&header_map("ME")), None);
        assert_eq!(extract_token(&header_map("ME token")), None);
        assert_eq!(extract_token(&header_map("Bearer a b")), None);
        assert_eq!(extract_token(&header_map("Bearer token")), Some("token".into()));
        assert_eq!(extract_token(&header_map("bEaReR token")), Some("token".into()));
    }

    #[test]
    fn test_issue_and_authenticate() {
        let service = service();
        let token = service.issue_token(&[], 3600, "tester", "subj").unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(service.is_authenticated(&bearer(&token)));

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, "subj");
        assert_eq!(claims.iss, "tester");
        assert_eq!(claims.aud, SERVICE_NAME);
        assert_eq!(claims.exp, Some(claims.nbf + 3600));
        assert!(claims.exp.unwrap() > claims.nbf);
    }

    #[test]
    fn test_token_ids_are_unique() {
        let service = service();
        let a = service.verify(&service.issue_token(&[], 60, "t", "s").unwrap()).unwrap();
        let b = service.verify(&service.issue_token(&[], 60, "t", "s").unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_token_expires() {
        let clock = FixedClock::at(1_700_000_000);
        let service =
            TokenService::with_clock(SigningKey::from_pem(TOKEN_KEY).unwrap(), clock.clone());

        let token = service.issue_token(&[], 3600, "tester", "subj").unwrap();
        let headers = bearer(&token);
        assert!(service.is_authenticated(&headers));

        clock.advance(3600);
        assert!(service.is_authenticated(&headers));

        clock.advance(1);
        assert!(!service.is_authenticated(&headers));
        assert!(matches!(
            service.authenticate(&headers),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn test_token_not_yet_valid() {
        let clock = FixedClock::at(1_700_000_000);
        let issuing =
            TokenService::with_clock(SigningKey::from_pem(TOKEN_KEY).unwrap(), clock.clone());
        let token = issuing.issue_token(&[], 3600, "tester", "subj").unwrap();

        let verifying = TokenService::with_clock(
            SigningKey::from_pem(TOKEN_KEY).unwrap(),
            FixedClock::at(1_700_000_000 - 10),
        );
        assert!(matches!(verifying.verify(&token), Err(TokenError::NotYetValid)));
    }

    #[test]
    fn test_zero_validity_rejected() {
        assert!(matches!(
            service().issue_token(&[], 0, "t", "s"),
            Err(TokenError::TokenCreationFailed(_))
        ));
    }

    #[test]
    fn test_key_id_must_match() {
        let with_kid = TokenService::new(
            SigningKey::from_pem(TOKEN_KEY)
                .unwrap()
                .with_key_id(Some("signer-1".into())),
        );
        let token = with_kid.issue_token(&[], 60, "t", "s").unwrap();
        assert!(with_kid.verify(&token).is_ok());

        let without_kid = service();
        assert!(matches!(without_kid.verify(&token), Err(TokenError::InvalidKeyId)));
    }

    #[test]
    fn test_authorization_with_scope_list() {
        let service = service();
        let token = service
            .issue_token(&["count:*".into(), "sign:theme-example".into()], 60, "t", "s")
            .unwrap();
        let headers = bearer(&token);

        assert!(service.is_authorized_to_perform(&headers, "sign:theme-example"));
        assert!(service.is_authorized_to_perform(&headers, "count:anything"));
        assert!(!service.is_authorized_to_perform(&headers, "sign:other-app"));
    }

    #[test]
    fn test_authorization_denied_without_scope() {
        let service = service();
        let token = service.issue_token(&[], 60, "t", "s").unwrap();
        assert!(!service.is_authorized_to_perform(&bearer(&token), "sign:app"));
        assert!(!service.is_authorized_to_perform(&HeaderMap::new(), "sign:app"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = TokenConfig::default();
        assert!(matches!(
            TokenService::from_config(&config),
            Err(TokenError::InvalidSigningKey(_))
        ));
    }
}
