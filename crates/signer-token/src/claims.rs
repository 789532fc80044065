//! Token payload.

use serde::{Deserialize, Serialize};

use crate::matcher;

/// Claim names every presented token must carry.
pub const MANDATORY_CLAIMS: [&str; 7] = ["nbf", "iat", "iss", "aud", "scope", "jti", "sub"];

/// The `scope` claim: one claim string or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scope {
    Single(String),
    List(Vec<String>),
}

impl Scope {
    /// Whether any claim in this scope grants `action`.
    pub fn grants(&self, action: &str) -> bool {
        match self {
            Scope::Single(claim) => matcher::matches(claim, action),
            Scope::List(claims) => claims.iter().any(|claim| matcher::matches(claim, action)),
        }
    }
}

impl From<Vec<String>> for Scope {
    fn from(claims: Vec<String>) -> Self {
        Scope::List(claims)
    }
}

/// Claims carried by a bearer token.
///
/// ```json
/// {
///   "sub": "release-bot",
///   "jti": "0b6a7c9e-...",
///   "iat": 1700000000,
///   "nbf": 1700000000,
///   "exp": 1700003600,
///   "iss": "signer-cli",
///   "aud": "signer",
///   "scope": ["sign:*"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Who the token was issued to.
    pub sub: String,
    /// Unique token id.
    pub jti: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Not before (seconds since epoch).
    pub nbf: i64,
    /// Expiration time (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Who issued the token.
    pub iss: String,
    /// Always the service name.
    pub aud: String,
    /// Granted claims.
    pub scope: Scope,
}

impl TokenClaims {
    /// Whether the scope grants `action`.
    pub fn grants(&self, action: &str) -> bool {
        self.scope.grants(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_accepts_string_or_list() {
        let single: Scope = serde_json::from_str(r#""sign:*""#).unwrap();
        assert_eq!(single, Scope::Single("sign:*".into()));

        let list: Scope = serde_json::from_str(r#"["count:x","sign:app"]"#).unwrap();
        assert!(list.grants("sign:app"));
        assert!(!list.grants("sign:other"));
    }

    #[test]
    fn test_scope_rejects_other_types() {
        assert!(serde_json::from_str::<Scope>("42").is_err());
        assert!(serde_json::from_str::<Scope>(r#"{"sign":"*"}"#).is_err());
        assert!(serde_json::from_str::<Scope>(r#"["sign:*", 1]"#).is_err());
    }

    #[test]
    fn test_empty_scope_grants_nothing() {
        assert!(!Scope::List(vec![]).grants("sign:app"));
    }

    #[test]
    fn test_claims_serialize_without_missing_exp() {
        let claims = TokenClaims {
            sub: "tester".into(),
            jti: "id".into(),
            iat: 1,
            nbf: 1,
            exp: None,
            iss: "signer".into(),
            aud: "signer".into(),
            scope: Scope::List(vec![]),
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert!(value.get("exp").is_none());
        assert_eq!(value["scope"], serde_json::json!([]));
    }
}
