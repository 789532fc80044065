//! Scope claim matching.
//!
//! Claims and actions share the grammar `<verb>:<namespace>`. A claim grants
//! an action when the verbs are equal and the claim namespace is either `*`
//! or equal to the action namespace. Every authorization decision in the
//! service reduces to this function.

const SEPARATOR: char = ':';
const WILDCARD: &str = "*";

/// Returns true if `claim` grants `action`. Malformed input never matches.
pub fn matches(claim: &str, action: &str) -> bool {
    let Some((claim_verb, claim_namespace)) = split(claim) else {
        return false;
    };
    let Some((action_verb, action_namespace)) = split(action) else {
        return false;
    };

    if claim_verb != action_verb {
        return false;
    }

    if claim_verb.is_empty()
        || claim_namespace.is_empty()
        || action_verb.is_empty()
        || action_namespace.is_empty()
    {
        return false;
    }

    claim_namespace == WILDCARD || claim_namespace == action_namespace
}

fn split(value: &str) -> Option<(&str, &str)> {
    let mut parts = value.split(SEPARATOR);
    let verb = parts.next()?;
    let namespace = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((verb.trim(), namespace.trim()))
}
