//! Error types for process authorization.
//!
//! Only construction and authoring mistakes are errors. Decoding misses and
//! validation failures are reported as `Option`/`bool` or as
//! [`ValidationIssue`](crate::rule_set::ValidationIssue)s, so that a bad rule
//! never aborts processing of its sibling rules.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::constants::ProcessAuthorizationCode;

/// Errors raised when constructing subjects or authoring rule-sets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// A required string argument was empty or whitespace.
    #[error("{field} blank")]
    BlankField { field: &'static str },

    /// A required collection argument was empty.
    #[error("{field} empty")]
    EmptyCollection { field: &'static str },

    /// Remote subjects cannot be refined by a practitioner role.
    #[error("remote {subject} subject cannot require a practitioner role")]
    RemotePractitionerRole { subject: &'static str },

    /// The subject cannot be encoded as a recipient.
    #[error("{code} subject cannot be used as recipient: {reason}")]
    InvalidRecipient {
        code: ProcessAuthorizationCode,
        reason: &'static str,
    },
}

/// Result type alias for authorization operations.
pub type AuthorizationResult<T> = Result<T, AuthorizationError>;

/// Fails with [`AuthorizationError::BlankField`] if `value` is blank.
pub(crate) fn require_non_blank(value: &str, field: &'static str) -> AuthorizationResult<()> {
    if value.trim().is_empty() {
        Err(AuthorizationError::BlankField { field })
    } else {
        Ok(())
    }
}
