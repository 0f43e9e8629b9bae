// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::codec::{decode_recipient_extension, decode_requester_extension};
use crate::constants::{
    EXTENSION_PROCESS_AUTHORIZATION_MESSAGE_NAME, EXTENSION_PROCESS_AUTHORIZATION_RECIPIENT,
    EXTENSION_PROCESS_AUTHORIZATION_REQUESTER, EXTENSION_PROCESS_AUTHORIZATION_TASK_PROFILE,
};
use crate::fhir::{ActivityDefinition, Extension};
use crate::predicates::ExistencePredicates;

use super::blocks;

/// How severe a validation issue is, in OperationOutcome terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// The resource carries no usable rules at all.
    Fatal,
    /// A block is malformed.
    Error,
}

/// What is wrong with a rule-set.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IssueKind {
    #[error("no resource")]
    MissingResource,

    #[error("no process authorization extensions")]
    NoAuthorizations,

    #[error("expected exactly one message-name, found {found}")]
    MessageNameCardinality { found: usize },

    #[error("message-name blank or not a string")]
    BlankMessageName,

    #[error("expected exactly one task-profile, found {found}")]
    TaskProfileCardinality { found: usize },

    #[error("task-profile {} unknown", .profile.as_deref().unwrap_or("<missing>"))]
    UnknownTaskProfile { profile: Option<String> },

    #[error("no requester")]
    MissingRequester,

    #[error("no recipient")]
    MissingRecipient,

    #[error("requester {position} invalid")]
    InvalidRequester { position: usize },

    #[error("recipient {position} invalid")]
    InvalidRecipient { position: usize },

    #[error("message-name not unique")]
    DuplicateMessageName,
}

impl IssueSeverity {
    /// Returns the OperationOutcome issue severity code.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Fatal => "fatal",
            IssueSeverity::Error => "error",
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IssueKind {
    /// Returns the severity of this kind of issue.
    pub fn severity(&self) -> IssueSeverity {
        match self {
            IssueKind::MissingResource | IssueKind::NoAuthorizations => IssueSeverity::Fatal,
            _ => IssueSeverity::Error,
        }
    }
}

/// A problem found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Index of the block among the resource's authorization blocks.
    ///
    /// `None` for resource-level issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<usize>,

    /// Message name of the block, if it has a usable one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_name: Option<String>,

    #[serde(flatten)]
    pub kind: IssueKind,

    pub severity: IssueSeverity,
}

impl ValidationIssue {
    fn resource(kind: IssueKind) -> Self {
        Self {
            block: None,
            message_name: None,
            severity: kind.severity(),
            kind,
        }
    }

    fn block(block: usize, message_name: Option<&str>, kind: IssueKind) -> Self {
        Self {
            block: Some(block),
            message_name: message_name.map(str::to_string),
            severity: kind.severity(),
            kind,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.block, &self.message_name) {
            (Some(block), Some(name)) => {
                write!(f, "authorization[{}] '{}': {}", block, name, self.kind)
            }
            (Some(block), None) => write!(f, "authorization[{}]: {}", block, self.kind),
            (None, _) => write!(f, "{}", self.kind),
        }
    }
}

fn children<'a>(block: &'a Extension, url: &str) -> Vec<&'a Extension> {
    block.extensions().iter().filter(|e| e.url() == url).collect()
}

fn valid_message_name<'a>(nodes: &[&'a Extension]) -> Option<&'a str> {
    match nodes {
        [node] => node.value_string().filter(|s| !s.trim().is_empty()),
        _ => None,
    }
}

fn validate_block(
    index: usize,
    block: &Extension,
    predicates: &ExistencePredicates,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    let message_names = children(block, EXTENSION_PROCESS_AUTHORIZATION_MESSAGE_NAME);
    let task_profiles = children(block, EXTENSION_PROCESS_AUTHORIZATION_TASK_PROFILE);
    let requesters = children(block, EXTENSION_PROCESS_AUTHORIZATION_REQUESTER);
    let recipients = children(block, EXTENSION_PROCESS_AUTHORIZATION_RECIPIENT);

    let message_name = valid_message_name(&message_names);
    let mut report =
        |kind: IssueKind| issues.push(ValidationIssue::block(index, message_name, kind));

    if message_names.len() != 1 {
        report(IssueKind::MessageNameCardinality {
            found: message_names.len(),
        });
    } else if message_name.is_none() {
        report(IssueKind::BlankMessageName);
    }

    match task_profiles.as_slice() {
        [node] => match node.value_canonical() {
            Some(profile) if predicates.profile_exists(profile) => {}
            profile => report(IssueKind::UnknownTaskProfile {
                profile: profile.map(str::to_string),
            }),
        },
        nodes => report(IssueKind::TaskProfileCardinality { found: nodes.len() }),
    }

    if requesters.is_empty() {
        report(IssueKind::MissingRequester);
    }
    for (position, requester) in requesters.iter().enumerate() {
        if decode_requester_extension(requester, predicates).is_none() {
            report(IssueKind::InvalidRequester { position });
        }
    }

    if recipients.is_empty() {
        report(IssueKind::MissingRecipient);
    }
    for (position, recipient) in recipients.iter().enumerate() {
        if decode_recipient_extension(recipient, predicates).is_none() {
            report(IssueKind::InvalidRecipient { position });
        }
    }

    message_name.map(str::to_string)
}

/// Validates all authorization blocks of a resource and reports every issue found.
///
/// Each block must have exactly one non-blank `message-name`, exactly one
/// `task-profile` accepted by [`ExistencePredicates::profile_exists`], and at
/// least one requester and one recipient, all of which decode under
/// `predicates`. Message names must be unique across blocks. A missing
/// resource or a resource without blocks is invalid.
pub fn validate(
    resource: Option<&ActivityDefinition>,
    predicates: &ExistencePredicates,
) -> Result<(), Vec<ValidationIssue>> {
    let Some(resource) = resource else {
        return Err(vec![ValidationIssue::resource(IssueKind::MissingResource)]);
    };

    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let mut count = 0;

    for (index, block) in blocks(resource).enumerate() {
        count += 1;
        if let Some(name) = validate_block(index, block, predicates, &mut issues) {
            if !seen.insert(name.clone()) {
                issues.push(ValidationIssue::block(
                    index,
                    Some(&name),
                    IssueKind::DuplicateMessageName,
                ));
            }
        }
    }

    if count == 0 {
        issues.push(ValidationIssue::resource(IssueKind::NoAuthorizations));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        for issue in &issues {
            debug!(
                url = ?resource.url(),
                severity = ?issue.severity,
                "rule-set issue: {}",
                issue
            );
        }
        Err(issues)
    }
}

/// Returns `true` if [`validate`] finds no issues.
pub fn is_valid(resource: Option<&ActivityDefinition>, predicates: &ExistencePredicates) -> bool {
    validate(resource, predicates).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EXTENSION_PROCESS_AUTHORIZATION;
    use crate::fhir::ExtensionValue;
    use crate::rule_set::add;
    use crate::subject::Subject;

    const PROFILE: &str = "http://dsf.dev/fhir/StructureDefinition/task-ping|1.0";

    fn process() -> ActivityDefinition {
        ActivityDefinition::new("http://dsf.dev/bpe/Process/ping", "1.0")
    }

    fn valid_process() -> ActivityDefinition {
        add(
            process(),
            "ping",
            PROFILE,
            &[Subject::remote_all()],
            &[Subject::local_all()],
        )
        .unwrap()
    }

    fn kinds(result: Result<(), Vec<ValidationIssue>>) -> Vec<IssueKind> {
        result.unwrap_err().into_iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_valid_rule_set() {
        let resource = valid_process();
        assert_eq!(validate(Some(&resource), &ExistencePredicates::allow_all()), Ok(()));
        assert!(is_valid(Some(&resource), &ExistencePredicates::allow_all()));
    }

    #[test]
    fn test_fails_closed() {
        let predicates = ExistencePredicates::allow_all();
        assert_eq!(kinds(validate(None, &predicates)), vec![IssueKind::MissingResource]);
        assert_eq!(
            kinds(validate(Some(&process()), &predicates)),
            vec![IssueKind::NoAuthorizations]
        );
        assert!(!is_valid(Some(&process()), &predicates));
    }

    #[test]
    fn test_unknown_profile() {
        let predicates = ExistencePredicates::allow_all().with_profile_exists(|_| false);
        let issues = validate(Some(&valid_process()), &predicates).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].block, Some(0));
        assert_eq!(issues[0].message_name.as_deref(), Some("ping"));
        assert_eq!(
            issues[0].kind,
            IssueKind::UnknownTaskProfile {
                profile: Some(PROFILE.to_string())
            }
        );
        assert_eq!(issues[0].severity, IssueSeverity::Error);
    }

    #[test]
    fn test_duplicate_message_name() {
        let resource = add(
            valid_process(),
            "ping",
            "http://dsf.dev/fhir/StructureDefinition/task-ping|2.0",
            &[Subject::remote_all()],
            &[Subject::local_all()],
        )
        .unwrap();

        let issues = validate(Some(&resource), &ExistencePredicates::allow_all()).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].block, Some(1));
        assert_eq!(issues[0].kind, IssueKind::DuplicateMessageName);
    }

    #[test]
    fn test_empty_block() {
        let resource = process().with_extension(Extension::new(EXTENSION_PROCESS_AUTHORIZATION));
        assert_eq!(
            kinds(validate(Some(&resource), &ExistencePredicates::allow_all())),
            vec![
                IssueKind::MessageNameCardinality { found: 0 },
                IssueKind::TaskProfileCardinality { found: 0 },
                IssueKind::MissingRequester,
                IssueKind::MissingRecipient,
            ]
        );
    }

    #[test]
    fn test_blank_message_name_and_invalid_subjects() {
        let block = Extension::new(EXTENSION_PROCESS_AUTHORIZATION)
            .with_extension(
                Extension::new(EXTENSION_PROCESS_AUTHORIZATION_MESSAGE_NAME)
                    .with_value(ExtensionValue::String("  ".to_string())),
            )
            .with_extension(
                Extension::new(EXTENSION_PROCESS_AUTHORIZATION_TASK_PROFILE)
                    .with_value(ExtensionValue::Canonical(PROFILE.to_string())),
            )
            .with_extension(
                Extension::new(EXTENSION_PROCESS_AUTHORIZATION_REQUESTER).with_value(
                    ExtensionValue::Coding(
                        crate::constants::ProcessAuthorizationCode::LocalOrganization.to_coding(),
                    ),
                ),
            )
            .with_extension(
                Extension::new(EXTENSION_PROCESS_AUTHORIZATION_RECIPIENT).with_value(
                    ExtensionValue::Coding(
                        crate::constants::ProcessAuthorizationCode::RemoteAll.to_coding(),
                    ),
                ),
            );
        let resource = process().with_extension(block);

        assert_eq!(
            kinds(validate(Some(&resource), &ExistencePredicates::allow_all())),
            vec![
                IssueKind::BlankMessageName,
                IssueKind::InvalidRequester { position: 0 },
                IssueKind::InvalidRecipient { position: 0 },
            ]
        );
    }

    #[test]
    fn test_issue_display_and_json() {
        let issue =
            ValidationIssue::block(2, Some("ping"), IssueKind::InvalidRequester { position: 1 });
        assert_eq!(issue.to_string(), "authorization[2] 'ping': requester 1 invalid");

        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["kind"], "invalidRequester");
        assert_eq!(value["position"], 1);
        assert_eq!(value["severity"], "error");
    }
}
