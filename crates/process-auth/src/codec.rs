//! Encoding of subjects to and from `requester`/`recipient` extension trees.
//!
//! A subject is stored as an extension whose `valueCoding` is the
//! classification coding. Organization, role and practitioner details hang
//! off that coding as nested extensions:
//!
//! | Code | Sub-node |
//! |---|---|
//! | `LOCAL_ALL_PRACTITIONER` | practitioner (`valueCoding`) |
//! | `*_ORGANIZATION` | organization (`valueIdentifier`) |
//! | `LOCAL_ORGANIZATION_PRACTITIONER` | organization practitioner { `organization`, `practitioner-role` } |
//! | `*_ROLE` | parent organization role { `parent-organization`, `organization-role` } |
//! | `LOCAL_ROLE_PRACTITIONER` | parent organization role practitioner { `parent-organization`, `organization-role`, `practitioner-role` } |
//!
//! Decoding is strict and never fails loudly: any missing, duplicated,
//! mistyped or unknown sub-node yields `None`.

use tracing::trace;

use crate::constants::*;
use crate::fhir::{Coding, Extension, ExtensionValue, Identifier};
use crate::predicates::ExistencePredicates;
use crate::subject::{All, Organization, Role, Subject};

/// Encodes a subject as a `requester` extension.
pub fn encode_requester(subject: &Subject) -> Extension {
    Extension::new(EXTENSION_PROCESS_AUTHORIZATION_REQUESTER)
        .with_value(ExtensionValue::Coding(to_coding(subject, true)))
}

/// Encodes a subject as a `recipient` extension. Practitioner details are never written.
pub fn encode_recipient(subject: &Subject) -> Extension {
    Extension::new(EXTENSION_PROCESS_AUTHORIZATION_RECIPIENT)
        .with_value(ExtensionValue::Coding(to_coding(subject, false)))
}

fn organization_identifier(value: &str) -> Identifier {
    Identifier::new(ORGANIZATION_IDENTIFIER_SYSTEM, value)
}

fn identifier_node(url: &str, value: &str) -> Extension {
    Extension::new(url).with_value(ExtensionValue::Identifier(organization_identifier(value)))
}

fn coding_node(url: &str, coding: &Coding) -> Extension {
    Extension::new(url).with_value(ExtensionValue::Coding(coding.to_plain()))
}

fn to_coding(subject: &Subject, with_practitioner: bool) -> Coding {
    let coding = subject.classification_coding();
    let practitioner_role = subject.practitioner_role().filter(|_| with_practitioner);

    match (subject, practitioner_role) {
        (Subject::All(_), None) => coding,
        (Subject::All(_), Some(role)) => {
            coding.with_extension(coding_node(EXTENSION_PROCESS_AUTHORIZATION_PRACTITIONER, role))
        }
        (Subject::Organization(o), None) => coding.with_extension(identifier_node(
            EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION,
            o.organization_identifier(),
        )),
        (Subject::Organization(o), Some(role)) => coding.with_extension(
            Extension::new(EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER)
                .with_extension(identifier_node(
                    EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER_ORGANIZATION,
                    o.organization_identifier(),
                ))
                .with_extension(coding_node(
                    EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER_PRACTITIONER_ROLE,
                    role,
                )),
        ),
        (Subject::Role(r), None) => coding.with_extension(parent_organization_role_node(
            EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE,
            r,
        )),
        (Subject::Role(r), Some(role)) => coding.with_extension(
            parent_organization_role_node(
                EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PRACTITIONER,
                r,
            )
            .with_extension(coding_node(
                EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PRACTITIONER_PRACTITIONER_ROLE,
                role,
            )),
        ),
    }
}

fn parent_organization_role_node(url: &str, role: &Role) -> Extension {
    Extension::new(url)
        .with_extension(identifier_node(
            EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PARENT_ORGANIZATION,
            role.parent_organization_identifier(),
        ))
        .with_extension(coding_node(
            EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_ORGANIZATION_ROLE,
            role.organization_role(),
        ))
}

/// Returns the only extension with `url`, or `None` if there are zero or several.
fn exactly_one<'a>(extensions: &'a [Extension], url: &str) -> Option<&'a Extension> {
    let mut matching = extensions.iter().filter(|e| e.url() == url);
    let first = matching.next()?;
    match matching.next() {
        Some(_) => None,
        None => Some(first),
    }
}

fn decode_organization_identifier<'a>(
    extension: &'a Extension,
    predicates: &ExistencePredicates,
) -> Option<&'a str> {
    let identifier = extension.value_identifier()?;
    if identifier.system() != Some(ORGANIZATION_IDENTIFIER_SYSTEM)
        || !predicates.organization_with_identifier_exists(identifier)
    {
        return None;
    }
    identifier.value()
}

fn decode_practitioner_role<'a>(
    extension: &'a Extension,
    predicates: &ExistencePredicates,
) -> Option<&'a Coding> {
    extension
        .value_coding()
        .filter(|role| predicates.practitioner_role_exists(role))
}

fn decode_organization_role<'a>(
    extension: &'a Extension,
    predicates: &ExistencePredicates,
) -> Option<&'a Coding> {
    extension
        .value_coding()
        .filter(|role| predicates.organization_role_exists(role))
}

fn decode_all(
    local_identity: bool,
    practitioner: bool,
    coding: &Coding,
    predicates: &ExistencePredicates,
) -> Option<Subject> {
    let practitioner_role = if practitioner {
        let node = exactly_one(coding.extensions(), EXTENSION_PROCESS_AUTHORIZATION_PRACTITIONER)?;
        Some(decode_practitioner_role(node, predicates)?.clone())
    } else {
        None
    };

    All::new(local_identity, practitioner_role).ok().map(Subject::All)
}

fn decode_organization(
    local_identity: bool,
    practitioner: bool,
    coding: &Coding,
    predicates: &ExistencePredicates,
) -> Option<Subject> {
    let (identifier, practitioner_role) = if practitioner {
        let container = exactly_one(
            coding.extensions(),
            EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER,
        )?;
        let organization = exactly_one(
            container.extensions(),
            EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER_ORGANIZATION,
        )?;
        let role = exactly_one(
            container.extensions(),
            EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER_PRACTITIONER_ROLE,
        )?;
        (
            decode_organization_identifier(organization, predicates)?,
            Some(decode_practitioner_role(role, predicates)?.clone()),
        )
    } else {
        let organization =
            exactly_one(coding.extensions(), EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION)?;
        (decode_organization_identifier(organization, predicates)?, None)
    };

    Organization::new(local_identity, identifier, practitioner_role)
        .ok()
        .map(Subject::Organization)
}

fn decode_role(
    local_identity: bool,
    practitioner: bool,
    coding: &Coding,
    predicates: &ExistencePredicates,
) -> Option<Subject> {
    let container_url = if practitioner {
        EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PRACTITIONER
    } else {
        EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE
    };
    let container = exactly_one(coding.extensions(), container_url)?;

    let parent = exactly_one(
        container.extensions(),
        EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PARENT_ORGANIZATION,
    )?;
    let role = exactly_one(
        container.extensions(),
        EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_ORGANIZATION_ROLE,
    )?;
    let parent = decode_organization_identifier(parent, predicates)?;
    let role = decode_organization_role(role, predicates)?;

    let practitioner_role = if practitioner {
        let node = exactly_one(
            container.extensions(),
            EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PRACTITIONER_PRACTITIONER_ROLE,
        )?;
        Some(decode_practitioner_role(node, predicates)?.clone())
    } else {
        None
    };

    Role::new(local_identity, parent, role.clone(), practitioner_role)
        .ok()
        .map(Subject::Role)
}

fn decode(
    coding: &Coding,
    predicates: &ExistencePredicates,
    code: ProcessAuthorizationCode,
) -> Option<Subject> {
    use ProcessAuthorizationCode::*;

    let local = code.is_local();
    let practitioner = code.is_practitioner();

    let subject = match code {
        LocalAll | LocalAllPractitioner | RemoteAll => {
            decode_all(local, practitioner, coding, predicates)
        }
        LocalOrganization | LocalOrganizationPractitioner | RemoteOrganization => {
            decode_organization(local, practitioner, coding, predicates)
        }
        LocalRole | LocalRolePractitioner | RemoteRole => {
            decode_role(local, practitioner, coding, predicates)
        }
    };

    if subject.is_none() {
        trace!(code = %code, "classification coding sub-nodes missing, malformed or unknown");
    }
    subject
}

/// Decodes the classification coding of a `requester` node.
pub fn decode_requester(coding: &Coding, predicates: &ExistencePredicates) -> Option<Subject> {
    let Some(code) = ProcessAuthorizationCode::from_coding(coding) else {
        trace!(
            system = ?coding.system(),
            code = ?coding.code(),
            "unknown requester classification"
        );
        return None;
    };
    decode(coding, predicates, code)
}

/// Decodes the classification coding of a `recipient` node.
///
/// Only `LOCAL_ALL`, `LOCAL_ORGANIZATION` and `LOCAL_ROLE` are valid recipients.
pub fn decode_recipient(coding: &Coding, predicates: &ExistencePredicates) -> Option<Subject> {
    match ProcessAuthorizationCode::from_coding(coding) {
        Some(code) if code.is_recipient_code() => decode(coding, predicates, code),
        Some(code) => {
            trace!(code = %code, "classification not allowed for recipients");
            None
        }
        None => {
            trace!(
                system = ?coding.system(),
                code = ?coding.code(),
                "unknown recipient classification"
            );
            None
        }
    }
}

/// Decodes a `requester` extension, checking its URL and value type first.
pub fn decode_requester_extension(
    extension: &Extension,
    predicates: &ExistencePredicates,
) -> Option<Subject> {
    if extension.url() != EXTENSION_PROCESS_AUTHORIZATION_REQUESTER {
        return None;
    }
    decode_requester(extension.value_coding()?, predicates)
}

/// Decodes a `recipient` extension, checking its URL and value type first.
pub fn decode_recipient_extension(
    extension: &Extension,
    predicates: &ExistencePredicates,
) -> Option<Subject> {
    if extension.url() != EXTENSION_PROCESS_AUTHORIZATION_RECIPIENT {
        return None;
    }
    decode_recipient(extension.value_coding()?, predicates)
}

fn identifier_matches(extension: &Extension, expected: &str) -> bool {
    extension
        .value_identifier()
        .is_some_and(|i| i.is_complete() && i.is(ORGANIZATION_IDENTIFIER_SYSTEM, expected))
}

fn coding_matches(extension: &Extension, expected: &Coding) -> bool {
    extension
        .value_coding()
        .is_some_and(|c| c.has_system() && c.has_code() && c.same_concept(expected))
}

fn any_child(container: &Extension, url: &str, matches: impl Fn(&Extension) -> bool) -> bool {
    container.extensions_with_url(url).any(matches)
}

fn role_container_matches(container: &Extension, role: &Role) -> bool {
    any_child(
        container,
        EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PARENT_ORGANIZATION,
        |e| identifier_matches(e, role.parent_organization_identifier()),
    ) && any_child(
        container,
        EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_ORGANIZATION_ROLE,
        |e| coding_matches(e, role.organization_role()),
    )
}

fn sub_nodes_match(subject: &Subject, coding: &Coding, with_practitioner: bool) -> bool {
    let practitioner_role = subject.practitioner_role().filter(|_| with_practitioner);
    let mut nodes = coding.extensions().iter();

    match (subject, practitioner_role) {
        (Subject::All(_), Some(role)) => nodes.any(|e| {
            e.url() == EXTENSION_PROCESS_AUTHORIZATION_PRACTITIONER && coding_matches(e, role)
        }),
        (Subject::All(_), None) if with_practitioner => {
            !nodes.any(|e| e.url() == EXTENSION_PROCESS_AUTHORIZATION_PRACTITIONER)
        }
        (Subject::All(_), None) => true,
        (Subject::Organization(o), None) => nodes.any(|e| {
            e.url() == EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION
                && identifier_matches(e, o.organization_identifier())
        }),
        (Subject::Organization(o), Some(role)) => nodes.any(|e| {
            e.url() == EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER
                && e.value().is_none()
                && any_child(
                    e,
                    EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER_ORGANIZATION,
                    |c| identifier_matches(c, o.organization_identifier()),
                )
                && any_child(
                    e,
                    EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER_PRACTITIONER_ROLE,
                    |c| coding_matches(c, role),
                )
        }),
        (Subject::Role(r), None) => nodes.any(|e| {
            e.url() == EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE
                && role_container_matches(e, r)
        }),
        (Subject::Role(r), Some(role)) => nodes.any(|e| {
            e.url() == EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PRACTITIONER
                && e.value().is_none()
                && role_container_matches(e, r)
                && any_child(
                    e,
                    EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PRACTITIONER_PRACTITIONER_ROLE,
                    |c| coding_matches(c, role),
                )
        }),
    }
}

/// Returns `true` if `extension` is a `requester` node equivalent to `subject`.
///
/// Existence predicates are not consulted.
pub fn requester_matches(subject: &Subject, extension: &Extension) -> bool {
    extension.url() == EXTENSION_PROCESS_AUTHORIZATION_REQUESTER
        && extension.value_coding().is_some_and(|coding| {
            subject.matches_classification(coding) && sub_nodes_match(subject, coding, true)
        })
}

/// Returns `true` if `extension` is a `recipient` node equivalent to `subject`.
///
/// Existence predicates are not consulted.
pub fn recipient_matches(subject: &Subject, extension: &Extension) -> bool {
    extension.url() == EXTENSION_PROCESS_AUTHORIZATION_RECIPIENT
        && extension.value_coding().is_some_and(|coding| {
            subject.matches_classification(coding) && sub_nodes_match(subject, coding, false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::{RecipientSubject, RequesterSubject};

    fn allow_all() -> &'static ExistencePredicates {
        ExistencePredicates::shared_allow_all()
    }

    fn requesters() -> Vec<Subject> {
        vec![
            Subject::local_all(),
            Subject::local_all_practitioner("pr", "DOC").unwrap(),
            Subject::remote_all(),
            Subject::local_organization("org.com").unwrap(),
            Subject::local_organization_practitioner("org.com", "pr", "DOC").unwrap(),
            Subject::remote_organization("org.com").unwrap(),
            Subject::local_role("parent.org", "cs", "DIC").unwrap(),
            Subject::local_role_practitioner("parent.org", "cs", "DIC", "pr", "DOC").unwrap(),
            Subject::remote_role("parent.org", "cs", "DIC").unwrap(),
        ]
    }

    #[test]
    fn test_requester_roundtrip_all_variants() {
        for subject in requesters() {
            let ext = subject.to_requester_extension();
            assert_eq!(ext.url(), EXTENSION_PROCESS_AUTHORIZATION_REQUESTER);

            let decoded = decode_requester_extension(&ext, allow_all());
            assert_eq!(decoded.as_ref(), Some(&subject), "{:?}", subject);
            assert!(subject.requester_matches(&ext));
        }
    }

    #[test]
    fn test_recipient_roundtrip_local_variants() {
        let recipients = [
            Subject::local_all(),
            Subject::local_organization("org.com").unwrap(),
            Subject::local_role("parent.org", "cs", "DIC").unwrap(),
        ];
        for subject in recipients {
            let ext = subject.to_recipient_extension();
            assert_eq!(ext.url(), EXTENSION_PROCESS_AUTHORIZATION_RECIPIENT);
            assert_eq!(decode_recipient_extension(&ext, allow_all()), Some(subject.clone()));
            assert!(subject.recipient_matches(&ext));
            assert!(!subject.requester_matches(&ext));
        }
    }

    #[test]
    fn test_recipient_rejects_remote_and_practitioner_codes() {
        for subject in requesters() {
            let coding = to_coding(&subject, true);
            let decoded = decode_recipient(&coding, allow_all());
            assert_eq!(
                decoded.is_some(),
                subject.classification_code().is_recipient_code(),
                "{:?}",
                subject
            );
        }
    }

    #[test]
    fn test_local_organization_wire_shape() {
        let ext = Subject::local_organization("org.com")
            .unwrap()
            .to_requester_extension();

        assert_eq!(
            serde_json::to_value(&ext).unwrap(),
            serde_json::json!({
                "url": "requester",
                "valueCoding": {
                    "extension": [{
                        "url": EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION,
                        "valueIdentifier": {
                            "system": ORGANIZATION_IDENTIFIER_SYSTEM,
                            "value": "org.com"
                        }
                    }],
                    "system": PROCESS_AUTHORIZATION_SYSTEM,
                    "code": "LOCAL_ORGANIZATION"
                }
            })
        );
    }

    #[test]
    fn test_role_practitioner_wire_shape() {
        let subject =
            Subject::local_role_practitioner("parent.org", "cs", "DIC", "pr", "DOC").unwrap();
        let ext = subject.to_requester_extension();
        let coding = ext.value_coding().unwrap();

        assert_eq!(coding.extensions().len(), 1);
        let container = &coding.extensions()[0];
        assert_eq!(
            container.url(),
            EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PRACTITIONER
        );
        let urls: Vec<_> = container.extensions().iter().map(|e| e.url()).collect();
        assert_eq!(
            urls,
            vec!["parent-organization", "organization-role", "practitioner-role"]
        );
    }

    #[test]
    fn test_recipient_encoding_omits_practitioner() {
        let subject = Subject::local_organization_practitioner("org.com", "pr", "DOC").unwrap();
        let coding = to_coding(&subject, false);
        assert_eq!(coding.extensions().len(), 1);
        assert_eq!(coding.extensions()[0].url(), EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION);
    }

    #[test]
    fn test_decode_rejects_duplicate_sub_node() {
        let coding = ProcessAuthorizationCode::LocalOrganization
            .to_coding()
            .with_extension(identifier_node(EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION, "a.com"))
            .with_extension(identifier_node(EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION, "b.com"));
        assert_eq!(decode_requester(&coding, allow_all()), None);
    }

    #[test]
    fn test_decode_rejects_missing_sub_node() {
        let coding = ProcessAuthorizationCode::LocalRole.to_coding().with_extension(
            Extension::new(EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE).with_extension(
                identifier_node(
                    EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PARENT_ORGANIZATION,
                    "parent.org",
                ),
            ),
        );
        assert_eq!(decode_requester(&coding, allow_all()), None);
        assert_eq!(
            decode_requester(
                &ProcessAuthorizationCode::LocalAllPractitioner.to_coding(),
                allow_all()
            ),
            None
        );
    }

    #[test]
    fn test_decode_rejects_mistyped_value() {
        let coding = ProcessAuthorizationCode::RemoteOrganization.to_coding().with_extension(
            Extension::new(EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION)
                .with_value(ExtensionValue::String("org.com".to_string())),
        );
        assert_eq!(decode_requester(&coding, allow_all()), None);
    }

    #[test]
    fn test_decode_rejects_foreign_identifier_system() {
        let coding = ProcessAuthorizationCode::RemoteOrganization.to_coding().with_extension(
            Extension::new(EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION).with_value(
                ExtensionValue::Identifier(Identifier::new("http://other", "org.com")),
            ),
        );
        assert_eq!(decode_requester(&coding, allow_all()), None);
    }

    #[test]
    fn test_decode_rejects_blank_identifier_value() {
        let coding = ProcessAuthorizationCode::RemoteOrganization
            .to_coding()
            .with_extension(identifier_node(EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION, " "));
        assert_eq!(decode_requester(&coding, allow_all()), None);
    }

    #[test]
    fn test_decode_consults_predicates() {
        let ext = Subject::local_role_practitioner("parent.org", "cs", "DIC", "pr", "DOC")
            .unwrap()
            .to_requester_extension();

        let no_orgs =
            ExistencePredicates::allow_all().with_organization_with_identifier_exists(|_| false);
        let no_roles = ExistencePredicates::allow_all().with_organization_role_exists(|_| false);
        let no_practitioner_roles = ExistencePredicates::allow_all()
            .with_practitioner_role_exists(|role: &Coding| !role.is("pr", "DOC"));

        assert!(decode_requester_extension(&ext, &no_orgs).is_none());
        assert!(decode_requester_extension(&ext, &no_roles).is_none());
        assert!(decode_requester_extension(&ext, &no_practitioner_roles).is_none());
        assert!(decode_requester_extension(&ext, allow_all()).is_some());
    }

    #[test]
    fn test_practitioner_predicate_receives_role_coding() {
        let ext = Subject::local_all_practitioner("pr", "DOC")
            .unwrap()
            .to_requester_extension();
        let only_doc = ExistencePredicates::allow_all()
            .with_practitioner_role_exists(|role: &Coding| role.is("pr", "DOC"));
        assert!(decode_requester_extension(&ext, &only_doc).is_some());
    }

    #[test]
    fn test_decode_rejects_unknown_code() {
        let coding = Coding::new(PROCESS_AUTHORIZATION_SYSTEM, "LOCAL_NOBODY");
        assert_eq!(decode_requester(&coding, allow_all()), None);
        let coding = Coding::new("http://other", "LOCAL_ALL");
        assert_eq!(decode_requester(&coding, allow_all()), None);
    }

    #[test]
    fn test_matches_distinguishes_values() {
        let subject = Subject::local_role("parent.org", "cs", "DIC").unwrap();
        let other_parent = Subject::local_role("other.org", "cs", "DIC").unwrap();
        let other_role = Subject::local_role("parent.org", "cs", "TTP").unwrap();
        let remote = Subject::remote_role("parent.org", "cs", "DIC").unwrap();

        let ext = subject.to_requester_extension();
        assert!(subject.requester_matches(&ext));
        assert!(!other_parent.requester_matches(&ext));
        assert!(!other_role.requester_matches(&ext));
        assert!(!remote.requester_matches(&ext));
    }

    #[test]
    fn test_all_requester_without_role_rejects_practitioner_node() {
        let practitioner = coding_node(
            EXTENSION_PROCESS_AUTHORIZATION_PRACTITIONER,
            &Coding::new("pr", "DOC"),
        );
        let ext = Extension::new(EXTENSION_PROCESS_AUTHORIZATION_REQUESTER).with_value(
            ExtensionValue::Coding(
                ProcessAuthorizationCode::LocalAll
                    .to_coding()
                    .with_extension(practitioner),
            ),
        );
        assert!(!Subject::local_all().requester_matches(&ext));
    }

    fn with_valued_container(subject: &Subject) -> Extension {
        let coding = subject.classification_coding();
        let requester = subject.to_requester_extension();
        let container = &requester.value_coding().unwrap().extensions()[0];
        let valued = container.extensions().iter().cloned().fold(
            Extension::new(container.url()).with_value(ExtensionValue::String("x".to_string())),
            Extension::with_extension,
        );
        Extension::new(EXTENSION_PROCESS_AUTHORIZATION_REQUESTER)
            .with_value(ExtensionValue::Coding(coding.with_extension(valued)))
    }

    #[test]
    fn test_practitioner_container_with_value_does_not_match() {
        let subjects = [
            Subject::local_organization_practitioner("org.com", "pr", "DOC").unwrap(),
            Subject::local_role_practitioner("parent.org", "cs", "DIC", "pr", "DOC").unwrap(),
        ];
        for subject in subjects {
            assert!(subject.requester_matches(&subject.to_requester_extension()));
            assert!(!subject.requester_matches(&with_valued_container(&subject)));
        }
    }

    #[test]
    fn test_practitioner_matches_role() {
        let subject = Subject::local_organization_practitioner("org.com", "pr", "DOC").unwrap();
        let other = Subject::local_organization_practitioner("org.com", "pr", "NURSE").unwrap();
        let ext = subject.to_requester_extension();
        assert!(subject.requester_matches(&ext));
        assert!(!other.requester_matches(&ext));
    }
}
