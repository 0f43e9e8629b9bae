//! Authorization subjects.
//!
//! A [`Subject`] describes who may send (requester) or receive (recipient) a
//! process message. There are three mutually exclusive shapes:
//!
//! - [`All`] - every organization, local or remote
//! - [`Organization`] - one organization, by identifier
//! - [`Role`] - every member organization holding a role in a parent organization
//!
//! Each shape may be refined by a practitioner role, in which case only
//! practitioners holding that role at a matching local organization qualify.
//!
//! Subjects are immutable and validated on construction:
//!
//! ```
//! use helios_process_auth::constants::ProcessAuthorizationCode;
//! use helios_process_auth::subject::Subject;
//!
//! let requester = Subject::local_organization_practitioner("org.com", "cs", "DIC").unwrap();
//! assert_eq!(
//!     requester.classification_code(),
//!     ProcessAuthorizationCode::LocalOrganizationPractitioner
//! );
//!
//! assert!(Subject::local_organization(" ").is_err());
//! ```

use serde::Serialize;

use crate::codec;
use crate::constants::ProcessAuthorizationCode;
use crate::error::{AuthorizationError, AuthorizationResult, require_non_blank};
use crate::evaluator;
use crate::fhir::{Coding, Extension, OrganizationAffiliation};
use crate::identity::Identity;

fn practitioner_role(
    local_identity: bool,
    subject: &'static str,
    role: Option<Coding>,
) -> AuthorizationResult<Option<Coding>> {
    match role {
        None => Ok(None),
        Some(_) if !local_identity => Err(AuthorizationError::RemotePractitionerRole { subject }),
        Some(role) => {
            require_non_blank(role.system().unwrap_or_default(), "practitionerRoleSystem")?;
            require_non_blank(role.code().unwrap_or_default(), "practitionerRoleCode")?;
            Ok(Some(role.to_plain()))
        }
    }
}

/// Every organization, optionally restricted to practitioners with a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct All {
    local_identity: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    practitioner_role: Option<Coding>,
}

impl All {
    /// Creates an `All` subject.
    pub fn new(
        local_identity: bool,
        practitioner_role: Option<Coding>,
    ) -> AuthorizationResult<Self> {
        Ok(Self {
            local_identity,
            practitioner_role: self::practitioner_role(local_identity, "all", practitioner_role)?,
        })
    }

    /// Returns `true` if the subject matches local identities.
    pub fn local_identity(&self) -> bool {
        self.local_identity
    }

    /// Returns the required practitioner role, if any.
    pub fn practitioner_role(&self) -> Option<&Coding> {
        self.practitioner_role.as_ref()
    }
}

/// A single organization, optionally restricted to practitioners with a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    local_identity: bool,
    organization_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    practitioner_role: Option<Coding>,
}

impl Organization {
    /// Creates an `Organization` subject. The identifier must not be blank.
    pub fn new(
        local_identity: bool,
        organization_identifier: impl Into<String>,
        practitioner_role: Option<Coding>,
    ) -> AuthorizationResult<Self> {
        let organization_identifier = organization_identifier.into();
        require_non_blank(&organization_identifier, "organizationIdentifier")?;

        Ok(Self {
            local_identity,
            organization_identifier,
            practitioner_role: self::practitioner_role(
                local_identity,
                "organization",
                practitioner_role,
            )?,
        })
    }

    /// Returns `true` if the subject matches local identities.
    pub fn local_identity(&self) -> bool {
        self.local_identity
    }

    /// Returns the identifier value in the organization identifier system.
    pub fn organization_identifier(&self) -> &str {
        &self.organization_identifier
    }

    /// Returns the required practitioner role, if any.
    pub fn practitioner_role(&self) -> Option<&Coding> {
        self.practitioner_role.as_ref()
    }
}

/// Member organizations holding a role within a parent organization,
/// optionally restricted to practitioners with a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    local_identity: bool,
    parent_organization_identifier: String,
    organization_role: Coding,
    #[serde(skip_serializing_if = "Option::is_none")]
    practitioner_role: Option<Coding>,
}

impl Role {
    /// Creates a `Role` subject.
    ///
    /// The parent organization identifier and the organization role's system
    /// and code must not be blank.
    pub fn new(
        local_identity: bool,
        parent_organization_identifier: impl Into<String>,
        organization_role: Coding,
        practitioner_role: Option<Coding>,
    ) -> AuthorizationResult<Self> {
        let parent_organization_identifier = parent_organization_identifier.into();
        require_non_blank(
            &parent_organization_identifier,
            "parentOrganizationIdentifier",
        )?;
        require_non_blank(
            organization_role.system().unwrap_or_default(),
            "organizationRoleSystem",
        )?;
        require_non_blank(
            organization_role.code().unwrap_or_default(),
            "organizationRoleCode",
        )?;

        Ok(Self {
            local_identity,
            parent_organization_identifier,
            organization_role: organization_role.to_plain(),
            practitioner_role: self::practitioner_role(local_identity, "role", practitioner_role)?,
        })
    }

    /// Returns `true` if the subject matches local identities.
    pub fn local_identity(&self) -> bool {
        self.local_identity
    }

    /// Returns the parent organization's identifier value.
    pub fn parent_organization_identifier(&self) -> &str {
        &self.parent_organization_identifier
    }

    /// Returns the role the member must hold within the parent organization.
    pub fn organization_role(&self) -> &Coding {
        &self.organization_role
    }

    /// Returns the required practitioner role, if any.
    pub fn practitioner_role(&self) -> Option<&Coding> {
        self.practitioner_role.as_ref()
    }
}

/// An authorization subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Subject {
    /// See [`All`].
    All(All),
    /// See [`Organization`].
    Organization(Organization),
    /// See [`Role`].
    Role(Role),
}

impl Subject {
    /// Any local organization.
    pub fn local_all() -> Self {
        Subject::All(All {
            local_identity: true,
            practitioner_role: None,
        })
    }

    /// Any local practitioner holding the given role.
    pub fn local_all_practitioner(
        practitioner_role_system: impl Into<String>,
        practitioner_role_code: impl Into<String>,
    ) -> AuthorizationResult<Self> {
        All::new(
            true,
            Some(Coding::new(practitioner_role_system, practitioner_role_code)),
        )
        .map(Subject::All)
    }

    /// Any remote organization.
    pub fn remote_all() -> Self {
        Subject::All(All {
            local_identity: false,
            practitioner_role: None,
        })
    }

    /// The local organization with the given identifier.
    pub fn local_organization(
        organization_identifier: impl Into<String>,
    ) -> AuthorizationResult<Self> {
        Organization::new(true, organization_identifier, None).map(Subject::Organization)
    }

    /// Practitioners with the given role at the local organization with the given identifier.
    pub fn local_organization_practitioner(
        organization_identifier: impl Into<String>,
        practitioner_role_system: impl Into<String>,
        practitioner_role_code: impl Into<String>,
    ) -> AuthorizationResult<Self> {
        Organization::new(
            true,
            organization_identifier,
            Some(Coding::new(practitioner_role_system, practitioner_role_code)),
        )
        .map(Subject::Organization)
    }

    /// The remote organization with the given identifier.
    pub fn remote_organization(
        organization_identifier: impl Into<String>,
    ) -> AuthorizationResult<Self> {
        Organization::new(false, organization_identifier, None).map(Subject::Organization)
    }

    /// Local members of the parent organization holding the given role.
    pub fn local_role(
        parent_organization_identifier: impl Into<String>,
        organization_role_system: impl Into<String>,
        organization_role_code: impl Into<String>,
    ) -> AuthorizationResult<Self> {
        Role::new(
            true,
            parent_organization_identifier,
            Coding::new(organization_role_system, organization_role_code),
            None,
        )
        .map(Subject::Role)
    }

    /// Practitioners with a role at local members of the parent organization holding a role.
    pub fn local_role_practitioner(
        parent_organization_identifier: impl Into<String>,
        organization_role_system: impl Into<String>,
        organization_role_code: impl Into<String>,
        practitioner_role_system: impl Into<String>,
        practitioner_role_code: impl Into<String>,
    ) -> AuthorizationResult<Self> {
        Role::new(
            true,
            parent_organization_identifier,
            Coding::new(organization_role_system, organization_role_code),
            Some(Coding::new(practitioner_role_system, practitioner_role_code)),
        )
        .map(Subject::Role)
    }

    /// Remote members of the parent organization holding the given role.
    pub fn remote_role(
        parent_organization_identifier: impl Into<String>,
        organization_role_system: impl Into<String>,
        organization_role_code: impl Into<String>,
    ) -> AuthorizationResult<Self> {
        Role::new(
            false,
            parent_organization_identifier,
            Coding::new(organization_role_system, organization_role_code),
            None,
        )
        .map(Subject::Role)
    }

    /// Returns `true` if the subject matches local identities.
    pub fn local_identity(&self) -> bool {
        match self {
            Subject::All(s) => s.local_identity,
            Subject::Organization(s) => s.local_identity,
            Subject::Role(s) => s.local_identity,
        }
    }

    /// Returns the required practitioner role, if any.
    pub fn practitioner_role(&self) -> Option<&Coding> {
        match self {
            Subject::All(s) => s.practitioner_role.as_ref(),
            Subject::Organization(s) => s.practitioner_role.as_ref(),
            Subject::Role(s) => s.practitioner_role.as_ref(),
        }
    }

    /// Returns `true` if a practitioner role is required.
    pub fn needs_practitioner_role(&self) -> bool {
        self.practitioner_role().is_some()
    }

    /// Returns the classification code of this subject.
    pub fn classification_code(&self) -> ProcessAuthorizationCode {
        use ProcessAuthorizationCode::*;

        match (self, self.local_identity(), self.needs_practitioner_role()) {
            (Subject::All(_), true, true) => LocalAllPractitioner,
            (Subject::All(_), true, false) => LocalAll,
            (Subject::All(_), false, _) => RemoteAll,
            (Subject::Organization(_), true, true) => LocalOrganizationPractitioner,
            (Subject::Organization(_), true, false) => LocalOrganization,
            (Subject::Organization(_), false, _) => RemoteOrganization,
            (Subject::Role(_), true, true) => LocalRolePractitioner,
            (Subject::Role(_), true, false) => LocalRole,
            (Subject::Role(_), false, _) => RemoteRole,
        }
    }

    /// Returns the classification coding, without variant sub-nodes.
    pub fn classification_coding(&self) -> Coding {
        self.classification_code().to_coding()
    }

    /// Returns `true` if the coding carries exactly this subject's classification code.
    pub fn matches_classification(&self, coding: &Coding) -> bool {
        self.classification_code().matches(coding)
    }

    /// Checks that this subject can be encoded as a recipient.
    ///
    /// Recipients are always local and never refined by a practitioner role.
    pub fn check_recipient(&self) -> AuthorizationResult<()> {
        if !self.local_identity() {
            return Err(AuthorizationError::InvalidRecipient {
                code: self.classification_code(),
                reason: "recipients must be local",
            });
        }
        if self.needs_practitioner_role() {
            return Err(AuthorizationError::InvalidRecipient {
                code: self.classification_code(),
                reason: "recipients cannot require a practitioner role",
            });
        }
        Ok(())
    }
}

/// A subject that can authorize the sender of a process message.
pub trait RequesterSubject {
    /// Encodes the subject as a `requester` node.
    fn to_requester_extension(&self) -> Extension;

    /// Returns `true` if `extension` is an equivalent `requester` node.
    fn requester_matches(&self, extension: &Extension) -> bool;

    /// Returns `true` if the identity may send the message.
    fn is_requester_authorized<'a, I>(&self, requester: Option<&Identity>, affiliations: I) -> bool
    where
        I: IntoIterator<Item = &'a OrganizationAffiliation>;
}

/// A subject that can authorize the receiver of a process message.
pub trait RecipientSubject {
    /// Encodes the subject as a `recipient` node.
    fn to_recipient_extension(&self) -> Extension;

    /// Returns `true` if `extension` is an equivalent `recipient` node.
    fn recipient_matches(&self, extension: &Extension) -> bool;

    /// Returns `true` if the identity may receive the message.
    fn is_recipient_authorized<'a, I>(&self, recipient: Option<&Identity>, affiliations: I) -> bool
    where
        I: IntoIterator<Item = &'a OrganizationAffiliation>;
}

impl RequesterSubject for Subject {
    fn to_requester_extension(&self) -> Extension {
        codec::encode_requester(self)
    }

    fn requester_matches(&self, extension: &Extension) -> bool {
        codec::requester_matches(self, extension)
    }

    fn is_requester_authorized<'a, I>(&self, requester: Option<&Identity>, affiliations: I) -> bool
    where
        I: IntoIterator<Item = &'a OrganizationAffiliation>,
    {
        evaluator::is_authorized(self, requester, affiliations)
    }
}

impl RecipientSubject for Subject {
    fn to_recipient_extension(&self) -> Extension {
        codec::encode_recipient(self)
    }

    fn recipient_matches(&self, extension: &Extension) -> bool {
        codec::recipient_matches(self, extension)
    }

    fn is_recipient_authorized<'a, I>(&self, recipient: Option<&Identity>, affiliations: I) -> bool
    where
        I: IntoIterator<Item = &'a OrganizationAffiliation>,
    {
        evaluator::is_authorized(self, recipient, affiliations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_codes() {
        use ProcessAuthorizationCode::*;

        let cases = vec![
            (Subject::local_all(), LocalAll),
            (Subject::local_all_practitioner("cs", "DIC").unwrap(), LocalAllPractitioner),
            (Subject::remote_all(), RemoteAll),
            (Subject::local_organization("org.com").unwrap(), LocalOrganization),
            (
                Subject::local_organization_practitioner("org.com", "cs", "DIC").unwrap(),
                LocalOrganizationPractitioner,
            ),
            (Subject::remote_organization("org.com").unwrap(), RemoteOrganization),
            (Subject::local_role("parent.org", "cs", "DIC").unwrap(), LocalRole),
            (
                Subject::local_role_practitioner("parent.org", "cs", "DIC", "pr", "DOC").unwrap(),
                LocalRolePractitioner,
            ),
            (Subject::remote_role("parent.org", "cs", "DIC").unwrap(), RemoteRole),
        ];

        for (subject, code) in cases {
            assert_eq!(subject.classification_code(), code);
            assert!(subject.matches_classification(&code.to_coding()));
            assert_eq!(subject.needs_practitioner_role(), code.is_practitioner());
            assert_eq!(subject.local_identity(), code.is_local());
        }
    }

    #[test]
    fn test_blank_identifiers_rejected() {
        assert_eq!(
            Subject::local_organization(""),
            Err(AuthorizationError::BlankField {
                field: "organizationIdentifier"
            })
        );
        assert_eq!(
            Subject::local_role("  ", "cs", "DIC"),
            Err(AuthorizationError::BlankField {
                field: "parentOrganizationIdentifier"
            })
        );
        assert_eq!(
            Subject::local_role("parent.org", "", "DIC"),
            Err(AuthorizationError::BlankField {
                field: "organizationRoleSystem"
            })
        );
        assert_eq!(
            Subject::local_role("parent.org", "cs", ""),
            Err(AuthorizationError::BlankField {
                field: "organizationRoleCode"
            })
        );
        assert_eq!(
            Subject::local_all_practitioner("cs", " "),
            Err(AuthorizationError::BlankField {
                field: "practitionerRoleCode"
            })
        );
    }

    #[test]
    fn test_role_without_code_rejected() {
        let role = Coding {
            system: Some("cs".to_string()),
            ..Default::default()
        };
        assert!(Role::new(true, "parent.org", role, None).is_err());
    }

    #[test]
    fn test_remote_practitioner_rejected() {
        assert_eq!(
            All::new(false, Some(Coding::new("cs", "DIC"))),
            Err(AuthorizationError::RemotePractitionerRole { subject: "all" })
        );
        assert!(Organization::new(false, "org.com", Some(Coding::new("cs", "DIC"))).is_err());
        assert!(
            Role::new(
                false,
                "parent.org",
                Coding::new("cs", "DIC"),
                Some(Coding::new("pr", "DOC"))
            )
            .is_err()
        );
    }

    #[test]
    fn test_practitioner_role_is_normalized() {
        let role = Coding::new("cs", "DIC").with_extension(Extension::new("x"));
        let all = All::new(true, Some(role)).unwrap();
        assert_eq!(all.practitioner_role(), Some(&Coding::new("cs", "DIC")));
    }

    #[test]
    fn test_check_recipient() {
        assert!(Subject::local_all().check_recipient().is_ok());
        assert!(Subject::local_role("parent.org", "cs", "DIC").unwrap().check_recipient().is_ok());
        assert!(matches!(
            Subject::remote_all().check_recipient(),
            Err(AuthorizationError::InvalidRecipient { .. })
        ));
        assert!(
            Subject::local_organization_practitioner("org.com", "cs", "DIC")
                .unwrap()
                .check_recipient()
                .is_err()
        );
    }

    #[test]
    fn test_subject_serializes_with_type_tag() {
        let subject = Subject::local_organization("org.com").unwrap();
        let value = serde_json::to_value(&subject).unwrap();
        assert_eq!(value["type"], "organization");
        assert_eq!(value["organizationIdentifier"], "org.com");
        assert_eq!(value["localIdentity"], true);
        assert!(value.get("practitionerRole").is_none());
    }
}
