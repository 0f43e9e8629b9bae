//! Stable identifiers of the process authorization extension tree.
//!
//! These URLs, systems and codes are shared with rule-authoring tooling and
//! must be reproduced exactly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fhir::Coding;

/// Code system of the classification coding on requester/recipient nodes.
pub const PROCESS_AUTHORIZATION_SYSTEM: &str =
    "http://dsf.dev/fhir/CodeSystem/process-authorization";

/// Identifier system used for organization references.
pub const ORGANIZATION_IDENTIFIER_SYSTEM: &str = "http://dsf.dev/sid/organization-identifier";

/// URL of an authorization block on an `ActivityDefinition`.
pub const EXTENSION_PROCESS_AUTHORIZATION: &str =
    "http://dsf.dev/fhir/StructureDefinition/extension-process-authorization";
/// Message name child of an authorization block (`valueString`).
pub const EXTENSION_PROCESS_AUTHORIZATION_MESSAGE_NAME: &str = "message-name";
/// Task profile child of an authorization block (`valueCanonical`).
pub const EXTENSION_PROCESS_AUTHORIZATION_TASK_PROFILE: &str = "task-profile";
/// Requester child of an authorization block (`valueCoding`).
pub const EXTENSION_PROCESS_AUTHORIZATION_REQUESTER: &str = "requester";
/// Recipient child of an authorization block (`valueCoding`).
pub const EXTENSION_PROCESS_AUTHORIZATION_RECIPIENT: &str = "recipient";

/// Practitioner role node of an `All` classification coding.
pub const EXTENSION_PROCESS_AUTHORIZATION_PRACTITIONER: &str =
    "http://dsf.dev/fhir/StructureDefinition/extension-process-authorization-practitioner";

/// Organization node of an `Organization` classification coding.
pub const EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION: &str =
    "http://dsf.dev/fhir/StructureDefinition/extension-process-authorization-organization";

/// Composite organization + practitioner role node of an `Organization` classification coding.
pub const EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER: &str =
    "http://dsf.dev/fhir/StructureDefinition/extension-process-authorization-organization-practitioner";
/// Organization child of the composite organization practitioner node.
pub const EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER_ORGANIZATION: &str =
    "organization";
/// Practitioner role child of the composite organization practitioner node.
pub const EXTENSION_PROCESS_AUTHORIZATION_ORGANIZATION_PRACTITIONER_PRACTITIONER_ROLE: &str =
    "practitioner-role";

/// Parent organization + role node of a `Role` classification coding.
pub const EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE: &str =
    "http://dsf.dev/fhir/StructureDefinition/extension-process-authorization-parent-organization-role";
/// Parent organization child of the parent organization role nodes.
pub const EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PARENT_ORGANIZATION: &str =
    "parent-organization";
/// Organization role child of the parent organization role nodes.
pub const EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_ORGANIZATION_ROLE: &str =
    "organization-role";

/// Composite parent organization + role + practitioner role node of a `Role` classification coding.
pub const EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PRACTITIONER: &str =
    "http://dsf.dev/fhir/StructureDefinition/extension-process-authorization-parent-organization-role-practitioner";
/// Practitioner role child of the composite parent organization role practitioner node.
pub const EXTENSION_PROCESS_AUTHORIZATION_PARENT_ORGANIZATION_ROLE_PRACTITIONER_PRACTITIONER_ROLE:
    &str = "practitioner-role";

/// The nine classification codes of the process authorization code system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessAuthorizationCode {
    /// Any local organization.
    LocalAll,
    /// Any local practitioner with a given role.
    LocalAllPractitioner,
    /// Any remote organization.
    RemoteAll,
    /// A specific local organization.
    LocalOrganization,
    /// A practitioner with a given role at a specific local organization.
    LocalOrganizationPractitioner,
    /// A specific remote organization.
    RemoteOrganization,
    /// Any local member organization with a role in a parent organization.
    LocalRole,
    /// A practitioner of such a local member organization.
    LocalRolePractitioner,
    /// Any remote member organization with a role in a parent organization.
    RemoteRole,
}

impl ProcessAuthorizationCode {
    /// All codes, in code system order.
    pub const ALL: [ProcessAuthorizationCode; 9] = [
        Self::LocalAll,
        Self::LocalAllPractitioner,
        Self::RemoteAll,
        Self::LocalOrganization,
        Self::LocalOrganizationPractitioner,
        Self::RemoteOrganization,
        Self::LocalRole,
        Self::LocalRolePractitioner,
        Self::RemoteRole,
    ];

    /// Returns the code string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalAll => "LOCAL_ALL",
            Self::LocalAllPractitioner => "LOCAL_ALL_PRACTITIONER",
            Self::RemoteAll => "REMOTE_ALL",
            Self::LocalOrganization => "LOCAL_ORGANIZATION",
            Self::LocalOrganizationPractitioner => "LOCAL_ORGANIZATION_PRACTITIONER",
            Self::RemoteOrganization => "REMOTE_ORGANIZATION",
            Self::LocalRole => "LOCAL_ROLE",
            Self::LocalRolePractitioner => "LOCAL_ROLE_PRACTITIONER",
            Self::RemoteRole => "REMOTE_ROLE",
        }
    }

    /// Returns the classification coding for this code.
    pub fn to_coding(&self) -> Coding {
        Coding::new(PROCESS_AUTHORIZATION_SYSTEM, self.as_str())
    }

    /// Returns `true` if the coding is this code in the process authorization system.
    pub fn matches(&self, coding: &Coding) -> bool {
        coding.is(PROCESS_AUTHORIZATION_SYSTEM, self.as_str())
    }

    /// Reads the code from a classification coding.
    ///
    /// Returns `None` unless the coding belongs to the process authorization
    /// system and carries one of the nine codes.
    pub fn from_coding(coding: &Coding) -> Option<Self> {
        if coding.system() != Some(PROCESS_AUTHORIZATION_SYSTEM) {
            return None;
        }
        coding.code().and_then(|c| c.parse().ok())
    }

    /// Returns `true` for codes that apply to local identities.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            Self::RemoteAll | Self::RemoteOrganization | Self::RemoteRole
        )
    }

    /// Returns `true` for the practitioner-refined codes.
    pub fn is_practitioner(&self) -> bool {
        matches!(
            self,
            Self::LocalAllPractitioner
                | Self::LocalOrganizationPractitioner
                | Self::LocalRolePractitioner
        )
    }

    /// Returns `true` for codes permitted on recipient nodes.
    pub fn is_recipient_code(&self) -> bool {
        matches!(
            self,
            Self::LocalAll | Self::LocalOrganization | Self::LocalRole
        )
    }
}

impl fmt::Display for ProcessAuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessAuthorizationCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown process authorization code: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_strings_roundtrip() {
        for code in ProcessAuthorizationCode::ALL {
            assert_eq!(code.as_str().parse::<ProcessAuthorizationCode>(), Ok(code));
            assert_eq!(
                serde_json::to_value(code).unwrap(),
                serde_json::Value::String(code.to_string())
            );
        }
        assert!("LOCAL_NOBODY".parse::<ProcessAuthorizationCode>().is_err());
    }

    #[test]
    fn test_from_coding_requires_system() {
        let coding = Coding::new("http://other.org", "LOCAL_ALL");
        assert_eq!(ProcessAuthorizationCode::from_coding(&coding), None);

        let coding = ProcessAuthorizationCode::RemoteRole.to_coding();
        assert_eq!(
            ProcessAuthorizationCode::from_coding(&coding),
            Some(ProcessAuthorizationCode::RemoteRole)
        );
        assert!(ProcessAuthorizationCode::RemoteRole.matches(&coding));
        assert!(!ProcessAuthorizationCode::LocalRole.matches(&coding));
    }

    #[test]
    fn test_code_classes() {
        let recipients: Vec<_> = ProcessAuthorizationCode::ALL
            .into_iter()
            .filter(|c| c.is_recipient_code())
            .collect();
        assert_eq!(
            recipients,
            vec![
                ProcessAuthorizationCode::LocalAll,
                ProcessAuthorizationCode::LocalOrganization,
                ProcessAuthorizationCode::LocalRole
            ]
        );
        assert!(ProcessAuthorizationCode::LocalRolePractitioner.is_local());
        assert!(!ProcessAuthorizationCode::RemoteAll.is_local());
        assert!(ProcessAuthorizationCode::LocalAllPractitioner.is_practitioner());
        assert!(!ProcessAuthorizationCode::LocalAll.is_practitioner());
    }
}
