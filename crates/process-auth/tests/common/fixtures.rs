//! Test fixtures for process authorization testing.

use std::path::PathBuf;

use helios_process_auth::ORGANIZATION_IDENTIFIER_SYSTEM;
use helios_process_auth::fhir::{
    ActivityDefinition, Coding, Identifier, Organization, OrganizationAffiliation, Reference,
};
use helios_process_auth::identity::Identity;

/// Canonical URL of the ping test process.
pub const PING_PROCESS_URL: &str = "http://dsf.dev/bpe/Process/ping";
/// Version of the ping test process.
pub const PING_PROCESS_VERSION: &str = "1.0";

/// Parent organization used by the role fixtures.
pub const PARENT_ORGANIZATION: &str = "medizininformatik-initiative.de";
/// Organization role code system.
pub const ORGANIZATION_ROLE_SYSTEM: &str = "http://dsf.dev/fhir/CodeSystem/organization-role";
/// Practitioner role code system.
pub const PRACTITIONER_ROLE_SYSTEM: &str = "http://dsf.dev/fhir/CodeSystem/practitioner-role";

/// Loads an `ActivityDefinition` from `tests/data`.
pub fn load_activity_definition(name: &str) -> ActivityDefinition {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name);
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    ActivityDefinition::from_json(&json)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e))
}

/// Creates an active organization identified in the organization identifier system.
pub fn organization(identifier: &str) -> Organization {
    Organization::active_with_identifier(Identifier::new(
        ORGANIZATION_IDENTIFIER_SYSTEM,
        identifier,
    ))
}

/// Creates an organization identity.
pub fn organization_identity(local: bool, identifier: &str) -> Identity {
    Identity::organization(local, organization(identifier))
}

/// Creates a practitioner identity with practitioner-role codes.
pub fn practitioner_identity(local: bool, identifier: &str, roles: &[&str]) -> Identity {
    Identity::practitioner(
        local,
        organization(identifier),
        roles
            .iter()
            .map(|code| Coding::new(PRACTITIONER_ROLE_SYSTEM, *code))
            .collect(),
    )
}

/// An affiliation fixture for testing.
#[derive(Debug, Clone)]
pub struct AffiliationFixture {
    /// Parent organization identifier value.
    pub parent: String,
    /// Member organization identifier value.
    pub member: String,
    /// Organization role codes.
    pub roles: Vec<String>,
    /// Whether the affiliation is active.
    pub active: bool,
}

impl AffiliationFixture {
    /// Creates an active affiliation of `member` in the default parent organization.
    pub fn new(member: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            parent: PARENT_ORGANIZATION.to_string(),
            member: member.into(),
            roles: vec![role.into()],
            active: true,
        }
    }

    /// Sets the parent organization.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = parent.into();
        self
    }

    /// Adds a role code.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Sets the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Builds the `OrganizationAffiliation`.
    pub fn build(&self) -> OrganizationAffiliation {
        OrganizationAffiliation {
            active: self.active,
            organization: Some(Reference::to_identifier(Identifier::new(
                ORGANIZATION_IDENTIFIER_SYSTEM,
                &self.parent,
            ))),
            participating_organization: Some(Reference::to_identifier(Identifier::new(
                ORGANIZATION_IDENTIFIER_SYSTEM,
                &self.member,
            ))),
            code: self
                .roles
                .iter()
                .map(|code| Coding::new(ORGANIZATION_ROLE_SYSTEM, code).into())
                .collect(),
        }
    }
}
