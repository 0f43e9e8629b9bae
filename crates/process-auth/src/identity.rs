//! Caller identities.
//!
//! An [`Identity`] is built by the authentication layer from a client
//! certificate or OIDC token. This crate only reads it.

use serde::{Deserialize, Serialize};

use crate::fhir::{Coding, Organization};

/// What kind of party an identity represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IdentityKind {
    /// An organization acting as itself.
    Organization,
    /// A practitioner acting on behalf of an organization.
    #[serde(rename_all = "camelCase")]
    Practitioner {
        /// The practitioner's roles.
        #[serde(default)]
        practitioner_roles: Vec<Coding>,
    },
}

/// The authenticated party of a request.
///
/// # Examples
///
/// ```
/// use helios_process_auth::fhir::{Coding, Identifier, Organization};
/// use helios_process_auth::identity::Identity;
///
/// let org = Organization::active_with_identifier(Identifier::new("sys", "org.com"));
/// let practitioner = Identity::practitioner(true, org, vec![Coding::new("cs", "DIC")]);
///
/// assert!(practitioner.is_local_identity());
/// assert_eq!(practitioner.practitioner_roles().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Whether the identity belongs to the local organization.
    local_identity: bool,

    /// The organization the identity acts for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    organization: Option<Organization>,

    #[serde(flatten)]
    kind: IdentityKind,
}

impl Identity {
    /// Creates an organization identity.
    pub fn organization(local_identity: bool, organization: Organization) -> Self {
        Self {
            local_identity,
            organization: Some(organization),
            kind: IdentityKind::Organization,
        }
    }

    /// Creates a practitioner identity.
    pub fn practitioner(
        local_identity: bool,
        organization: Organization,
        practitioner_roles: Vec<Coding>,
    ) -> Self {
        Self {
            local_identity,
            organization: Some(organization),
            kind: IdentityKind::Practitioner { practitioner_roles },
        }
    }

    /// Creates an identity from its parts; the organization may be missing.
    pub fn from_parts(
        local_identity: bool,
        organization: Option<Organization>,
        kind: IdentityKind,
    ) -> Self {
        Self {
            local_identity,
            organization,
            kind,
        }
    }

    /// Returns `true` if the identity belongs to the local organization.
    pub fn is_local_identity(&self) -> bool {
        self.local_identity
    }

    /// Returns the organization, if known.
    pub fn organization_resource(&self) -> Option<&Organization> {
        self.organization.as_ref()
    }

    /// Returns the identity kind.
    pub fn kind(&self) -> &IdentityKind {
        &self.kind
    }

    /// Returns `true` for practitioner identities.
    pub fn is_practitioner(&self) -> bool {
        matches!(self.kind, IdentityKind::Practitioner { .. })
    }

    /// Returns the practitioner roles; empty unless this is a practitioner identity.
    pub fn practitioner_roles(&self) -> &[Coding] {
        match &self.kind {
            IdentityKind::Practitioner { practitioner_roles } => practitioner_roles,
            IdentityKind::Organization => &[],
        }
    }
}
