//! Runtime authorization of caller identities against a subject.
//!
//! An identity is authorized when all of the following hold:
//!
//! 1. the identity is present and has an active organization;
//! 2. its locality equals the subject's;
//! 3. the subject-specific check passes:
//!    - `All`: always;
//!    - `Organization`: the organization carries the subject's identifier;
//!    - `Role`: one single affiliation is active, names the subject's parent
//!      organization, names the identity's organization as member, and grants
//!      the subject's organization role;
//! 4. if the subject requires a practitioner role, the identity is a
//!    practitioner holding it; otherwise the identity is an organization.

use tracing::trace;

use crate::constants::ORGANIZATION_IDENTIFIER_SYSTEM;
use crate::fhir::{Organization, OrganizationAffiliation};
use crate::identity::Identity;
use crate::subject::{Role, Subject};

/// Returns `true` if the identity satisfies the subject.
pub fn is_authorized<'a, I>(subject: &Subject, identity: Option<&Identity>, affiliations: I) -> bool
where
    I: IntoIterator<Item = &'a OrganizationAffiliation>,
{
    let code = subject.classification_code();

    let Some(identity) = identity else {
        trace!(code = %code, "denied: no identity");
        return false;
    };
    let Some(organization) = identity.organization_resource() else {
        trace!(code = %code, "denied: identity has no organization");
        return false;
    };
    if !organization.active {
        trace!(code = %code, "denied: organization not active");
        return false;
    }
    if identity.is_local_identity() != subject.local_identity() {
        trace!(
            code = %code,
            local_identity = identity.is_local_identity(),
            "denied: locality mismatch"
        );
        return false;
    }

    let subject_matches = match subject {
        Subject::All(_) => true,
        Subject::Organization(o) => {
            organization.has_identifier(ORGANIZATION_IDENTIFIER_SYSTEM, o.organization_identifier())
        }
        Subject::Role(r) => has_member_role(r, organization, affiliations),
    };
    if !subject_matches {
        trace!(code = %code, "denied: organization or role does not match");
        return false;
    }

    let practitioner_matches = match subject.practitioner_role() {
        Some(role) => {
            identity.is_practitioner()
                && identity.practitioner_roles().iter().any(|r| r.same_concept(role))
        }
        None => !identity.is_practitioner(),
    };
    if !practitioner_matches {
        trace!(
            code = %code,
            practitioner = identity.is_practitioner(),
            "denied: practitioner role does not match"
        );
    }
    practitioner_matches
}

fn has_member_role<'a, I>(role: &Role, organization: &Organization, affiliations: I) -> bool
where
    I: IntoIterator<Item = &'a OrganizationAffiliation>,
{
    affiliations.into_iter().any(|affiliation| {
        affiliation.active
            && affiliation.parent_identifier().is_some_and(|parent| {
                parent.is(
                    ORGANIZATION_IDENTIFIER_SYSTEM,
                    role.parent_organization_identifier(),
                )
            })
            && affiliation.member_identifier().is_some_and(|member| {
                member
                    .system()
                    .zip(member.value())
                    .is_some_and(|(system, value)| organization.has_identifier(system, value))
            })
            && affiliation
                .role_codings()
                .any(|coding| coding.same_concept(role.organization_role()))
    })
}
