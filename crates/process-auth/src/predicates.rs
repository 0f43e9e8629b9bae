//! Existence predicates for referenced profiles, organizations and roles.
//!
//! When a rule-set is written, every reference it contains must resolve
//! against the resource store. When a stored rule-set is read back at request
//! time, it was already validated, so [`ExistencePredicates::allow_all`] is
//! used instead.

use std::fmt;
use std::sync::LazyLock;

use crate::fhir::{Coding, Identifier};

type CanonicalPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;
type CodingPredicate = Box<dyn Fn(&Coding) -> bool + Send + Sync>;
type IdentifierPredicate = Box<dyn Fn(&Identifier) -> bool + Send + Sync>;

static ALLOW_ALL: LazyLock<ExistencePredicates> = LazyLock::new(ExistencePredicates::allow_all);

/// Caller-supplied checks that referenced entities exist.
///
/// Every predicate defaults to `true`; replace individual ones with the
/// `with_*` methods.
///
/// # Examples
///
/// ```
/// use helios_process_auth::fhir::Identifier;
/// use helios_process_auth::predicates::ExistencePredicates;
///
/// let known = ["org.com".to_string()];
/// let predicates = ExistencePredicates::allow_all()
///     .with_organization_with_identifier_exists(move |i: &Identifier| {
///         i.value().is_some_and(|v| known.iter().any(|k| k == v))
///     });
///
/// assert!(predicates.organization_with_identifier_exists(&Identifier::new("sys", "org.com")));
/// assert!(!predicates.organization_with_identifier_exists(&Identifier::new("sys", "bad.id")));
/// assert!(predicates.profile_exists("http://example.org/StructureDefinition/task"));
/// ```
pub struct ExistencePredicates {
    profile_exists: CanonicalPredicate,
    practitioner_role_exists: CodingPredicate,
    organization_with_identifier_exists: IdentifierPredicate,
    organization_role_exists: CodingPredicate,
}

impl ExistencePredicates {
    /// Creates predicates that accept every reference.
    pub fn allow_all() -> Self {
        Self {
            profile_exists: Box::new(|_| true),
            practitioner_role_exists: Box::new(|_| true),
            organization_with_identifier_exists: Box::new(|_| true),
            organization_role_exists: Box::new(|_| true),
        }
    }

    /// Returns a shared instance of [`allow_all`](Self::allow_all).
    pub fn shared_allow_all() -> &'static Self {
        &ALLOW_ALL
    }

    /// Replaces the task profile predicate. It receives the canonical URL as stored.
    pub fn with_profile_exists(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.profile_exists = Box::new(f);
        self
    }

    /// Replaces the practitioner role predicate.
    pub fn with_practitioner_role_exists(
        mut self,
        f: impl Fn(&Coding) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.practitioner_role_exists = Box::new(f);
        self
    }

    /// Replaces the organization identifier predicate.
    pub fn with_organization_with_identifier_exists(
        mut self,
        f: impl Fn(&Identifier) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.organization_with_identifier_exists = Box::new(f);
        self
    }

    /// Replaces the organization role predicate.
    pub fn with_organization_role_exists(
        mut self,
        f: impl Fn(&Coding) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.organization_role_exists = Box::new(f);
        self
    }

    /// Returns `true` if the task profile exists.
    pub fn profile_exists(&self, canonical: &str) -> bool {
        (self.profile_exists)(canonical)
    }

    /// Returns `true` if the practitioner role exists.
    pub fn practitioner_role_exists(&self, role: &Coding) -> bool {
        (self.practitioner_role_exists)(role)
    }

    /// Returns `true` if an organization with the identifier exists.
    pub fn organization_with_identifier_exists(&self, identifier: &Identifier) -> bool {
        (self.organization_with_identifier_exists)(identifier)
    }

    /// Returns `true` if the organization role exists.
    pub fn organization_role_exists(&self, role: &Coding) -> bool {
        (self.organization_role_exists)(role)
    }
}

impl Default for ExistencePredicates {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl fmt::Debug for ExistencePredicates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExistencePredicates").finish_non_exhaustive()
    }
}
