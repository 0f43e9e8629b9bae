//! Helios Process Authorization
//!
//! This crate decides whether an organization, or a practitioner acting for
//! one, may start or receive an inter-organizational process message. The
//! rules live as nested FHIR extensions on the process's `ActivityDefinition`.
//!
//! # Features
//!
//! - **Rule model**: `All`, `Organization` and `Role` subjects, local or
//!   remote, optionally refined by a practitioner role
//! - **Tree codec**: bit-exact encoding to and strict decoding from extension trees
//! - **Evaluator**: matching of caller identities and organization affiliations
//! - **Rule-sets**: validation with diagnostics, idempotent authoring, and
//!   lookup by process, message name and task profile
//!
//! # Architecture
//!
//! - [`fhir`] - The FHIR R4 JSON subset the rules are expressed in
//! - [`constants`] - Extension URLs, systems and the nine classification codes
//! - [`subject`] - Authorization subjects and their capability traits
//! - [`codec`] - Encoding, decoding and matching of subject trees
//! - [`evaluator`] - Runtime authorization of identities
//! - [`predicates`] - Existence checks for referenced entities
//! - [`rule_set`] - Validation, authoring and queries over whole rule-sets
//! - [`identity`] - The caller identity consumed by the evaluator
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```
//! use helios_process_auth::fhir::{ActivityDefinition, Identifier, Organization, OrganizationAffiliation};
//! use helios_process_auth::identity::Identity;
//! use helios_process_auth::subject::{RequesterSubject, Subject};
//! use helios_process_auth::{ORGANIZATION_IDENTIFIER_SYSTEM, rule_set};
//!
//! let process = rule_set::add(
//!     ActivityDefinition::new("http://dsf.dev/bpe/Process/ping", "1.0"),
//!     "ping",
//!     "http://dsf.dev/fhir/StructureDefinition/task-ping|1.0",
//!     &[Subject::remote_organization("org.com").unwrap()],
//!     &[Subject::local_all()],
//! )
//! .unwrap();
//!
//! let caller = Identity::organization(
//!     false,
//!     Organization::active_with_identifier(Identifier::new(
//!         ORGANIZATION_IDENTIFIER_SYSTEM,
//!         "org.com",
//!     )),
//! );
//!
//! let authorized = rule_set::requesters(
//!     Some(&process),
//!     "http://dsf.dev/bpe/Process/ping",
//!     "1.0",
//!     "ping",
//!     &["http://dsf.dev/fhir/StructureDefinition/task-ping|1.0"],
//! )
//! .any(|r| {
//!     let affiliations: [&OrganizationAffiliation; 0] = [];
//!     r.is_requester_authorized(Some(&caller), affiliations)
//! });
//!
//! assert!(authorized);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod codec;
pub mod constants;
pub mod error;
pub mod evaluator;
pub mod fhir;
pub mod identity;
pub mod predicates;
pub mod rule_set;
pub mod subject;

pub use constants::{
    ORGANIZATION_IDENTIFIER_SYSTEM, PROCESS_AUTHORIZATION_SYSTEM, ProcessAuthorizationCode,
};
pub use error::{AuthorizationError, AuthorizationResult};
pub use identity::{Identity, IdentityKind};
pub use predicates::ExistencePredicates;
pub use rule_set::{IssueKind, IssueSeverity, ValidationIssue};
pub use subject::{RecipientSubject, RequesterSubject, Subject};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
