//! Rule-sets: the authorization blocks of a process definition.
//!
//! Each `extension-process-authorization` block on an [`ActivityDefinition`]
//! names one message (`message-name`), the task profile carrying it
//! (`task-profile`), and the subjects allowed to send it (`requester`) and
//! receive it (`recipient`).
//!
//! This module provides:
//!
//! - [`validate`] and [`is_valid`]: structural validation against existence predicates
//! - [`add`]: idempotent authoring of blocks
//! - [`requesters`] and [`recipients`]: lookup of the subjects for a message
//!
//! # Examples
//!
//! ```
//! use helios_process_auth::fhir::ActivityDefinition;
//! use helios_process_auth::predicates::ExistencePredicates;
//! use helios_process_auth::rule_set;
//! use helios_process_auth::subject::Subject;
//!
//! let process = ActivityDefinition::new("http://dsf.dev/bpe/Process/ping", "1.0");
//! let process = rule_set::add(
//!     process,
//!     "ping",
//!     "http://dsf.dev/fhir/StructureDefinition/task-ping|1.0",
//!     &[Subject::remote_all()],
//!     &[Subject::local_all()],
//! )
//! .unwrap();
//!
//! assert!(rule_set::is_valid(Some(&process), ExistencePredicates::shared_allow_all()));
//!
//! let requesters: Vec<_> = rule_set::requesters(
//!     Some(&process),
//!     "http://dsf.dev/bpe/Process/ping",
//!     "1.0",
//!     "ping",
//!     &["http://dsf.dev/fhir/StructureDefinition/task-ping"],
//! )
//! .collect();
//! assert_eq!(requesters, vec![Subject::remote_all()]);
//! ```

mod add;
mod query;
mod validate;

pub use add::add;
pub use query::{recipients, requesters};
pub use validate::{IssueKind, IssueSeverity, ValidationIssue, is_valid, validate};

use crate::constants::{
    EXTENSION_PROCESS_AUTHORIZATION, EXTENSION_PROCESS_AUTHORIZATION_MESSAGE_NAME,
    EXTENSION_PROCESS_AUTHORIZATION_TASK_PROFILE,
};
use crate::fhir::{ActivityDefinition, Extension};

/// Returns the authorization blocks of a resource.
pub(crate) fn blocks(resource: &ActivityDefinition) -> impl Iterator<Item = &Extension> {
    resource
        .extensions()
        .iter()
        .filter(|e| e.url() == EXTENSION_PROCESS_AUTHORIZATION)
}

pub(crate) fn has_message_name(block: &Extension, message_name: &str) -> bool {
    block
        .extensions_with_url(EXTENSION_PROCESS_AUTHORIZATION_MESSAGE_NAME)
        .filter_map(Extension::value_string)
        .any(|name| name == message_name)
}

pub(crate) fn task_profiles(block: &Extension) -> impl Iterator<Item = &str> {
    block
        .extensions_with_url(EXTENSION_PROCESS_AUTHORIZATION_TASK_PROFILE)
        .filter_map(Extension::value_canonical)
}

/// Returns the canonical URL without its `|version` suffix.
pub(crate) fn canonical_base(canonical: &str) -> &str {
    canonical
        .split_once('|')
        .map_or(canonical, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_base() {
        assert_eq!(
            canonical_base("http://dsf.dev/fhir/StructureDefinition/task-ping|1.0"),
            "http://dsf.dev/fhir/StructureDefinition/task-ping"
        );
        assert_eq!(
            canonical_base("http://dsf.dev/fhir/StructureDefinition/task-ping"),
            "http://dsf.dev/fhir/StructureDefinition/task-ping"
        );
        assert_eq!(canonical_base("a|b|c"), "a");
    }
}
