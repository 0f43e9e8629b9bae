use tracing::trace;

use crate::codec::{decode_recipient_extension, decode_requester_extension};
use crate::fhir::{ActivityDefinition, Extension};
use crate::predicates::ExistencePredicates;
use crate::subject::Subject;

use super::{blocks, canonical_base, has_message_name, task_profiles};

/// Returns `true` if the block's task profile equals a candidate, or equals
/// it once the stored profile's `|version` suffix is dropped.
fn has_task_profile<S: AsRef<str>>(block: &Extension, candidates: &[S]) -> bool {
    candidates.iter().map(AsRef::as_ref).any(|candidate| {
        task_profiles(block)
            .any(|stored| candidate == stored || candidate == canonical_base(stored))
    })
}

fn find_block<'a, S: AsRef<str>>(
    resource: Option<&'a ActivityDefinition>,
    process_url: &str,
    process_version: &str,
    message_name: &str,
    candidate_profiles: &[S],
) -> Option<&'a Extension> {
    let resource = resource?;
    if process_url.trim().is_empty()
        || process_version.trim().is_empty()
        || message_name.trim().is_empty()
    {
        return None;
    }
    if resource.url() != Some(process_url) || resource.version() != Some(process_version) {
        trace!(
            process_url,
            process_version,
            url = ?resource.url(),
            version = ?resource.version(),
            "process url or version mismatch"
        );
        return None;
    }

    let block = blocks(resource)
        .find(|b| has_message_name(b, message_name) && has_task_profile(b, candidate_profiles));
    if block.is_none() {
        trace!(message_name, "no authorization block for message");
    }
    block
}

/// Returns the requesters authorized to send `message_name` for the given
/// process and task profiles.
///
/// Only the first block whose message name matches and whose task profile
/// equals one of `task_profiles` is consulted. A candidate profile without a
/// version also matches a stored profile with one, so callers that do not
/// know the task version still find the rules. Requesters that do not decode
/// are skipped. Blank arguments or a process URL/version that does not match
/// the resource yield nothing.
pub fn requesters<'a, S: AsRef<str>>(
    resource: Option<&'a ActivityDefinition>,
    process_url: &str,
    process_version: &str,
    message_name: &str,
    task_profiles: &[S],
) -> impl Iterator<Item = Subject> + use<'a, S> {
    find_block(resource, process_url, process_version, message_name, task_profiles)
        .into_iter()
        .flat_map(|block| block.extensions().iter())
        .filter_map(|e| decode_requester_extension(e, ExistencePredicates::shared_allow_all()))
}

/// Returns the recipients authorized to receive `message_name`.
///
/// Lookup follows the same rules as [`requesters`].
pub fn recipients<'a, S: AsRef<str>>(
    resource: Option<&'a ActivityDefinition>,
    process_url: &str,
    process_version: &str,
    message_name: &str,
    task_profiles: &[S],
) -> impl Iterator<Item = Subject> + use<'a, S> {
    find_block(resource, process_url, process_version, message_name, task_profiles)
        .into_iter()
        .flat_map(|block| block.extensions().iter())
        .filter_map(|e| decode_recipient_extension(e, ExistencePredicates::shared_allow_all()))
}
