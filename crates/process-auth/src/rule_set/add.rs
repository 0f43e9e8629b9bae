use tracing::debug;

use crate::constants::{
    EXTENSION_PROCESS_AUTHORIZATION, EXTENSION_PROCESS_AUTHORIZATION_MESSAGE_NAME,
    EXTENSION_PROCESS_AUTHORIZATION_TASK_PROFILE,
};
use crate::error::{AuthorizationError, AuthorizationResult, require_non_blank};
use crate::fhir::{ActivityDefinition, Extension, ExtensionValue};
use crate::subject::{RecipientSubject, RequesterSubject, Subject};

use super::{has_message_name, task_profiles};

fn new_block(message_name: &str, task_profile: &str) -> Extension {
    Extension::new(EXTENSION_PROCESS_AUTHORIZATION)
        .with_extension(
            Extension::new(EXTENSION_PROCESS_AUTHORIZATION_MESSAGE_NAME)
                .with_value(ExtensionValue::String(message_name.to_string())),
        )
        .with_extension(
            Extension::new(EXTENSION_PROCESS_AUTHORIZATION_TASK_PROFILE)
                .with_value(ExtensionValue::Canonical(task_profile.to_string())),
        )
}

/// Adds requesters and recipients for a message to a process definition.
///
/// The block with exactly this message name and task profile is reused, or
/// appended if there is none. Subjects already present in equivalent form are
/// not added again, so repeated calls with the same arguments leave the
/// resource unchanged.
///
/// # Errors
///
/// - [`AuthorizationError::BlankField`] if `message_name` or `task_profile` is blank
/// - [`AuthorizationError::EmptyCollection`] if `requesters` or `recipients` is empty
/// - [`AuthorizationError::InvalidRecipient`] if a recipient is remote or
///   requires a practitioner role
pub fn add(
    mut resource: ActivityDefinition,
    message_name: &str,
    task_profile: &str,
    requesters: &[Subject],
    recipients: &[Subject],
) -> AuthorizationResult<ActivityDefinition> {
    require_non_blank(message_name, "messageName")?;
    require_non_blank(task_profile, "taskProfile")?;
    if requesters.is_empty() {
        return Err(AuthorizationError::EmptyCollection {
            field: "requesters",
        });
    }
    if recipients.is_empty() {
        return Err(AuthorizationError::EmptyCollection {
            field: "recipients",
        });
    }
    for recipient in recipients {
        recipient.check_recipient()?;
    }

    let extensions = resource.extensions_mut();
    let position = extensions.iter().position(|e| {
        e.url() == EXTENSION_PROCESS_AUTHORIZATION
            && has_message_name(e, message_name)
            && task_profiles(e).any(|p| p == task_profile)
    });
    let index = match position {
        Some(index) => index,
        None => {
            debug!(message_name, task_profile, "creating authorization block");
            extensions.push(new_block(message_name, task_profile));
            extensions.len() - 1
        }
    };
    let block = &mut extensions[index];

    for requester in requesters {
        if block.extensions().iter().any(|e| requester.requester_matches(e)) {
            debug!(
                message_name,
                code = %requester.classification_code(),
                "requester already present"
            );
        } else {
            block.add_extension(requester.to_requester_extension());
        }
    }
    for recipient in recipients {
        if block.extensions().iter().any(|e| recipient.recipient_matches(e)) {
            debug!(
                message_name,
                code = %recipient.classification_code(),
                "recipient already present"
            );
        } else {
            block.add_extension(recipient.to_recipient_extension());
        }
    }

    Ok(resource)
}
