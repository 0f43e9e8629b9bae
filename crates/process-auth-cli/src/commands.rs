//! Command implementations.
//!
//! Every command writes its result to the given writer and returns whether it
//! succeeded: the rule-set is valid, or the identity is authorized. I/O and
//! parse failures are errors.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, bail};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use helios_process_auth::fhir::{ActivityDefinition, Coding, OrganizationAffiliation};
use helios_process_auth::identity::Identity;
use helios_process_auth::rule_set::{self, ValidationIssue};
use helios_process_auth::subject::{RecipientSubject, RequesterSubject, Subject};

use crate::config::{
    CheckArgs, CliConfig, Command, Direction, OutputFormat, QueryArgs, ValidateArgs,
};

/// Runs the configured command.
pub fn run(config: &CliConfig, out: &mut dyn Write) -> anyhow::Result<bool> {
    match &config.command {
        Command::Validate(args) => validate(args, config.output, out),
        Command::Requesters(args) => list(args, Direction::Requester, config.output, out),
        Command::Recipients(args) => list(args, Direction::Recipient, config.output, out),
        Command::Check(args) => check(args, config.output, out),
    }
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Loads an `ActivityDefinition` from a JSON file.
pub fn load_resource(path: &Path) -> anyhow::Result<ActivityDefinition> {
    ActivityDefinition::from_value(read_json(path)?)
        .with_context(|| format!("{} is not an ActivityDefinition", path.display()))
}

/// Loads an [`Identity`] from a JSON file.
pub fn load_identity(path: &Path) -> anyhow::Result<Identity> {
    serde_json::from_value(read_json(path)?)
        .with_context(|| format!("{} is not an identity", path.display()))
}

/// Loads affiliations from a JSON array, a single resource, or a Bundle.
pub fn load_affiliations(path: &Path) -> anyhow::Result<Vec<OrganizationAffiliation>> {
    let resources = match read_json(path)? {
        Value::Array(items) => items,
        Value::Object(bundle) if bundle.get("resourceType") == Some(&json!("Bundle")) => bundle
            .get("entry")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.get("resource"))
            .filter(|r| r.get("resourceType") == Some(&json!("OrganizationAffiliation")))
            .cloned()
            .collect(),
        Value::Object(resource) => vec![Value::Object(resource)],
        _ => bail!("{} holds no OrganizationAffiliation", path.display()),
    };

    resources
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid OrganizationAffiliation in {}", path.display()))
}

fn write_json(out: &mut dyn Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn coding_text(coding: &Coding) -> String {
    format!(
        "{}|{}",
        coding.system().unwrap_or_default(),
        coding.code().unwrap_or_default()
    )
}

/// Returns a one-line description of a subject.
pub fn describe(subject: &Subject) -> String {
    let mut parts = vec![subject.classification_code().to_string()];
    match subject {
        Subject::All(_) => {}
        Subject::Organization(o) => {
            parts.push(format!("organization={}", o.organization_identifier()));
        }
        Subject::Role(r) => {
            parts.push(format!("parent-organization={}", r.parent_organization_identifier()));
            parts.push(format!("organization-role={}", coding_text(r.organization_role())));
        }
    }
    if let Some(role) = subject.practitioner_role() {
        parts.push(format!("practitioner-role={}", coding_text(role)));
    }
    parts.join(" ")
}

fn subject_json(subject: &Subject) -> anyhow::Result<Value> {
    let mut value = serde_json::to_value(subject)?;
    if let Value::Object(fields) = &mut value {
        fields.insert("code".to_string(), json!(subject.classification_code()));
    }
    Ok(value)
}

fn validate(
    args: &ValidateArgs,
    output: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    let resource = load_resource(&args.resource)?;
    let predicates = args
        .predicates()
        .map_err(|e| anyhow::anyhow!("Invalid known entities: {}", e))?;

    info!(resource = %args.resource.display(), "Validating process authorization rules");
    let issues: Vec<ValidationIssue> = match rule_set::validate(Some(&resource), &predicates) {
        Ok(()) => Vec::new(),
        Err(issues) => issues,
    };

    match output {
        OutputFormat::Json => write_json(
            out,
            &json!({
                "valid": issues.is_empty(),
                "issues": issues,
            }),
        )?,
        OutputFormat::Text if issues.is_empty() => writeln!(out, "valid")?,
        OutputFormat::Text => {
            for issue in &issues {
                writeln!(out, "{}: {}", issue.severity, issue)?;
            }
        }
    }

    Ok(issues.is_empty())
}

fn query(args: &QueryArgs, direction: Direction) -> anyhow::Result<Vec<Subject>> {
    let resource = load_resource(&args.resource)?;
    let subjects: Vec<Subject> = match direction {
        Direction::Requester => rule_set::requesters(
            Some(&resource),
            &args.process_url,
            &args.process_version,
            &args.message_name,
            &args.task_profiles,
        )
        .collect(),
        Direction::Recipient => rule_set::recipients(
            Some(&resource),
            &args.process_url,
            &args.process_version,
            &args.message_name,
            &args.task_profiles,
        )
        .collect(),
    };

    debug!(
        message_name = %args.message_name,
        direction = ?direction,
        count = subjects.len(),
        "Decoded subjects"
    );
    Ok(subjects)
}

fn list(
    args: &QueryArgs,
    direction: Direction,
    output: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    let subjects = query(args, direction)?;

    match output {
        OutputFormat::Json => {
            let values = subjects
                .iter()
                .map(subject_json)
                .collect::<anyhow::Result<Vec<_>>>()?;
            write_json(out, &values)?;
        }
        OutputFormat::Text => {
            for subject in &subjects {
                writeln!(out, "{}", describe(subject))?;
            }
        }
    }

    Ok(true)
}

fn check(args: &CheckArgs, output: OutputFormat, out: &mut dyn Write) -> anyhow::Result<bool> {
    let subjects = query(&args.query, args.direction)?;
    let identity = load_identity(&args.identity)?;
    let affiliations = match &args.affiliations {
        Some(path) => load_affiliations(path)?,
        None => Vec::new(),
    };

    let matched = subjects.iter().find(|subject| match args.direction {
        Direction::Requester => subject.is_requester_authorized(Some(&identity), &affiliations),
        Direction::Recipient => subject.is_recipient_authorized(Some(&identity), &affiliations),
    });

    info!(
        message_name = %args.query.message_name,
        direction = ?args.direction,
        authorized = matched.is_some(),
        "Checked identity"
    );

    match output {
        OutputFormat::Json => {
            let matched_by = matched.map(subject_json).transpose()?;
            write_json(
                out,
                &json!({
                    "authorized": matched.is_some(),
                    "matchedBy": matched_by,
                }),
            )?;
        }
        OutputFormat::Text => match matched {
            Some(subject) => writeln!(out, "authorized by {}", describe(subject))?,
            None => writeln!(out, "denied")?,
        },
    }

    Ok(matched.is_some())
}
