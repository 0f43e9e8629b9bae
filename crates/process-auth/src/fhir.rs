//! Minimal FHIR R4 element model.
//!
//! Process authorization rules live in extensions on an `ActivityDefinition`
//! and reference organizations, affiliations and codings. This module models
//! just enough of FHIR R4 JSON to read, evaluate and write those rules without
//! pulling in a full resource model.
//!
//! All types serialize to and from standard FHIR JSON:
//!
//! ```
//! use helios_process_auth::fhir::{Coding, Extension, ExtensionValue};
//!
//! let ext: Extension = serde_json::from_str(
//!     r#"{"url": "requester", "valueCoding": {"system": "http://example.org", "code": "X"}}"#,
//! )
//! .unwrap();
//!
//! assert_eq!(ext.url(), "requester");
//! assert_eq!(ext.value_coding(), Some(&Coding::new("http://example.org", "X")));
//! assert!(matches!(ext.value(), Some(ExtensionValue::Coding(_))));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `resourceType` of process definition resources.
pub const ACTIVITY_DEFINITION: &str = "ActivityDefinition";

fn is_present(s: &Option<String>) -> bool {
    s.as_deref().is_some_and(|s| !s.is_empty())
}

/// A FHIR `Coding`: a `(system, code)` pair, optionally carrying extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    /// Extensions attached to the coding.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    /// The code system URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// The code within the system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Members not interpreted here (`display`, `version`, `userSelected`, ...).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Coding {
    /// Creates a coding without extensions.
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            extension: Vec::new(),
            system: Some(system.into()),
            code: Some(code.into()),
            other: Map::new(),
        }
    }

    /// Returns the system, if any.
    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    /// Returns the code, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns `true` if the system is present and non-empty.
    pub fn has_system(&self) -> bool {
        is_present(&self.system)
    }

    /// Returns `true` if the code is present and non-empty.
    pub fn has_code(&self) -> bool {
        is_present(&self.code)
    }

    /// Returns `true` if this coding has exactly the given system and code.
    pub fn is(&self, system: &str, code: &str) -> bool {
        self.system() == Some(system) && self.code() == Some(code)
    }

    /// Returns `true` if both codings carry a system and code and these are equal.
    ///
    /// Extensions are ignored.
    pub fn same_concept(&self, other: &Coding) -> bool {
        match (other.system(), other.code()) {
            (Some(system), Some(code)) => self.is(system, code),
            _ => false,
        }
    }

    /// Returns the coding's extensions.
    pub fn extensions(&self) -> &[Extension] {
        &self.extension
    }

    /// Appends an extension, returning the updated coding.
    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extension.push(extension);
        self
    }

    /// Returns a copy reduced to system and code.
    pub fn to_plain(&self) -> Coding {
        Coding {
            system: self.system.clone(),
            code: self.code.clone(),
            ..Default::default()
        }
    }
}

/// A FHIR `Identifier` (system and value).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// The namespace of the identifier value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// The identifier value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Members not interpreted here (`use`, `type`, `period`, `assigner`, ...).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Identifier {
    /// Creates an identifier.
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            value: Some(value.into()),
            other: Map::new(),
        }
    }

    /// Returns the system, if any.
    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    /// Returns the value, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns `true` if both system and value are present and non-empty.
    pub fn is_complete(&self) -> bool {
        is_present(&self.system) && is_present(&self.value)
    }

    /// Returns `true` if this identifier has exactly the given system and value.
    pub fn is(&self, system: &str, value: &str) -> bool {
        self.system() == Some(system) && self.value() == Some(value)
    }
}

/// The typed `value[x]` of an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionValue {
    /// `valueString`
    String(String),
    /// `valueCanonical`
    Canonical(String),
    /// `valueCoding`
    Coding(Coding),
    /// `valueIdentifier`
    Identifier(Identifier),
    /// Any other `value[x]`, kept as raw JSON under its member name.
    Other {
        /// The member name, e.g. `valueBoolean`.
        key: String,
        /// The member's JSON value.
        value: Value,
    },
}

/// A FHIR `Extension`: a named node with an optional value and child nodes.
///
/// Extensions are built functionally:
///
/// ```
/// use helios_process_auth::fhir::{Extension, ExtensionValue, Identifier};
///
/// let ext = Extension::new("http://example.org/container")
///     .with_extension(
///         Extension::new("organization")
///             .with_value(ExtensionValue::Identifier(Identifier::new("sys", "org.com"))),
///     );
///
/// assert_eq!(ext.extensions_with_url("organization").count(), 1);
/// assert!(ext.value().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExtension", into = "RawExtension")]
pub struct Extension {
    url: String,
    value: Option<ExtensionValue>,
    extension: Vec<Extension>,
    other: Map<String, Value>,
}

impl Extension {
    /// Creates an extension with the given URL, no value and no children.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            value: None,
            extension: Vec::new(),
            other: Map::new(),
        }
    }

    /// Sets the value, returning the updated extension.
    pub fn with_value(mut self, value: ExtensionValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Appends a child extension, returning the updated extension.
    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extension.push(extension);
        self
    }

    /// Appends a child extension in place.
    pub fn add_extension(&mut self, extension: Extension) {
        self.extension.push(extension);
    }

    /// Returns the URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` if the URL is non-empty.
    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }

    /// Returns the value, if any.
    pub fn value(&self) -> Option<&ExtensionValue> {
        self.value.as_ref()
    }

    /// Returns the child extensions.
    pub fn extensions(&self) -> &[Extension] {
        &self.extension
    }

    /// Returns the child extensions with the given URL.
    pub fn extensions_with_url<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a Extension> {
        self.extension.iter().filter(move |e| e.url == url)
    }

    /// Returns the value if it is a `valueCoding`.
    pub fn value_coding(&self) -> Option<&Coding> {
        match &self.value {
            Some(ExtensionValue::Coding(c)) => Some(c),
            _ => None,
        }
    }

    /// Returns the value if it is a `valueIdentifier`.
    pub fn value_identifier(&self) -> Option<&Identifier> {
        match &self.value {
            Some(ExtensionValue::Identifier(i)) => Some(i),
            _ => None,
        }
    }

    /// Returns the value if it is a `valueString`.
    pub fn value_string(&self) -> Option<&str> {
        match &self.value {
            Some(ExtensionValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the value if it is a `valueCanonical`.
    pub fn value_canonical(&self) -> Option<&str> {
        match &self.value {
            Some(ExtensionValue::Canonical(s)) => Some(s),
            _ => None,
        }
    }
}

/// Returns `true` for `value[x]` member names such as `valueBoolean`.
fn is_value_key(key: &str) -> bool {
    key.strip_prefix("value")
        .and_then(|suffix| suffix.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// JSON shape of an extension with one field per interpreted `value[x]` type.
///
/// Everything else, including other `value[x]` types and `id`, lands in `other`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtension {
    #[serde(default)]
    url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extension: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_canonical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_coding: Option<Coding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_identifier: Option<Identifier>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

impl TryFrom<RawExtension> for Extension {
    type Error = String;

    fn try_from(mut raw: RawExtension) -> Result<Self, Self::Error> {
        let mut values = Vec::with_capacity(1);
        if let Some(s) = raw.value_string {
            values.push(ExtensionValue::String(s));
        }
        if let Some(s) = raw.value_canonical {
            values.push(ExtensionValue::Canonical(s));
        }
        if let Some(c) = raw.value_coding {
            values.push(ExtensionValue::Coding(c));
        }
        if let Some(i) = raw.value_identifier {
            values.push(ExtensionValue::Identifier(i));
        }
        let other_keys: Vec<String> = raw
            .other
            .keys()
            .filter(|k| is_value_key(k))
            .cloned()
            .collect();
        for key in other_keys {
            if let Some(value) = raw.other.remove(&key) {
                values.push(ExtensionValue::Other { key, value });
            }
        }

        if values.len() > 1 {
            return Err(format!(
                "extension '{}' has {} values, expected at most one",
                raw.url,
                values.len()
            ));
        }

        Ok(Extension {
            url: raw.url,
            value: values.pop(),
            extension: raw.extension,
            other: raw.other,
        })
    }
}

impl From<Extension> for RawExtension {
    fn from(ext: Extension) -> Self {
        let mut raw = RawExtension {
            url: ext.url,
            extension: ext.extension,
            value_string: None,
            value_canonical: None,
            value_coding: None,
            value_identifier: None,
            other: ext.other,
        };
        match ext.value {
            Some(ExtensionValue::String(s)) => raw.value_string = Some(s),
            Some(ExtensionValue::Canonical(s)) => raw.value_canonical = Some(s),
            Some(ExtensionValue::Coding(c)) => raw.value_coding = Some(c),
            Some(ExtensionValue::Identifier(i)) => raw.value_identifier = Some(i),
            Some(ExtensionValue::Other { key, value }) => {
                raw.other.insert(key, value);
            }
            None => {}
        }
        raw
    }
}

fn activity_definition_type() -> String {
    ACTIVITY_DEFINITION.to_string()
}

/// A process definition resource carrying authorization extensions.
///
/// Only `url`, `version` and `extension` are interpreted. All other members
/// of the JSON resource are preserved unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    #[serde(rename = "resourceType", default = "activity_definition_type")]
    resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extension: Vec<Extension>,

    #[serde(flatten)]
    other: Map<String, Value>,
}

impl ActivityDefinition {
    /// Creates an empty activity definition with the given canonical URL and version.
    pub fn new(url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            resource_type: activity_definition_type(),
            url: Some(url.into()),
            version: Some(version.into()),
            extension: Vec::new(),
            other: Map::new(),
        }
    }

    /// Parses an activity definition from FHIR JSON.
    ///
    /// Fails if the JSON is malformed or the `resourceType` is not
    /// `ActivityDefinition`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let resource: ActivityDefinition = serde_json::from_str(json)?;
        resource.checked()
    }

    /// Converts a JSON value into an activity definition.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let resource: ActivityDefinition = serde_json::from_value(value)?;
        resource.checked()
    }

    fn checked(self) -> Result<Self, serde_json::Error> {
        if self.resource_type != ACTIVITY_DEFINITION {
            return Err(<serde_json::Error as serde::de::Error>::custom(format!(
                "expected resourceType {}, found {}",
                ACTIVITY_DEFINITION, self.resource_type
            )));
        }
        Ok(self)
    }

    /// Serializes the resource as pretty-printed FHIR JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Returns the canonical URL.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Returns the business version.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the top-level extensions.
    pub fn extensions(&self) -> &[Extension] {
        &self.extension
    }

    pub(crate) fn extensions_mut(&mut self) -> &mut Vec<Extension> {
        &mut self.extension
    }

    /// Appends a top-level extension, returning the updated resource.
    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extension.push(extension);
        self
    }
}

/// A FHIR `Organization`, reduced to the fields authorization needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Whether the organization record is in active use.
    #[serde(default)]
    pub active: bool,

    /// Identifiers of the organization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
}

impl Organization {
    /// Creates an active organization with a single identifier.
    pub fn active_with_identifier(identifier: Identifier) -> Self {
        Self {
            active: true,
            identifier: vec![identifier],
        }
    }

    /// Returns `true` if any complete identifier equals `(system, value)`.
    pub fn has_identifier(&self, system: &str, value: &str) -> bool {
        self.identifier
            .iter()
            .filter(|i| i.is_complete())
            .any(|i| i.is(system, value))
    }
}

/// A FHIR `Reference` by logical identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// The logical identifier of the referenced resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
}

impl Reference {
    /// Creates a reference by identifier.
    pub fn to_identifier(identifier: Identifier) -> Self {
        Self {
            identifier: Some(identifier),
        }
    }
}

/// A FHIR `CodeableConcept`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    /// Codings representing the concept.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
}

impl From<Coding> for CodeableConcept {
    fn from(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
        }
    }
}

/// A FHIR `OrganizationAffiliation`: membership of an organization in a
/// parent organization with one or more roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationAffiliation {
    /// Whether the affiliation is in active use.
    #[serde(default)]
    pub active: bool,

    /// The parent organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Reference>,

    /// The member organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participating_organization: Option<Reference>,

    /// The roles the member holds within the parent organization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code: Vec<CodeableConcept>,
}

impl OrganizationAffiliation {
    /// Returns the parent organization identifier, if complete.
    pub fn parent_identifier(&self) -> Option<&Identifier> {
        self.organization
            .as_ref()
            .and_then(|r| r.identifier.as_ref())
            .filter(|i| i.is_complete())
    }

    /// Returns the member organization identifier, if complete.
    pub fn member_identifier(&self) -> Option<&Identifier> {
        self.participating_organization
            .as_ref()
            .and_then(|r| r.identifier.as_ref())
            .filter(|i| i.is_complete())
    }

    /// Returns all role codings that carry both system and code.
    pub fn role_codings(&self) -> impl Iterator<Item = &Coding> {
        self.code
            .iter()
            .flat_map(|c| c.coding.iter())
            .filter(|c| c.has_system() && c.has_code())
    }
}
