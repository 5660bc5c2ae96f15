//! English string table for the activity.
//!
//! Two identifier schemes exist for the same strings: the plain one (`name`,
//! `type`, `accepttext`) and the prefixed one (`ackname`, `acktype`,
//! `ackaccepttext`). A deployment picks one and every label, help text,
//! default and form field name goes through it.

use serde::{Deserialize, Serialize};

use super::domain::COMPONENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    #[default]
    Plain,
    Prefixed,
}

impl KeyScheme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" | "unprefixed" => Some(Self::Plain),
            "prefixed" | "ack" => Some(Self::Prefixed),
            _ => None,
        }
    }

    /// Applies the scheme to a form field or string stem.
    pub fn apply(self, stem: &str) -> String {
        match self {
            Self::Plain => stem.to_string(),
            Self::Prefixed => format!("ack{stem}"),
        }
    }
}

/// Canonical identifiers, independent of the active scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKey {
    AcceptText,
    AcceptTextHelp,
    AcceptTextMessage,
    Name,
    NameHelp,
    Settings,
    Type,
    TypeHelp,
    TypeText,
    TypeFile,
    TypeUrl,
    TypeTextField,
    TypeFileField,
    TypeUrlField,
    Parameters,
    ParameterName,
    ParameterValue,
    ModuleName,
    ModuleNamePlural,
    NoInstances,
    PluginAdministration,
    PluginName,
    AddInstance,
    View,
    InvalidUrl,
    Required,
    MaximumChars,
    General,
    Description,
}

impl StringKey {
    pub const ALL: [Self; 29] = [
        Self::AcceptText,
        Self::AcceptTextHelp,
        Self::AcceptTextMessage,
        Self::Name,
        Self::NameHelp,
        Self::Settings,
        Self::Type,
        Self::TypeHelp,
        Self::TypeText,
        Self::TypeFile,
        Self::TypeUrl,
        Self::TypeTextField,
        Self::TypeFileField,
        Self::TypeUrlField,
        Self::Parameters,
        Self::ParameterName,
        Self::ParameterValue,
        Self::ModuleName,
        Self::ModuleNamePlural,
        Self::NoInstances,
        Self::PluginAdministration,
        Self::PluginName,
        Self::AddInstance,
        Self::View,
        Self::InvalidUrl,
        Self::Required,
        Self::MaximumChars,
        Self::General,
        Self::Description,
    ];

    /// Identifier stem and whether the key scheme applies to it.
    const fn stem(self) -> (&'static str, bool) {
        match self {
            Self::AcceptText => ("accepttext", true),
            Self::AcceptTextHelp => ("accepttext_help", true),
            Self::AcceptTextMessage => ("accepttextmsg", true),
            Self::Name => ("name", true),
            Self::NameHelp => ("name_help", true),
            Self::Settings => ("settings", true),
            Self::Type => ("type", true),
            Self::TypeHelp => ("type_help", true),
            Self::TypeText => ("type_text", true),
            Self::TypeFile => ("type_file", true),
            Self::TypeUrl => ("type_url", true),
            Self::TypeTextField => ("typetext", true),
            Self::TypeFileField => ("typefile", true),
            Self::TypeUrlField => ("typeurl", true),
            Self::Parameters => ("parameters", true),
            Self::ParameterName => ("parameter", false),
            Self::ParameterValue => ("variable", false),
            Self::ModuleName => ("modulename", false),
            Self::ModuleNamePlural => ("modulenameplural", false),
            Self::NoInstances => ("noackinstances", false),
            Self::PluginAdministration => ("pluginadministration", false),
            Self::PluginName => ("pluginname", false),
            Self::AddInstance => ("ack:addinstance", false),
            Self::View => ("ack:view", false),
            Self::InvalidUrl => ("invalidurl", false),
            Self::Required => ("required", false),
            Self::MaximumChars => ("maximumchars", false),
            Self::General => ("general", false),
            Self::Description => ("moduleintro", false),
        }
    }

    pub fn identifier(self, scheme: KeyScheme) -> String {
        match self.stem() {
            (stem, true) => scheme.apply(stem),
            (stem, false) => stem.to_string(),
        }
    }

    const fn english(self) -> &'static str {
        match self {
            Self::AcceptText => "Acceptance message",
            Self::AcceptTextHelp => "The acceptance message displayed to the learner",
            Self::AcceptTextMessage => {
                "I acknowledge I have read and understood this information"
            }
            Self::Name => "Acknowledgement name",
            Self::NameHelp => "The name of this acknowledgement",
            Self::Settings => "Acknowledgement settings",
            Self::Type => "Acknowledgement type",
            Self::TypeHelp => {
                "Choose the Acknowledgement type:<br/><strong>Text</strong> Rich text<br/>\
                 <strong>File</strong> An uploaded file<br/><strong>URL</strong> An external \
                 file or webpage<br/><br/>All types are displayed embedded."
            }
            Self::TypeText => "Text",
            Self::TypeFile => "File",
            Self::TypeUrl => "URL (link)",
            Self::TypeTextField => "Acknowledgement text",
            Self::TypeFileField => "Acknowledgement file",
            Self::TypeUrlField => "Acknowledgement URL",
            Self::Parameters => "URL variables",
            Self::ParameterName => "Parameter",
            Self::ParameterValue => "Value",
            Self::ModuleName => "Acknowledge",
            Self::ModuleNamePlural => "Acknowledgements",
            Self::NoInstances => "No acknowledgement instances in this course",
            Self::PluginAdministration => "Acknowledgement module administration",
            Self::PluginName => "Acknowledgement",
            Self::AddInstance => "Add a new acknowledgement",
            Self::View => "View acknowledgement",
            Self::InvalidUrl => "Entered URL is invalid",
            Self::Required => "You must supply a value here.",
            Self::MaximumChars => "Maximum of {$a} characters",
            Self::General => "General",
            Self::Description => "Description",
        }
    }
}

/// Resolves user-visible strings for the `mod_ack` component.
#[derive(Debug, Clone)]
pub struct StringTable {
    scheme: KeyScheme,
}

impl StringTable {
    pub fn new(scheme: KeyScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    pub fn component(&self) -> &'static str {
        COMPONENT
    }

    pub fn translate(&self, key: StringKey) -> String {
        key.english().to_string()
    }

    /// Like [`translate`](Self::translate) with `{$a}` replaced by `argument`.
    pub fn translate_with(&self, key: StringKey, argument: impl ToString) -> String {
        key.english().replace("{$a}", &argument.to_string())
    }

    pub fn identifier(&self, key: StringKey) -> String {
        key.identifier(self.scheme)
    }

    /// Looks up a raw identifier in the active scheme. Unknown identifiers,
    /// including those of the other scheme, render as `[[identifier]]`.
    pub fn lookup(&self, identifier: &str) -> String {
        StringKey::ALL
            .iter()
            .find(|key| key.identifier(self.scheme) == identifier)
            .map(|key| key.english().to_string())
            .unwrap_or_else(|| format!("[[{identifier}]]"))
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new(KeyScheme::default())
    }
}
