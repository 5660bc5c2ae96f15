//! Schema of the activity settings form and its server-side validation.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use super::domain::{AckSubmission, AckType, COMPONENT, MAX_NAME_LENGTH, MAX_URL_PARAMETERS};
use super::files::FileOptions;
use super::strings::{StringKey, StringTable};
use super::url::validate_url;
use crate::config::ModuleConfig;

/// Field name -> translated message.
pub type FormErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Header,
    Text,
    Editor,
    Select,
    Filemanager,
    Url,
    Textarea,
    Group,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FormRule {
    Required { message: String },
    MaxLength { limit: usize, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpButton {
    pub identifier: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: u8,
    pub label: String,
}

/// Hides an element while `field` does not hold `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HideUnless {
    pub field: String,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormElement {
    pub kind: ElementKind,
    pub name: String,
    pub label: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<FormRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<HelpButton>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_options: Option<FileOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_unless: Option<HideUnless>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FormElement>,
}

impl FormElement {
    fn new(kind: ElementKind, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            label: label.into(),
            attributes: BTreeMap::new(),
            rules: Vec::new(),
            help: None,
            default: None,
            options: Vec::new(),
            file_options: None,
            hide_unless: None,
            children: Vec::new(),
        }
    }

    fn attribute(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    fn rule(mut self, rule: FormRule) -> Self {
        self.rules.push(rule);
        self
    }

    fn help(mut self, help: HelpButton) -> Self {
        self.help = Some(help);
        self
    }

    fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    fn hide_unless(mut self, field: &str, kind: AckType) -> Self {
        self.hide_unless = Some(HideUnless {
            field: field.to_string(),
            value: kind.code(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDefinition {
    pub component: &'static str,
    pub elements: Vec<FormElement>,
}

impl FormDefinition {
    pub fn element(&self, name: &str) -> Option<&FormElement> {
        self.elements.iter().find(|element| element.name == name)
    }
}

/// Settings form bound to a string table and the course limits.
pub struct AckForm<'a> {
    strings: &'a StringTable,
    config: &'a ModuleConfig,
}

impl<'a> AckForm<'a> {
    pub fn new(strings: &'a StringTable, config: &'a ModuleConfig) -> Self {
        Self { strings, config }
    }

    /// Form field name of `key` under the active key scheme.
    pub fn field(&self, key: StringKey) -> String {
        self.strings.identifier(key)
    }

    fn label(&self, key: StringKey) -> String {
        self.strings.translate(key)
    }

    fn help_for(&self, key: StringKey, help: StringKey) -> HelpButton {
        HelpButton {
            identifier: self.field(key),
            text: self.label(help),
        }
    }

    pub fn definition(&self) -> FormDefinition {
        let type_field = self.field(StringKey::Type);
        let maxbytes = self.config.course_maxbytes;
        let mut elements = Vec::new();

        elements.push(FormElement::new(
            ElementKind::Header,
            "general",
            self.label(StringKey::General),
        ));

        elements.push(
            FormElement::new(
                ElementKind::Text,
                self.field(StringKey::Name),
                self.label(StringKey::Name),
            )
            .attribute("size", json!(64))
            .rule(FormRule::Required {
                message: self.label(StringKey::Required),
            })
            .rule(FormRule::MaxLength {
                limit: MAX_NAME_LENGTH,
                message: self
                    .strings
                    .translate_with(StringKey::MaximumChars, MAX_NAME_LENGTH),
            })
            .help(self.help_for(StringKey::Name, StringKey::NameHelp)),
        );

        elements.push(FormElement::new(
            ElementKind::Editor,
            "intro",
            self.label(StringKey::Description),
        ));

        elements.push(
            FormElement::new(
                ElementKind::Header,
                self.field(StringKey::Settings),
                self.label(StringKey::Settings),
            )
            .attribute("expanded", json!(true)),
        );

        let mut select = FormElement::new(
            ElementKind::Select,
            type_field.clone(),
            self.label(StringKey::Type),
        )
        .default_value(json!(AckType::Text.code()))
        .help(self.help_for(StringKey::Type, StringKey::TypeHelp));
        select.options = AckType::ordered()
            .into_iter()
            .map(|kind| SelectOption {
                value: kind.code(),
                label: self.label(match kind {
                    AckType::Text => StringKey::TypeText,
                    AckType::File => StringKey::TypeFile,
                    AckType::Url => StringKey::TypeUrl,
                }),
            })
            .collect();
        elements.push(select);

        let mut file = FormElement::new(
            ElementKind::Filemanager,
            self.field(StringKey::TypeFileField),
            self.label(StringKey::TypeFileField),
        )
        .hide_unless(&type_field, AckType::File);
        file.file_options = Some(FileOptions::single_document(maxbytes));
        elements.push(file);

        let mut editor = FormElement::new(
            ElementKind::Editor,
            self.field(StringKey::TypeTextField),
            self.label(StringKey::TypeTextField),
        )
        .hide_unless(&type_field, AckType::Text);
        editor.file_options = Some(FileOptions::editor(maxbytes));
        elements.push(editor);

        elements.push(
            FormElement::new(
                ElementKind::Url,
                self.field(StringKey::TypeUrlField),
                self.label(StringKey::TypeUrlField),
            )
            .attribute("size", json!(60))
            .attribute("usefilepicker", json!(true))
            .hide_unless(&type_field, AckType::Url),
        );

        let mut parameters = FormElement::new(
            ElementKind::Group,
            self.field(StringKey::Parameters),
            self.label(StringKey::Parameters),
        )
        .attribute("repeat", json!(MAX_URL_PARAMETERS))
        .hide_unless(&type_field, AckType::Url);
        parameters.children = vec![
            FormElement::new(
                ElementKind::Text,
                "parameter",
                self.label(StringKey::ParameterName),
            ),
            FormElement::new(
                ElementKind::Text,
                "variable",
                self.label(StringKey::ParameterValue),
            ),
        ];
        elements.push(parameters);

        elements.push(
            FormElement::new(
                ElementKind::Textarea,
                self.field(StringKey::AcceptText),
                self.label(StringKey::AcceptText),
            )
            .attribute("cols", json!(60))
            .default_value(json!(self.label(StringKey::AcceptTextMessage)))
            .help(self.help_for(StringKey::AcceptText, StringKey::AcceptTextHelp)),
        );

        FormDefinition {
            component: COMPONENT,
            elements,
        }
    }

    /// Field-level errors for a submission. An empty map means the
    /// submission may be saved.
    pub fn validate(&self, submission: &AckSubmission) -> FormErrors {
        let mut errors = FormErrors::new();

        let name = submission.name.trim();
        if name.is_empty() {
            errors.insert(
                self.field(StringKey::Name),
                self.label(StringKey::Required),
            );
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.insert(
                self.field(StringKey::Name),
                self.strings
                    .translate_with(StringKey::MaximumChars, MAX_NAME_LENGTH),
            );
        }

        if submission.kind == AckType::Url {
            let url = submission.typeurl.as_deref().map(str::trim).unwrap_or("");
            let field = self.field(StringKey::TypeUrlField);
            if url.is_empty() {
                errors.insert(field, self.label(StringKey::Required));
            } else if let Some(message) = validate_url(url, self.strings) {
                errors.insert(field, message);
            }
        }

        errors
    }
}
