use std::fmt;

use serde::{Deserialize, Serialize};

use super::parameters::{self, UrlParameters};

/// Table holding one row per activity instance.
pub const ACK_TABLE: &str = "ack";
/// Frankenstyle component name used for file areas and string lookups.
pub const COMPONENT: &str = "mod_ack";
/// Upper bound of parameter/variable pairs collected from the form.
pub const MAX_URL_PARAMETERS: usize = 100;
/// Length limit enforced on the instance name.
pub const MAX_NAME_LENGTH: usize = 255;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier generated by the record store.
    InstanceId
);
numeric_id!(CourseId);
numeric_id!(CourseModuleId);
numeric_id!(ContextId);
numeric_id!(
    /// Handle of a per-user draft file area created while a form is edited.
    DraftItemId
);

/// Kind of content the learner acknowledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AckType {
    #[default]
    Text,
    File,
    Url,
}

impl AckType {
    pub const fn ordered() -> [Self; 3] {
        [Self::Text, Self::File, Self::Url]
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Text => 1,
            Self::File => 2,
            Self::Url => 3,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Text),
            2 => Some(Self::File),
            3 => Some(Self::Url),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Url => "url",
        }
    }
}

impl From<AckType> for u8 {
    fn from(value: AckType) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for AckType {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or(DomainError::UnknownAckType(value))
    }
}

/// Markup format tag stored next to rich text, numbered as the host does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TextFormat {
    Moodle,
    #[default]
    Html,
    Plain,
    Markdown,
}

impl TextFormat {
    pub const fn code(self) -> u8 {
        match self {
            Self::Moodle => 0,
            Self::Html => 1,
            Self::Plain => 2,
            Self::Markdown => 4,
        }
    }
}

impl From<TextFormat> for u8 {
    fn from(value: TextFormat) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for TextFormat {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Moodle),
            1 => Ok(Self::Html),
            2 => Ok(Self::Plain),
            4 => Ok(Self::Markdown),
            other => Err(DomainError::UnknownTextFormat(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("unknown acknowledgement type code {0}")]
    UnknownAckType(u8),
    #[error("unknown text format code {0}")]
    UnknownTextFormat(u8),
}

/// Value of the rich-text editor element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorContent {
    pub text: String,
    #[serde(default)]
    pub format: TextFormat,
    /// Draft area holding files embedded in the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itemid: Option<DraftItemId>,
}

/// One `parameter_i` / `variable_i` row of the URL form section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlParameterPair {
    #[serde(default, alias = "parameter")]
    pub name: String,
    #[serde(default, alias = "variable")]
    pub value: String,
}

impl UrlParameterPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Only empty strings count as missing, so `debug=0` is kept.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.value.is_empty()
    }
}

/// Object produced by the configuration form on submit.
///
/// Field names follow the plain key scheme; the prefixed spellings are
/// accepted as aliases so either form layout deserializes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckSubmission {
    /// Reference to the instance being edited. Only set on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<InstanceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceId>,
    #[serde(default)]
    pub course: CourseId,
    #[serde(default)]
    pub coursemodule: CourseModuleId,
    #[serde(default, alias = "ackname")]
    pub name: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub introformat: TextFormat,
    #[serde(rename = "type", alias = "acktype", default)]
    pub kind: AckType,
    #[serde(default, alias = "acktypetext", skip_serializing_if = "Option::is_none")]
    pub typetext: Option<EditorContent>,
    #[serde(default, alias = "acktypefile", skip_serializing_if = "Option::is_none")]
    pub typefile: Option<DraftItemId>,
    #[serde(default, alias = "acktypeurl", skip_serializing_if = "Option::is_none")]
    pub typeurl: Option<String>,
    #[serde(default, alias = "ackparameters", skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<UrlParameterPair>,
    #[serde(default, alias = "ackaccepttext", skip_serializing_if = "Option::is_none")]
    pub accepttext: Option<String>,
}

/// The active content of an instance. Only the payload of the selected type
/// exists, so the other two kinds can never carry stale data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckContent {
    Text {
        content: String,
        format: TextFormat,
    },
    /// The document lives in the file service's attachment area.
    File,
    Url {
        externalurl: String,
        parameters: UrlParameters,
    },
}

impl AckContent {
    pub fn kind(&self) -> AckType {
        match self {
            Self::Text { .. } => AckType::Text,
            Self::File => AckType::File,
            Self::Url { .. } => AckType::Url,
        }
    }
}

/// One persisted activity instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AckRow", into = "AckRow")]
pub struct AckRecord {
    pub id: Option<InstanceId>,
    pub course: CourseId,
    pub coursemodule: CourseModuleId,
    pub name: String,
    pub intro: String,
    pub introformat: TextFormat,
    pub content: AckContent,
    pub accepttext: String,
    pub timecreated: i64,
    pub timemodified: i64,
}

impl AckRecord {
    pub fn kind(&self) -> AckType {
        self.content.kind()
    }
}

/// Flat column layout of the `ack` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AckRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<InstanceId>,
    course: CourseId,
    coursemodule: CourseModuleId,
    name: String,
    #[serde(default)]
    intro: String,
    #[serde(default)]
    introformat: TextFormat,
    #[serde(rename = "type")]
    kind: AckType,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    contentformat: Option<TextFormat>,
    #[serde(default)]
    externalurl: Option<String>,
    #[serde(default, with = "parameters::json_column")]
    parameters: Option<UrlParameters>,
    #[serde(default)]
    accepttext: String,
    #[serde(default)]
    timecreated: i64,
    #[serde(default)]
    timemodified: i64,
}

impl From<AckRecord> for AckRow {
    fn from(record: AckRecord) -> Self {
        let kind = record.kind();
        let (content, contentformat, externalurl, parameters) = match record.content {
            AckContent::Text { content, format } => (Some(content), Some(format), None, None),
            AckContent::File => (None, None, None, None),
            AckContent::Url {
                externalurl,
                parameters,
            } => (None, None, Some(externalurl), Some(parameters)),
        };

        Self {
            id: record.id,
            course: record.course,
            coursemodule: record.coursemodule,
            name: record.name,
            intro: record.intro,
            introformat: record.introformat,
            kind,
            content,
            contentformat,
            externalurl,
            parameters,
            accepttext: record.accepttext,
            timecreated: record.timecreated,
            timemodified: record.timemodified,
        }
    }
}

impl From<AckRow> for AckRecord {
    fn from(row: AckRow) -> Self {
        let content = match row.kind {
            AckType::Text => AckContent::Text {
                content: row.content.unwrap_or_default(),
                format: row.contentformat.unwrap_or_default(),
            },
            AckType::File => AckContent::File,
            AckType::Url => AckContent::Url {
                externalurl: row.externalurl.unwrap_or_default(),
                parameters: row.parameters.unwrap_or_default(),
            },
        };

        Self {
            id: row.id,
            course: row.course,
            coursemodule: row.coursemodule,
            name: row.name,
            intro: row.intro,
            introformat: row.introformat,
            content,
            accepttext: row.accepttext,
            timecreated: row.timecreated,
            timemodified: row.timemodified,
        }
    }
}
