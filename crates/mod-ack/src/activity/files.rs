use std::collections::BTreeMap;
use std::path::Path;

use mime::Mime;
use serde::{Deserialize, Serialize};

use super::domain::{ContextId, CourseId, CourseModuleId, DraftItemId, COMPONENT};

pub const UNLIMITED_FILES: i32 = -1;
/// File type group covering word-processor and print documents.
pub const DOCUMENT_GROUP: &str = "document";

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.oasis.opendocument.text-template",
    "application/rtf",
    "text/rtf",
    "application/epub+zip",
];

/// Limits applied when a draft area is migrated into permanent storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOptions {
    pub subdirs: bool,
    /// Maximum number of files, [`UNLIMITED_FILES`] for no limit.
    pub maxfiles: i32,
    /// Per-file byte limit, `0` for the site default.
    pub maxbytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_types: Option<Vec<String>>,
}

impl FileOptions {
    /// Options of the rich-text editor: any number of embedded files.
    pub fn editor(maxbytes: u64) -> Self {
        Self {
            subdirs: false,
            maxfiles: UNLIMITED_FILES,
            maxbytes,
            accepted_types: None,
        }
    }

    /// Options of the file picker: exactly one document.
    pub fn single_document(maxbytes: u64) -> Self {
        Self {
            subdirs: false,
            maxfiles: 1,
            maxbytes,
            accepted_types: Some(vec![DOCUMENT_GROUP.to_string()]),
        }
    }

    pub fn allows_count(&self, count: usize) -> bool {
        self.maxfiles < 0 || count <= self.maxfiles as usize
    }

    pub fn allows_size(&self, bytes: u64) -> bool {
        self.maxbytes == 0 || bytes <= self.maxbytes
    }

    /// Checks a filename against `accepted_types`. Entries may be a type
    /// group, a `.ext` suffix or a MIME type.
    pub fn accepts(&self, filename: &str) -> bool {
        let Some(accepted) = &self.accepted_types else {
            return true;
        };
        let mime = guess_mime(filename);
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        accepted.iter().any(|entry| {
            if entry == "*" {
                true
            } else if entry == DOCUMENT_GROUP {
                is_document(&mime)
            } else if let Some(suffix) = entry.strip_prefix('.') {
                extension.as_deref() == Some(suffix.to_ascii_lowercase().as_str())
            } else {
                mime.essence_str().eq_ignore_ascii_case(entry)
            }
        })
    }
}

pub fn guess_mime(filename: &str) -> Mime {
    mime_guess::from_path(filename).first_or_octet_stream()
}

pub fn is_document(mime: &Mime) -> bool {
    *mime == mime::APPLICATION_PDF
        || *mime == mime::TEXT_PLAIN
        || DOCUMENT_MIME_TYPES.contains(&mime.essence_str())
}

/// Permanent, component-scoped storage location for an instance's files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileArea {
    pub context: ContextId,
    pub component: String,
    pub area: String,
    pub item_id: u64,
}

impl FileArea {
    pub fn new(context: ContextId, area: impl Into<String>) -> Self {
        Self {
            context,
            component: COMPONENT.to_string(),
            area: area.into(),
            item_id: 0,
        }
    }
}

/// Draft-file transfer contract provided by the host.
pub trait FileTransferService: Send + Sync {
    /// Resolves the module context the instance's files are scoped to.
    fn module_context(&self, coursemodule: CourseModuleId) -> Result<ContextId, FileError>;

    /// Moves the files of a draft area into `target`, replacing what was
    /// there and enforcing `options`.
    fn save_draft_area_files(
        &self,
        draft: DraftItemId,
        target: &FileArea,
        options: &FileOptions,
    ) -> Result<(), FileError>;

    /// Copies the files of `source` into a draft area for editing. Reuses
    /// `draft` when given, otherwise allocates a new one.
    fn prepare_draft_area(
        &self,
        draft: Option<DraftItemId>,
        source: &FileArea,
        options: &FileOptions,
    ) -> Result<DraftItemId, FileError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("no module context for course module {0}")]
    ContextNotFound(CourseModuleId),
    #[error("draft area {0} does not exist")]
    UnknownDraft(DraftItemId),
    #[error("file '{filename}' is not an accepted type")]
    Rejected { filename: String },
    #[error("at most {max} file(s) may be stored, found {found}")]
    TooManyFiles { max: i32, found: usize },
    #[error("file '{filename}' exceeds {max} bytes")]
    TooLarge { filename: String, max: u64 },
    #[error("file storage unavailable: {0}")]
    Storage(String),
}

/// Host context levels, numbered as the host numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextLevel {
    System,
    User,
    CourseCategory,
    Course,
    Module,
    Block,
}

impl ContextLevel {
    pub const fn code(self) -> u16 {
        match self {
            Self::System => 10,
            Self::User => 30,
            Self::CourseCategory => 40,
            Self::Course => 50,
            Self::Module => 70,
            Self::Block => 80,
        }
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            10 => Some(Self::System),
            30 => Some(Self::User),
            40 => Some(Self::CourseCategory),
            50 => Some(Self::Course),
            70 => Some(Self::Module),
            80 => Some(Self::Block),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileContext {
    pub id: ContextId,
    pub level: ContextLevel,
}

/// Login and enrolment check performed before serving course files.
pub trait AccessGuard: Send + Sync {
    fn require_login(
        &self,
        course: CourseId,
        coursemodule: CourseModuleId,
    ) -> Result<(), AccessDenied>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("access denied: {reason}")]
pub struct AccessDenied {
    pub reason: String,
}

/// Browsable file areas beyond the intro area the host adds on its own.
pub fn ack_get_file_areas(
    _course: CourseId,
    _coursemodule: CourseModuleId,
    _context: &FileContext,
) -> BTreeMap<String, String> {
    BTreeMap::new()
}

/// Metadata of a browsable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub area: String,
    pub item_id: u64,
    pub filepath: String,
    pub filename: String,
}

/// File browsing is not offered for any area yet.
pub fn ack_get_file_info(
    _context: &FileContext,
    _area: &str,
    _item_id: u64,
    _filepath: &str,
    _filename: &str,
) -> Option<FileInfo> {
    None
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginFileRequest {
    pub course: CourseId,
    pub coursemodule: CourseModuleId,
    pub area: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub forcedownload: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileServeError {
    #[error("file not found")]
    NotFound,
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
}

/// Resolves a request for a file in one of the plugin's areas. Nothing beyond
/// the standard intro area is world readable, so the outcome is always a
/// refusal: access denied when the login check fails, not found otherwise.
pub fn ack_pluginfile<G>(
    guard: &G,
    context: &FileContext,
    request: &PluginFileRequest,
) -> FileServeError
where
    G: AccessGuard + ?Sized,
{
    if context.level != ContextLevel::Module {
        return FileServeError::NotFound;
    }

    if let Err(denied) = guard.require_login(request.course, request.coursemodule) {
        return denied.into();
    }
    tracing::debug!(area = %request.area, args = ?request.args, "no servable file in area");
    FileServeError::NotFound
}
