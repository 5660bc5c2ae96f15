//! Acknowledgement activity: instance lifecycle, per-type content upsert,
//! settings form and host glue.

pub mod domain;
pub mod features;
pub mod files;
pub mod form;
pub mod parameters;
pub mod repository;
pub mod router;
pub mod service;
pub mod strings;
pub mod url;

#[cfg(test)]
mod tests;

pub use domain::{
    AckContent, AckRecord, AckSubmission, AckType, ContextId, CourseId, CourseModuleId,
    DraftItemId, EditorContent, InstanceId, TextFormat, UrlParameterPair, ACK_TABLE, COMPONENT,
    MAX_URL_PARAMETERS,
};
pub use features::{ack_supports, Feature};
pub use files::{
    ack_get_file_areas, ack_get_file_info, ack_pluginfile, AccessDenied, AccessGuard,
    ContextLevel, FileArea, FileContext, FileError, FileOptions, FileServeError,
    FileTransferService, PluginFileRequest,
};
pub use form::{AckForm, FormDefinition, FormErrors};
pub use parameters::UrlParameters;
pub use repository::{AckRepository, RepositoryError};
pub use router::{ack_router, AckApi};
pub use service::{AckModule, AckServiceError, Clock, SystemClock};
pub use strings::{KeyScheme, StringKey, StringTable};
pub use url::{is_valid_url, validate_url};
