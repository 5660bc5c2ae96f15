use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{
    AckContent, AckRecord, AckSubmission, AckType, CourseModuleId, DraftItemId, EditorContent,
    InstanceId,
};
use super::files::{FileArea, FileError, FileOptions, FileTransferService};
use super::parameters::UrlParameters;
use super::repository::{AckRepository, RepositoryError};
use super::strings::{StringKey, StringTable};
use crate::config::ModuleConfig;

/// Source of the epoch-second timestamps written to `timecreated` and
/// `timemodified`.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Record manager for acknowledgement instances.
///
/// Draft files are migrated before the row is written and the two steps do
/// not share a transaction: a failed insert or update leaves the migrated
/// files in place.
pub struct AckModule<R, F> {
    repository: Arc<R>,
    files: Arc<F>,
    clock: Arc<dyn Clock>,
    config: ModuleConfig,
    strings: StringTable,
}

impl<R, F> AckModule<R, F>
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    pub fn new(repository: Arc<R>, files: Arc<F>, config: ModuleConfig) -> Self {
        Self::with_clock(repository, files, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        files: Arc<F>,
        config: ModuleConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let strings = StringTable::new(config.string_keys);
        Self {
            repository,
            files,
            clock,
            config,
            strings,
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    pub fn editor_options(&self) -> FileOptions {
        FileOptions::editor(self.config.course_maxbytes)
    }

    pub fn document_options(&self) -> FileOptions {
        FileOptions::single_document(self.config.course_maxbytes)
    }

    /// Create a new instance, returning the store-generated id.
    pub fn add_instance(&self, submission: AckSubmission) -> Result<InstanceId, AckServiceError> {
        let mut record = self.upsert_normalize(submission)?;
        record.timecreated = self.clock.now();
        let kind = record.kind();

        let id = self.repository.insert(record).map_err(|err| {
            warn!(error = %err, "insert failed; migrated draft files were kept");
            err
        })?;

        info!(instance = %id, kind = kind.label(), "acknowledgement instance created");
        Ok(id)
    }

    /// Rewrite an existing instance. The target row comes from the
    /// submission's `instance` reference; any `id` on the submission is
    /// ignored. Returns `Ok(false)` when the row does not exist.
    pub fn update_instance(&self, submission: AckSubmission) -> Result<bool, AckServiceError> {
        let id = submission
            .instance
            .ok_or(AckServiceError::MissingInstanceReference)?;
        let Some(existing) = self.repository.fetch(id)? else {
            info!(instance = %id, "update skipped, instance does not exist");
            return Ok(false);
        };

        let mut record = self.upsert_normalize(submission)?;
        record.id = Some(id);
        record.timecreated = existing.timecreated;
        record.timemodified = self.clock.now();
        let kind = record.kind();

        let updated = self.repository.update(record).map_err(|err| {
            warn!(instance = %id, error = %err, "update failed; migrated draft files were kept");
            err
        })?;

        if updated {
            info!(instance = %id, kind = kind.label(), "acknowledgement instance updated");
        }
        Ok(updated)
    }

    /// Hard-delete an instance. Attached files are left to the file service.
    pub fn delete_instance(&self, id: InstanceId) -> Result<bool, AckServiceError> {
        if self.repository.fetch(id)?.is_none() {
            return Ok(false);
        }

        self.repository.delete(id)?;
        info!(instance = %id, "acknowledgement instance deleted");
        Ok(true)
    }

    pub fn get_instance(&self, id: InstanceId) -> Result<Option<AckRecord>, AckServiceError> {
        Ok(self.repository.fetch(id)?)
    }

    /// Builds the submission an edit form starts from, copying the stored
    /// files of the active type into a fresh draft area.
    pub fn prepare_edit_submission(
        &self,
        id: InstanceId,
    ) -> Result<Option<AckSubmission>, AckServiceError> {
        let Some(record) = self.repository.fetch(id)? else {
            return Ok(None);
        };

        let mut submission = AckSubmission {
            instance: Some(id),
            course: record.course,
            coursemodule: record.coursemodule,
            kind: record.kind(),
            name: record.name,
            intro: record.intro,
            introformat: record.introformat,
            accepttext: Some(record.accepttext),
            ..AckSubmission::default()
        };

        match record.content {
            AckContent::Text { content, format } => {
                let draft = self.prepare_draft(
                    record.coursemodule,
                    &self.config.text_file_area,
                    &self.editor_options(),
                )?;
                submission.typetext = Some(EditorContent {
                    text: content,
                    format,
                    itemid: Some(draft),
                });
            }
            AckContent::File => {
                let draft = self.prepare_draft(
                    record.coursemodule,
                    &self.config.file_area,
                    &self.document_options(),
                )?;
                submission.typefile = Some(draft);
            }
            AckContent::Url {
                externalurl,
                parameters,
            } => {
                submission.typeurl = Some(externalurl);
                submission.parameters = parameters.to_pairs();
            }
        }

        Ok(Some(submission))
    }

    /// Turns a submission into the record to persist, migrating draft files
    /// for the selected type. Fields of the other types are dropped.
    fn upsert_normalize(&self, submission: AckSubmission) -> Result<AckRecord, AckServiceError> {
        let AckSubmission {
            course,
            coursemodule,
            name,
            intro,
            introformat,
            kind,
            typetext,
            typefile,
            typeurl,
            parameters,
            accepttext,
            ..
        } = submission;

        let content = match kind {
            AckType::Text => {
                let editor = typetext.unwrap_or_default();
                if let Some(draft) = editor.itemid {
                    self.save_draft(
                        coursemodule,
                        draft,
                        &self.config.text_file_area,
                        &self.editor_options(),
                    )?;
                }
                AckContent::Text {
                    content: editor.text,
                    format: editor.format,
                }
            }
            AckType::File => {
                match typefile {
                    Some(draft) => self.save_draft(
                        coursemodule,
                        draft,
                        &self.config.file_area,
                        &self.document_options(),
                    )?,
                    None => debug!(%coursemodule, "file type submitted without a draft area"),
                }
                AckContent::File
            }
            AckType::Url => {
                let collected = UrlParameters::collect(&parameters);
                if collected.skipped > 0 {
                    debug!(skipped = collected.skipped, "dropped incomplete url parameter rows");
                }
                AckContent::Url {
                    externalurl: typeurl.unwrap_or_default().trim().to_string(),
                    parameters: collected.parameters,
                }
            }
        };

        let accepttext = accepttext
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| self.strings.translate(StringKey::AcceptTextMessage));

        Ok(AckRecord {
            id: None,
            course,
            coursemodule,
            name: name.trim().to_string(),
            intro,
            introformat,
            content,
            accepttext,
            timecreated: 0,
            timemodified: 0,
        })
    }

    fn save_draft(
        &self,
        coursemodule: CourseModuleId,
        draft: DraftItemId,
        area: &str,
        options: &FileOptions,
    ) -> Result<(), FileError> {
        let context = self.files.module_context(coursemodule)?;
        let target = FileArea::new(context, area);
        self.files.save_draft_area_files(draft, &target, options)?;
        debug!(%draft, area, %context, "draft files saved");
        Ok(())
    }

    fn prepare_draft(
        &self,
        coursemodule: CourseModuleId,
        area: &str,
        options: &FileOptions,
    ) -> Result<DraftItemId, FileError> {
        let context = self.files.module_context(coursemodule)?;
        let source = FileArea::new(context, area);
        self.files.prepare_draft_area(None, &source, options)
    }
}

/// Error raised by the record manager.
#[derive(Debug, thiserror::Error)]
pub enum AckServiceError {
    #[error("update requires the instance reference of the edited activity")]
    MissingInstanceReference,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Files(#[from] FileError),
}
