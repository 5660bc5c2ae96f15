use metrics_exporter_prometheus::PrometheusHandle;
use mod_ack::activity::{
    AccessDenied, AccessGuard, AckRecord, AckRepository, ContextId, CourseId, CourseModuleId,
    DraftItemId, FileArea, FileError, FileOptions, FileTransferService, InstanceId,
    RepositoryError,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Module contexts are numbered after the course module they belong to.
const MODULE_CONTEXT_OFFSET: u64 = 1_000;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAckRepository {
    records: Arc<Mutex<HashMap<InstanceId, AckRecord>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryAckRepository {
    fn records(&self) -> Result<MutexGuard<'_, HashMap<InstanceId, AckRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl AckRepository for InMemoryAckRepository {
    fn insert(&self, mut record: AckRecord) -> Result<InstanceId, RepositoryError> {
        let id = InstanceId(self.sequence.fetch_add(1, Ordering::SeqCst) + 1);
        record.id = Some(id);
        self.records()?.insert(id, record);
        Ok(id)
    }

    fn update(&self, record: AckRecord) -> Result<bool, RepositoryError> {
        let id = record.id.ok_or(RepositoryError::MissingId)?;
        let mut guard = self.records()?;
        match guard.get_mut(&id) {
            Some(slot) => {
                *slot = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn fetch(&self, id: InstanceId) -> Result<Option<AckRecord>, RepositoryError> {
        Ok(self.records()?.get(&id).cloned())
    }

    fn delete(&self, id: InstanceId) -> Result<(), RepositoryError> {
        self.records()?.remove(&id);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct StoredFile {
    pub(crate) filename: String,
    pub(crate) size: u64,
    pub(crate) mime: String,
}

impl StoredFile {
    pub(crate) fn new(filename: impl Into<String>, size: u64) -> Self {
        let filename = filename.into();
        let mime = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            filename,
            size,
            mime,
        }
    }
}

/// Draft and permanent file areas held in memory. Saving a draft enforces
/// the options it is given and replaces the target area.
#[derive(Default, Clone)]
pub(crate) struct InMemoryFileStore {
    drafts: Arc<Mutex<HashMap<DraftItemId, Vec<StoredFile>>>>,
    areas: Arc<Mutex<HashMap<FileArea, Vec<StoredFile>>>>,
    next_draft: Arc<AtomicU64>,
}

fn poisoned<T>(_: T) -> FileError {
    FileError::Storage("file store mutex poisoned".to_string())
}

impl InMemoryFileStore {
    pub(crate) fn stage_draft(&self, files: Vec<StoredFile>) -> Result<DraftItemId, FileError> {
        let draft = self.allocate_draft();
        self.drafts.lock().map_err(poisoned)?.insert(draft, files);
        Ok(draft)
    }

    pub(crate) fn area_files(&self, area: &FileArea) -> Result<Vec<StoredFile>, FileError> {
        Ok(self
            .areas
            .lock()
            .map_err(poisoned)?
            .get(area)
            .cloned()
            .unwrap_or_default())
    }

    fn allocate_draft(&self) -> DraftItemId {
        DraftItemId(self.next_draft.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl FileTransferService for InMemoryFileStore {
    fn module_context(&self, coursemodule: CourseModuleId) -> Result<ContextId, FileError> {
        if coursemodule.0 == 0 {
            return Err(FileError::ContextNotFound(coursemodule));
        }
        Ok(ContextId(MODULE_CONTEXT_OFFSET + coursemodule.0))
    }

    fn save_draft_area_files(
        &self,
        draft: DraftItemId,
        target: &FileArea,
        options: &FileOptions,
    ) -> Result<(), FileError> {
        let files = self
            .drafts
            .lock()
            .map_err(poisoned)?
            .get(&draft)
            .cloned()
            .ok_or(FileError::UnknownDraft(draft))?;

        if !options.allows_count(files.len()) {
            return Err(FileError::TooManyFiles {
                max: options.maxfiles,
                found: files.len(),
            });
        }
        for file in &files {
            if !options.accepts(&file.filename) {
                return Err(FileError::Rejected {
                    filename: file.filename.clone(),
                });
            }
            if !options.allows_size(file.size) {
                return Err(FileError::TooLarge {
                    filename: file.filename.clone(),
                    max: options.maxbytes,
                });
            }
        }

        self.areas
            .lock()
            .map_err(poisoned)?
            .insert(target.clone(), files);
        Ok(())
    }

    fn prepare_draft_area(
        &self,
        draft: Option<DraftItemId>,
        source: &FileArea,
        _options: &FileOptions,
    ) -> Result<DraftItemId, FileError> {
        let draft = draft.unwrap_or_else(|| self.allocate_draft());
        let files = self.area_files(source)?;
        self.drafts.lock().map_err(poisoned)?.insert(draft, files);
        Ok(draft)
    }
}

/// Guard that lets every request through. The service has no user sessions.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct OpenAccess;

impl AccessGuard for OpenAccess {
    fn require_login(
        &self,
        _course: CourseId,
        _coursemodule: CourseModuleId,
    ) -> Result<(), AccessDenied> {
        Ok(())
    }
}
