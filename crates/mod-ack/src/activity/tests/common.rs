use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::activity::ack_router;
use crate::activity::domain::{
    AckRecord, AckSubmission, AckType, ContextId, CourseId, CourseModuleId, DraftItemId,
    EditorContent, InstanceId, TextFormat, UrlParameterPair,
};
use crate::activity::files::{
    AccessDenied, AccessGuard, FileArea, FileError, FileOptions, FileTransferService,
};
use crate::activity::repository::{AckRepository, RepositoryError};
use crate::activity::service::{AckModule, Clock};
use crate::config::ModuleConfig;

pub(super) const COURSE_MAXBYTES: u64 = 10_485_760;
pub(super) const NOW: i64 = 1_717_000_000;

pub(super) fn module_config() -> ModuleConfig {
    ModuleConfig {
        course_maxbytes: COURSE_MAXBYTES,
        ..ModuleConfig::default()
    }
}

pub(super) fn text_submission() -> AckSubmission {
    AckSubmission {
        course: CourseId(3),
        coursemodule: CourseModuleId(21),
        name: "Lab safety rules".to_string(),
        kind: AckType::Text,
        typetext: Some(EditorContent {
            text: "<p>Always wear goggles.</p>".to_string(),
            format: TextFormat::Html,
            itemid: Some(DraftItemId(501)),
        }),
        accepttext: Some("I will follow the lab rules".to_string()),
        ..AckSubmission::default()
    }
}

pub(super) fn file_submission() -> AckSubmission {
    AckSubmission {
        course: CourseId(3),
        coursemodule: CourseModuleId(22),
        name: "Employee handbook".to_string(),
        kind: AckType::File,
        typefile: Some(DraftItemId(777)),
        ..AckSubmission::default()
    }
}

pub(super) fn url_submission() -> AckSubmission {
    AckSubmission {
        course: CourseId(3),
        coursemodule: CourseModuleId(23),
        name: "Privacy notice".to_string(),
        kind: AckType::Url,
        typeurl: Some(" https://example.com/privacy ".to_string()),
        parameters: vec![
            UrlParameterPair::new("lang", "en"),
            UrlParameterPair::new("", "ignored"),
            UrlParameterPair::new("view", ""),
            UrlParameterPair::new("embed", "1"),
            UrlParameterPair::new("lang", "fr"),
        ],
        ..AckSubmission::default()
    }
}

pub(super) fn build_module() -> (
    AckModule<MemoryRepository, MemoryFiles>,
    Arc<MemoryRepository>,
    Arc<MemoryFiles>,
    Arc<FixedClock>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let files = Arc::new(MemoryFiles::default());
    let clock = Arc::new(FixedClock::new(NOW));
    let module = AckModule::with_clock(
        repository.clone(),
        files.clone(),
        module_config(),
        clock.clone(),
    );
    (module, repository, files, clock)
}

pub(super) fn router_with_module(
    module: AckModule<MemoryRepository, MemoryFiles>,
) -> axum::Router {
    ack_router(Arc::new(module), Arc::new(AllowAccess))
}

pub(super) struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub(super) fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub(super) fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    pub(super) records: Mutex<HashMap<InstanceId, AckRecord>>,
    sequence: AtomicU64,
}

impl MemoryRepository {
    pub(super) fn stored(&self, id: InstanceId) -> Option<AckRecord> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&id)
            .cloned()
    }

    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl AckRepository for MemoryRepository {
    fn insert(&self, mut record: AckRecord) -> Result<InstanceId, RepositoryError> {
        let id = InstanceId(self.sequence.fetch_add(1, Ordering::SeqCst) + 1);
        record.id = Some(id);
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(id, record);
        Ok(id)
    }

    fn update(&self, record: AckRecord) -> Result<bool, RepositoryError> {
        let id = record.id.ok_or(RepositoryError::MissingId)?;
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&id) {
            Some(slot) => {
                *slot = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn fetch(&self, id: InstanceId) -> Result<Option<AckRecord>, RepositoryError> {
        Ok(self.stored(id))
    }

    fn delete(&self, id: InstanceId) -> Result<(), RepositoryError> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .remove(&id);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl AckRepository for UnavailableRepository {
    fn insert(&self, _record: AckRecord) -> Result<InstanceId, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: AckRecord) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: InstanceId) -> Result<Option<AckRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: InstanceId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Repository whose rows vanish between the existence check and the write.
#[derive(Default)]
pub(super) struct VanishingRepository {
    inner: MemoryRepository,
}

impl AckRepository for VanishingRepository {
    fn insert(&self, record: AckRecord) -> Result<InstanceId, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, _record: AckRecord) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    fn fetch(&self, id: InstanceId) -> Result<Option<AckRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn delete(&self, id: InstanceId) -> Result<(), RepositoryError> {
        self.inner.delete(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SavedDraft {
    pub(super) draft: DraftItemId,
    pub(super) target: FileArea,
    pub(super) options: FileOptions,
}

#[derive(Default)]
pub(super) struct MemoryFiles {
    saved: Mutex<Vec<SavedDraft>>,
    prepared: Mutex<Vec<FileArea>>,
    next_draft: AtomicU64,
}

impl MemoryFiles {
    pub(super) fn saved(&self) -> Vec<SavedDraft> {
        self.saved.lock().expect("files mutex poisoned").clone()
    }

    pub(super) fn prepared(&self) -> Vec<FileArea> {
        self.prepared.lock().expect("files mutex poisoned").clone()
    }
}

pub(super) fn context_for(coursemodule: CourseModuleId) -> ContextId {
    ContextId(1000 + coursemodule.0)
}

impl FileTransferService for MemoryFiles {
    fn module_context(&self, coursemodule: CourseModuleId) -> Result<ContextId, FileError> {
        Ok(context_for(coursemodule))
    }

    fn save_draft_area_files(
        &self,
        draft: DraftItemId,
        target: &FileArea,
        options: &FileOptions,
    ) -> Result<(), FileError> {
        self.saved
            .lock()
            .expect("files mutex poisoned")
            .push(SavedDraft {
                draft,
                target: target.clone(),
                options: options.clone(),
            });
        Ok(())
    }

    fn prepare_draft_area(
        &self,
        draft: Option<DraftItemId>,
        source: &FileArea,
        _options: &FileOptions,
    ) -> Result<DraftItemId, FileError> {
        self.prepared
            .lock()
            .expect("files mutex poisoned")
            .push(source.clone());
        Ok(draft.unwrap_or_else(|| {
            DraftItemId(9000 + self.next_draft.fetch_add(1, Ordering::SeqCst))
        }))
    }
}

pub(super) struct FailingFiles;

impl FileTransferService for FailingFiles {
    fn module_context(&self, coursemodule: CourseModuleId) -> Result<ContextId, FileError> {
        Ok(context_for(coursemodule))
    }

    fn save_draft_area_files(
        &self,
        _draft: DraftItemId,
        _target: &FileArea,
        _options: &FileOptions,
    ) -> Result<(), FileError> {
        Err(FileError::Storage("file pool offline".to_string()))
    }

    fn prepare_draft_area(
        &self,
        _draft: Option<DraftItemId>,
        _source: &FileArea,
        _options: &FileOptions,
    ) -> Result<DraftItemId, FileError> {
        Err(FileError::Storage("file pool offline".to_string()))
    }
}

pub(super) struct AllowAccess;

impl AccessGuard for AllowAccess {
    fn require_login(
        &self,
        _course: CourseId,
        _coursemodule: CourseModuleId,
    ) -> Result<(), AccessDenied> {
        Ok(())
    }
}

pub(super) struct DenyAccess;

impl AccessGuard for DenyAccess {
    fn require_login(
        &self,
        _course: CourseId,
        _coursemodule: CourseModuleId,
    ) -> Result<(), AccessDenied> {
        Err(AccessDenied {
            reason: "not enrolled".to_string(),
        })
    }
}

pub(super) fn parameters_of(record: &AckRecord) -> BTreeMap<String, String> {
    match &record.content {
        crate::activity::AckContent::Url { parameters, .. } => parameters
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        other => panic!("expected url content, got {other:?}"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
