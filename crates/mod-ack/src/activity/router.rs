use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AckSubmission, ContextId, CourseId, CourseModuleId, InstanceId};
use super::features::{ack_supports, Feature};
use super::files::{
    ack_pluginfile, AccessGuard, ContextLevel, FileContext, FileError, FileServeError,
    FileTransferService, PluginFileRequest,
};
use super::form::AckForm;
use super::repository::{AckRepository, RepositoryError};
use super::service::{AckModule, AckServiceError};
use super::url::validate_url;

/// Shared state of the activity routes.
pub struct AckApi<R, F> {
    pub module: Arc<AckModule<R, F>>,
    pub guard: Arc<dyn AccessGuard>,
}

impl<R, F> Clone for AckApi<R, F> {
    fn clone(&self) -> Self {
        Self {
            module: Arc::clone(&self.module),
            guard: Arc::clone(&self.guard),
        }
    }
}

/// Router builder exposing the instance lifecycle and form endpoints.
pub fn ack_router<R, F>(module: Arc<AckModule<R, F>>, guard: Arc<dyn AccessGuard>) -> Router
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    Router::new()
        .route("/api/v1/ack/instances", post(add_handler::<R, F>))
        .route(
            "/api/v1/ack/instances/:instance_id",
            get(get_handler::<R, F>)
                .put(update_handler::<R, F>)
                .delete(delete_handler::<R, F>),
        )
        .route(
            "/api/v1/ack/instances/:instance_id/edit",
            get(edit_handler::<R, F>),
        )
        .route("/api/v1/ack/form", get(form_handler::<R, F>))
        .route("/api/v1/ack/url/validate", post(validate_url_handler::<R, F>))
        .route("/api/v1/ack/supports/:feature", get(supports_handler))
        .route(
            "/api/v1/ack/pluginfile/:context_id/:context_level/:course/:coursemodule/:filearea/*args",
            get(pluginfile_handler::<R, F>),
        )
        .with_state(AckApi { module, guard })
}

pub(crate) async fn add_handler<R, F>(
    State(api): State<AckApi<R, F>>,
    axum::Json(submission): axum::Json<AckSubmission>,
) -> Response
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    if let Some(response) = reject_invalid(&api, &submission) {
        return response;
    }

    match api.module.add_instance(submission) {
        Ok(id) => (StatusCode::CREATED, axum::Json(json!({ "id": id }))).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn update_handler<R, F>(
    State(api): State<AckApi<R, F>>,
    Path(instance_id): Path<u64>,
    axum::Json(mut submission): axum::Json<AckSubmission>,
) -> Response
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    submission.instance = Some(InstanceId(instance_id));
    if let Some(response) = reject_invalid(&api, &submission) {
        return response;
    }

    match api.module.update_instance(submission) {
        Ok(true) => (
            StatusCode::OK,
            axum::Json(json!({ "id": instance_id, "updated": true })),
        )
            .into_response(),
        Ok(false) => not_found(instance_id),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn get_handler<R, F>(
    State(api): State<AckApi<R, F>>,
    Path(instance_id): Path<u64>,
) -> Response
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    match api.module.get_instance(InstanceId(instance_id)) {
        Ok(Some(record)) => (StatusCode::OK, axum::Json(record)).into_response(),
        Ok(None) => not_found(instance_id),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn edit_handler<R, F>(
    State(api): State<AckApi<R, F>>,
    Path(instance_id): Path<u64>,
) -> Response
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    match api.module.prepare_edit_submission(InstanceId(instance_id)) {
        Ok(Some(submission)) => (StatusCode::OK, axum::Json(submission)).into_response(),
        Ok(None) => not_found(instance_id),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn delete_handler<R, F>(
    State(api): State<AckApi<R, F>>,
    Path(instance_id): Path<u64>,
) -> Response
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    match api.module.delete_instance(InstanceId(instance_id)) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found(instance_id),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn form_handler<R, F>(State(api): State<AckApi<R, F>>) -> Response
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    let form = AckForm::new(api.module.strings(), api.module.config());
    (StatusCode::OK, axum::Json(form.definition())).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct UrlCheckRequest {
    url: String,
}

pub(crate) async fn validate_url_handler<R, F>(
    State(api): State<AckApi<R, F>>,
    axum::Json(request): axum::Json<UrlCheckRequest>,
) -> Response
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    let error = validate_url(request.url.trim(), api.module.strings());
    let payload = json!({
        "valid": error.is_none(),
        "error": error,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn supports_handler(Path(feature): Path<String>) -> Response {
    let feature = Feature::from_name(&feature);
    let payload = json!({
        "feature": feature.name(),
        "supported": ack_supports(&feature),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn pluginfile_handler<R, F>(
    State(api): State<AckApi<R, F>>,
    Path((context_id, context_level, course, coursemodule, filearea, args)): Path<(
        u64,
        u16,
        u64,
        u64,
        String,
        String,
    )>,
) -> Response
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    let Some(level) = ContextLevel::from_code(context_level) else {
        return file_not_found();
    };
    let context = FileContext {
        id: ContextId(context_id),
        level,
    };
    let request = PluginFileRequest {
        course: CourseId(course),
        coursemodule: CourseModuleId(coursemodule),
        area: filearea,
        args: args
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect(),
        forcedownload: false,
    };

    match ack_pluginfile(api.guard.as_ref(), &context, &request) {
        FileServeError::NotFound => file_not_found(),
        FileServeError::AccessDenied(denied) => {
            let payload = json!({ "error": denied.to_string() });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
    }
}

fn reject_invalid<R, F>(api: &AckApi<R, F>, submission: &AckSubmission) -> Option<Response>
where
    R: AckRepository + 'static,
    F: FileTransferService + 'static,
{
    let form = AckForm::new(api.module.strings(), api.module.config());
    let errors = form.validate(submission);
    if errors.is_empty() {
        return None;
    }
    let payload = json!({ "errors": errors });
    Some((StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response())
}

fn not_found(instance_id: u64) -> Response {
    let payload = json!({
        "error": "acknowledgement instance not found",
        "id": instance_id,
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn file_not_found() -> Response {
    let payload = json!({ "error": "file not found" });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

pub(crate) fn service_error_status(err: &AckServiceError) -> StatusCode {
    match err {
        AckServiceError::MissingInstanceReference => StatusCode::BAD_REQUEST,
        AckServiceError::Repository(RepositoryError::Constraint(_)) => StatusCode::CONFLICT,
        AckServiceError::Files(FileError::ContextNotFound(_)) => StatusCode::NOT_FOUND,
        AckServiceError::Files(
            FileError::UnknownDraft(_)
            | FileError::Rejected { .. }
            | FileError::TooManyFiles { .. }
            | FileError::TooLarge { .. },
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        AckServiceError::Repository(_) | AckServiceError::Files(FileError::Storage(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn service_error_response(err: AckServiceError) -> Response {
    let status = service_error_status(&err);
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
