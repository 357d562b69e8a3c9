use axum::body::Body;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::db::PortalStore;
use crate::error::PortalError;
use crate::session::{CurrentSession, Role};
use crate::state::AppState;
use crate::storage::{download_name, resolve_stored_path, zip_files};

fn attachment(content_type: &str, filename: &str, content: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        Body::from(content),
    )
        .into_response()
}

fn file_not_found() -> PortalError {
    PortalError::NotFound("File not found.".to_string())
}

pub async fn download_file<S: PortalStore>(
    State(state): State<Arc<AppState<S>>>,
    session: CurrentSession,
    file_id: Result<Path<String>, PathRejection>,
) -> Result<Response, PortalError> {
    let pio = session.require(Role::Pio)?;
    let file_id = file_id
        .ok()
        .and_then(|Path(raw)| crate::routes::api::parse_id(Some(raw.as_str())))
        .ok_or_else(|| PortalError::Validation("Invalid or missing file ID".to_string()))?;

    let file = state
        .store
        .submission_file(file_id, pio.campus_id)
        .await
        .map_err(PortalError::persistence("Failed to fetch file."))?
        .ok_or_else(file_not_found)?;

    let path = resolve_stored_path(&state.config.upload_folder, &file.file_path).ok_or_else(|| {
        tracing::warn!(file_id, path = %file.file_path, "stored path escapes upload folder");
        file_not_found()
    })?;

    let content = tokio::fs::read(&path).await.map_err(|e| {
        tracing::error!("Failed to read {}: {}", path.display(), e);
        file_not_found()
    })?;

    let mime = mime_guess::from_path(&file.file_name)
        .first_raw()
        .unwrap_or("application/octet-stream");
    Ok(attachment(mime, &download_name(&file.file_name, ""), content))
}

pub async fn download_all<S: PortalStore>(
    State(state): State<Arc<AppState<S>>>,
    session: CurrentSession,
    submission_id: Result<Path<String>, PathRejection>,
) -> Result<Response, PortalError> {
    let pio = session.require(Role::Pio)?;
    let submission_id = submission_id
        .ok()
        .and_then(|Path(raw)| crate::routes::api::parse_id(Some(raw.as_str())))
        .ok_or_else(|| PortalError::Validation("Invalid or missing submission ID".to_string()))?;

    let submission = state
        .store
        .submission_detail(submission_id, pio.campus_id)
        .await
        .map_err(PortalError::persistence("Failed to fetch submission details."))?
        .ok_or_else(|| PortalError::NotFound("Submission not found.".to_string()))?;

    let files = state
        .store
        .submission_files(submission_id)
        .await
        .map_err(PortalError::persistence("Failed to fetch submission files."))?;

    let entries: Vec<_> = files
        .iter()
        .filter_map(|f| {
            let path = resolve_stored_path(&state.config.upload_folder, &f.file_path)?;
            let name = format!("{}/{}", download_name(&f.requirement_name, ""), download_name(&f.file_name, ""));
            Some((name, path))
        })
        .collect();

    let archive = tokio::task::spawn_blocking(move || zip_files(&entries))
        .await
        .map_err(|e| PortalError::Internal(format!("archive task failed: {e}")))?
        .map_err(|e| PortalError::Internal(format!("failed to build archive for submission {submission_id}: {e}")))?;

    let filename = download_name(&submission.reference_number, "_files.zip");
    Ok(attachment("application/zip", &filename, archive))
}
