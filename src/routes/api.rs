use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Form;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{
    PaymentChange, PaymentStatus, PortalStore, ResearcherSummary, StatusChange, SubmissionDetail,
    SubmissionFileEntry, SubmissionSummary,
};
use crate::error::{ApiSuccess, NoData, PortalError, StoreError};
use crate::session::{CurrentSession, Role};
use crate::state::AppState;
use crate::workflow::SubmissionStatus;

/// Positive integer parameter, surrounding whitespace tolerated.
pub(crate) fn parse_id(raw: Option<&str>) -> Option<i32> {
    raw?.trim().parse::<i32>().ok().filter(|id| *id > 0)
}

/// Unwraps query parameters once the caller is known. A query string that
/// does not deserialize is a validation failure like any other bad input.
pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, PortalError> {
    query.map(|Query(params)| params).map_err(|e| {
        tracing::debug!("Rejected query string: {}", e.body_text());
        PortalError::Validation("Invalid query string.".to_string())
    })
}

pub(crate) fn parse_status_filter(raw: Option<&str>) -> Result<Option<SubmissionStatus>, PortalError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| PortalError::Validation("Invalid status filter.".to_string())),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DepartmentQuery {
    pub department_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResearchersData {
    pub researchers: Vec<ResearcherSummary>,
}

pub async fn researchers<S: PortalStore>(
    State(state): State<Arc<AppState<S>>>,
    session: CurrentSession,
    params: Result<Query<DepartmentQuery>, QueryRejection>,
) -> Result<ApiSuccess<ResearchersData>, PortalError> {
    let pio = session.require(Role::Pio)?;
    let params = query_params(params)?;
    let department_id = parse_id(params.department_id.as_deref())
        .ok_or_else(|| PortalError::Validation("Invalid or missing department ID".to_string()))?;

    let researchers = state
        .store
        .researchers_in_department(department_id, pio.campus_id)
        .await
        .map_err(PortalError::persistence("Failed to fetch researchers."))?;

    Ok(ApiSuccess::new(
        "Researchers retrieved successfully.",
        ResearchersData { researchers },
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmissionQuery {
    pub submission_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionDetailData {
    pub submission: SubmissionDetail,
    pub submission_files: Vec<SubmissionFileEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_warning: Option<String>,
}

pub async fn submission_detail<S: PortalStore>(
    State(state): State<Arc<AppState<S>>>,
    session: CurrentSession,
    params: Result<Query<SubmissionQuery>, QueryRejection>,
) -> Result<ApiSuccess<SubmissionDetailData>, PortalError> {
    let pio = session.require(Role::Pio)?;
    let params = query_params(params)?;
    let submission_id = parse_id(params.submission_id.as_deref())
        .ok_or_else(|| PortalError::Validation("Invalid or missing submission ID".to_string()))?;

    let submission = state
        .store
        .submission_detail(submission_id, pio.campus_id)
        .await
        .map_err(PortalError::persistence("Failed to fetch submission details."))?
        .ok_or_else(|| PortalError::NotFound("Submission not found.".to_string()))?;

    // the submission itself is what was asked for; missing files only warn
    let (submission_files, files_warning) = match state.store.submission_files(submission_id).await {
        Ok(files) => (files, None),
        Err(e) => {
            tracing::error!(submission_id, "Failed to fetch submission files: {:?}", e);
            (
                Vec::new(),
                Some("Submission files could not be loaded.".to_string()),
            )
        }
    };

    Ok(ApiSuccess::new(
        "Submission details retrieved successfully.",
        SubmissionDetailData {
            submission,
            submission_files,
            files_warning,
        },
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentForm {
    pub submission_id: Option<String>,
    pub payment_status: Option<String>,
}

pub async fn update_payment_status<S: PortalStore>(
    State(state): State<Arc<AppState<S>>>,
    session: CurrentSession,
    form: Result<Form<PaymentForm>, FormRejection>,
) -> Result<ApiSuccess<NoData>, PortalError> {
    let pio = session.require(Role::Pio)?;
    let Form(form) = form.map_err(|e| PortalError::Validation(format!("Invalid request body: {}", e.body_text())))?;

    let submission_id = parse_id(form.submission_id.as_deref())
        .ok_or_else(|| PortalError::Validation("Invalid or missing submission ID".to_string()))?;
    let payment_status: PaymentStatus = form
        .payment_status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| PortalError::Validation("Invalid payment status. Must be Pending or Paid.".to_string()))?;

    let change = PaymentChange {
        submission_id,
        campus_id: pio.campus_id,
        payment_status,
        actor_id: pio.user_id,
    };

    match state.store.update_payment_status(change).await {
        Ok(()) => {}
        Err(StoreError::NotFound) => {
            return Err(PortalError::NotFound("Submission review not found.".to_string()))
        }
        Err(e) => return Err(PortalError::persistence("Failed to update payment status.")(e)),
    }

    tracing::info!(
        user_id = pio.user_id,
        submission_id,
        payment_status = payment_status.as_str(),
        "payment status updated"
    );
    Ok(ApiSuccess::new("Payment status updated successfully.", NoData {}))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusForm {
    pub submission_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusChangeData {
    pub previous_status: SubmissionStatus,
    pub status: SubmissionStatus,
}

pub async fn update_submission_status<S: PortalStore>(
    State(state): State<Arc<AppState<S>>>,
    session: CurrentSession,
    form: Result<Form<StatusForm>, FormRejection>,
) -> Result<ApiSuccess<StatusChangeData>, PortalError> {
    let pio = session.require(Role::Pio)?;
    let Form(form) = form.map_err(|e| PortalError::Validation(format!("Invalid request body: {}", e.body_text())))?;

    let submission_id = parse_id(form.submission_id.as_deref())
        .ok_or_else(|| PortalError::Validation("Invalid or missing submission ID".to_string()))?;
    let target: SubmissionStatus = form
        .status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| PortalError::Validation("Invalid submission status.".to_string()))?;

    let change = StatusChange {
        submission_id,
        campus_id: pio.campus_id,
        target,
        actor_id: pio.user_id,
    };

    let previous = match state.store.change_submission_status(change).await {
        Ok(previous) => previous,
        Err(StoreError::NotFound) => {
            return Err(PortalError::NotFound("Submission not found.".to_string()))
        }
        Err(StoreError::InvalidTransition { from, to }) => {
            return Err(PortalError::Conflict(format!(
                "A submission that is {} cannot be moved to {}.",
                from.label(),
                to.label()
            )))
        }
        Err(e) => return Err(PortalError::persistence("Failed to update submission status.")(e)),
    };

    tracing::info!(
        user_id = pio.user_id,
        submission_id,
        from = previous.as_str(),
        to = target.as_str(),
        "submission status changed"
    );
    Ok(ApiSuccess::new(
        format!("Submission status updated to {}.", target.label()),
        StatusChangeData {
            previous_status: previous,
            status: target,
        },
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusFilterQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListedSubmission {
    #[serde(flatten)]
    pub summary: SubmissionSummary,
    pub status_label: &'static str,
}

impl From<SubmissionSummary> for ListedSubmission {
    fn from(summary: SubmissionSummary) -> Self {
        let status_label = summary.status.label();
        Self {
            summary,
            status_label,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionListData {
    pub submissions: Vec<ListedSubmission>,
}

pub async fn list_submissions<S: PortalStore>(
    State(state): State<Arc<AppState<S>>>,
    session: CurrentSession,
    params: Result<Query<StatusFilterQuery>, QueryRejection>,
) -> Result<ApiSuccess<SubmissionListData>, PortalError> {
    let pio = session.require(Role::Pio)?;
    let params = query_params(params)?;
    let status = parse_status_filter(params.status.as_deref())?;

    let submissions = state
        .store
        .campus_submissions(pio.campus_id, status)
        .await
        .map_err(PortalError::persistence("Failed to fetch submissions."))?
        .into_iter()
        .map(ListedSubmission::from)
        .collect();

    Ok(ApiSuccess::new(
        "Submissions retrieved successfully.",
        SubmissionListData { submissions },
    ))
}

pub async fn method_not_allowed() -> PortalError {
    PortalError::MethodNotAllowed
}
