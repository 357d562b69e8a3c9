use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::session::Role;
use crate::workflow::SubmissionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Publication,
    Innovation,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown submission type `{0}`")]
pub struct UnknownSubmissionKind(pub String);

impl TryFrom<String> for SubmissionKind {
    type Error = UnknownSubmissionKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "publication" => Ok(SubmissionKind::Publication),
            "innovation" => Ok(SubmissionKind::Innovation),
            _ => Err(UnknownSubmissionKind(value)),
        }
    }
}

/// Payment flag on a submission review. Either value may follow the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment status `{0}`")]
pub struct UnknownPaymentStatus(pub String);

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Paid" => Ok(PaymentStatus::Paid),
            other => Err(UnknownPaymentStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ResearcherSummary {
    pub user_id: i32,
    pub name: String,
    pub email: String,
}

/// One submission joined with its people, places and sub-type names.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRecord {
    pub submission_id: i32,
    pub reference_number: String,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub submission_type: SubmissionKind,
    #[sqlx(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub file_path: Option<String>,
    pub submission_date: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub researcher_id: i32,
    pub researcher_name: String,
    pub researcher_email: String,
    pub department_id: i32,
    pub department_name: String,
    pub campus_id: i32,
    pub campus_name: String,
    pub publication_type_id: Option<i32>,
    pub publication_type_name: Option<String>,
    pub innovation_type_id: Option<i32>,
    pub innovation_type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionDetail {
    pub submission_id: i32,
    pub reference_number: String,
    pub title: String,
    pub submission_type: SubmissionKind,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub file_path: Option<String>,
    pub submission_date: DateTime<Utc>,
    pub status: SubmissionStatus,
    pub researcher_id: i32,
    pub researcher_name: String,
    pub researcher_email: String,
    pub department_id: i32,
    pub department_name: String,
    pub campus_id: i32,
    pub campus_name: String,
    pub publication_type_id: Option<i32>,
    pub innovation_type_id: Option<i32>,
    pub submission_type_name: String,
}

/// Picks the sub-type name that belongs to the submission's type, or `N/A`.
pub fn resolve_type_name(
    kind: SubmissionKind,
    publication_type_name: Option<&str>,
    innovation_type_name: Option<&str>,
) -> String {
    let matched = match kind {
        SubmissionKind::Publication => publication_type_name,
        SubmissionKind::Innovation => innovation_type_name,
    };
    matched.unwrap_or("N/A").to_string()
}

impl From<SubmissionRecord> for SubmissionDetail {
    fn from(r: SubmissionRecord) -> Self {
        let submission_type_name = resolve_type_name(
            r.submission_type,
            r.publication_type_name.as_deref(),
            r.innovation_type_name.as_deref(),
        );
        Self {
            submission_id: r.submission_id,
            reference_number: r.reference_number,
            title: r.title,
            submission_type: r.submission_type,
            abstract_text: r.abstract_text,
            file_path: r.file_path,
            submission_date: r.submission_date,
            status: r.status,
            researcher_id: r.researcher_id,
            researcher_name: r.researcher_name,
            researcher_email: r.researcher_email,
            department_id: r.department_id,
            department_name: r.department_name,
            campus_id: r.campus_id,
            campus_name: r.campus_name,
            publication_type_id: r.publication_type_id,
            innovation_type_id: r.innovation_type_id,
            submission_type_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SubmissionFileEntry {
    pub file_id: i32,
    pub file_name: String,
    pub file_path: String,
    pub requirement_name: String,
    pub requirement_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SubmissionSummary {
    pub submission_id: i32,
    pub reference_number: String,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub submission_type: SubmissionKind,
    pub researcher_name: String,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub submission_date: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub user_id: i32,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub campus_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentChange {
    pub submission_id: i32,
    pub campus_id: i32,
    pub payment_status: PaymentStatus,
    pub actor_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub submission_id: i32,
    pub campus_id: i32,
    pub target: SubmissionStatus,
    pub actor_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    PaymentStatusUpdated,
    SubmissionStatusChanged,
}

impl ActivityAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityAction::PaymentStatusUpdated => "update_payment_status",
            ActivityAction::SubmissionStatusChanged => "update_submission_status",
        }
    }
}

/// An audit row about to be appended to `activity_logs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub user_id: i32,
    pub action: ActivityAction,
    pub submission_id: i32,
    pub details: String,
}

impl ActivityEntry {
    pub fn payment(change: &PaymentChange) -> Self {
        Self {
            user_id: change.actor_id,
            action: ActivityAction::PaymentStatusUpdated,
            submission_id: change.submission_id,
            details: format!(
                "Payment status of submission #{} set to {}",
                change.submission_id, change.payment_status
            ),
        }
    }

    pub fn status(change: &StatusChange, previous: SubmissionStatus) -> Self {
        Self {
            user_id: change.actor_id,
            action: ActivityAction::SubmissionStatusChanged,
            submission_id: change.submission_id,
            details: format!(
                "Status of submission #{} changed from {} to {}",
                change.submission_id, previous, change.target
            ),
        }
    }
}
