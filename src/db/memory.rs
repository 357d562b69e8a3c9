//! In-memory `PortalStore` for handler tests, with switches to force
//! failures at specific steps.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::*;
use crate::config::Config;
use crate::session::Role;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub user_id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub department_id: Option<i32>,
    pub campus_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct FileRow {
    pub submission_id: i32,
    pub entry: SubmissionFileEntry,
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub users: Vec<UserRow>,
    pub sessions: HashMap<Uuid, i32>,
    pub submissions: Vec<SubmissionDetail>,
    pub files: Vec<FileRow>,
    pub reviews: HashMap<i32, PaymentStatus>,
    pub activity: Vec<ActivityEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pub fail_reads: AtomicBool,
    pub fail_files: AtomicBool,
    pub fail_log_insert: AtomicBool,
    reads: std::sync::atomic::AtomicUsize,
}

fn forced(step: &str) -> StoreError {
    StoreError::Database(sqlx::Error::Protocol(format!("forced failure at {step}")))
}

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Tables {
        self.tables.lock().unwrap().clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn add_user(&self, user_id: i32, name: &str, role: Role, department_id: i32, campus_id: i32) {
        self.tables.lock().unwrap().users.push(UserRow {
            user_id,
            name: name.to_string(),
            username: name.to_lowercase().replace(' ', "."),
            email: format!("{}@univ.test", name.to_lowercase().replace(' ', ".")),
            role,
            department_id: Some(department_id),
            campus_id: Some(campus_id),
        });
    }

    pub fn add_session(&self, user_id: i32) -> Uuid {
        let token = Uuid::new_v4();
        self.tables.lock().unwrap().sessions.insert(token, user_id);
        token
    }

    /// Adds a publication submission with a pending review row.
    pub fn add_submission(&self, submission_id: i32, campus_id: i32, status: SubmissionStatus) {
        let mut tables = self.tables.lock().unwrap();
        tables.submissions.push(SubmissionDetail {
            submission_id,
            reference_number: format!("PUB-2024-{submission_id:04}"),
            title: format!("Study {submission_id}"),
            submission_type: SubmissionKind::Publication,
            abstract_text: Some("Abstract".to_string()),
            file_path: Some(format!("submissions/{submission_id}/manuscript.pdf")),
            submission_date: at(submission_id as u32 % 28 + 1),
            status,
            researcher_id: 100,
            researcher_name: "Ana Cruz".to_string(),
            researcher_email: "ana.cruz@univ.test".to_string(),
            department_id: 3,
            department_name: "Biology".to_string(),
            campus_id,
            campus_name: format!("Campus {campus_id}"),
            publication_type_id: Some(1),
            innovation_type_id: None,
            submission_type_name: "Journal Article".to_string(),
        });
        tables.reviews.insert(submission_id, PaymentStatus::Pending);
    }

    pub fn add_file(&self, submission_id: i32, file_id: i32, requirement: &str, file_path: &str) {
        self.tables.lock().unwrap().files.push(FileRow {
            submission_id,
            entry: SubmissionFileEntry {
                file_id,
                file_name: file_path.rsplit('/').next().unwrap_or(file_path).to_string(),
                file_path: file_path.to_string(),
                requirement_name: requirement.to_string(),
                requirement_description: Some(format!("{requirement} document")),
            },
        });
    }

    pub fn remove_review(&self, submission_id: i32) {
        self.tables.lock().unwrap().reviews.remove(&submission_id);
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(forced("read"));
        }
        Ok(())
    }

    fn append_log(&self, tables: &mut Tables, entry: ActivityEntry) -> Result<(), StoreError> {
        if self.fail_log_insert.load(Ordering::SeqCst) {
            return Err(forced("activity log insert"));
        }
        tables.activity.push(entry);
        Ok(())
    }
}

impl PortalStore for MemoryStore {
    async fn find_session(&self, token: Uuid) -> Result<Option<SessionRecord>, StoreError> {
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        let record = tables.sessions.get(&token).and_then(|user_id| {
            tables
                .users
                .iter()
                .find(|u| u.user_id == *user_id)
                .map(|u| SessionRecord {
                    user_id: u.user_id,
                    username: u.username.clone(),
                    role: u.role,
                    campus_id: u.campus_id,
                })
        });
        Ok(record)
    }

    async fn researchers_in_department(
        &self,
        department_id: i32,
        campus_id: i32,
    ) -> Result<Vec<ResearcherSummary>, StoreError> {
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<ResearcherSummary> = tables
            .users
            .iter()
            .filter(|u| {
                u.role == Role::Researcher
                    && u.department_id == Some(department_id)
                    && u.campus_id == Some(campus_id)
            })
            .map(|u| ResearcherSummary {
                user_id: u.user_id,
                name: u.name.clone(),
                email: u.email.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn submission_detail(
        &self,
        submission_id: i32,
        campus_id: i32,
    ) -> Result<Option<SubmissionDetail>, StoreError> {
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .submissions
            .iter()
            .find(|s| s.submission_id == submission_id && s.campus_id == campus_id)
            .cloned())
    }

    async fn submission_files(
        &self,
        submission_id: i32,
    ) -> Result<Vec<SubmissionFileEntry>, StoreError> {
        if self.fail_files.load(Ordering::SeqCst) {
            return Err(forced("files query"));
        }
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<SubmissionFileEntry> = tables
            .files
            .iter()
            .filter(|f| f.submission_id == submission_id)
            .map(|f| f.entry.clone())
            .collect();
        rows.sort_by(|a, b| a.requirement_name.cmp(&b.requirement_name));
        Ok(rows)
    }

    async fn submission_file(
        &self,
        file_id: i32,
        campus_id: i32,
    ) -> Result<Option<SubmissionFileEntry>, StoreError> {
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .files
            .iter()
            .find(|f| {
                f.entry.file_id == file_id
                    && tables
                        .submissions
                        .iter()
                        .any(|s| s.submission_id == f.submission_id && s.campus_id == campus_id)
            })
            .map(|f| f.entry.clone()))
    }

    async fn campus_submissions(
        &self,
        campus_id: i32,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<SubmissionSummary>, StoreError> {
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<SubmissionSummary> = tables
            .submissions
            .iter()
            .filter(|s| s.campus_id == campus_id && status.map_or(true, |st| s.status == st))
            .map(|s| SubmissionSummary {
                submission_id: s.submission_id,
                reference_number: s.reference_number.clone(),
                title: s.title.clone(),
                submission_type: s.submission_type,
                researcher_name: s.researcher_name.clone(),
                status: s.status,
                submission_date: s.submission_date,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.submission_date
                .cmp(&a.submission_date)
                .then(b.submission_id.cmp(&a.submission_id))
        });
        Ok(rows)
    }

    async fn update_payment_status(&self, change: PaymentChange) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        // work on a copy so a failed step leaves nothing behind
        let mut tx = tables.clone();

        let in_campus = tx
            .submissions
            .iter()
            .any(|s| s.submission_id == change.submission_id && s.campus_id == change.campus_id);
        let review = tx
            .reviews
            .get_mut(&change.submission_id)
            .filter(|_| in_campus)
            .ok_or(StoreError::NotFound)?;
        *review = change.payment_status;

        self.append_log(&mut tx, ActivityEntry::payment(&change))?;
        *tables = tx;
        Ok(())
    }

    async fn change_submission_status(
        &self,
        change: StatusChange,
    ) -> Result<SubmissionStatus, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let mut tx = tables.clone();

        let submission = tx
            .submissions
            .iter_mut()
            .find(|s| s.submission_id == change.submission_id && s.campus_id == change.campus_id)
            .ok_or(StoreError::NotFound)?;
        let current = submission.status;
        if !current.can_transition_to(change.target) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: change.target,
            });
        }
        submission.status = change.target;

        self.append_log(&mut tx, ActivityEntry::status(&change, current))?;
        *tables = tx;
        Ok(current)
    }
}

pub fn test_config(upload_folder: std::path::PathBuf) -> Config {
    Config {
        database_url: "postgres://localhost/unused".to_string(),
        database_max_connections: 1,
        upload_folder,
        session_cookie: "portal_session".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}

pub fn test_state(store: MemoryStore) -> Arc<AppState<MemoryStore>> {
    test_state_with_uploads(store, std::env::temp_dir())
}

pub fn test_state_with_uploads(
    store: MemoryStore,
    upload_folder: std::path::PathBuf,
) -> Arc<AppState<MemoryStore>> {
    Arc::new(AppState {
        store,
        config: Arc::new(test_config(upload_folder)),
        tera: Arc::new(crate::templates::build_tera().unwrap()),
    })
}

pub async fn read_json(response: axum::response::Response) -> (axum::http::StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
