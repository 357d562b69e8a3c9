mod models;
#[cfg(test)]
pub mod memory;

pub use models::*;

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::workflow::SubmissionStatus;

pub type DbPool = Arc<PgPool>;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Everything the portal reads from or writes to durable storage.
///
/// Reads that take a `campus_id` never return rows from another campus; such
/// rows are indistinguishable from missing ones. Writes are all-or-nothing:
/// the row change and its audit entry commit together or not at all.
pub trait PortalStore: Send + Sync + 'static {
    /// Live session for `token` joined with its user.
    fn find_session(
        &self,
        token: Uuid,
    ) -> impl Future<Output = Result<Option<SessionRecord>, StoreError>> + Send;

    /// Researchers of a department within a campus, by name ascending.
    fn researchers_in_department(
        &self,
        department_id: i32,
        campus_id: i32,
    ) -> impl Future<Output = Result<Vec<ResearcherSummary>, StoreError>> + Send;

    fn submission_detail(
        &self,
        submission_id: i32,
        campus_id: i32,
    ) -> impl Future<Output = Result<Option<SubmissionDetail>, StoreError>> + Send;

    /// Required files attached to a submission, by requirement name.
    fn submission_files(
        &self,
        submission_id: i32,
    ) -> impl Future<Output = Result<Vec<SubmissionFileEntry>, StoreError>> + Send;

    fn submission_file(
        &self,
        file_id: i32,
        campus_id: i32,
    ) -> impl Future<Output = Result<Option<SubmissionFileEntry>, StoreError>> + Send;

    /// Campus submissions, newest first, optionally narrowed to one status.
    fn campus_submissions(
        &self,
        campus_id: i32,
        status: Option<SubmissionStatus>,
    ) -> impl Future<Output = Result<Vec<SubmissionSummary>, StoreError>> + Send;

    fn update_payment_status(
        &self,
        change: PaymentChange,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Moves a submission along the workflow, returning the status it left.
    fn change_submission_status(
        &self,
        change: StatusChange,
    ) -> impl Future<Output = Result<SubmissionStatus, StoreError>> + Send;
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn insert_activity(
    tx: &mut Transaction<'_, Postgres>,
    entry: &ActivityEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO activity_logs (user_id, action, entity_type, entity_id, details)
        VALUES ($1, $2, 'submission', $3, $4)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.action.as_str())
    .bind(entry.submission_id)
    .bind(&entry.details)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

impl PortalStore for PgStore {
    async fn find_session(&self, token: Uuid) -> Result<Option<SessionRecord>, StoreError> {
        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT u.user_id, u.username, u.role, u.campus_id
            FROM sessions s
            JOIN users u ON u.user_id = s.user_id
            WHERE s.token = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(record)
    }

    async fn researchers_in_department(
        &self,
        department_id: i32,
        campus_id: i32,
    ) -> Result<Vec<ResearcherSummary>, StoreError> {
        let rows = sqlx::query_as::<_, ResearcherSummary>(
            r#"
            SELECT user_id, name, email
            FROM users
            WHERE role = 'researcher' AND department_id = $1 AND campus_id = $2
            ORDER BY name ASC
            "#,
        )
        .bind(department_id)
        .bind(campus_id)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(rows)
    }

    async fn submission_detail(
        &self,
        submission_id: i32,
        campus_id: i32,
    ) -> Result<Option<SubmissionDetail>, StoreError> {
        let record = sqlx::query_as::<_, SubmissionRecord>(
            r#"
            SELECT s.submission_id, s.reference_number, s.title, s.submission_type, s.abstract,
                   s.file_path, s.submission_date, s.status,
                   s.researcher_id, u.name AS researcher_name, u.email AS researcher_email,
                   s.department_id, d.department_name,
                   s.campus_id, c.campus_name,
                   s.publication_type_id, pt.type_name AS publication_type_name,
                   s.innovation_type_id, it.type_name AS innovation_type_name
            FROM submissions s
            JOIN users u ON u.user_id = s.researcher_id
            JOIN departments d ON d.department_id = s.department_id
            JOIN campuses c ON c.campus_id = s.campus_id
            LEFT JOIN publication_types pt ON pt.publication_type_id = s.publication_type_id
            LEFT JOIN innovation_types it ON it.innovation_type_id = s.innovation_type_id
            WHERE s.submission_id = $1 AND s.campus_id = $2
            "#,
        )
        .bind(submission_id)
        .bind(campus_id)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(record.map(SubmissionDetail::from))
    }

    async fn submission_files(
        &self,
        submission_id: i32,
    ) -> Result<Vec<SubmissionFileEntry>, StoreError> {
        let rows = sqlx::query_as::<_, SubmissionFileEntry>(
            r#"
            SELECT sf.file_id, sf.file_name, sf.file_path,
                   rm.requirement_name, rm.description AS requirement_description
            FROM submission_files sf
            JOIN requirements_master rm ON rm.requirement_id = sf.requirement_id
            WHERE sf.submission_id = $1
            ORDER BY rm.requirement_name
            "#,
        )
        .bind(submission_id)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(rows)
    }

    async fn submission_file(
        &self,
        file_id: i32,
        campus_id: i32,
    ) -> Result<Option<SubmissionFileEntry>, StoreError> {
        let row = sqlx::query_as::<_, SubmissionFileEntry>(
            r#"
            SELECT sf.file_id, sf.file_name, sf.file_path,
                   rm.requirement_name, rm.description AS requirement_description
            FROM submission_files sf
            JOIN requirements_master rm ON rm.requirement_id = sf.requirement_id
            JOIN submissions s ON s.submission_id = sf.submission_id
            WHERE sf.file_id = $1 AND s.campus_id = $2
            "#,
        )
        .bind(file_id)
        .bind(campus_id)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(row)
    }

    async fn campus_submissions(
        &self,
        campus_id: i32,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<SubmissionSummary>, StoreError> {
        let rows = sqlx::query_as::<_, SubmissionSummary>(
            r#"
            SELECT s.submission_id, s.reference_number, s.title, s.submission_type,
                   u.name AS researcher_name, s.status, s.submission_date
            FROM submissions s
            JOIN users u ON u.user_id = s.researcher_id
            WHERE s.campus_id = $1 AND ($2::TEXT IS NULL OR s.status = $2)
            ORDER BY s.submission_date DESC, s.submission_id DESC
            "#,
        )
        .bind(campus_id)
        .bind(status.map(SubmissionStatus::as_str))
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(rows)
    }

    async fn update_payment_status(&self, change: PaymentChange) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE submission_reviews sr
            SET payment_status = $1, updated_at = NOW()
            FROM submissions s
            WHERE sr.submission_id = s.submission_id
              AND s.submission_id = $2
              AND s.campus_id = $3
            "#,
        )
        .bind(change.payment_status.as_str())
        .bind(change.submission_id)
        .bind(change.campus_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound);
        }

        insert_activity(&mut tx, &ActivityEntry::payment(&change)).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn change_submission_status(
        &self,
        change: StatusChange,
    ) -> Result<SubmissionStatus, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> = sqlx::query_scalar(
            "SELECT status FROM submissions WHERE submission_id = $1 AND campus_id = $2 FOR UPDATE",
        )
        .bind(change.submission_id)
        .bind(change.campus_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current: SubmissionStatus = current
            .ok_or(StoreError::NotFound)?
            .parse()
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))?;

        if !current.can_transition_to(change.target) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: change.target,
            });
        }

        sqlx::query("UPDATE submissions SET status = $1 WHERE submission_id = $2")
            .bind(change.target.as_str())
            .bind(change.submission_id)
            .execute(&mut *tx)
            .await?;

        insert_activity(&mut tx, &ActivityEntry::status(&change, current)).await?;
        tx.commit().await?;
        Ok(current)
    }
}
