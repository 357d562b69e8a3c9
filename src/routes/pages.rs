use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Html;
use std::sync::Arc;

use crate::db::PortalStore;
use crate::error::PortalError;
use crate::nav;
use crate::routes::api::{parse_status_filter, query_params, ListedSubmission, StatusFilterQuery};
use crate::session::{CurrentSession, Role};
use crate::state::AppState;

pub async fn submissions_page<S: PortalStore>(
    State(state): State<Arc<AppState<S>>>,
    session: CurrentSession,
    params: Result<Query<StatusFilterQuery>, QueryRejection>,
) -> Result<Html<String>, PortalError> {
    let pio = session.require(Role::Pio)?;
    let params = query_params(params)?;
    let status = parse_status_filter(params.status.as_deref())?;

    let submissions: Vec<ListedSubmission> = state
        .store
        .campus_submissions(pio.campus_id, status)
        .await
        .map_err(PortalError::persistence("Failed to fetch submissions."))?
        .into_iter()
        .map(ListedSubmission::from)
        .collect();

    let heading = status.map_or("All Submissions", |s| s.label());
    let mut ctx = nav::nav_context(
        pio.role,
        &pio.username,
        "submissions",
        status.map(|s| s.as_str()),
    );
    ctx.insert("heading", heading);
    ctx.insert("submissions", &submissions);

    let rendered = state.tera.render("submissions.html", &ctx)?;
    Ok(Html(rendered))
}
