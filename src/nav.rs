//! Role menus for the navbar and sidebar partials.
//!
//! Menus are fixed tables. Highlighting only compares the current page and
//! status filter against them, nothing is looked up.

use serde::Serialize;
use tera::Context;

use crate::session::Role;
use crate::workflow::SubmissionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuLink {
    pub label: &'static str,
    pub page: &'static str,
    pub status: Option<&'static str>,
    pub href: &'static str,
    pub icon: &'static str,
}

const fn link(label: &'static str, page: &'static str, href: &'static str, icon: &'static str) -> MenuLink {
    MenuLink {
        label,
        page,
        status: None,
        href,
        icon,
    }
}

const fn status_link(status: SubmissionStatus, href: &'static str, icon: &'static str) -> MenuLink {
    MenuLink {
        label: status.label(),
        page: "submissions",
        status: Some(status.as_str()),
        href,
        icon,
    }
}

const PIO_MENU: &[MenuLink] = &[
    link("All Submissions", "submissions", "/pio/submissions", "inbox"),
    status_link(SubmissionStatus::ForwardedToPio, "/pio/submissions?status=forwarded_to_pio", "arrow-right"),
    status_link(SubmissionStatus::AcceptedByPio, "/pio/submissions?status=accepted_by_pio", "check"),
    status_link(SubmissionStatus::ForwardedToExternal, "/pio/submissions?status=forwarded_to_external", "send"),
    status_link(SubmissionStatus::UnderExternalReview, "/pio/submissions?status=under_external_review", "search"),
    status_link(SubmissionStatus::Approved, "/pio/submissions?status=approved", "award"),
    status_link(SubmissionStatus::Rejected, "/pio/submissions?status=rejected", "x-circle"),
];

const FACILITATOR_MENU: &[MenuLink] = &[
    link("Dashboard", "dashboard", "/facilitator/dashboard", "home"),
    link("Researchers", "researchers", "/facilitator/researchers", "users"),
    link("Submissions", "submissions", "/facilitator/submissions", "inbox"),
];

const RESEARCHER_MENU: &[MenuLink] = &[
    link("Dashboard", "dashboard", "/researcher/dashboard", "home"),
    link("My Submissions", "submissions", "/researcher/submissions", "inbox"),
    link("New Submission", "new_submission", "/researcher/submissions/new", "upload"),
];

const ADMIN_MENU: &[MenuLink] = &[
    link("Dashboard", "dashboard", "/admin/dashboard", "home"),
    link("Users", "users", "/admin/users", "users"),
    link("Departments", "departments", "/admin/departments", "layers"),
    link("Campuses", "campuses", "/admin/campuses", "map-pin"),
    link("Submission Types", "submission_types", "/admin/submission-types", "tag"),
    link("Requirements", "requirements", "/admin/requirements", "file-text"),
    link("Activity Logs", "activity_logs", "/admin/activity-logs", "clock"),
];

pub fn menu_for(role: Role) -> &'static [MenuLink] {
    match role {
        Role::Pio => PIO_MENU,
        Role::Facilitator => FACILITATOR_MENU,
        Role::Researcher => RESEARCHER_MENU,
        Role::Admin => ADMIN_MENU,
    }
}

/// Whether `menu` has per-status links for `page`.
fn splits_by_status(menu: &[MenuLink], page: &str) -> bool {
    menu.iter().any(|link| link.page == page && link.status.is_some())
}

impl MenuLink {
    /// Exact match on page. Where the menu splits a page by status, each
    /// status link needs its own filter and the plain link needs none.
    pub fn is_active(&self, menu: &[MenuLink], current_page: &str, current_status: Option<&str>) -> bool {
        if self.page != current_page {
            return false;
        }
        let current_status = current_status.filter(|s| !s.is_empty());
        match (self.status, current_status) {
            (Some(status), Some(current)) => status == current,
            (Some(_), None) => false,
            (None, Some(_)) => !splits_by_status(menu, self.page),
            (None, None) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub label: &'static str,
    pub href: &'static str,
    pub icon: &'static str,
    pub active: bool,
}

pub fn sidebar_entries(role: Role, current_page: &str, current_status: Option<&str>) -> Vec<NavEntry> {
    let menu = menu_for(role);
    menu.iter()
        .map(|link| NavEntry {
            label: link.label,
            href: link.href,
            icon: link.icon,
            active: link.is_active(menu, current_page, current_status),
        })
        .collect()
}

/// Context shared by pages that include both partials.
pub fn nav_context(role: Role, username: &str, current_page: &str, current_status: Option<&str>) -> Context {
    let mut ctx = Context::new();
    ctx.insert("username", username);
    ctx.insert("role_label", role.label());
    ctx.insert("menu", &sidebar_entries(role, current_page, current_status));
    ctx
}
