use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{PortalStore, SessionRecord};
use crate::error::PortalError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Pio,
    Facilitator,
    Researcher,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Pio => "pio",
            Role::Facilitator => "facilitator",
            Role::Researcher => "researcher",
            Role::Admin => "admin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Pio => "PIO",
            Role::Facilitator => "Facilitator",
            Role::Researcher => "Researcher",
            Role::Admin => "Administrator",
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pio" => Ok(Role::Pio),
            "facilitator" => Ok(Role::Facilitator),
            "researcher" => Ok(Role::Researcher),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(value)),
        }
    }
}

/// Who is making the request. Built once per request and handed to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub campus_id: Option<i32>,
}

impl From<SessionRecord> for SessionContext {
    fn from(record: SessionRecord) -> Self {
        Self {
            user_id: record.user_id,
            username: record.username,
            role: record.role,
            campus_id: record.campus_id,
        }
    }
}

/// A session that passed the role check and is bound to a campus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedSession {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub campus_id: i32,
}

pub fn require_role(session: Option<&SessionContext>, role: Role) -> Result<ScopedSession, PortalError> {
    let Some(session) = session else {
        tracing::warn!(required = role.as_str(), "request without session");
        return Err(PortalError::Authorization(role.label()));
    };
    if session.role != role {
        tracing::warn!(
            user_id = session.user_id,
            role = session.role.as_str(),
            required = role.as_str(),
            "role mismatch"
        );
        return Err(PortalError::Authorization(role.label()));
    }
    let Some(campus_id) = session.campus_id else {
        tracing::warn!(user_id = session.user_id, "session has no campus binding");
        return Err(PortalError::Authorization(role.label()));
    };
    Ok(ScopedSession {
        user_id: session.user_id,
        username: session.username.clone(),
        role: session.role,
        campus_id,
    })
}

/// Reads the session token out of the `Cookie` headers.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, token)| Uuid::parse_str(token.trim()).ok())
}

/// Extractor resolving the caller's session. Never rejects: a missing or
/// unknown session is `None` and the role guard decides what to do.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<SessionContext>);

impl CurrentSession {
    pub fn require(&self, role: Role) -> Result<ScopedSession, PortalError> {
        require_role(self.0.as_ref(), role)
    }
}

#[axum::async_trait]
impl<S: PortalStore> FromRequestParts<Arc<AppState<S>>> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers, &state.config.session_cookie) else {
            return Ok(CurrentSession(None));
        };

        match state.store.find_session(token).await {
            Ok(record) => Ok(CurrentSession(record.map(SessionContext::from))),
            Err(e) => {
                tracing::error!("Failed to resolve session: {}", e);
                Ok(CurrentSession(None))
            }
        }
    }
}
