use {axum::routing::get, serde::Serialize};

use crate::{core::AxumRouter, model::SessionUser};

/// Body of the session endpoint: `{"user": {...}}` when signed in, `{}`
/// otherwise.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

pub fn router(session: &str) -> AxumRouter {
    AxumRouter::new().route(session, get(self::get::session))
}

mod get {
    use axum::Json;

    use super::{SessionResponse, SessionUser};
    use crate::AuthSession;

    pub async fn session(auth_session: AuthSession) -> Json<SessionResponse> {
        Json(SessionResponse {
            user: auth_session.user.as_ref().map(SessionUser::from),
        })
    }
}
