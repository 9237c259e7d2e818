use {
    axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    oauth2::{basic::BasicRequestTokenError, reqwest::AsyncHttpClientError},
    sqlx::migrate::MigrateError,
    tracing::error,
    url::ParseError,
};

use bookshelf_config::ConfigError;

use crate::web::Backend;

/// Failure reported by the session layer around [`Backend`].
pub type AuthError = axum_login::Error<Backend>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    Migration(#[from] MigrateError),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("OAuth2 error: {0}")]
    OAuth2(#[from] BasicRequestTokenError<AsyncHttpClientError>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("Failed to install logger: {0}")]
    Logger(String),
    #[error("Invalid {kind} URL for client {client_name} '{url}': {inner}")]
    InvalidClientUrl {
        kind: &'static str,
        client_name: String,
        url: String,
        inner: ParseError,
    },
    #[error("OAuth provider not found: {0}")]
    ProviderNotFound(String),
    #[error("Userinfo response from {provider} has no `{field}` field")]
    MissingLoginField { provider: String, field: String },
    #[error("CSRF state missing from session")]
    MissingCsrfState,
    #[error("Invalid match pattern '{pattern}' for sidebar link {href}: {inner}")]
    InvalidSidebarPattern {
        href: String,
        pattern: String,
        inner: regex::Error,
    },
    #[error("Stored roles for user {user_id} are not a list of strings: {inner}")]
    InvalidStoredRoles {
        user_id: String,
        inner: serde_json::Error,
    },
    #[error("Authentication failed: {0}")]
    Authentication(#[source] Box<AuthError>),
    #[error("Login failed: {0}")]
    Login(#[source] Box<AuthError>),
    #[error("Sign out failed: {0}")]
    SignOut(#[source] Box<AuthError>),
}

impl Error {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ProviderNotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingCsrfState => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(%status, "{}", self);

        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use tower_sessions::{session, session_store};

    use super::*;

    #[test]
    fn client_errors_keep_their_status() {
        assert_eq!(
            Error::ProviderNotFound("gitlab".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::MissingCsrfState.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    fn store_unavailable() -> Box<AuthError> {
        let store = session_store::Error::Backend("store unavailable".into());
        Box::new(axum_login::Error::Session(session::Error::Store(store)))
    }

    #[test]
    fn everything_else_is_internal() {
        assert_eq!(
            Error::SignOut(store_unavailable()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn auth_failures_keep_their_cause() {
        let err = Error::Login(store_unavailable());
        let source = std::error::Error::source(&err).expect("login error has a source");
        assert!(source.to_string().contains("store unavailable"));
    }
}
