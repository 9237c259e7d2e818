use {oauth2::CsrfToken, serde::Deserialize};

mod signin;
pub use signin::{router as create_signin_router, SignIn};

mod callback;
pub use callback::router as create_callback_router;

mod signout;
pub use signout::{router as create_signout_router, sign_out_then_redirect, SignOut};

mod session;
pub use session::{router as create_session_router, SessionResponse};

pub mod backend;

pub(crate) const CSRF_STATE_KEY: &str = "oauth.csrf-state";
pub(crate) const NEXT_URL_KEY: &str = "auth.next-url";

// This allows us to extract the "next" field from the query string or form.
// We use this to redirect after sign in.
#[derive(Debug, Deserialize)]
pub struct NextUrl {
    next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthzResp {
    code: String,
    state: CsrfToken,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub code: String,
    pub old_state: CsrfToken,
    pub new_state: CsrfToken,
    pub provider: String,
}

/// Keeps only same-site absolute paths as redirect targets.
pub(crate) fn safe_next(next: Option<String>) -> Option<String> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next(Some("/books".into())).as_deref(), Some("/books"));
        assert_eq!(safe_next(Some("/books?page=2".into())).as_deref(), Some("/books?page=2"));
        assert_eq!(safe_next(Some("https://evil.example".into())), None);
        assert_eq!(safe_next(Some("//evil.example".into())), None);
        assert_eq!(safe_next(Some("/\\evil.example".into())), None);
        assert_eq!(safe_next(Some(String::new())), None);
        assert_eq!(safe_next(None), None);
    }
}
