use {
    axum::{async_trait, response::Redirect, routing::get},
    tracing::{error, info},
};

use crate::{core::AxumRouter, AuthSession, Error};

pub fn router(signout: &str) -> AxumRouter {
    AxumRouter::new().route(signout, get(self::get::signout))
}

/// Ends the caller's session.
#[async_trait]
pub trait SignOut {
    async fn sign_out(&mut self) -> Result<(), Error>;
}

#[async_trait]
impl SignOut for AuthSession {
    async fn sign_out(&mut self) -> Result<(), Error> {
        match self.logout().await {
            Ok(Some(user)) => {
                info!(slug = %user.slug, "User signed out");
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => Err(Error::SignOut(Box::new(e))),
        }
    }
}

/// Signs out, then redirects to `signin`. The redirect is only produced once
/// sign out has completed; a failed sign out yields the error instead.
///
/// # Errors
///
/// Returns [`Error::SignOut`] when the session could not be ended.
pub async fn sign_out_then_redirect<S>(session: &mut S, signin: &str) -> Result<Redirect, Error>
where
    S: SignOut + Send,
{
    if let Err(e) = session.sign_out().await {
        error!("Sign out failed, not redirecting: {}", e);
        return Err(e);
    }

    Ok(Redirect::to(signin))
}

mod get {
    use std::sync::Arc;

    use axum::{extract::State, response::Redirect};

    use super::sign_out_then_redirect;
    use crate::{model::AppContext, AuthSession, Error};

    pub async fn signout(
        mut auth_session: AuthSession,
        State(ctx): State<Arc<AppContext>>,
    ) -> Result<Redirect, Error> {
        sign_out_then_redirect(&mut auth_session, &ctx.routes.signin).await
    }
}

#[cfg(test)]
mod tests {
    use {
        axum::{
            http::{header::LOCATION, StatusCode},
            response::IntoResponse,
        },
        tower_sessions::{session, session_store},
    };

    use super::*;

    #[derive(Default)]
    struct RecordingSession {
        calls: usize,
        fail: bool,
    }

    #[async_trait]
    impl SignOut for RecordingSession {
        async fn sign_out(&mut self) -> Result<(), Error> {
            self.calls += 1;
            if self.fail {
                let store = session_store::Error::Backend("session store unavailable".into());
                Err(Error::SignOut(Box::new(axum_login::Error::Session(
                    session::Error::Store(store),
                ))))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn signs_out_once_then_redirects_to_signin() {
        let mut session = RecordingSession::default();

        let response = sign_out_then_redirect(&mut session, "/auth/signin")
            .await
            .unwrap()
            .into_response();

        assert_eq!(session.calls, 1);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get_all(LOCATION).iter().count(), 1);
        assert_eq!(response.headers()[LOCATION], "/auth/signin");
    }

    #[tokio::test]
    async fn failed_sign_out_does_not_redirect() {
        let mut session = RecordingSession {
            fail: true,
            ..Default::default()
        };

        let result = sign_out_then_redirect(&mut session, "/auth/signin").await;

        assert_eq!(session.calls, 1);
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(LOCATION).is_none());
    }
}
