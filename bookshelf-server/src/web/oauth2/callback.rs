use crate::{axum::routing::get, core::AxumRouter};

pub fn router(callback: &str) -> AxumRouter {
    AxumRouter::new().route(&format!("{callback}/:provider"), get(self::get::callback))
}

mod get {
    use std::sync::Arc;

    use {
        axum::{
            extract::{Path, Query, State},
            http::StatusCode,
            response::{IntoResponse, Redirect, Response},
        },
        oauth2::CsrfToken,
        tower_sessions::Session,
        tracing::{debug, info, warn},
    };

    use crate::{
        model::AppContext,
        web::oauth2::{AuthzResp, Credentials, SignIn, CSRF_STATE_KEY, NEXT_URL_KEY},
        AuthSession, Error,
    };

    pub async fn callback(
        mut auth_session: AuthSession,
        session: Session,
        State(ctx): State<Arc<AppContext>>,
        Path(provider): Path<String>,
        Query(AuthzResp {
            code,
            state: new_state,
        }): Query<AuthzResp>,
    ) -> Result<Response, Error> {
        debug!("OAuth callback for provider: {}", provider);

        let old_state: CsrfToken = session
            .remove(CSRF_STATE_KEY)
            .await?
            .ok_or(Error::MissingCsrfState)?;
        let next = session
            .remove::<Option<String>>(NEXT_URL_KEY)
            .await?
            .flatten();

        let creds = Credentials {
            code,
            old_state,
            new_state,
            provider,
        };

        let user = match auth_session.authenticate(creds).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("Rejected OAuth callback with a mismatched CSRF state");
                let page = SignIn::new(&ctx, Some("Invalid CSRF state.".to_string()), next);
                return Ok((StatusCode::UNAUTHORIZED, page).into_response());
            }
            Err(e) => return Err(Error::Authentication(Box::new(e))),
        };

        auth_session
            .login(&user)
            .await
            .map_err(|e| Error::Login(Box::new(e)))?;
        info!(slug = %user.slug, "User signed in");

        Ok(Redirect::to(next.as_deref().unwrap_or("/")).into_response())
    }
}
