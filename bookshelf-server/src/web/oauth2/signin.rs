use std::sync::Arc;

use {
    askama::Template,
    axum::routing::{get, post},
};

use super::safe_next;
use crate::{core::AxumRouter, model::AppContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderLink {
    pub name: String,
    pub display_name: String,
}

#[derive(Template)]
#[template(path = "signin.html")]
pub struct SignIn {
    pub message: Option<String>,
    pub next: Option<String>,
    pub action: String,
    pub providers: Vec<ProviderLink>,
}

impl SignIn {
    #[must_use]
    pub fn new(ctx: &AppContext, message: Option<String>, next: Option<String>) -> Self {
        let mut providers: Vec<_> = ctx
            .config
            .oauth_clients
            .iter()
            .map(|(name, client)| ProviderLink {
                name: name.clone(),
                display_name: client.display_name.clone(),
            })
            .collect();
        providers.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            message,
            next: safe_next(next),
            action: ctx.routes.signin.clone(),
            providers,
        }
    }
}

pub fn router(signin: &str) -> AxumRouter {
    AxumRouter::new()
        .route(signin, get(self::get::signin))
        .route(&format!("{signin}/:provider"), post(self::post::signin))
}

mod post {
    use {
        axum::{extract::Path, response::Redirect, Form},
        tower_sessions::Session,
        tracing::debug,
    };

    use crate::{
        web::oauth2::{safe_next, NextUrl, CSRF_STATE_KEY, NEXT_URL_KEY},
        AuthSession, Error,
    };

    pub async fn signin(
        auth_session: AuthSession,
        session: Session,
        Path(provider): Path<String>,
        Form(NextUrl { next }): Form<NextUrl>,
    ) -> Result<Redirect, Error> {
        let (url, token) = auth_session.backend.authorize_url(&provider)?;

        session.insert(CSRF_STATE_KEY, token.secret()).await?;
        session.insert(NEXT_URL_KEY, safe_next(next)).await?;

        debug!("Redirecting to {} for sign in", provider);
        Ok(Redirect::to(url.as_str()))
    }
}

mod get {
    use axum::extract::{Query, State};

    use super::{AppContext, Arc, SignIn};
    use crate::web::oauth2::NextUrl;

    pub async fn signin(
        State(ctx): State<Arc<AppContext>>,
        Query(NextUrl { next }): Query<NextUrl>,
    ) -> SignIn {
        SignIn::new(&ctx, None, next)
    }
}
