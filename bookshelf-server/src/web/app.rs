use std::sync::Arc;

use {
    axum::{
        extract::{Request, State},
        http::{uri::PathAndQuery, Uri},
        middleware::{self, Next},
        response::{IntoResponse, Redirect, Response},
    },
    axum_login::AuthManagerLayerBuilder,
    time::Duration,
    tower::ServiceBuilder,
    tower_http::{services::ServeDir, trace::TraceLayer},
    tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer},
    tracing::debug,
};

use bookshelf_config::{SameSiteConfig, SessionConfig};

use super::{
    oauth2::{
        create_callback_router, create_session_router, create_signin_router,
        create_signout_router,
    },
    pages, Backend,
};
use crate::{core::AxumRouter, db::UserStore, model::AppContext, AuthSession, Error};

const STATIC_ROUTE: &str = "/static";

fn create_session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    let same_site = match config.same_site_policy {
        SameSiteConfig::Strict => SameSite::Strict,
        SameSiteConfig::Lax => SameSite::Lax,
        SameSiteConfig::None => SameSite::None,
    };

    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.secure)
        .with_same_site(same_site)
        .with_expiry(Expiry::OnInactivity(Duration::days(config.expiry_days)))
}

pub struct ProtectedApp {
    app_ctx: Arc<AppContext>,
    backend: Backend,
    session_layer: SessionManagerLayer<MemoryStore>,
}

impl ProtectedApp {
    pub async fn new(app_ctx: Arc<AppContext>) -> Result<Self, Error> {
        let users = UserStore::connect(&app_ctx.config.database).await?;
        let backend = Backend::from_config(&app_ctx.config, &app_ctx.routes.callback, users)?;
        let session_layer = create_session_layer(&app_ctx.config.session);

        Ok(Self {
            app_ctx,
            backend,
            session_layer,
        })
    }

    pub fn create_auth_router(self) -> AxumRouter {
        let Self {
            app_ctx,
            backend,
            session_layer,
        } = self;
        let routes = &app_ctx.routes;

        // Auth service.
        //
        // This combines the session layer with our backend to establish the auth
        // service which will provide the auth session as a request extension.
        let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

        debug!("Mounting auth routes: {:?}", routes);

        pages::router()
            .route_layer(middleware::from_fn_with_state(
                app_ctx.clone(),
                require_login,
            ))
            .merge(create_signin_router(&routes.signin))
            .merge(create_callback_router(&routes.callback))
            .merge(create_signout_router(&routes.signout))
            .merge(create_session_router(&routes.session))
            .nest_service(STATIC_ROUTE, ServeDir::new(&app_ctx.config.website.web_root))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(auth_layer),
            )
    }
}

async fn require_login(
    State(app_ctx): State<Arc<AppContext>>,
    auth_session: AuthSession,
    request: Request,
    next: Next,
) -> Response {
    if auth_session.user.is_some() {
        return next.run(request).await;
    }

    let target = signin_redirect(&app_ctx.routes.signin, request.uri());
    Redirect::temporary(&target).into_response()
}

fn signin_redirect(signin: &str, uri: &Uri) -> String {
    let next = uri.path_and_query().map_or("/", PathAndQuery::as_str);
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{signin}?{query}")
}

#[cfg(test)]
mod tests {
    use {
        axum::{
            body::{to_bytes, Body},
            http::{
                header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
                Method, StatusCode,
            },
            Router,
        },
        serde_json::Map,
        tower::ServiceExt,
    };

    use bookshelf_config::ClientConfig;

    use super::*;
    use crate::{app::Builder, util::Config};

    fn config() -> Config {
        let mut config = Config::default();
        config.oauth_clients.insert(
            "github".into(),
            ClientConfig {
                display_name: "GitHub".into(),
                client_id: "id".into(),
                client_secret: "secret".into(),
                auth_uri: "https://github.com/login/oauth/authorize".into(),
                token_uri: "https://github.com/login/oauth/access_token".into(),
                userinfo_uri: "https://api.github.com/user".into(),
                login_field: "login".into(),
                scopes: vec![],
                extra: Map::new(),
            },
        );
        config
    }

    async fn router() -> Router {
        Builder::new(config())
            .unwrap()
            .build()
            .await
            .unwrap()
            .router()
    }

    fn get(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn signin_redirect_keeps_the_requested_path() {
        assert_eq!(
            signin_redirect("/auth/signin", &Uri::from_static("/books?page=2")),
            "/auth/signin?next=%2Fbooks%3Fpage%3D2"
        );
        assert_eq!(
            signin_redirect("/auth/signin", &Uri::from_static("/")),
            "/auth/signin?next=%2F"
        );
    }

    #[tokio::test]
    async fn signout_redirects_to_signin() {
        let response = router().await.oneshot(get("/auth/signout")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/auth/signin");
    }

    #[tokio::test]
    async fn protected_pages_require_a_session() {
        let app = router().await;

        for (path, location) in [
            ("/", "/auth/signin?next=%2F"),
            ("/books", "/auth/signin?next=%2Fbooks"),
        ] {
            let response = app.clone().oneshot(get(path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
            assert_eq!(response.headers()[LOCATION], location);
        }
    }

    #[tokio::test]
    async fn anonymous_session_is_empty() {
        let response = router().await.oneshot(get("/auth/session")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "{}");
    }

    #[tokio::test]
    async fn signin_page_lists_providers() {
        let response = router()
            .await
            .oneshot(get("/auth/signin?next=%2Fbooks"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Sign in with GitHub"));
    }

    #[tokio::test]
    async fn unknown_provider_is_not_found() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/signin/gitlab")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("next=%2Fbooks"))
            .unwrap();

        let response = router().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn callback_without_signin_is_rejected() {
        let response = router()
            .await
            .oneshot(get("/auth/callback/github?code=abc&state=xyz"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn callback_with_forged_state_is_unauthorized() {
        let app = router().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/signin/github")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("next=%2Fbooks"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[LOCATION].to_str().unwrap().to_string();
        assert!(location.starts_with("https://github.com/login/oauth/authorize?"));

        let cookie = response.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let request = Request::builder()
            .uri("/auth/callback/github?code=abc&state=forged")
            .header(COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Invalid CSRF state."));
    }
}
