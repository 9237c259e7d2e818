use {askama::Template, axum::routing::get};

use crate::{
    core::AxumRouter,
    model::{NavEntry, SessionUser},
};

pub const HOME_ROUTE: &str = "/";
pub const BOOKS_ROUTE: &str = "/books";

#[derive(Template)]
#[template(path = "home.html")]
struct Home<'a> {
    nav: Vec<NavEntry<'a>>,
    user: SessionUser,
    signout: &'a str,
}

#[derive(Template)]
#[template(path = "books.html")]
struct Books<'a> {
    nav: Vec<NavEntry<'a>>,
    user: SessionUser,
    signout: &'a str,
}

pub fn router() -> AxumRouter {
    AxumRouter::new()
        .route(HOME_ROUTE, get(self::get::home))
        .route(BOOKS_ROUTE, get(self::get::books))
}

mod get {
    use std::sync::Arc;

    use axum::{
        extract::{OriginalUri, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    };

    use super::{Books, Home, SessionUser};
    use crate::{model::AppContext, AuthSession};

    pub async fn home(
        State(ctx): State<Arc<AppContext>>,
        auth_session: AuthSession,
        OriginalUri(uri): OriginalUri,
    ) -> Response {
        match auth_session.user {
            Some(user) => Home {
                nav: ctx.sidebar.entries(uri.path()),
                user: SessionUser::from(&user),
                signout: &ctx.routes.signout,
            }
            .into_response(),

            None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }

    pub async fn books(
        State(ctx): State<Arc<AppContext>>,
        auth_session: AuthSession,
        OriginalUri(uri): OriginalUri,
    ) -> Response {
        match auth_session.user {
            Some(user) => Books {
                nav: ctx.sidebar.entries(uri.path()),
                user: SessionUser::from(&user),
                signout: &ctx.routes.signout,
            }
            .into_response(),

            None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{model::AppContext, util::Config};

    fn user() -> SessionUser {
        SessionUser {
            id: "u-1".into(),
            slug: "octocat".into(),
            roles: BTreeSet::from(["admin".to_string(), "reader".to_string()]),
        }
    }

    fn active_item(html: &str) -> &str {
        let start = html
            .find(r#"<li class="active">"#)
            .expect("an active sidebar entry");
        let rest = &html[start..];
        &rest[..rest.find("</li>").expect("closed list item")]
    }

    #[test]
    fn home_highlights_home_only() {
        let ctx = AppContext::new(Config::default()).unwrap();
        let html = Home {
            nav: ctx.sidebar.entries(HOME_ROUTE),
            user: user(),
            signout: &ctx.routes.signout,
        }
        .render()
        .unwrap();

        assert_eq!(html.matches(r#"class="active""#).count(), 1);
        assert!(active_item(&html).contains("Home"));
        assert!(html.contains("octocat"));
        assert!(html.contains("admin, reader"));
    }

    #[test]
    fn books_highlights_books_only() {
        let ctx = AppContext::new(Config::default()).unwrap();
        let html = Books {
            nav: ctx.sidebar.entries(BOOKS_ROUTE),
            user: user(),
            signout: &ctx.routes.signout,
        }
        .render()
        .unwrap();

        assert_eq!(html.matches(r#"class="active""#).count(), 1);
        assert!(active_item(&html).contains("Books"));
        assert!(html.contains("Sign out"));
    }

    #[test]
    fn nested_book_path_highlights_nothing() {
        let ctx = AppContext::new(Config::default()).unwrap();
        let html = Books {
            nav: ctx.sidebar.entries("/books/42"),
            user: user(),
            signout: &ctx.routes.signout,
        }
        .render()
        .unwrap();

        assert_eq!(html.matches(r#"class="active""#).count(), 0);
    }
}
