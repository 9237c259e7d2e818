use std::sync::Arc;

use crate::{model::AppContext, web::Backend};

pub type AxumRouter = axum::Router<Arc<AppContext>>;

pub type AuthSession = axum_login::AuthSession<Backend>;
