mod app;
mod core;
mod db;
mod error;
pub mod model;
mod util;
mod web;

pub use crate::core::{AuthSession, AxumRouter};

pub use {
    app::{Builder, Server},
    axum,
    db::UserStore,
    error::{AuthError, Error},
    tracing,
    util::{slugify, ClientConfig, Config, TracingLogger},
    web::{sign_out_then_redirect, Backend, Credentials, SessionResponse, SignIn, SignOut},
};
