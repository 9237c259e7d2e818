pub use self::oauth2::{
    backend::Backend, sign_out_then_redirect, Credentials, SessionResponse, SignIn, SignOut,
};
pub(crate) use app::ProtectedApp;

mod app;
mod oauth2;
mod pages;
