use std::sync::Arc;

use tracing::debug;

use super::server::Server;
use crate::{model::AppContext, util::Config, web::ProtectedApp, Error};

pub struct Builder {
    app_ctx: Arc<AppContext>,
}

impl Builder {
    /// # Errors
    ///
    /// Fails when the configured sidebar cannot be compiled.
    pub fn new(config: Config) -> Result<Self, Error> {
        debug!("Initializing Builder for run mode {}", config.run_mode);

        let app_ctx = Arc::new(AppContext::new(config)?);
        Ok(Self { app_ctx })
    }

    /// Connects the user store and assembles the router.
    ///
    /// # Errors
    ///
    /// Fails when the database cannot be opened or migrated, or an OAuth
    /// client is misconfigured.
    pub async fn build(self) -> Result<Server, Error> {
        debug!("Building server");

        let app = ProtectedApp::new(self.app_ctx.clone()).await?;
        let router = app.create_auth_router().with_state(self.app_ctx.clone());

        debug!("Server built successfully");
        Ok(Server::new(router, self.app_ctx))
    }
}
