use bookshelf_config::Routes;

use super::Sidebar;
use crate::{util::Config, Error};

/// Read-only state shared by every request.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub routes: Routes,
    pub sidebar: Sidebar,
}

impl AppContext {
    /// # Errors
    ///
    /// Fails when a sidebar pattern is invalid.
    pub fn new(config: Config) -> Result<Self, Error> {
        let routes = config.routes.with_base_prepend();
        let sidebar = Sidebar::from_config(&config.sidebar)?;
        Ok(Self {
            config,
            routes,
            sidebar,
        })
    }
}
