use std::{net::SocketAddr, sync::Arc};

use {
    axum::{routing::IntoMakeService, Router},
    axum_server::tls_rustls::RustlsConfig,
    bookshelf_config::SslConfig,
    tracing::{debug, error, info},
};

use crate::{model::AppContext, Error};

pub struct Server {
    router: Router,
    app_ctx: Arc<AppContext>,
}

impl Server {
    pub(crate) fn new(router: Router, app_ctx: Arc<AppContext>) -> Self {
        Self { router, app_ctx }
    }

    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Spawns the listener on the current runtime and returns immediately.
    pub fn start(self) {
        let website = self.app_ctx.config.website.clone();
        debug!("Starting server with configuration: {:?}", website);

        let web_service = self.router.into_make_service();

        if website.bind_ssl_config.enabled {
            let https_addr = SocketAddr::from((website.bind_address, website.bind_ports.https));
            tokio::spawn(async move {
                if let Err(e) = serve_https(https_addr, web_service, website.bind_ssl_config).await {
                    error!("Failed to start HTTPS server: {}", e);
                }
            });
        } else {
            let http_addr = SocketAddr::from((website.bind_address, website.bind_ports.http));
            tokio::spawn(async move {
                if let Err(e) = serve_http(http_addr, web_service).await {
                    error!("Failed to start HTTP server: {}", e);
                }
            });
        }

        debug!("Server started successfully");
    }
}

async fn serve_https(
    addr: SocketAddr,
    web_service: IntoMakeService<Router>,
    ssl_config: SslConfig,
) -> Result<(), Error> {
    let tls_config = RustlsConfig::from_pem_file(&ssl_config.cert_path, &ssl_config.key_path).await?;

    info!("https listening on {}", addr);
    axum_server::bind_rustls(addr, tls_config)
        .serve(web_service)
        .await?;

    Ok(())
}

async fn serve_http(addr: SocketAddr, web_service: IntoMakeService<Router>) -> Result<(), Error> {
    info!("http listening on {}", addr);
    axum_server::bind(addr).serve(web_service).await?;

    Ok(())
}
