use {
    bookshelf_server::{tracing::info, Builder, Config, Error, TracingLogger},
    tokio::signal,
};

const CONFIG_DIR: &str = "./config";

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::load_from_dir(CONFIG_DIR)?;

    let _logger_guard = TracingLogger::from_config(&config)?;

    let server = Builder::new(config)?.build().await?;

    server.start();
    info!("Server started successfully");

    signal::ctrl_c().await?;
    info!("Server shutdown gracefully");

    Ok(())
}
