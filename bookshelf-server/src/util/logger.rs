use {
    tracing::{info, subscriber::set_global_default, Level},
    tracing_appender::non_blocking::WorkerGuard,
    tracing_subscriber::fmt::format::FmtSpan,
};

use bookshelf_config::Verbosity;

use super::Config;
use crate::Error;

pub struct TracingLogger {
    _guard: WorkerGuard, // Keeps the background worker alive
}

impl TracingLogger {
    fn new(level: Level) -> Result<Self, Error> {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

        let subscriber = tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_max_level(level)
            .with_span_events(FmtSpan::CLOSE)
            .finish();

        set_global_default(subscriber).map_err(|e| Error::Logger(e.to_string()))?;

        Ok(Self { _guard: guard })
    }

    /// Installs the global subscriber at the configured verbosity.
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber has already been installed.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let logger = Self::new(level_for(config.logger.verbosity))?;
        info!("Logger initialized with verbosity: {}", config.logger.verbosity);
        Ok(logger)
    }
}

const fn level_for(verbosity: Verbosity) -> Level {
    match verbosity {
        Verbosity::Trace => Level::TRACE,
        Verbosity::Debug => Level::DEBUG,
        Verbosity::Info => Level::INFO,
        Verbosity::Warn => Level::WARN,
        Verbosity::Error => Level::ERROR,
    }
}
