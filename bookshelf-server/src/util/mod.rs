pub use bookshelf_config::{ClientConfig, Config};

mod logger;
pub use logger::TracingLogger;

mod slug;
pub use slug::slugify;
