mod builder;
pub use builder::Builder;

mod server;
pub use server::Server;
