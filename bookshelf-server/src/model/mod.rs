mod user;
pub use user::{SessionUser, User};

mod sidebar;
pub use sidebar::{NavEntry, Sidebar, SidebarLink};

mod context;
pub use context::AppContext;
