
pub mod analysis_handlers;
pub mod auth_handlers;
pub mod system_handlers;

pub use analysis_handlers::*;
pub use auth_handlers::*;
pub use system_handlers::*;
