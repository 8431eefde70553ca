//! CLI command implementations

pub mod bootstrap;
pub mod clean;
pub mod config;
pub mod status;

pub use bootstrap::execute as bootstrap;
pub use clean::execute as clean;
pub use config::execute as config;
pub use status::execute as status;
