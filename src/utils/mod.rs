// Shared utilities module
pub mod config_loader;
pub mod errors;
pub mod logging;
pub mod watch;

pub use errors::*;
pub use logging::*;
