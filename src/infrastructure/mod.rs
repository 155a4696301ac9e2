// Infrastructure layer
pub mod bundler_runner;
pub mod file_system;
pub mod materializer;
pub mod processors;
pub mod resolver;
pub mod staging;
pub mod walker;

pub use bundler_runner::*;
pub use materializer::*;
pub use resolver::*;
pub use staging::*;
pub use walker::*;
