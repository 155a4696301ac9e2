//! Builds a UI component library into mini-program and H5 outputs.
//!
//! The library entry file is analyzed for the components and stylesheets it
//! exposes. Everything reachable from them is copied into `<output>/weapp` and
//! `<output>/h5`, and a dispatcher module selects one at runtime.

pub mod cli;
pub mod core;
pub mod infrastructure;
pub mod utils;

pub use crate::core::{BuildContext, BuildOptions, LibraryBuildService, Target};
pub use crate::utils::{DuplexError, Result};
