//! # llmdash-core
//!
//! Shared errors and logging for the llmdash usage dashboard.
//!
//! This crate provides:
//! - [`DashError`] - Process-level errors (configuration, I/O, server startup)
//! - [`logging`] - Tracing setup with a JSON-lines file and a console layer
//! - [`paths`] - Home-relative path helpers
//!
//! ## Example
//!
//! ```no_run
//! use llmdash_core::{DashError, logging};
//!
//! fn main() -> llmdash_core::Result<()> {
//!     let _guard = logging::init_logging(None, false)?;
//!
//!     let config_path = std::path::Path::new("/etc/llmdash/config.yaml");
//!     if !config_path.exists() {
//!         return Err(DashError::config_not_found(config_path));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{DashError, Result};
pub use logging::{LogGuard, init_logging};
pub use paths::expand_home;
