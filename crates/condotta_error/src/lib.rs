//! Error types for the Condotta faction bot.
//!
//! This crate provides the foundation error types used throughout the Condotta
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use condotta_error::{CondottaResult, CommandError, CommandErrorKind};
//!
//! fn declare_war() -> CondottaResult<()> {
//!     Err(CommandError::new(CommandErrorKind::WarAlreadyActive))?
//! }
//!
//! match declare_war() {
//!     Ok(_) => println!("war declared"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod config;
mod error;
mod provision;
mod store;

pub use command::{CommandError, CommandErrorKind};
pub use config::ConfigError;
pub use error::{CondottaError, CondottaErrorKind, CondottaResult};
pub use provision::{ProvisionError, ProvisionErrorKind};
pub use store::{StoreError, StoreErrorKind};
