//! Framesmith Common
//!
//! Pieces every Framesmith crate shares: the [`FramesmithError`] type,
//! the JSON tool configuration and tracing setup for the CLI.

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
