//! pxdgen Core
//!
//! Core types and interfaces shared by the pxdgen header translator.

pub mod config;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
