//! Verinews Core
//!
//! Core types and error handling shared across Verinews components.
//!
//! This crate provides:
//! - The binary news [`Label`] and labeled [`Document`]
//! - The error taxonomy used by training, persistence and serving

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Document, Label};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Document, Label};
}
