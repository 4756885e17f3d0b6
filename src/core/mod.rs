//! Core types shared by every stage of the install pipeline.
//!
//! - [`LibhelperError`] enumerates the terminal failure kinds
//! - [`ErrorContext`] adds user-facing suggestions to an error
//! - [`user_friendly_error`] converts any `anyhow::Error` for display

pub mod error;

pub use error::{ErrorContext, LibhelperError, user_friendly_error};
