//! Shared error handling and logging for the Olist bronze pipeline.
//!
//! Every workspace member pulls its error taxonomy and tracing setup from
//! here so the binaries log and fail the same way.

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{EtlError, Result};
