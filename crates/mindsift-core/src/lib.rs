//! # mindsift-core
//!
//! Core types, traits, and abstractions for mindsift.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other mindsift crates depend on: the note/idea domain
//! model, the processing state machine enums, store traits, the shared
//! error type, and centralized defaults.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
