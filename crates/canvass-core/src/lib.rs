//! Core types, scoring, and trait definitions for the canvass roster search.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod confirmation;
pub mod error;
pub mod normalize;
pub mod record;
pub mod search;
pub mod similarity;
pub mod store;

pub use error::{Error, Result};
