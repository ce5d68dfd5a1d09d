//! Error types for `canvass-core`.
//!
//! Missing or empty query fields are valid search inputs, not errors, so the
//! ranking engine has no variants here. Uniqueness conflicts on confirm are
//! absorbed by the store as no-ops and never surface either. Malformed
//! identifiers are rejected at the HTTP boundary before they reach the core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("record not found: {0}")]
  RecordNotFound(String),

  #[error("campaign not found: {0}")]
  CampaignNotFound(i64),

  /// Only records with `Active` registration status may be confirmed.
  #[error("record {0} is not active")]
  RecordNotActive(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
