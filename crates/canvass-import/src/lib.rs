//! Roster import reconciler.
//!
//! Feeds master roster file updates into the record corpus: new registrants
//! are added, existing ones updated field by field, and any record whose
//! registration status transitions away from `Active` has its confirmations
//! unlinked via the store's deactivation callback.
//!
//! The roster file is a headered TSV published by the elections vendor; its
//! column names are translated through an explicit mapping table that is
//! validated before any row is read.

pub mod mapping;
pub mod reconcile;

use thiserror::Error;

pub use mapping::{ROSTER_FILE_MAPPING, RecordField, RosterReader};
pub use reconcile::{ImportCounts, Reconciler, import_tsv};

#[derive(Debug, Error)]
pub enum ImportError {
  #[error("invalid field mapping: {0}")]
  Mapping(String),

  #[error("roster file is missing column {0:?}")]
  MissingColumn(String),

  #[error("row {row}: expected at least {expected} fields, found {found}")]
  RowWidth {
    row:      usize,
    expected: usize,
    found:    usize,
  },

  #[error("row {row}: {message}")]
  BadValue { row: usize, message: String },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = ImportError> = std::result::Result<T, E>;
