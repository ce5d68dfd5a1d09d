//! ConfirmationRecord — marks a record confirmed for a campaign.
//!
//! The links to the record, campaign, and validator are optional: when one of
//! those entities is removed (or a record is deactivated by an import), the
//! link is nulled rather than the confirmation deleted. The denormalized
//! snapshot fields keep the row human-auditable regardless.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// "Record X is confirmed for campaign Y by operator Z at time T."
///
/// At most one row exists per `(campaign_key, record_external_id)` pair;
/// the storage layer enforces this with a UNIQUE constraint. Absence of a
/// row means "not confirmed" — unconfirm deletes outright, no soft delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRecord {
  pub confirmation_id: Uuid,

  /// The operator who confirmed; `None` if that operator was later removed.
  pub validator_id: Option<String>,

  /// Live link to the campaign; `None` if the campaign was removed.
  pub campaign_id:  Option<i64>,
  /// Denormalized campaign id; survives campaign removal and carries the
  /// uniqueness constraint.
  pub campaign_key: i64,

  /// Live link to the record; `None` once the record is removed or marked
  /// inactive by the import reconciler (the confirmation then remains as an
  /// orphaned audit entry).
  pub record_id:          Option<String>,
  /// Denormalized snapshot, captured at confirm time.
  pub record_external_id: String,
  pub record_full_name:   String,
  pub record_address:     String,

  /// Set on every mutating write; used for activity reporting.
  pub last_updated: DateTime<Utc>,
}
