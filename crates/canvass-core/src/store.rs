//! The `RosterStore` trait — storage abstraction for records, campaigns, and
//! confirmations.
//!
//! The trait is implemented by storage backends (e.g. `canvass-store-sqlite`).
//! Higher layers (`canvass-api`, `canvass-import`) depend on this
//! abstraction, not on any concrete backend.

use std::{collections::HashSet, future::Future};

use chrono::{DateTime, Utc};

use crate::{
  confirmation::ConfirmationRecord,
  record::{Campaign, Record, RegStatus},
};

// ─── Reconciler outcome ──────────────────────────────────────────────────────

/// What [`RosterStore::upsert_record`] did with an incoming roster row.
///
/// `Modified` carries the status the record had before the write so the
/// import reconciler can detect transitions away from `Active` and fire the
/// deactivation callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  Added,
  Unmodified,
  Modified { previous_status: RegStatus },
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a canvass storage backend.
///
/// Reads are side-effect free and may run concurrently without coordination.
/// Confirmation mutations are serialized per `(campaign, record)` key by the
/// backend: the one-confirmation uniqueness invariant is enforced at the
/// storage layer, never by application-level check-then-act.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RosterStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Records ───────────────────────────────────────────────────────────

  /// List records with `Active` registration status, optionally restricted
  /// to an exact ZIP match (postal codes are never matched fuzzily).
  fn list_active_records<'a>(
    &'a self,
    zip: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;

  /// Point lookup by external id. Returns `None` if not found.
  fn get_record<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a;

  /// Insert or update a record from the import reconciler. The stored full
  /// name is recomputed from the name parts on every write.
  fn upsert_record(
    &self,
    record: Record,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  // ── Campaigns ─────────────────────────────────────────────────────────

  /// Retrieve a campaign by id. Returns `None` if not found.
  fn get_campaign(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Campaign>, Self::Error>> + Send + '_;

  /// Create or replace a campaign (administrative tooling only).
  fn put_campaign(
    &self,
    campaign: Campaign,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Enrol a validator in a campaign. Idempotent.
  fn add_campaign_member<'a>(
    &'a self,
    campaign_id: i64,
    validator_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Whether `validator_id` may confirm records for `campaign_id`. Consumed
  /// by the HTTP authorization boundary; the core never re-derives this.
  fn validator_in_campaign<'a>(
    &'a self,
    campaign_id: i64,
    validator_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Confirmations ─────────────────────────────────────────────────────

  /// Idempotently confirm a record for a campaign.
  ///
  /// If a live confirmation already exists for the pair it is returned
  /// unchanged (no timestamp or validator update). A row orphaned by an
  /// earlier deactivation is re-linked under its original confirmation id,
  /// with the validator, snapshot, and timestamp refreshed. Otherwise a new
  /// row is created with the record's name/address/external-id snapshotted
  /// into the denormalized fields. Racing duplicate inserts are absorbed by
  /// the storage uniqueness constraint and resolved as a read of the winner.
  fn confirm<'a>(
    &'a self,
    record_id: &'a str,
    campaign_id: i64,
    validator_id: &'a str,
  ) -> impl Future<Output = Result<ConfirmationRecord, Self::Error>> + Send + 'a;

  /// Idempotently remove a confirmation. Deletes the row outright if present
  /// (absence means "not confirmed"); silent no-op otherwise.
  fn unconfirm<'a>(
    &'a self,
    record_id: &'a str,
    campaign_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Look up the confirmation for a `(campaign, record)` pair, if any.
  /// Keyed on the denormalized columns, so it still resolves after the live
  /// record link has been nulled.
  fn get_confirmation<'a>(
    &'a self,
    record_id: &'a str,
    campaign_id: i64,
  ) -> impl Future<Output = Result<Option<ConfirmationRecord>, Self::Error>>
  + Send
  + 'a;

  /// External ids of every record confirmed for `campaign_id` and still
  /// linked to a live record. Used by the ranking engine to annotate
  /// results; orphaned audit rows never count, so this view always agrees
  /// with [`RosterStore::confirmation_count`].
  fn confirmed_record_ids(
    &self,
    campaign_id: i64,
  ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send + '_;

  /// Confirmations for `campaign_id` still linked to an `Active` record —
  /// the campaign's progress towards its goal.
  fn confirmation_count(
    &self,
    campaign_id: i64,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Confirmations for `campaign_id` touched at or after `since`, for
  /// activity reporting (e.g. "confirmations in the last 24h").
  fn confirmations_since(
    &self,
    campaign_id: i64,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Reconciler callback ───────────────────────────────────────────────

  /// Invoked by the import reconciler when a record's status transitions
  /// away from `Active`. Nulls the `record_id` link on every matching
  /// confirmation — never deletes them — and returns the number unlinked.
  fn on_record_deactivated<'a>(
    &'a self,
    record_id: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}
