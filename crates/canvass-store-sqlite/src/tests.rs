//! Integration tests for `SqliteStore` against an in-memory database.

use canvass_core::{
  Error as CoreError,
  record::{Address, Campaign, NameParts, Record, RegStatus},
  search::{SearchEngine, SearchQuery},
  store::{RosterStore, UpsertOutcome},
};
use chrono::{Duration, Utc};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn registrant(id: &str, first: &str, last: &str, addr: &str, zip: &str) -> Record {
  Record {
    id: id.into(),
    name: NameParts {
      first: first.into(),
      last: last.into(),
      ..NameParts::default()
    },
    address: Address {
      line: addr.into(),
      zip: zip.into(),
      ..Address::default()
    },
    status: RegStatus::Active,
    ..Record::default()
  }
}

async fn seed_campaign(s: &SqliteStore, id: i64) {
  s.put_campaign(Campaign {
    id,
    name: format!("campaign {id}"),
    goal: 1000,
  })
  .await
  .unwrap();
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_record() {
  let s = store().await;

  let outcome = s
    .upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();
  assert_eq!(outcome, UpsertOutcome::Added);

  let fetched = s.get_record("V1").await.unwrap().expect("record exists");
  assert_eq!(fetched.full_name(), "Jane Doe");
  assert_eq!(fetched.address.zip, "94110");
}

#[tokio::test]
async fn get_record_missing_returns_none() {
  let s = store().await;
  assert!(s.get_record("V404").await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_detects_unmodified_and_modified() {
  let s = store().await;
  let original = registrant("V1", "Jane", "Doe", "123 Main St", "94110");

  s.upsert_record(original.clone()).await.unwrap();

  let outcome = s.upsert_record(original.clone()).await.unwrap();
  assert_eq!(outcome, UpsertOutcome::Unmodified);

  let mut changed = original;
  changed.status = RegStatus::Inactive;
  let outcome = s.upsert_record(changed).await.unwrap();
  assert_eq!(outcome, UpsertOutcome::Modified {
    previous_status: RegStatus::Active
  });
}

#[tokio::test]
async fn full_name_is_recomputed_on_every_write() {
  let s = store().await;
  let mut record = registrant("V1", "Jane", "Doe", "123 Main St", "94110");
  s.upsert_record(record.clone()).await.unwrap();

  record.name.last = "Doe-Smith".into();
  s.upsert_record(record).await.unwrap();

  let fetched = s.get_record("V1").await.unwrap().unwrap();
  assert_eq!(fetched.full_name(), "Jane Doe-Smith");
}

#[tokio::test]
async fn list_active_excludes_other_statuses() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();
  let mut inactive = registrant("V2", "John", "Roe", "5 Oak Ave", "94110");
  inactive.status = RegStatus::Inactive;
  s.upsert_record(inactive).await.unwrap();
  let mut cancelled = registrant("V3", "Jan", "Poe", "7 Elm Rd", "94110");
  cancelled.status = RegStatus::Cancelled;
  s.upsert_record(cancelled).await.unwrap();

  let active = s.list_active_records(None).await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].id, "V1");
}

#[tokio::test]
async fn list_active_filters_zip_exactly() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "90210"))
    .await
    .unwrap();
  s.upsert_record(registrant("V2", "Jane", "Doe", "125 Main St", "94110"))
    .await
    .unwrap();

  let hits = s.list_active_records(Some("90210")).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert!(hits.iter().all(|r| r.address.zip == "90210"));
}

// ─── Confirm / unconfirm ─────────────────────────────────────────────────────

#[tokio::test]
async fn confirm_snapshots_record_fields() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();
  seed_campaign(&s, 7).await;

  let confirmation = s.confirm("V1", 7, "U1").await.unwrap();
  assert_eq!(confirmation.validator_id.as_deref(), Some("U1"));
  assert_eq!(confirmation.campaign_id, Some(7));
  assert_eq!(confirmation.campaign_key, 7);
  assert_eq!(confirmation.record_id.as_deref(), Some("V1"));
  assert_eq!(confirmation.record_external_id, "V1");
  assert_eq!(confirmation.record_full_name, "Jane Doe");
  assert_eq!(confirmation.record_address, "123 Main St");
}

#[tokio::test]
async fn confirm_is_idempotent() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();
  seed_campaign(&s, 7).await;

  let first = s.confirm("V1", 7, "U1").await.unwrap();
  // Second call with a different validator must return the original row
  // unchanged — same id, same validator, same timestamp.
  let second = s.confirm("V1", 7, "U2").await.unwrap();
  assert_eq!(first, second);

  let ids = s.confirmed_record_ids(7).await.unwrap();
  assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn confirm_unknown_record_fails() {
  let s = store().await;
  seed_campaign(&s, 7).await;

  let err = s.confirm("V404", 7, "U1").await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(CoreError::RecordNotFound(ref id)) if id == "V404"
  ));
}

#[tokio::test]
async fn confirm_unknown_campaign_fails() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();

  let err = s.confirm("V1", 404, "U1").await.unwrap_err();
  assert!(matches!(err, Error::Domain(CoreError::CampaignNotFound(404))));
}

#[tokio::test]
async fn confirm_inactive_record_is_rejected() {
  let s = store().await;
  let mut record = registrant("V1", "Jane", "Doe", "123 Main St", "94110");
  record.status = RegStatus::Inactive;
  s.upsert_record(record).await.unwrap();
  seed_campaign(&s, 7).await;

  let err = s.confirm("V1", 7, "U1").await.unwrap_err();
  assert!(matches!(
    err,
    Error::Domain(CoreError::RecordNotActive(ref id)) if id == "V1"
  ));
}

#[tokio::test]
async fn unconfirm_deletes_and_reconfirm_creates_fresh_row() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();
  seed_campaign(&s, 7).await;

  let first = s.confirm("V1", 7, "U1").await.unwrap();
  s.unconfirm("V1", 7).await.unwrap();
  assert!(s.get_confirmation("V1", 7).await.unwrap().is_none());

  let again = s.confirm("V1", 7, "U1").await.unwrap();
  assert_ne!(first.confirmation_id, again.confirmation_id);
}

#[tokio::test]
async fn unconfirm_without_confirmation_is_a_noop() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();
  seed_campaign(&s, 7).await;

  s.unconfirm("V1", 7).await.unwrap();
  s.unconfirm("V1", 7).await.unwrap();
}

#[tokio::test]
async fn unconfirm_unknown_ids_fail() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();
  seed_campaign(&s, 7).await;

  assert!(matches!(
    s.unconfirm("V404", 7).await.unwrap_err(),
    Error::Domain(CoreError::RecordNotFound(_))
  ));
  assert!(matches!(
    s.unconfirm("V1", 404).await.unwrap_err(),
    Error::Domain(CoreError::CampaignNotFound(404))
  ));
}

#[tokio::test]
async fn concurrent_confirms_create_exactly_one_row() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();
  seed_campaign(&s, 7).await;

  let mut handles = Vec::new();
  for i in 0..8 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.confirm("V1", 7, &format!("U{i}")).await
    }));
  }

  let mut confirmation_ids = Vec::new();
  for handle in handles {
    let confirmation = handle.await.unwrap().unwrap();
    confirmation_ids.push(confirmation.confirmation_id);
  }

  // Every racer observed the same single row.
  confirmation_ids.dedup();
  assert_eq!(confirmation_ids.len(), 1);
  assert_eq!(s.confirmed_record_ids(7).await.unwrap().len(), 1);
}

// ─── Deactivation callback ───────────────────────────────────────────────────

#[tokio::test]
async fn deactivation_unlinks_but_keeps_audit_row() {
  let s = store().await;
  let record = registrant("V1", "Jane", "Doe", "123 Main St", "94110");
  s.upsert_record(record.clone()).await.unwrap();
  seed_campaign(&s, 7).await;
  s.confirm("V1", 7, "U1").await.unwrap();

  let mut deactivated = record;
  deactivated.status = RegStatus::Inactive;
  s.upsert_record(deactivated).await.unwrap();
  let unlinked = s.on_record_deactivated("V1").await.unwrap();
  assert_eq!(unlinked, 1);

  let confirmation = s
    .get_confirmation("V1", 7)
    .await
    .unwrap()
    .expect("audit row survives deactivation");
  assert_eq!(confirmation.record_id, None);
  assert_eq!(confirmation.record_full_name, "Jane Doe");
  assert_eq!(confirmation.record_address, "123 Main St");
  assert_eq!(confirmation.record_external_id, "V1");
}

#[tokio::test]
async fn reactivated_record_is_not_confirmed_until_reconfirmed() {
  let s = store().await;
  let record = registrant("V1", "Jane", "Doe", "123 Main St", "94110");
  s.upsert_record(record.clone()).await.unwrap();
  seed_campaign(&s, 7).await;
  s.confirm("V1", 7, "U1").await.unwrap();

  let mut deactivated = record.clone();
  deactivated.status = RegStatus::Inactive;
  s.upsert_record(deactivated).await.unwrap();
  s.on_record_deactivated("V1").await.unwrap();

  // A later roster import brings the record back as Active. The orphaned
  // confirmation must not resurface: every confirmation view has to agree.
  s.upsert_record(record).await.unwrap();
  assert!(s.confirmed_record_ids(7).await.unwrap().is_empty());
  assert_eq!(s.confirmation_count(7).await.unwrap(), 0);

  let engine = SearchEngine::default();
  let query = SearchQuery {
    name: Some("jane doe".into()),
    campaign_id: Some(7),
    ..SearchQuery::default()
  };
  let results = engine.search(&s, &query).await.unwrap();
  assert_eq!(results.len(), 1);
  assert!(!results[0].is_confirmed);
}

#[tokio::test]
async fn reconfirm_after_reactivation_relinks_original_row() {
  let s = store().await;
  let record = registrant("V1", "Jane", "Doe", "123 Main St", "94110");
  s.upsert_record(record.clone()).await.unwrap();
  seed_campaign(&s, 7).await;
  let first = s.confirm("V1", 7, "U1").await.unwrap();

  let mut deactivated = record.clone();
  deactivated.status = RegStatus::Inactive;
  s.upsert_record(deactivated).await.unwrap();
  s.on_record_deactivated("V1").await.unwrap();
  s.upsert_record(record).await.unwrap();

  // Confirming again re-links the orphaned row under its original id with
  // a fresh validator and snapshot, instead of returning it stale.
  let relinked = s.confirm("V1", 7, "U2").await.unwrap();
  assert_eq!(relinked.confirmation_id, first.confirmation_id);
  assert_eq!(relinked.record_id.as_deref(), Some("V1"));
  assert_eq!(relinked.validator_id.as_deref(), Some("U2"));
  assert!(relinked.last_updated > first.last_updated);

  assert_eq!(s.confirmation_count(7).await.unwrap(), 1);
  assert!(s.confirmed_record_ids(7).await.unwrap().contains("V1"));
}

#[tokio::test]
async fn confirmation_count_ignores_unlinked_and_inactive() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();
  s.upsert_record(registrant("V2", "John", "Roe", "5 Oak Ave", "94110"))
    .await
    .unwrap();
  seed_campaign(&s, 7).await;
  s.confirm("V1", 7, "U1").await.unwrap();
  s.confirm("V2", 7, "U1").await.unwrap();
  assert_eq!(s.confirmation_count(7).await.unwrap(), 2);

  // V2 goes inactive: its confirmation stops counting towards the goal even
  // before the unlink callback runs, and stays uncounted after it.
  let mut v2 = registrant("V2", "John", "Roe", "5 Oak Ave", "94110");
  v2.status = RegStatus::Inactive;
  s.upsert_record(v2).await.unwrap();
  assert_eq!(s.confirmation_count(7).await.unwrap(), 1);
  s.on_record_deactivated("V2").await.unwrap();
  assert_eq!(s.confirmation_count(7).await.unwrap(), 1);
}

#[tokio::test]
async fn confirmations_since_reports_recent_activity() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();
  seed_campaign(&s, 7).await;
  s.confirm("V1", 7, "U1").await.unwrap();

  let day_ago = Utc::now() - Duration::hours(24);
  assert_eq!(s.confirmations_since(7, day_ago).await.unwrap(), 1);
  let in_an_hour = Utc::now() + Duration::hours(1);
  assert_eq!(s.confirmations_since(7, in_an_hour).await.unwrap(), 0);
}

// ─── Campaign membership ─────────────────────────────────────────────────────

#[tokio::test]
async fn campaign_membership_checks() {
  let s = store().await;
  seed_campaign(&s, 7).await;

  assert!(!s.validator_in_campaign(7, "U1").await.unwrap());
  s.add_campaign_member(7, "U1").await.unwrap();
  assert!(s.validator_in_campaign(7, "U1").await.unwrap());
  // Re-enrolment is idempotent.
  s.add_campaign_member(7, "U1").await.unwrap();
  assert!(!s.validator_in_campaign(8, "U1").await.unwrap());
}

// ─── End-to-end search ───────────────────────────────────────────────────────

#[tokio::test]
async fn search_finds_and_annotates_confirmation_state() {
  let s = store().await;
  let mut v1 = registrant("V1", "Jane", "Doe", "123 Main St", "94110");
  v1.name.middle = "A".into();
  s.upsert_record(v1).await.unwrap();
  seed_campaign(&s, 7).await;

  let engine = SearchEngine::default();
  let query = SearchQuery {
    name: Some("jane doe".into()),
    address: Some("123 main".into()),
    zip: Some("94110".into()),
    campaign_id: Some(7),
    ..SearchQuery::default()
  };

  let results = engine.search(&s, &query).await.unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].record.id, "V1");
  assert!(!results[0].is_confirmed);

  s.confirm("V1", 7, "U1").await.unwrap();
  let results = engine.search(&s, &query).await.unwrap();
  assert!(results[0].is_confirmed);

  s.unconfirm("V1", 7).await.unwrap();
  let results = engine.search(&s, &query).await.unwrap();
  assert!(!results[0].is_confirmed);
}

#[tokio::test]
async fn search_repeats_identically() {
  let s = store().await;
  for (id, first, addr) in [
    ("V1", "Jane", "123 Main St"),
    ("V2", "Jan", "125 Main St"),
    ("V3", "Janet", "123 Maine St"),
  ] {
    s.upsert_record(registrant(id, first, "Doe", addr, "94110"))
      .await
      .unwrap();
  }

  let engine = SearchEngine::default();
  let query = SearchQuery {
    name: Some("jane doe".into()),
    address: Some("123 main".into()),
    debug: true,
    ..SearchQuery::default()
  };

  let first = engine.search(&s, &query).await.unwrap();
  let second = engine.search(&s, &query).await.unwrap();
  assert_eq!(first, second);
}

#[tokio::test]
async fn deactivated_record_leaves_search_but_not_audit_log() {
  let s = store().await;
  let record = registrant("V1", "Jane", "Doe", "123 Main St", "94110");
  s.upsert_record(record.clone()).await.unwrap();
  seed_campaign(&s, 7).await;
  s.confirm("V1", 7, "U1").await.unwrap();

  let mut deactivated = record;
  deactivated.status = RegStatus::Inactive;
  s.upsert_record(deactivated).await.unwrap();
  s.on_record_deactivated("V1").await.unwrap();

  let engine = SearchEngine::default();
  let query = SearchQuery {
    name: Some("jane doe".into()),
    campaign_id: Some(7),
    ..SearchQuery::default()
  };
  let results = engine.search(&s, &query).await.unwrap();
  assert!(results.is_empty());

  assert!(s.get_confirmation("V1", 7).await.unwrap().is_some());
}

#[tokio::test]
async fn search_debug_flag_controls_score_exposure() {
  let s = store().await;
  s.upsert_record(registrant("V1", "Jane", "Doe", "123 Main St", "94110"))
    .await
    .unwrap();

  let engine = SearchEngine::default();
  let plain = SearchQuery {
    name: Some("jane doe".into()),
    ..SearchQuery::default()
  };
  let results = engine.search(&s, &plain).await.unwrap();
  assert!(results[0].scores.is_none());

  let debug = SearchQuery { debug: true, ..plain };
  let results = engine.search(&s, &debug).await.unwrap();
  let scores = results[0].scores.expect("debug scores present");
  assert!(scores.search_score > 0.0);
  assert_eq!(scores.name_similarity, 1.0);
}
