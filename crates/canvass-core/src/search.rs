//! The ranking engine: fuzzy, multi-field, weighted search over the active
//! roster.
//!
//! Searching is a pure read — no mutation, no side effects — so any number of
//! calls may run concurrently, and identical inputs against an unchanged
//! corpus always produce identical ordered output.

use serde::Serialize;

use crate::{
  normalize::{normalize, normalize_query},
  record::{Record, RegStatus},
  similarity::similarity,
  store::RosterStore,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Scoring weights and the candidate gate, passed to the engine at
/// construction so they can be tuned and unit-tested independently of
/// request handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchWeights {
  /// Weight applied to full-name trigram similarity.
  pub name:          f64,
  /// Weight applied to address trigram similarity.
  pub address:       f64,
  /// Weight applied to the exact-substring address bonus.
  pub exact_address: f64,
  /// Per-field floor below which candidates are dropped before final
  /// scoring. Near zero on purpose: it bounds the candidate set, it is not a
  /// relevance filter. Calibrated against the summed trigram scorer's scale;
  /// recalibrate if the scorer changes.
  pub candidate_gate: f64,
}

impl Default for SearchWeights {
  fn default() -> Self {
    Self {
      name:           1.5,
      address:        1.25,
      exact_address:  0.35,
      candidate_gate: 0.005,
    }
  }
}

// ─── Query and result types ──────────────────────────────────────────────────

/// Parameters for [`SearchEngine::search`].
///
/// `None` fields are skipped entirely; an explicitly empty field still
/// participates in scoring (and matches nothing once gated).
#[derive(Debug, Clone)]
pub struct SearchQuery {
  pub name:        Option<String>,
  pub address:     Option<String>,
  /// Matched exactly against the record ZIP when non-empty — no fuzziness on
  /// postal codes.
  pub zip:         Option<String>,
  /// When set, results are annotated with `is_confirmed` for this campaign.
  pub campaign_id: Option<i64>,
  /// Zero or negative means unbounded.
  pub limit:       i64,
  /// Attach the raw score breakdown to each result.
  pub debug:       bool,
}

impl SearchQuery {
  pub const DEFAULT_LIMIT: i64 = 60;
}

impl Default for SearchQuery {
  fn default() -> Self {
    Self {
      name:        None,
      address:     None,
      zip:         None,
      campaign_id: None,
      limit:       Self::DEFAULT_LIMIT,
      debug:       false,
    }
  }
}

/// Raw scoring signals for one result, exposed only in debug mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
  pub search_score:       f64,
  pub name_similarity:    f64,
  pub address_similarity: f64,
  pub exact_addr_bonus:   f64,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
  pub record:       Record,
  /// Whether a confirmation exists for the queried campaign and the record
  /// is still active. Always `false` when no campaign was supplied.
  pub is_confirmed: bool,
  /// Present only when the query had `debug` set.
  pub scores:       Option<ScoreBreakdown>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Filters, scores, and orders roster records for a query.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
  weights: SearchWeights,
}

impl SearchEngine {
  pub fn new(weights: SearchWeights) -> Self { Self { weights } }

  /// Score and order `records` against already-normalized query fields.
  ///
  /// Pure and deterministic: ties are broken by record id ascending so that
  /// repeated identical calls yield identical output. Non-active records are
  /// never returned. `limit <= 0` returns all matches.
  pub fn rank(
    &self,
    records: Vec<Record>,
    name: Option<&str>,
    address: Option<&str>,
    limit: i64,
  ) -> Vec<(Record, ScoreBreakdown)> {
    let w = &self.weights;
    let mut scored: Vec<(Record, ScoreBreakdown)> = Vec::new();

    for record in records {
      if record.status != RegStatus::Active {
        continue;
      }

      let record_name = normalize(&record.full_name());
      let record_addr = normalize(&record.address.line);

      let name_similarity = match name {
        Some(query) => similarity([record_name.as_str()], query),
        None => 0.0,
      };
      if name.is_some() && name_similarity < w.candidate_gate {
        continue;
      }

      let address_similarity = match address {
        Some(query) => similarity([record_addr.as_str()], query),
        None => 0.0,
      };
      if address.is_some() && address_similarity < w.candidate_gate {
        continue;
      }

      let exact_addr_bonus = match address {
        Some(query) if !query.is_empty() && record_addr.contains(query) => 1.0,
        _ => 0.0,
      };

      let search_score = w.name * name_similarity
        + w.address * address_similarity
        + w.exact_address * exact_addr_bonus;

      scored.push((record, ScoreBreakdown {
        search_score,
        name_similarity,
        address_similarity,
        exact_addr_bonus,
      }));
    }

    scored.sort_by(|a, b| {
      b.1
        .search_score
        .total_cmp(&a.1.search_score)
        .then_with(|| a.0.id.cmp(&b.0.id))
    });

    if limit > 0 {
      scored.truncate(limit as usize);
    }
    scored
  }

  /// Run a full search against `store`: normalize the query, pull the active
  /// (and optionally ZIP-filtered) corpus, rank it, and annotate results with
  /// confirmation state when a campaign was supplied.
  ///
  /// Empty or missing query fields are valid inputs, never errors; only
  /// storage failures propagate.
  pub async fn search<S: RosterStore>(
    &self,
    store: &S,
    query: &SearchQuery,
  ) -> Result<Vec<ScoredRecord>, S::Error> {
    let name = normalize_query(query.name.as_deref());
    let address = normalize_query(query.address.as_deref());
    let zip = normalize_query(query.zip.as_deref());

    // ZIP filtering is exact and pushed down to the store; an empty ZIP
    // after normalization filters nothing.
    let zip_filter = zip.as_deref().filter(|z| !z.is_empty());
    let records = store.list_active_records(zip_filter).await?;

    let ranked =
      self.rank(records, name.as_deref(), address.as_deref(), query.limit);

    let confirmed = match query.campaign_id {
      Some(campaign_id) => Some(store.confirmed_record_ids(campaign_id).await?),
      None => None,
    };

    Ok(
      ranked
        .into_iter()
        .map(|(record, scores)| ScoredRecord {
          is_confirmed: confirmed
            .as_ref()
            .is_some_and(|ids| ids.contains(&record.id))
            && record.status.is_active(),
          scores: query.debug.then_some(scores),
          record,
        })
        .collect(),
    )
  }
}
