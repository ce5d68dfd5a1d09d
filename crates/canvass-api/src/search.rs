//! Handler for `GET /search`.
//!
//! Query params map directly to [`SearchQuery`] fields. Absent params skip
//! filtering on that field; `limit <= 0` returns all matches.

use axum::{
  Json,
  extract::{Query, State},
};
use canvass_core::{
  search::{ScoredRecord, SearchQuery},
  store::RosterStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub name:        Option<String>,
  pub address:     Option<String>,
  pub zip:         Option<String>,
  pub campaign_id: Option<i64>,
  #[serde(default = "default_limit")]
  pub limit:       i64,
  #[serde(default)]
  pub debug:       bool,
}

fn default_limit() -> i64 { SearchQuery::DEFAULT_LIMIT }

/// One search hit on the wire. Field names are fixed for existing clients.
#[derive(Debug, Serialize)]
pub struct SearchResult {
  pub id:                String,
  pub name:              String,
  pub address:           String,
  pub zip:               String,
  pub gender:            String,
  pub party:             String,
  pub language:          String,
  pub curr_reg_date:     String,
  pub orig_reg_date:     String,
  /// One-letter registration status code.
  pub reg_status:        String,
  pub reg_status_reason: String,
  /// Whether the record is confirmed for the requested campaign.
  pub is_validated:      bool,
  #[serde(rename = "type")]
  pub kind:              &'static str,

  // Raw scoring signals, present only when `debug=true` was requested.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub search_score:     Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name_similarity:  Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub addr_similarity:  Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub exact_addr_bonus: Option<f64>,
}

impl From<ScoredRecord> for SearchResult {
  fn from(hit: ScoredRecord) -> Self {
    let name = hit.record.full_name();
    let record = hit.record;
    Self {
      id: record.id,
      name,
      address: record.address.line,
      zip: record.address.zip,
      gender: record.gender,
      party: record.party,
      language: record.language,
      curr_reg_date: record.curr_reg_date,
      orig_reg_date: record.orig_reg_date,
      reg_status: record.status.code().to_owned(),
      reg_status_reason: record.status_reason,
      is_validated: hit.is_confirmed,
      kind: "Record",
      search_score: hit.scores.map(|s| s.search_score),
      name_similarity: hit.scores.map(|s| s.name_similarity),
      addr_similarity: hit.scores.map(|s| s.address_similarity),
      exact_addr_bonus: hit.scores.map(|s| s.exact_addr_bonus),
    }
  }
}

/// `GET /search[?name=...][&address=...][&zip=...][&campaign_id=...][&limit=...][&debug=true]`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, ApiError>
where
  S: RosterStore,
{
  let query = SearchQuery {
    name:        params.name,
    address:     params.address,
    zip:         params.zip,
    campaign_id: params.campaign_id,
    limit:       params.limit,
    debug:       params.debug,
  };

  let hits = state
    .engine
    .search(state.store.as_ref(), &query)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(hits.into_iter().map(SearchResult::from).collect()))
}
