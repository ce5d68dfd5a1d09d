//! Handler for `GET /campaigns/{id}` — campaign progress reporting.

use axum::{
  Json,
  extract::{Path, State},
};
use canvass_core::store::RosterStore;
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct CampaignProgress {
  pub id:   i64,
  pub name: String,
  pub goal: i64,
  /// Confirmations still linked to an active record.
  pub confirmed:          u64,
  /// Confirmations touched in the last 24 hours.
  pub confirmed_last_24h: u64,
}

/// `GET /campaigns/{id}`
pub async fn progress<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<CampaignProgress>, ApiError>
where
  S: RosterStore,
{
  let campaign = state
    .store
    .get_campaign(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("campaign {id} not found")))?;

  let confirmed = state
    .store
    .confirmation_count(id)
    .await
    .map_err(ApiError::store)?;
  let confirmed_last_24h = state
    .store
    .confirmations_since(id, Utc::now() - Duration::hours(24))
    .await
    .map_err(ApiError::store)?;

  Ok(Json(CampaignProgress {
    id: campaign.id,
    name: campaign.name,
    goal: campaign.goal,
    confirmed,
    confirmed_last_24h,
  }))
}
