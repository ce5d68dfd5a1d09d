//! Handler for `POST /confirmations` — fire-and-forget confirm/unconfirm
//! dispatch.
//!
//! Membership and record checks happen here, before dispatch, so bad requests
//! fail loudly while the store call itself runs detached from the request and
//! the operator is never blocked on storage latency. Post-dispatch failures
//! are logged, not surfaced; the search UI re-reads confirmation state on its
//! next query anyway.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use canvass_core::store::RosterStore;
use serde::Deserialize;
use serde_json::json;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
  pub record_id:      String,
  pub campaign_id:    i64,
  pub validator_id:   String,
  /// `true` to confirm, `false` to unconfirm. Both directions are
  /// idempotent.
  pub want_confirmed: bool,
}

/// `POST /confirmations` — body: `{"record_id":"V1","campaign_id":7,
/// "validator_id":"U1","want_confirmed":true}`. Returns `202 Accepted`
/// immediately after dispatch.
pub async fn dispatch<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<ConfirmBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RosterStore + 'static,
{
  let authorized = state
    .store
    .validator_in_campaign(body.campaign_id, &body.validator_id)
    .await
    .map_err(ApiError::store)?;
  if !authorized {
    return Err(ApiError::Forbidden(format!(
      "validator {} is not in campaign {}",
      body.validator_id, body.campaign_id
    )));
  }

  let record = state
    .store
    .get_record(&body.record_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("record {} not found", body.record_id))
    })?;
  if body.want_confirmed && !record.status.is_active() {
    return Err(ApiError::BadRequest(format!(
      "record {} is not active",
      body.record_id
    )));
  }

  let store = state.store.clone();
  tokio::spawn(async move {
    let result = if body.want_confirmed {
      store
        .confirm(&body.record_id, body.campaign_id, &body.validator_id)
        .await
        .map(drop)
    } else {
      store.unconfirm(&body.record_id, body.campaign_id).await
    };

    if let Err(error) = result {
      tracing::warn!(
        record_id = %body.record_id,
        campaign_id = body.campaign_id,
        want_confirmed = body.want_confirmed,
        %error,
        "confirmation task failed"
      );
    }
  });

  Ok((StatusCode::ACCEPTED, Json(json!({ "queued": true }))))
}
