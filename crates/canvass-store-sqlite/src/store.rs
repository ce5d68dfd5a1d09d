//! [`SqliteStore`] — the SQLite implementation of [`RosterStore`].

use std::{collections::HashSet, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use canvass_core::{
  Error as CoreError,
  confirmation::ConfirmationRecord,
  record::{Campaign, Record},
  store::{RosterStore, UpsertOutcome},
};

use crate::{
  Error, Result,
  encode::{
    CONFIRMATION_COLUMNS, RECORD_COLUMNS, RawConfirmation, RawRecord,
    decode_status, encode_dt, encode_uuid, raw_confirmation_from_row,
    raw_record_from_row,
  },
  schema::SCHEMA,
};

// ─── Closure outcome types ───────────────────────────────────────────────────
//
// Domain errors cannot cross the `tokio_rusqlite::call` boundary, so the
// closures report outcomes as plain enums which are mapped to errors outside.

enum RawUpsert {
  Added,
  Unmodified,
  Modified { previous_status: String },
}

enum RawConfirm {
  RecordMissing,
  RecordInactive,
  CampaignMissing,
  Row(RawConfirmation),
}

enum RawUnconfirm {
  RecordMissing,
  CampaignMissing,
  Done,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A canvass roster store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls on
/// one store run on the connection's dedicated thread, so confirmation
/// mutations are serialized; the UNIQUE constraint on
/// `(campaign_key, record_external_id)` backstops the invariant regardless.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn record_insert_params(raw: &RawRecord) -> [&dyn rusqlite::ToSql; 23] {
  [
    &raw.record_id,
    &raw.first_name,
    &raw.middle_name,
    &raw.last_name,
    &raw.suffix,
    &raw.full_name,
    &raw.address,
    &raw.address_zip,
    &raw.address_city,
    &raw.address_state,
    &raw.address_house_num,
    &raw.address_street,
    &raw.address_street_suffix,
    &raw.address_unit,
    &raw.phone,
    &raw.email,
    &raw.curr_reg_date,
    &raw.orig_reg_date,
    &raw.reg_status,
    &raw.reg_status_reason,
    &raw.gender,
    &raw.party,
    &raw.language,
  ]
}

// ─── RosterStore impl ────────────────────────────────────────────────────────

impl RosterStore for SqliteStore {
  type Error = Error;

  // ── Records ───────────────────────────────────────────────────────────────

  async fn list_active_records(&self, zip: Option<&str>) -> Result<Vec<Record>> {
    let zip = zip.map(str::to_owned);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        // Ordered by id so the corpus enumeration itself is deterministic.
        let rows = if let Some(z) = zip {
          let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records
             WHERE reg_status = 'A' AND address_zip = ?1
             ORDER BY record_id"
          ))?;
          stmt
            .query_map(rusqlite::params![z], |row| raw_record_from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records
             WHERE reg_status = 'A'
             ORDER BY record_id"
          ))?;
          stmt
            .query_map([], |row| raw_record_from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn get_record(&self, id: &str) -> Result<Option<Record>> {
    let id = id.to_owned();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {RECORD_COLUMNS} FROM records WHERE record_id = ?1"
              ),
              rusqlite::params![id],
              raw_record_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn upsert_record(&self, record: Record) -> Result<UpsertOutcome> {
    let incoming = RawRecord::from_record(&record);

    let raw = self
      .conn
      .call(move |conn| {
        let existing: Option<RawRecord> = conn
          .query_row(
            &format!(
              "SELECT {RECORD_COLUMNS} FROM records WHERE record_id = ?1"
            ),
            rusqlite::params![incoming.record_id],
            raw_record_from_row,
          )
          .optional()?;

        match existing {
          None => {
            conn.execute(
              "INSERT INTO records (
                 record_id, first_name, middle_name, last_name, suffix,
                 full_name, address, address_zip, address_city, address_state,
                 address_house_num, address_street, address_street_suffix,
                 address_unit, phone, email, curr_reg_date, orig_reg_date,
                 reg_status, reg_status_reason, gender, party, language
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                         ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22,
                         ?23)",
              &record_insert_params(&incoming)[..],
            )?;
            Ok(RawUpsert::Added)
          }
          Some(existing) if existing == incoming => Ok(RawUpsert::Unmodified),
          Some(existing) => {
            conn.execute(
              "UPDATE records SET
                 first_name = ?2, middle_name = ?3, last_name = ?4,
                 suffix = ?5, full_name = ?6, address = ?7, address_zip = ?8,
                 address_city = ?9, address_state = ?10,
                 address_house_num = ?11, address_street = ?12,
                 address_street_suffix = ?13, address_unit = ?14, phone = ?15,
                 email = ?16, curr_reg_date = ?17, orig_reg_date = ?18,
                 reg_status = ?19, reg_status_reason = ?20, gender = ?21,
                 party = ?22, language = ?23
               WHERE record_id = ?1",
              &record_insert_params(&incoming)[..],
            )?;
            Ok(RawUpsert::Modified { previous_status: existing.reg_status })
          }
        }
      })
      .await?;

    Ok(match raw {
      RawUpsert::Added => UpsertOutcome::Added,
      RawUpsert::Unmodified => UpsertOutcome::Unmodified,
      RawUpsert::Modified { previous_status } => UpsertOutcome::Modified {
        previous_status: decode_status(&previous_status)?,
      },
    })
  }

  // ── Campaigns ─────────────────────────────────────────────────────────────

  async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
    let campaign = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT campaign_id, name, goal FROM campaigns
               WHERE campaign_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(Campaign {
                  id:   row.get(0)?,
                  name: row.get(1)?,
                  goal: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(campaign)
  }

  async fn put_campaign(&self, campaign: Campaign) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO campaigns (campaign_id, name, goal)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![campaign.id, campaign.name, campaign.goal],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn add_campaign_member(
    &self,
    campaign_id: i64,
    validator_id: &str,
  ) -> Result<()> {
    let validator_id = validator_id.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO campaign_members (campaign_id, validator_id)
           VALUES (?1, ?2)",
          rusqlite::params![campaign_id, validator_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn validator_in_campaign(
    &self,
    campaign_id: i64,
    validator_id: &str,
  ) -> Result<bool> {
    let validator_id = validator_id.to_owned();
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM campaign_members
               WHERE campaign_id = ?1 AND validator_id = ?2",
              rusqlite::params![campaign_id, validator_id],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }

  // ── Confirmations ─────────────────────────────────────────────────────────

  async fn confirm(
    &self,
    record_id: &str,
    campaign_id: i64,
    validator_id: &str,
  ) -> Result<ConfirmationRecord> {
    let record_id = record_id.to_owned();
    let record_id_err = record_id.clone();
    let validator_id = validator_id.to_owned();
    let confirmation_id = encode_uuid(Uuid::new_v4());
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        // The whole check-snapshot-insert sequence runs in one transaction;
        // partial application (snapshot written, constraint unenforced) is
        // impossible.
        let tx = conn.transaction()?;

        let snapshot: Option<(String, String, String)> = tx
          .query_row(
            "SELECT full_name, address, reg_status FROM records
             WHERE record_id = ?1",
            rusqlite::params![record_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
          )
          .optional()?;

        let (full_name, address, reg_status) = match snapshot {
          None => return Ok(RawConfirm::RecordMissing),
          Some(s) => s,
        };
        if reg_status != "A" {
          return Ok(RawConfirm::RecordInactive);
        }

        let campaign_exists: bool = tx
          .query_row(
            "SELECT 1 FROM campaigns WHERE campaign_id = ?1",
            rusqlite::params![campaign_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !campaign_exists {
          return Ok(RawConfirm::CampaignMissing);
        }

        // A racing duplicate loses against the UNIQUE constraint and the
        // insert becomes a no-op; the re-read below returns the winner's row
        // unchanged (no timestamp or validator update).
        tx.execute(
          "INSERT OR IGNORE INTO confirmations (
             confirmation_id, validator_id, campaign_id, campaign_key,
             record_id, record_external_id, record_full_name, record_address,
             last_updated
           ) VALUES (?1, ?2, ?3, ?3, ?4, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            confirmation_id,
            validator_id,
            campaign_id,
            record_id,
            full_name,
            address,
            now,
          ],
        )?;

        // A row orphaned by an earlier deactivation still occupies the
        // (campaign, record) slot. Confirming the reactivated record
        // re-links it and refreshes the snapshot under the original
        // confirmation id, rather than returning the stale audit row.
        tx.execute(
          "UPDATE confirmations
           SET record_id = ?2, validator_id = ?3, record_full_name = ?4,
               record_address = ?5, last_updated = ?6
           WHERE campaign_key = ?1 AND record_external_id = ?2
             AND record_id IS NULL",
          rusqlite::params![
            campaign_id,
            record_id,
            validator_id,
            full_name,
            address,
            now,
          ],
        )?;

        let raw = tx.query_row(
          &format!(
            "SELECT {CONFIRMATION_COLUMNS} FROM confirmations
             WHERE campaign_key = ?1 AND record_external_id = ?2"
          ),
          rusqlite::params![campaign_id, record_id],
          raw_confirmation_from_row,
        )?;

        tx.commit()?;
        Ok(RawConfirm::Row(raw))
      })
      .await?;

    match outcome {
      RawConfirm::RecordMissing => {
        Err(CoreError::RecordNotFound(record_id_err).into())
      }
      RawConfirm::RecordInactive => {
        Err(CoreError::RecordNotActive(record_id_err).into())
      }
      RawConfirm::CampaignMissing => {
        Err(CoreError::CampaignNotFound(campaign_id).into())
      }
      RawConfirm::Row(raw) => raw.into_confirmation(),
    }
  }

  async fn unconfirm(&self, record_id: &str, campaign_id: i64) -> Result<()> {
    let record_id = record_id.to_owned();
    let record_id_err = record_id.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let record_exists: bool = conn
          .query_row(
            "SELECT 1 FROM records WHERE record_id = ?1",
            rusqlite::params![record_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !record_exists {
          return Ok(RawUnconfirm::RecordMissing);
        }

        let campaign_exists: bool = conn
          .query_row(
            "SELECT 1 FROM campaigns WHERE campaign_id = ?1",
            rusqlite::params![campaign_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !campaign_exists {
          return Ok(RawUnconfirm::CampaignMissing);
        }

        // Deleted outright; absence means "not confirmed". Deleting an
        // absent row is the idempotent no-op.
        conn.execute(
          "DELETE FROM confirmations
           WHERE campaign_key = ?1 AND record_external_id = ?2",
          rusqlite::params![campaign_id, record_id],
        )?;
        Ok(RawUnconfirm::Done)
      })
      .await?;

    match outcome {
      RawUnconfirm::RecordMissing => {
        Err(CoreError::RecordNotFound(record_id_err).into())
      }
      RawUnconfirm::CampaignMissing => {
        Err(CoreError::CampaignNotFound(campaign_id).into())
      }
      RawUnconfirm::Done => Ok(()),
    }
  }

  async fn get_confirmation(
    &self,
    record_id: &str,
    campaign_id: i64,
  ) -> Result<Option<ConfirmationRecord>> {
    let record_id = record_id.to_owned();

    let raw: Option<RawConfirmation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CONFIRMATION_COLUMNS} FROM confirmations
                 WHERE campaign_key = ?1 AND record_external_id = ?2"
              ),
              rusqlite::params![campaign_id, record_id],
              raw_confirmation_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawConfirmation::into_confirmation).transpose()
  }

  async fn confirmed_record_ids(
    &self,
    campaign_id: i64,
  ) -> Result<HashSet<String>> {
    let ids = self
      .conn
      .call(move |conn| {
        // Keyed on the live link, like confirmation_count: an orphaned row
        // must not annotate a record that was re-imported as Active.
        let mut stmt = conn.prepare(
          "SELECT record_external_id FROM confirmations
           WHERE campaign_key = ?1 AND record_id IS NOT NULL",
        )?;
        let ids = stmt
          .query_map(rusqlite::params![campaign_id], |row| row.get(0))?
          .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  async fn confirmation_count(&self, campaign_id: i64) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM confirmations c
           JOIN records r ON r.record_id = c.record_id
           WHERE c.campaign_key = ?1 AND r.reg_status = 'A'",
          rusqlite::params![campaign_id],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count as u64)
  }

  async fn confirmations_since(
    &self,
    campaign_id: i64,
    since: DateTime<Utc>,
  ) -> Result<u64> {
    let since = encode_dt(since);
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM confirmations
           WHERE campaign_key = ?1 AND last_updated >= ?2",
          rusqlite::params![campaign_id, since],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count as u64)
  }

  // ── Reconciler callback ───────────────────────────────────────────────────

  async fn on_record_deactivated(&self, record_id: &str) -> Result<u64> {
    let record_id = record_id.to_owned();
    let now = encode_dt(Utc::now());

    let unlinked = self
      .conn
      .call(move |conn| {
        // Null the live link only; the denormalized snapshot stays behind as
        // the audit trail.
        let n = conn.execute(
          "UPDATE confirmations
           SET record_id = NULL, last_updated = ?2
           WHERE record_id = ?1",
          rusqlite::params![record_id, now],
        )?;
        Ok(n)
      })
      .await?;
    Ok(unlinked as u64)
  }
}
