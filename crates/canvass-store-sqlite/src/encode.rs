//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, registration statuses as
//! their one-letter codes, and UUIDs as hyphenated lowercase strings.

use canvass_core::{
  confirmation::ConfirmationRecord,
  record::{Address, NameParts, Record, RegStatus},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn decode_status(code: &str) -> Result<RegStatus> {
  RegStatus::from_code(code)
    .ok_or_else(|| Error::Decode(format!("unknown status code: {code:?}")))
}

// ─── Record rows ─────────────────────────────────────────────────────────────

/// Column list shared by every `records` query so row mapping stays aligned
/// with [`raw_record_from_row`].
pub const RECORD_COLUMNS: &str = "record_id, first_name, middle_name, \
   last_name, suffix, full_name, address, address_zip, address_city, \
   address_state, address_house_num, address_street, address_street_suffix, \
   address_unit, phone, email, curr_reg_date, orig_reg_date, reg_status, \
   reg_status_reason, gender, party, language";

/// A `records` row as read from (or written to) SQLite, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
  pub record_id:             String,
  pub first_name:            String,
  pub middle_name:           String,
  pub last_name:             String,
  pub suffix:                String,
  pub full_name:             String,
  pub address:               String,
  pub address_zip:           String,
  pub address_city:          String,
  pub address_state:         String,
  pub address_house_num:     String,
  pub address_street:        String,
  pub address_street_suffix: String,
  pub address_unit:          String,
  pub phone:                 String,
  pub email:                 String,
  pub curr_reg_date:         String,
  pub orig_reg_date:         String,
  pub reg_status:            String,
  pub reg_status_reason:     String,
  pub gender:                String,
  pub party:                 String,
  pub language:              String,
}

impl RawRecord {
  /// Encode a domain record for writing. The stored `full_name` is derived
  /// here, immediately before persistence.
  pub fn from_record(record: &Record) -> Self {
    Self {
      record_id:             record.id.clone(),
      first_name:            record.name.first.clone(),
      middle_name:           record.name.middle.clone(),
      last_name:             record.name.last.clone(),
      suffix:                record.name.suffix.clone(),
      full_name:             record.full_name(),
      address:               record.address.line.clone(),
      address_zip:           record.address.zip.clone(),
      address_city:          record.address.city.clone(),
      address_state:         record.address.state.clone(),
      address_house_num:     record.address.house_number.clone(),
      address_street:        record.address.street.clone(),
      address_street_suffix: record.address.street_suffix.clone(),
      address_unit:          record.address.unit.clone(),
      phone:                 record.phone.clone(),
      email:                 record.email.clone(),
      curr_reg_date:         record.curr_reg_date.clone(),
      orig_reg_date:         record.orig_reg_date.clone(),
      reg_status:            record.status.code().to_owned(),
      reg_status_reason:     record.status_reason.clone(),
      gender:                record.gender.clone(),
      party:                 record.party.clone(),
      language:              record.language.clone(),
    }
  }

  pub fn into_record(self) -> Result<Record> {
    let status = decode_status(&self.reg_status)?;
    Ok(Record {
      id: self.record_id,
      name: NameParts {
        first:  self.first_name,
        middle: self.middle_name,
        last:   self.last_name,
        suffix: self.suffix,
      },
      address: Address {
        line:          self.address,
        zip:           self.address_zip,
        city:          self.address_city,
        state:         self.address_state,
        house_number:  self.address_house_num,
        street:        self.address_street,
        street_suffix: self.address_street_suffix,
        unit:          self.address_unit,
      },
      phone: self.phone,
      email: self.email,
      curr_reg_date: self.curr_reg_date,
      orig_reg_date: self.orig_reg_date,
      status,
      status_reason: self.reg_status_reason,
      gender: self.gender,
      party: self.party,
      language: self.language,
    })
  }
}

/// Map a row selected with [`RECORD_COLUMNS`] into a [`RawRecord`].
pub fn raw_record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
  Ok(RawRecord {
    record_id:             row.get(0)?,
    first_name:            row.get(1)?,
    middle_name:           row.get(2)?,
    last_name:             row.get(3)?,
    suffix:                row.get(4)?,
    full_name:             row.get(5)?,
    address:               row.get(6)?,
    address_zip:           row.get(7)?,
    address_city:          row.get(8)?,
    address_state:         row.get(9)?,
    address_house_num:     row.get(10)?,
    address_street:        row.get(11)?,
    address_street_suffix: row.get(12)?,
    address_unit:          row.get(13)?,
    phone:                 row.get(14)?,
    email:                 row.get(15)?,
    curr_reg_date:         row.get(16)?,
    orig_reg_date:         row.get(17)?,
    reg_status:            row.get(18)?,
    reg_status_reason:     row.get(19)?,
    gender:                row.get(20)?,
    party:                 row.get(21)?,
    language:              row.get(22)?,
  })
}

// ─── Confirmation rows ───────────────────────────────────────────────────────

pub const CONFIRMATION_COLUMNS: &str = "confirmation_id, validator_id, \
   campaign_id, campaign_key, record_id, record_external_id, \
   record_full_name, record_address, last_updated";

/// A `confirmations` row as read from SQLite, before decoding.
#[derive(Debug, Clone)]
pub struct RawConfirmation {
  pub confirmation_id:    String,
  pub validator_id:       Option<String>,
  pub campaign_id:        Option<i64>,
  pub campaign_key:       i64,
  pub record_id:          Option<String>,
  pub record_external_id: String,
  pub record_full_name:   String,
  pub record_address:     String,
  pub last_updated:       String,
}

impl RawConfirmation {
  pub fn into_confirmation(self) -> Result<ConfirmationRecord> {
    Ok(ConfirmationRecord {
      confirmation_id:    Uuid::parse_str(&self.confirmation_id)?,
      validator_id:       self.validator_id,
      campaign_id:        self.campaign_id,
      campaign_key:       self.campaign_key,
      record_id:          self.record_id,
      record_external_id: self.record_external_id,
      record_full_name:   self.record_full_name,
      record_address:     self.record_address,
      last_updated:       decode_dt(&self.last_updated)?,
    })
  }
}

/// Map a row selected with [`CONFIRMATION_COLUMNS`] into a
/// [`RawConfirmation`].
pub fn raw_confirmation_from_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawConfirmation> {
  Ok(RawConfirmation {
    confirmation_id:    row.get(0)?,
    validator_id:       row.get(1)?,
    campaign_id:        row.get(2)?,
    campaign_key:       row.get(3)?,
    record_id:          row.get(4)?,
    record_external_id: row.get(5)?,
    record_full_name:   row.get(6)?,
    record_address:     row.get(7)?,
    last_updated:       row.get(8)?,
  })
}
