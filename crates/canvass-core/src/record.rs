//! Record — the searchable roster entity — and Campaign.
//!
//! Records are created and updated only by the import reconciler; the ranking
//! engine and the confirmation store treat them as read-only.

use serde::{Deserialize, Serialize};

/// Registration status, stored as the roster file's one-letter codes.
/// Only `Active` records are searchable or confirmable.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RegStatus {
  Active,
  Inactive,
  Cancelled,
  LocalPending,
  #[default]
  None,
}

impl RegStatus {
  /// The one-letter code used by roster files and the storage layer.
  pub fn code(self) -> &'static str {
    match self {
      Self::Active => "A",
      Self::Inactive => "I",
      Self::Cancelled => "C",
      Self::LocalPending => "P",
      Self::None => "",
    }
  }

  pub fn from_code(code: &str) -> Option<Self> {
    match code {
      "A" => Some(Self::Active),
      "I" => Some(Self::Inactive),
      "C" => Some(Self::Cancelled),
      "P" => Some(Self::LocalPending),
      "" => Some(Self::None),
      _ => None,
    }
  }

  pub fn is_active(self) -> bool { matches!(self, Self::Active) }
}

/// Name parts as delivered by the roster file.
///
/// The full name is always derived from these via [`NameParts::full`] —
/// it is recomputed by the write path before every persist and is never
/// independently settable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameParts {
  pub first:  String,
  pub middle: String,
  pub last:   String,
  pub suffix: String,
}

impl NameParts {
  /// Non-empty parts joined with single spaces.
  pub fn full(&self) -> String {
    [&self.first, &self.middle, &self.last, &self.suffix]
      .into_iter()
      .filter(|part| !part.is_empty())
      .cloned()
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Residential address, full line plus decomposed sub-fields. All free text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
  /// The full address line; used for scoring and exact-match detection.
  pub line:          String,
  /// Five-digit ZIP (truncated from ZIP+4 by the import mapping).
  pub zip:           String,
  pub city:          String,
  pub state:         String,
  pub house_number:  String,
  pub street:        String,
  pub street_suffix: String,
  pub unit:          String,
}

/// A registrant in the searchable roster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
  /// Stable external identifier assigned by the import source.
  pub id:            String,
  pub name:          NameParts,
  pub address:       Address,
  // Contact information; carried through the roster but not shown in search
  // results.
  pub phone:         String,
  pub email:         String,
  // Registration dates, usually MM/DD/YYYY in roster files.
  pub curr_reg_date: String,
  pub orig_reg_date: String,
  pub status:        RegStatus,
  pub status_reason: String,
  pub gender:        String,
  pub party:         String,
  pub language:      String,
}

impl Record {
  /// Derived full name; see [`NameParts::full`].
  pub fn full_name(&self) -> String { self.name.full() }
}

/// An ongoing confirmation campaign. Created by administrative tooling;
/// read-only to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
  pub id:   i64,
  pub name: String,
  /// Target confirmation count.
  pub goal: i64,
}
