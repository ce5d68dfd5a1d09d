//! Statically checked mapping from roster file columns to record fields.

use canvass_core::record::{Record, RegStatus};

use crate::{ImportError, Result};

/// Target fields of a [`Record`] addressable by the roster file. The full
/// name is deliberately absent: it is derived from the name parts by the
/// write path and never imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
  Id,
  FirstName,
  MiddleName,
  LastName,
  Suffix,
  Address,
  AddressZip,
  AddressCity,
  AddressState,
  AddressHouseNum,
  AddressStreet,
  AddressStreetSuffix,
  AddressUnit,
  Phone,
  Email,
  CurrRegDate,
  OrigRegDate,
  Status,
  StatusReason,
  Gender,
  Party,
  Language,
}

impl RecordField {
  /// Write one roster value into `record`, applying per-field transforms.
  fn apply(self, record: &mut Record, value: &str, row: usize) -> Result<()> {
    match self {
      Self::Id => record.id = value.into(),
      Self::FirstName => record.name.first = value.into(),
      Self::MiddleName => record.name.middle = value.into(),
      Self::LastName => record.name.last = value.into(),
      Self::Suffix => record.name.suffix = value.into(),
      Self::Address => record.address.line = value.into(),
      // ZIP+4 is shortened to the five-digit ZIP for simplicity.
      Self::AddressZip => {
        record.address.zip = value.chars().take(5).collect();
      }
      Self::AddressCity => record.address.city = value.into(),
      Self::AddressState => record.address.state = value.into(),
      Self::AddressHouseNum => record.address.house_number = value.into(),
      Self::AddressStreet => record.address.street = value.into(),
      Self::AddressStreetSuffix => record.address.street_suffix = value.into(),
      Self::AddressUnit => record.address.unit = value.into(),
      Self::Phone => record.phone = value.into(),
      Self::Email => record.email = value.into(),
      Self::CurrRegDate => record.curr_reg_date = value.into(),
      Self::OrigRegDate => record.orig_reg_date = value.into(),
      Self::Status => {
        record.status = RegStatus::from_code(value).ok_or_else(|| {
          ImportError::BadValue {
            row,
            message: format!("unknown registration status {value:?}"),
          }
        })?;
      }
      Self::StatusReason => record.status_reason = value.into(),
      Self::Gender => record.gender = value.into(),
      Self::Party => record.party = value.into(),
      Self::Language => record.language = value.into(),
    }
    Ok(())
  }
}

/// Mapping from master roster file column names to record fields.
pub const ROSTER_FILE_MAPPING: &[(&str, RecordField)] = &[
  ("lVoterUniqueID", RecordField::Id),
  ("szNameFirst", RecordField::FirstName),
  ("szNameMiddle", RecordField::MiddleName),
  ("szNameLast", RecordField::LastName),
  ("sNameSuffix", RecordField::Suffix),
  ("szSitusAddress", RecordField::Address),
  ("sSitusZip", RecordField::AddressZip),
  ("szSitusCity", RecordField::AddressCity),
  ("sSitusState", RecordField::AddressState),
  ("sHouseNum", RecordField::AddressHouseNum),
  ("szStreetName", RecordField::AddressStreet),
  ("sStreetSuffix", RecordField::AddressStreetSuffix),
  ("sUnitNum", RecordField::AddressUnit),
  ("szPhone", RecordField::Phone),
  ("szEmailAddress", RecordField::Email),
  ("dtRegDate", RecordField::CurrRegDate),
  ("dtOrigRegDate", RecordField::OrigRegDate),
  ("sStatusCode", RecordField::Status),
  ("szStatusReasonDesc", RecordField::StatusReason),
  ("sGender", RecordField::Gender),
  ("szPartyName", RecordField::Party),
  ("szLanguageName", RecordField::Language),
];

/// Check the mapping table itself: no duplicate source columns, no duplicate
/// targets, and the fields an import cannot do without must be present.
pub fn validate_mapping(
  mapping: &[(&str, RecordField)],
) -> Result<()> {
  for (i, (column, field)) in mapping.iter().enumerate() {
    for (other_column, other_field) in &mapping[i + 1..] {
      if column == other_column {
        return Err(ImportError::Mapping(format!(
          "duplicate source column {column:?}"
        )));
      }
      if field == other_field {
        return Err(ImportError::Mapping(format!(
          "columns {column:?} and {other_column:?} map to the same field"
        )));
      }
    }
  }
  for required in [RecordField::Id, RecordField::Status] {
    if !mapping.iter().any(|(_, field)| *field == required) {
      return Err(ImportError::Mapping(format!(
        "required field {required:?} is not mapped"
      )));
    }
  }
  Ok(())
}

/// Resolves a roster file header against the mapping table and decodes rows.
#[derive(Debug)]
pub struct RosterReader {
  /// `(column index in the file, target field)` pairs.
  columns: Vec<(usize, RecordField)>,
}

impl RosterReader {
  /// Validate the mapping and bind it to the header line of a roster file.
  /// Extra columns in the file are ignored; mapped columns must all exist.
  pub fn from_header(header: &str) -> Result<Self> {
    validate_mapping(ROSTER_FILE_MAPPING)?;

    let names: Vec<&str> = header.split('\t').map(str::trim).collect();
    let mut columns = Vec::with_capacity(ROSTER_FILE_MAPPING.len());
    for (column, field) in ROSTER_FILE_MAPPING {
      let index = names
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| ImportError::MissingColumn((*column).to_owned()))?;
      columns.push((index, *field));
    }
    Ok(Self { columns })
  }

  /// Decode one data line into a [`Record`]. `row` is the 1-based data row
  /// number, used for error reporting.
  pub fn parse_row(&self, line: &str, row: usize) -> Result<Record> {
    let values: Vec<&str> = line.split('\t').collect();
    let expected = self
      .columns
      .iter()
      .map(|(index, _)| index + 1)
      .max()
      .unwrap_or(0);
    if values.len() < expected {
      return Err(ImportError::RowWidth {
        row,
        expected,
        found: values.len(),
      });
    }

    let mut record = Record::default();
    for (index, field) in &self.columns {
      field.apply(&mut record, values[*index].trim(), row)?;
    }
    Ok(record)
  }
}
