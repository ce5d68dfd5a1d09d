//! The reconciliation loop: apply roster records to the store and fire the
//! deactivation callback on status transitions away from `Active`.

use std::io::BufRead;

use canvass_core::{
  record::Record,
  store::{RosterStore, UpsertOutcome},
};

use crate::{ImportError, Result, mapping::RosterReader};

/// Running totals for one import run, reported when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
  pub added:      u64,
  pub unmodified: u64,
  pub modified:   u64,
  /// Confirmations whose record link was nulled because the record left
  /// `Active` status during this run.
  pub confirmations_unlinked: u64,
}

/// Applies roster records to a store one at a time, accumulating counts.
#[derive(Debug)]
pub struct Reconciler<'s, S> {
  store:  &'s S,
  counts: ImportCounts,
}

impl<'s, S: RosterStore> Reconciler<'s, S> {
  pub fn new(store: &'s S) -> Self {
    Self { store, counts: ImportCounts::default() }
  }

  pub fn counts(&self) -> ImportCounts { self.counts }

  /// Upsert one record. If the write moved it out of `Active` status, unlink
  /// its confirmations through the store callback — they stay in the audit
  /// log, only the live record link is nulled.
  pub async fn apply(&mut self, record: Record) -> Result<()> {
    let record_id = record.id.clone();
    let new_status = record.status;

    let outcome = self
      .store
      .upsert_record(record)
      .await
      .map_err(|e| ImportError::Store(Box::new(e)))?;

    match outcome {
      UpsertOutcome::Added => self.counts.added += 1,
      UpsertOutcome::Unmodified => self.counts.unmodified += 1,
      UpsertOutcome::Modified { previous_status } => {
        self.counts.modified += 1;
        if previous_status.is_active() && !new_status.is_active() {
          let unlinked = self
            .store
            .on_record_deactivated(&record_id)
            .await
            .map_err(|e| ImportError::Store(Box::new(e)))?;
          self.counts.confirmations_unlinked += unlinked;
          if unlinked > 0 {
            tracing::info!(
              record_id = %record_id,
              unlinked,
              "record deactivated; confirmations unlinked"
            );
          }
        }
      }
    }
    Ok(())
  }
}

/// Import a headered roster TSV from `input`, streaming row by row.
pub async fn import_tsv<S: RosterStore>(
  store: &S,
  input: impl BufRead,
) -> Result<ImportCounts> {
  let mut lines = input.lines();
  let header = lines
    .next()
    .ok_or_else(|| ImportError::Mapping("empty roster file".to_owned()))??;
  let reader = RosterReader::from_header(&header)?;

  let mut reconciler = Reconciler::new(store);
  let mut row = 0usize;
  for line in lines {
    let line = line?;
    if line.is_empty() {
      continue;
    }
    row += 1;
    reconciler.apply(reader.parse_row(&line, row)?).await?;
    if row % 1000 == 0 {
      tracing::info!(rows = row, counts = ?reconciler.counts(), "import progress");
    }
  }

  let counts = reconciler.counts();
  tracing::info!(rows = row, ?counts, "import finished");
  Ok(counts)
}

#[cfg(test)]
mod tests {
  use canvass_core::{
    record::{Campaign, RegStatus},
    store::RosterStore,
  };
  use canvass_store_sqlite::SqliteStore;

  use super::*;
  use crate::mapping::ROSTER_FILE_MAPPING;

  fn tsv(rows: &[(&str, &str, &str, &str)]) -> String {
    let header = ROSTER_FILE_MAPPING
      .iter()
      .map(|(column, _)| *column)
      .collect::<Vec<_>>()
      .join("\t");
    let mut out = header;
    for (id, first, last, status) in rows {
      let row = ROSTER_FILE_MAPPING
        .iter()
        .map(|(_, field)| match field {
          crate::RecordField::Id => *id,
          crate::RecordField::FirstName => *first,
          crate::RecordField::LastName => *last,
          crate::RecordField::Address => "123 Main St",
          crate::RecordField::AddressZip => "94110",
          crate::RecordField::Status => *status,
          _ => "",
        })
        .collect::<Vec<_>>()
        .join("\t");
      out.push('\n');
      out.push_str(&row);
    }
    out
  }

  #[tokio::test]
  async fn import_adds_new_records() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let data = tsv(&[("V1", "Jane", "Doe", "A"), ("V2", "John", "Roe", "A")]);

    let counts = import_tsv(&store, data.as_bytes()).await.unwrap();
    assert_eq!(counts.added, 2);
    assert_eq!(counts.modified, 0);

    let record = store.get_record("V1").await.unwrap().unwrap();
    assert_eq!(record.full_name(), "Jane Doe");
    assert!(record.status.is_active());
  }

  #[tokio::test]
  async fn reimport_of_identical_file_modifies_nothing() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let data = tsv(&[("V1", "Jane", "Doe", "A")]);

    import_tsv(&store, data.as_bytes()).await.unwrap();
    let counts = import_tsv(&store, data.as_bytes()).await.unwrap();
    assert_eq!(counts, ImportCounts { unmodified: 1, ..ImportCounts::default() });
  }

  #[tokio::test]
  async fn deactivation_during_import_unlinks_confirmations() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    import_tsv(&store, tsv(&[("V1", "Jane", "Doe", "A")]).as_bytes())
      .await
      .unwrap();
    store
      .put_campaign(Campaign { id: 7, name: "renewal".into(), goal: 100 })
      .await
      .unwrap();
    store.confirm("V1", 7, "U1").await.unwrap();

    let counts =
      import_tsv(&store, tsv(&[("V1", "Jane", "Doe", "I")]).as_bytes())
        .await
        .unwrap();
    assert_eq!(counts.modified, 1);
    assert_eq!(counts.confirmations_unlinked, 1);

    let record = store.get_record("V1").await.unwrap().unwrap();
    assert_eq!(record.status, RegStatus::Inactive);

    let confirmation = store.get_confirmation("V1", 7).await.unwrap().unwrap();
    assert_eq!(confirmation.record_id, None);
    assert_eq!(confirmation.record_full_name, "Jane Doe");
  }

  #[tokio::test]
  async fn reactivation_does_not_touch_confirmations() {
    // Leaving Active fires the callback; returning to Active must not
    // re-link anything on its own.
    let store = SqliteStore::open_in_memory().await.unwrap();
    import_tsv(&store, tsv(&[("V1", "Jane", "Doe", "I")]).as_bytes())
      .await
      .unwrap();

    let counts =
      import_tsv(&store, tsv(&[("V1", "Jane", "Doe", "A")]).as_bytes())
        .await
        .unwrap();
    assert_eq!(counts.modified, 1);
    assert_eq!(counts.confirmations_unlinked, 0);
  }
}
