//! Append-only audit trail with one record per attempted file.

use crate::models::{MetadataRecord, ParseOutcome};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct TreeMetadataLog {
    records: Mutex<Vec<MetadataRecord>>,
}

impl TreeMetadataLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MetadataRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, record: MetadataRecord) {
        self.lock().push(record);
    }

    pub fn all_records(&self) -> Vec<MetadataRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn count(&self, outcome: ParseOutcome) -> usize {
        self.lock().iter().filter(|r| r.outcome == outcome).count()
    }
}
