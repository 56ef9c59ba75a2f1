//! Persists and recovers database records through the storage backend.
//!
//! Records live under `<id>-record.json` keys, so a startup scan can tell
//! record entries apart from unrelated keys in the same backend. Corrupt or
//! stale entries found during the scan are deleted on the spot: the queue
//! must self-heal rather than block startup or accumulate garbage.

use super::record::{self, DatabaseRecord};
use crate::storage::StorageBackend;
use std::sync::Arc;
use tracing::{debug, warn};

pub const RECORD_SUFFIX: &str = "-record.json";

pub struct StorageProvider {
	backend: Arc<dyn StorageBackend>,
}

impl StorageProvider {
	pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
		Self { backend }
	}

	pub fn record_key(id: &str) -> String {
		format!("{id}{RECORD_SUFFIX}")
	}

	/// Readiness check. When this fails the whole queue stays disabled
	/// rather than risk writing into an unusable backend.
	pub fn start(&self) -> bool {
		self.backend.initialize()
	}

	/// Persist a record. Returns false when the record has no durable
	/// representation or the backend write fails; the record then stays
	/// memory-only.
	pub async fn add(&self, record: &DatabaseRecord) -> bool {
		let Some(json) = record::save(record) else {
			debug!("Record {} has no durable representation, keeping in memory", record.id());
			return false;
		};
		self.backend.set(&Self::record_key(record.id()), &json).await
	}

	/// Recovery scan: every parseable record entry, with corrupt and stale
	/// ones removed along the way.
	pub async fn get(&self) -> Vec<DatabaseRecord> {
		let mut records = Vec::new();
		for key in self.backend.keys().await {
			if !key.ends_with(RECORD_SUFFIX) {
				continue;
			}

			let Some(json) = self.backend.get(&key).await else {
				let _ = self.backend.remove(&key).await;
				continue;
			};
			match record::load(&json) {
				Some(loaded) => records.push(loaded),
				None => {
					warn!("Removing unreadable database record {key}");
					let _ = self.backend.remove(&key).await;
				}
			}
		}
		records
	}

	/// Idempotent removal of a record's persisted entry.
	pub async fn delete(&self, id: &str) -> bool {
		self.backend.remove(&Self::record_key(id)).await
	}

	pub async fn has(&self, id: &str) -> bool {
		self.backend.has(&Self::record_key(id)).await
	}
}
