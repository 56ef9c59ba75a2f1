//! In-memory record index with generational aging.
//!
//! Every tracked record carries a generation counter. The aging tick
//! advances generations; a record reaching the bucket count is evicted
//! without delivery. This bounds how many retry cycles an unsent record can
//! survive. The context never hands out live references: `get` and friends
//! always return value copies, so observers cannot mutate the index from
//! the outside.

use super::config::RecordLimits;
use super::record::{DatabaseRecord, RecordId, RecordType};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub const DEFAULT_BUCKET_COUNT: u32 = 3;

#[derive(Debug, Clone)]
struct IndexedRecord {
	record: DatabaseRecord,
	generation: u32,
}

#[derive(Debug)]
pub struct DatabaseContext {
	bucket_count: u32,
	records: HashMap<RecordId, IndexedRecord>,
}

impl DatabaseContext {
	pub fn new(bucket_count: u32) -> Self {
		Self { bucket_count: bucket_count.max(1), records: HashMap::new() }
	}

	pub fn bucket_count(&self) -> u32 {
		self.bucket_count
	}

	/// Track a record at generation 0. Re-adding a tracked id resets its
	/// generation instead of duplicating it.
	pub fn add(&mut self, record: DatabaseRecord) {
		let id = record.id().to_string();
		self.records.insert(id, IndexedRecord { record, generation: 0 });
	}

	/// Bulk insert at generation 0, used by startup recovery.
	pub fn load(&mut self, records: Vec<DatabaseRecord>) {
		for record in records {
			self.add(record);
		}
	}

	pub fn remove(&mut self, id: &str) -> Option<DatabaseRecord> {
		self.records.remove(id).map(|entry| entry.record)
	}

	/// Value copies of all tracked records, oldest first.
	pub fn get(&self) -> Vec<DatabaseRecord> {
		let mut records: Vec<_> =
			self.records.values().map(|entry| entry.record.clone()).collect();
		records.sort_by(Self::record_order);
		records
	}

	pub fn get_record(&self, id: &str) -> Option<DatabaseRecord> {
		self.records.get(id).map(|entry| entry.record.clone())
	}

	pub fn get_bucket(&self, generation: u32) -> Vec<DatabaseRecord> {
		let mut records: Vec<_> = self
			.records
			.values()
			.filter(|entry| entry.generation == generation)
			.map(|entry| entry.record.clone())
			.collect();
		records.sort_by(Self::record_order);
		records
	}

	pub fn generation(&self, id: &str) -> Option<u32> {
		self.records.get(id).map(|entry| entry.generation)
	}

	/// Advance every unlocked record at generation >= `bucket_start` by one;
	/// records reaching the bucket count are evicted and returned. Locked
	/// records are frozen so an in-flight send cannot be evicted from under
	/// itself.
	pub fn increase_bucket(&mut self, bucket_start: u32) -> Vec<DatabaseRecord> {
		let mut evicted_ids = Vec::new();
		for (id, entry) in self.records.iter_mut() {
			if entry.record.locked() || entry.generation < bucket_start {
				continue;
			}
			entry.generation += 1;
			if entry.generation >= self.bucket_count {
				evicted_ids.push(id.clone());
			}
		}
		evicted_ids.into_iter().filter_map(|id| self.remove(&id)).collect()
	}

	/// Enforce per-type count ceilings, keeping the newest records. Locked
	/// records still count toward a ceiling but are never dropped while in
	/// flight. Returns what was dropped.
	pub fn drop_over_limits(&mut self, limits: &RecordLimits) -> Vec<DatabaseRecord> {
		let mut dropped = Vec::new();
		for record_type in [RecordType::Report, RecordType::Attachment] {
			let Some(limit) = limits.limit_for(record_type) else {
				continue;
			};

			let mut entries: Vec<(DateTime<Utc>, RecordId, bool)> = self
				.records
				.values()
				.filter(|entry| entry.record.record_type() == record_type)
				.map(|entry| {
					(entry.record.timestamp(), entry.record.id().to_string(), entry.record.locked())
				})
				.collect();
			if entries.len() <= limit {
				continue;
			}

			// Newest first; the surplus tail holds the oldest records.
			entries.sort_by(|a, b| b.cmp(a));
			for (_, id, locked) in entries.into_iter().skip(limit) {
				if locked {
					continue;
				}
				if let Some(record) = self.remove(&id) {
					dropped.push(record);
				}
			}
		}
		dropped
	}

	pub fn count(&self) -> usize {
		self.records.len()
	}

	pub fn count_by_type(&self) -> HashMap<RecordType, usize> {
		let mut counts = HashMap::new();
		for entry in self.records.values() {
			*counts.entry(entry.record.record_type()).or_insert(0) += 1;
		}
		counts
	}

	/// Mark a record as having an outstanding send attempt. Returns a copy
	/// of the locked record, or `None` when the record is missing or already
	/// locked.
	pub fn lock(&mut self, id: &str) -> Option<DatabaseRecord> {
		let entry = self.records.get_mut(id)?;
		if entry.record.locked() {
			return None;
		}
		entry.record.set_locked(true);
		Some(entry.record.clone())
	}

	pub fn unlock(&mut self, id: &str) {
		if let Some(entry) = self.records.get_mut(id) {
			entry.record.set_locked(false);
		}
	}

	/// Ids of records eligible for a send attempt, lowest generation first.
	pub fn unlocked_ids(&self) -> Vec<RecordId> {
		let mut entries: Vec<(u32, DateTime<Utc>, RecordId)> = self
			.records
			.values()
			.filter(|entry| !entry.record.locked())
			.map(|entry| {
				(entry.generation, entry.record.timestamp(), entry.record.id().to_string())
			})
			.collect();
		entries.sort();
		entries.into_iter().map(|(_, _, id)| id).collect()
	}

	fn record_order(a: &DatabaseRecord, b: &DatabaseRecord) -> std::cmp::Ordering {
		(a.timestamp(), a.id()).cmp(&(b.timestamp(), b.id()))
	}
}

impl Default for DatabaseContext {
	fn default() -> Self {
		Self::new(DEFAULT_BUCKET_COUNT)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::database::record::ReportRecord;
	use serde_json::json;

	fn report(message: &str) -> DatabaseRecord {
		DatabaseRecord::Report(ReportRecord::new(json!({ "message": message }), Vec::new(), None))
	}

	fn attachment(rxid: &str) -> DatabaseRecord {
		use crate::database::record::AttachmentRecord;
		use crate::model::Attachment;
		DatabaseRecord::Attachment(AttachmentRecord::new(
			rxid.to_string(),
			Attachment::buffer("buf", vec![1]),
			None,
		))
	}

	#[test]
	fn test_get_returns_value_copies() {
		let mut context = DatabaseContext::default();
		let record = report("a");
		context.add(record.clone());

		let mut copies = context.get();
		assert_eq!(copies.len(), 1);
		assert_eq!(copies[0], record);

		// Mutating the copy must not affect the index.
		copies[0].set_locked(true);
		assert!(!context.get()[0].locked());
	}

	#[test]
	fn test_re_adding_resets_generation_without_growth() {
		let mut context = DatabaseContext::default();
		let record = report("a");
		context.add(record.clone());
		context.increase_bucket(0);
		assert_eq!(context.generation(record.id()), Some(1));

		context.add(record.clone());
		assert_eq!(context.count(), 1);
		assert_eq!(context.generation(record.id()), Some(0));
	}

	#[test]
	fn test_bucket_count_increases_evict() {
		let mut context = DatabaseContext::new(3);
		let record = report("a");
		context.add(record.clone());

		assert!(context.increase_bucket(0).is_empty());
		assert!(context.increase_bucket(0).is_empty());
		let evicted = context.increase_bucket(0);
		assert_eq!(evicted.len(), 1);
		assert_eq!(evicted[0].id(), record.id());
		assert_eq!(context.count(), 0);
	}

	#[test]
	fn test_one_less_increase_does_not_evict() {
		let mut context = DatabaseContext::new(3);
		context.add(report("a"));
		assert!(context.increase_bucket(0).is_empty());
		assert!(context.increase_bucket(0).is_empty());
		assert_eq!(context.count(), 1);
	}

	#[test]
	fn test_increase_bucket_respects_bucket_start() {
		let mut context = DatabaseContext::new(3);
		let old = report("old");
		context.add(old.clone());
		context.increase_bucket(0);

		let fresh = report("fresh");
		context.add(fresh.clone());

		// Only records at generation >= 1 advance.
		context.increase_bucket(1);
		assert_eq!(context.generation(old.id()), Some(2));
		assert_eq!(context.generation(fresh.id()), Some(0));
	}

	#[test]
	fn test_locked_records_do_not_age() {
		let mut context = DatabaseContext::new(2);
		let record = report("in-flight");
		context.add(record.clone());
		assert!(context.lock(record.id()).is_some());

		assert!(context.increase_bucket(0).is_empty());
		assert!(context.increase_bucket(0).is_empty());
		assert_eq!(context.generation(record.id()), Some(0));

		context.unlock(record.id());
		context.increase_bucket(0);
		let evicted = context.increase_bucket(0);
		assert_eq!(evicted.len(), 1);
	}

	#[test]
	fn test_drop_over_limits_removes_exactly_the_excess() {
		let mut context = DatabaseContext::default();
		for n in 0..5 {
			context.add(report(&format!("r{n}")));
		}
		context.add(attachment("rx"));

		let limits = RecordLimits { report: Some(0), attachment: None };
		let dropped = context.drop_over_limits(&limits);
		assert_eq!(dropped.len(), 5);
		assert!(dropped.iter().all(|r| r.record_type() == RecordType::Report));
		assert_eq!(context.count(), 1);
	}

	#[test]
	fn test_drop_over_limits_keeps_newest() {
		let mut context = DatabaseContext::default();
		let records: Vec<_> = (0..4).map(|n| report(&format!("r{n}"))).collect();
		for record in &records {
			context.add(record.clone());
		}

		let limits = RecordLimits { report: Some(2), attachment: None };
		let dropped = context.drop_over_limits(&limits);
		assert_eq!(dropped.len(), 2);

		let kept = context.get();
		let newest: Vec<_> = {
			let mut sorted = records.clone();
			sorted.sort_by(|a, b| (b.timestamp(), b.id()).cmp(&(a.timestamp(), a.id())));
			sorted.into_iter().take(2).map(|r| r.id().to_string()).collect()
		};
		assert!(kept.iter().all(|r| newest.contains(&r.id().to_string())));
	}

	#[test]
	fn test_lock_excludes_record_from_second_lock() {
		let mut context = DatabaseContext::default();
		let record = report("a");
		context.add(record.clone());

		let first = context.lock(record.id());
		assert!(first.is_some());
		assert!(first.unwrap().locked());
		assert!(context.lock(record.id()).is_none());

		context.unlock(record.id());
		assert!(context.lock(record.id()).is_some());
	}

	#[test]
	fn test_unlocked_ids_skip_locked_records() {
		let mut context = DatabaseContext::default();
		let a = report("a");
		let b = report("b");
		context.add(a.clone());
		context.add(b.clone());
		context.lock(a.id());

		let ids = context.unlocked_ids();
		assert_eq!(ids, vec![b.id().to_string()]);
	}

	#[test]
	fn test_count_by_type() {
		let mut context = DatabaseContext::default();
		context.add(report("a"));
		context.add(report("b"));
		context.add(attachment("rx"));

		let counts = context.count_by_type();
		assert_eq!(counts.get(&RecordType::Report), Some(&2));
		assert_eq!(counts.get(&RecordType::Attachment), Some(&1));
	}

	#[test]
	fn test_get_bucket_groups_by_generation() {
		let mut context = DatabaseContext::new(3);
		let old = report("old");
		context.add(old.clone());
		context.increase_bucket(0);
		let fresh = report("fresh");
		context.add(fresh.clone());

		let bucket0 = context.get_bucket(0);
		assert_eq!(bucket0.len(), 1);
		assert_eq!(bucket0[0].id(), fresh.id());

		let bucket1 = context.get_bucket(1);
		assert_eq!(bucket1.len(), 1);
		assert_eq!(bucket1[0].id(), old.id());
	}
}
