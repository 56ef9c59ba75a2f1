//! Notification stream of the retry queue.
//!
//! Events are value copies delivered on a broadcast channel and consumed
//! outside the index lock, so a subscriber can observe every mutation but
//! can never re-entrantly mutate the index from a handler. Slow subscribers
//! may lag and miss events; the queue itself never blocks on them.

use super::record::DatabaseRecord;
use crate::submission::SubmissionResult;

#[derive(Debug, Clone)]
pub enum DatabaseEvent {
	/// A record entered the queue.
	Added { record: DatabaseRecord },
	/// A record left the queue: delivered, evicted, flushed, or removed.
	Removed { record: DatabaseRecord },
	/// A send attempt is about to start; the record is locked.
	BeforeSend { record: DatabaseRecord },
	/// A send attempt finished with the given outcome.
	AfterSend { record: DatabaseRecord, result: SubmissionResult },
}

impl DatabaseEvent {
	pub fn record(&self) -> &DatabaseRecord {
		match self {
			DatabaseEvent::Added { record }
			| DatabaseEvent::Removed { record }
			| DatabaseEvent::BeforeSend { record }
			| DatabaseEvent::AfterSend { record, .. } => record,
		}
	}
}
