//! Persisted record model: the tagged union held by the retry queue and its
//! on-disk serialization.
//!
//! Runtime records carry live attachments (including in-memory buffers);
//! the persisted form keeps only what can be re-created after a restart.
//! A record is stored under the key `<id>-record.json` and must round-trip
//! across restarts.

use crate::model::{Attachment, FileAttachment, ReportPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RecordId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
	Report,
	Attachment,
}

impl RecordType {
	pub fn as_str(&self) -> &'static str {
		match self {
			RecordType::Report => "report",
			RecordType::Attachment => "attachment",
		}
	}
}

/// An already-built report waiting for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
	pub id: RecordId,
	pub timestamp: DateTime<Utc>,
	pub session_id: Option<String>,
	pub locked: bool,
	pub data: ReportPayload,
	pub attachments: Vec<Attachment>,
}

impl ReportRecord {
	pub fn new(
		data: ReportPayload, attachments: Vec<Attachment>, session_id: Option<String>,
	) -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			timestamp: Utc::now(),
			session_id,
			locked: false,
			data,
			attachments,
		}
	}
}

/// An attachment queued separately from its owning report. `rxid` is the
/// owning report's id.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentRecord {
	pub id: RecordId,
	pub timestamp: DateTime<Utc>,
	pub session_id: Option<String>,
	pub locked: bool,
	pub rxid: RecordId,
	pub attachment: Attachment,
}

impl AttachmentRecord {
	pub fn new(rxid: RecordId, attachment: Attachment, session_id: Option<String>) -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			timestamp: Utc::now(),
			session_id,
			locked: false,
			rxid,
			attachment,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseRecord {
	Report(ReportRecord),
	Attachment(AttachmentRecord),
}

impl DatabaseRecord {
	pub fn id(&self) -> &str {
		match self {
			DatabaseRecord::Report(record) => &record.id,
			DatabaseRecord::Attachment(record) => &record.id,
		}
	}

	pub fn record_type(&self) -> RecordType {
		match self {
			DatabaseRecord::Report(_) => RecordType::Report,
			DatabaseRecord::Attachment(_) => RecordType::Attachment,
		}
	}

	pub fn timestamp(&self) -> DateTime<Utc> {
		match self {
			DatabaseRecord::Report(record) => record.timestamp,
			DatabaseRecord::Attachment(record) => record.timestamp,
		}
	}

	pub fn session_id(&self) -> Option<&str> {
		match self {
			DatabaseRecord::Report(record) => record.session_id.as_deref(),
			DatabaseRecord::Attachment(record) => record.session_id.as_deref(),
		}
	}

	pub fn locked(&self) -> bool {
		match self {
			DatabaseRecord::Report(record) => record.locked,
			DatabaseRecord::Attachment(record) => record.locked,
		}
	}

	pub(crate) fn set_locked(&mut self, locked: bool) {
		match self {
			DatabaseRecord::Report(record) => record.locked = locked,
			DatabaseRecord::Attachment(record) => record.locked = locked,
		}
	}
}

impl From<ReportRecord> for DatabaseRecord {
	fn from(record: ReportRecord) -> Self {
		DatabaseRecord::Report(record)
	}
}

impl From<AttachmentRecord> for DatabaseRecord {
	fn from(record: AttachmentRecord) -> Self {
		DatabaseRecord::Attachment(record)
	}
}

/// On-disk shape of a record. Records are stored unlocked so a restart
/// always recovers them available for a new send attempt.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum PersistedRecord {
	Report {
		id: RecordId,
		timestamp: DateTime<Utc>,
		#[serde(skip_serializing_if = "Option::is_none", default)]
		session_id: Option<String>,
		locked: bool,
		data: ReportPayload,
		attachments: Vec<FileAttachment>,
	},
	Attachment {
		id: RecordId,
		timestamp: DateTime<Utc>,
		#[serde(skip_serializing_if = "Option::is_none", default)]
		session_id: Option<String>,
		locked: bool,
		rxid: RecordId,
		attachment: FileAttachment,
	},
}

/// Serialize a record for persistence. `None` means "do not persist": an
/// attachment record holding an in-memory buffer has no durable
/// representation and is silently kept memory-only.
pub(crate) fn save(record: &DatabaseRecord) -> Option<String> {
	let persisted = match record {
		DatabaseRecord::Report(report) => PersistedRecord::Report {
			id: report.id.clone(),
			timestamp: report.timestamp,
			session_id: report.session_id.clone(),
			locked: false,
			data: report.data.clone(),
			attachments: report
				.attachments
				.iter()
				.filter_map(|attachment| attachment.as_file().cloned())
				.collect(),
		},
		DatabaseRecord::Attachment(record) => PersistedRecord::Attachment {
			id: record.id.clone(),
			timestamp: record.timestamp,
			session_id: record.session_id.clone(),
			locked: false,
			rxid: record.rxid.clone(),
			attachment: record.attachment.as_file().cloned()?,
		},
	};
	serde_json::to_string(&persisted).ok()
}

/// Parse a persisted record. `None` on parse failure, an unknown type tag,
/// or an attachment whose backing file no longer exists; the caller must
/// then delete the orphaned entry.
pub(crate) fn load(json: &str) -> Option<DatabaseRecord> {
	let persisted: PersistedRecord = serde_json::from_str(json).ok()?;
	match persisted {
		PersistedRecord::Report { id, timestamp, session_id, data, attachments, .. } => {
			Some(DatabaseRecord::Report(ReportRecord {
				id,
				timestamp,
				session_id,
				locked: false,
				data,
				attachments: attachments.into_iter().map(Attachment::File).collect(),
			}))
		}
		PersistedRecord::Attachment { id, timestamp, session_id, rxid, attachment, .. } => {
			if !attachment.path.is_file() {
				return None;
			}
			Some(DatabaseRecord::Attachment(AttachmentRecord {
				id,
				timestamp,
				session_id,
				locked: false,
				rxid,
				attachment: Attachment::File(attachment),
			}))
		}
	}
}
