//! Local persistent retry queue for built reports and attachments.
//!
//! Reports captured before a crash or network outage are persisted here and
//! delivered later, with generational eviction bounding local storage and a
//! per-record lock preventing double submission within one instance.

mod config;
mod context;
mod core;
mod error;
mod events;
mod provider;
mod record;
mod sender;

pub use config::{DatabaseConfig, RecordLimits};
pub use context::{DatabaseContext, DEFAULT_BUCKET_COUNT};
pub use self::core::Database;
pub use error::{DatabaseError, DatabaseResult};
pub use events::DatabaseEvent;
pub use provider::{StorageProvider, RECORD_SUFFIX};
pub use record::{AttachmentRecord, DatabaseRecord, RecordId, RecordType, ReportRecord};
pub use sender::send_record;
