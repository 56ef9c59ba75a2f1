pub mod breadcrumbs;
pub mod cancel;
pub mod chunks;
pub mod database;
pub mod model;
pub mod storage;
pub mod submission;

pub use breadcrumbs::{
	AlternatingLogWriter, BreadcrumbsError, BreadcrumbsResult, FileBreadcrumbsStorage,
};
pub use cancel::{CancelSource, CancelToken};
pub use database::{Database, DatabaseConfig, DatabaseEvent, DatabaseRecord};
pub use model::{Attachment, ReportPayload};
pub use storage::{FsStorage, MemoryStorage, StorageBackend};
pub use submission::{ReportSubmission, SubmissionResult, SubmissionStatus};
