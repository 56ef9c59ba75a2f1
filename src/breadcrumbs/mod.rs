//! Breadcrumb history: model, rotating crash-safe writer, and storage.

mod error;
mod model;
mod storage;
mod writer;

pub use error::{BreadcrumbsError, BreadcrumbsResult};
pub use model::{Breadcrumb, BreadcrumbLevel, BreadcrumbType, RawBreadcrumb};
pub use storage::{
	BreadcrumbsStorage, FileBreadcrumbsStorage, InMemoryBreadcrumbsStorage,
	BREADCRUMB_ATTACHMENT_FALLBACK, BREADCRUMB_ATTACHMENT_MAIN,
};
pub use writer::AlternatingLogWriter;
