use thiserror::Error;

#[derive(Error, Debug)]
pub enum BreadcrumbsError {
	#[error("breadcrumb log has been disposed")]
	Disposed,

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON serialization error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type BreadcrumbsResult<T> = Result<T, BreadcrumbsError>;
