use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
	#[error("Invalid configuration: {0}")]
	InvalidConfiguration(String),

	#[error("Database is not enabled")]
	NotEnabled,

	#[error("Database has been disposed")]
	Disposed,
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
