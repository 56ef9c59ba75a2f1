//! Attachment model shared by the database and the transport contract.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// A file-backed attachment. Only the path and display name are persisted;
/// bytes are read lazily when a delivery attempt needs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
	pub name: String,
	pub path: PathBuf,
}

/// An attachment queued next to a report.
///
/// `File` attachments can be re-created after a process restart and therefore
/// survive persistence. `Buffer` attachments live only in memory and are
/// silently dropped from durability.
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
	File(FileAttachment),
	Buffer { name: String, bytes: Vec<u8> },
}

impl Attachment {
	pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
		Attachment::File(FileAttachment { name: name.into(), path: path.into() })
	}

	pub fn buffer(name: impl Into<String>, bytes: Vec<u8>) -> Self {
		Attachment::Buffer { name: name.into(), bytes }
	}

	pub fn name(&self) -> &str {
		match self {
			Attachment::File(file) => &file.name,
			Attachment::Buffer { name, .. } => name,
		}
	}

	/// Materialize the attachment content. File attachments are read from
	/// disk at call time so a queued attachment always delivers the current
	/// file content.
	pub fn bytes(&self) -> io::Result<Vec<u8>> {
		match self {
			Attachment::File(file) => std::fs::read(&file.path),
			Attachment::Buffer { bytes, .. } => Ok(bytes.clone()),
		}
	}

	pub fn as_file(&self) -> Option<&FileAttachment> {
		match self {
			Attachment::File(file) => Some(file),
			Attachment::Buffer { .. } => None,
		}
	}

	pub fn path(&self) -> Option<&Path> {
		self.as_file().map(|file| file.path.as_path())
	}
}

impl From<FileAttachment> for Attachment {
	fn from(file: FileAttachment) -> Self {
		Attachment::File(file)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_buffer_attachment_bytes() {
		let attachment = Attachment::buffer("dump", vec![1, 2, 3]);
		assert_eq!(attachment.name(), "dump");
		assert_eq!(attachment.bytes().unwrap(), vec![1, 2, 3]);
		assert!(attachment.as_file().is_none());
	}

	#[test]
	fn test_file_attachment_reads_current_content() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("log.txt");
		let mut file = std::fs::File::create(&path).unwrap();
		file.write_all(b"first").unwrap();

		let attachment = Attachment::file("log.txt", &path);
		assert_eq!(attachment.bytes().unwrap(), b"first");

		std::fs::write(&path, b"second").unwrap();
		assert_eq!(attachment.bytes().unwrap(), b"second");
	}

	#[test]
	fn test_missing_file_is_an_io_error() {
		let attachment = Attachment::file("gone", "/nonexistent/path/gone.txt");
		assert!(attachment.bytes().is_err());
	}
}
