//! Crash-resilient rotating line writer.
//!
//! Lines are appended to a "main" file; when the configured capacity is
//! reached, main's contents move to a "fallback" file (replacing any prior
//! fallback) and main restarts fresh. An abrupt process kill therefore loses
//! at most the last unflushed line while total size stays bounded at two
//! files. Rotation is the chunk-splitting primitive wearing a different hat:
//! a line-capacity splitter drives a sink whose next chunk renames main to
//! fallback.

use super::error::{BreadcrumbsError, BreadcrumbsResult};
use crate::chunks::{ChunkSink, Chunkifier, LineChunkSplitter};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::warn;

struct AlternatingSink {
	main: PathBuf,
	fallback: PathBuf,
}

impl ChunkSink for AlternatingSink {
	type Stream = File;

	fn create(&mut self, index: usize) -> io::Result<File> {
		if index > 0 {
			// Rotation: the finished main becomes the fallback. A failed
			// rename degrades to restarting main in place.
			let _ = std::fs::remove_file(&self.fallback);
			if let Err(error) = std::fs::rename(&self.main, &self.fallback) {
				warn!("Breadcrumb log rotation failed: {error}");
			}
		}
		File::create(&self.main)
	}
}

enum WriterState {
	Active(Chunkifier<AlternatingSink>),
	/// Zero capacity: writes are accepted but perform no I/O.
	Inactive,
	Disposed,
}

/// Appends lines to `main`, rotating to `fallback` every `capacity` lines.
///
/// All writes pass through a single internal lock, so concurrent callers are
/// strictly ordered relative to each other and a write never interleaves
/// with a rotation. Ordering between callers racing for the lock is
/// best-effort.
pub struct AlternatingLogWriter {
	state: Mutex<WriterState>,
}

impl AlternatingLogWriter {
	/// A `capacity` of zero disables the writer entirely; neither file is
	/// created and every write is a silent no-op.
	pub fn new(main: impl Into<PathBuf>, fallback: impl Into<PathBuf>, capacity: usize) -> Self {
		let state = if capacity == 0 {
			WriterState::Inactive
		} else {
			let sink = AlternatingSink { main: main.into(), fallback: fallback.into() };
			WriterState::Active(Chunkifier::new(
				sink,
				Box::new(move || Box::new(LineChunkSplitter::new(capacity))),
			))
		};
		Self { state: Mutex::new(state) }
	}

	pub async fn write_line(&self, line: &str) -> BreadcrumbsResult<()> {
		let mut state = self.state.lock().await;
		match &mut *state {
			WriterState::Disposed => Err(BreadcrumbsError::Disposed),
			WriterState::Inactive => Ok(()),
			WriterState::Active(chunkifier) => {
				chunkifier.write(format!("{line}\n").as_bytes())?;
				Ok(())
			}
		}
	}

	/// Terminal. Flushes the current file; later writes fail with
	/// [`BreadcrumbsError::Disposed`] and perform no I/O.
	pub async fn dispose(&self) {
		let mut state = self.state.lock().await;
		if let WriterState::Active(chunkifier) = &mut *state {
			if let Err(error) = chunkifier.finish() {
				warn!("Failed to flush breadcrumb log on dispose: {error}");
			}
		}
		*state = WriterState::Disposed;
	}

	pub async fn is_disposed(&self) -> bool {
		matches!(*self.state.lock().await, WriterState::Disposed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::Path;

	fn paths(dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
		(dir.path().join("log-main"), dir.path().join("log-fallback"))
	}

	fn read_lines(path: &Path) -> Vec<String> {
		std::fs::read_to_string(path)
			.unwrap()
			.lines()
			.map(str::to_string)
			.collect()
	}

	#[tokio::test]
	async fn test_capacity_lines_leave_fallback_empty() {
		let dir = tempfile::tempdir().unwrap();
		let (main, fallback) = paths(&dir);
		let writer = AlternatingLogWriter::new(&main, &fallback, 3);

		for n in 0..3 {
			writer.write_line(&format!("line {n}")).await.unwrap();
		}

		assert_eq!(read_lines(&main), vec!["line 0", "line 1", "line 2"]);
		assert!(!fallback.exists());
	}

	#[tokio::test]
	async fn test_overflow_rotates_main_to_fallback() {
		let dir = tempfile::tempdir().unwrap();
		let (main, fallback) = paths(&dir);
		let writer = AlternatingLogWriter::new(&main, &fallback, 3);

		for n in 0..4 {
			writer.write_line(&format!("line {n}")).await.unwrap();
		}

		assert_eq!(read_lines(&fallback), vec!["line 0", "line 1", "line 2"]);
		assert_eq!(read_lines(&main), vec!["line 3"]);
	}

	#[tokio::test]
	async fn test_second_rotation_replaces_fallback() {
		let dir = tempfile::tempdir().unwrap();
		let (main, fallback) = paths(&dir);
		let writer = AlternatingLogWriter::new(&main, &fallback, 2);

		for n in 0..5 {
			writer.write_line(&format!("line {n}")).await.unwrap();
		}

		assert_eq!(read_lines(&fallback), vec!["line 2", "line 3"]);
		assert_eq!(read_lines(&main), vec!["line 4"]);
	}

	#[tokio::test]
	async fn test_zero_capacity_creates_no_files() {
		let dir = tempfile::tempdir().unwrap();
		let (main, fallback) = paths(&dir);
		let writer = AlternatingLogWriter::new(&main, &fallback, 0);

		writer.write_line("dropped").await.unwrap();

		assert!(!main.exists());
		assert!(!fallback.exists());
	}

	#[tokio::test]
	async fn test_write_after_dispose_fails_without_io() {
		let dir = tempfile::tempdir().unwrap();
		let (main, fallback) = paths(&dir);
		let writer = AlternatingLogWriter::new(&main, &fallback, 3);

		writer.write_line("kept").await.unwrap();
		writer.dispose().await;
		assert!(writer.is_disposed().await);

		let result = writer.write_line("lost").await;
		assert!(matches!(result, Err(BreadcrumbsError::Disposed)));
		assert_eq!(read_lines(&main), vec!["kept"]);
	}

	#[tokio::test]
	async fn test_concurrent_writers_never_lose_committed_lines() {
		let dir = tempfile::tempdir().unwrap();
		let (main, fallback) = paths(&dir);
		let writer = std::sync::Arc::new(AlternatingLogWriter::new(&main, &fallback, 8));

		let mut handles = Vec::new();
		for task in 0..4 {
			let writer = writer.clone();
			handles.push(tokio::spawn(async move {
				for n in 0..4 {
					writer.write_line(&format!("task {task} line {n}")).await.unwrap();
				}
			}));
		}
		for handle in handles {
			handle.await.unwrap();
		}

		// 16 lines at capacity 8: both files together hold the complete tail.
		let mut lines = read_lines(&main);
		lines.extend(read_lines(&fallback));
		assert_eq!(lines.len(), 16);
	}
}
