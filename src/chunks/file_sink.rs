//! Chunk sink which writes each chunk to its own file.

use super::ChunkSink;
use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::debug;

/// Creates one file per chunk and keeps at most `max_files` of them on disk,
/// deleting the oldest when the limit is exceeded.
pub struct FileChunkSink {
	max_files: usize,
	file_name: Box<dyn Fn(usize) -> PathBuf + Send>,
	files: VecDeque<PathBuf>,
}

impl FileChunkSink {
	pub fn new(max_files: usize, file_name: Box<dyn Fn(usize) -> PathBuf + Send>) -> Self {
		Self { max_files: max_files.max(1), file_name, files: VecDeque::new() }
	}

	/// Files written so far and not yet rotated out, oldest first.
	pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
		self.files.iter()
	}
}

impl ChunkSink for FileChunkSink {
	type Stream = File;

	fn create(&mut self, index: usize) -> io::Result<File> {
		let path = (self.file_name)(index);
		let file = File::create(&path)?;

		self.files.push_back(path);
		if self.files.len() > self.max_files {
			if let Some(oldest) = self.files.pop_front() {
				debug!("Rotating out chunk file {:?}", oldest);
				let _ = std::fs::remove_file(oldest);
			}
		}

		Ok(file)
	}
}
