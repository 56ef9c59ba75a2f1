//! Filesystem-backed storage: one file per key under a single directory.

use super::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct FsStorage {
	path: PathBuf,
	create_directory: bool,
}

impl FsStorage {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), create_directory: true }
	}

	/// Use an existing directory without creating it. `initialize` then fails
	/// when the directory is missing instead of creating it.
	pub fn existing(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), create_directory: false }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn resolve(&self, key: &str) -> PathBuf {
		self.path.join(key)
	}
}

#[async_trait]
impl StorageBackend for FsStorage {
	fn initialize(&self) -> bool {
		if self.path.is_dir() {
			return true;
		}
		if !self.create_directory {
			return false;
		}
		match std::fs::create_dir_all(&self.path) {
			Ok(()) => true,
			Err(error) => {
				warn!("Failed to create storage directory {:?}: {error}", self.path);
				false
			}
		}
	}

	async fn get(&self, key: &str) -> Option<String> {
		tokio::fs::read_to_string(self.resolve(key)).await.ok()
	}

	async fn set(&self, key: &str, value: &str) -> bool {
		tokio::fs::write(self.resolve(key), value).await.is_ok()
	}

	async fn remove(&self, key: &str) -> bool {
		tokio::fs::remove_file(self.resolve(key)).await.is_ok()
	}

	async fn has(&self, key: &str) -> bool {
		tokio::fs::metadata(self.resolve(key)).await.is_ok()
	}

	async fn keys(&self) -> Vec<String> {
		let mut keys = Vec::new();
		let Ok(mut entries) = tokio::fs::read_dir(&self.path).await else {
			return keys;
		};
		while let Ok(Some(entry)) = entries.next_entry().await {
			if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
				if let Ok(name) = entry.file_name().into_string() {
					keys.push(name);
				}
			}
		}
		keys
	}

	fn get_sync(&self, key: &str) -> Option<String> {
		std::fs::read_to_string(self.resolve(key)).ok()
	}

	fn set_sync(&self, key: &str, value: &str) -> bool {
		std::fs::write(self.resolve(key), value).is_ok()
	}

	fn remove_sync(&self, key: &str) -> bool {
		std::fs::remove_file(self.resolve(key)).is_ok()
	}

	fn has_sync(&self, key: &str) -> bool {
		self.resolve(key).is_file()
	}

	fn keys_sync(&self) -> Box<dyn Iterator<Item = String> + Send> {
		let Ok(entries) = std::fs::read_dir(&self.path) else {
			return Box::new(std::iter::empty());
		};
		Box::new(entries.filter_map(|entry| {
			let entry = entry.ok()?;
			if !entry.file_type().ok()?.is_file() {
				return None;
			}
			entry.file_name().into_string().ok()
		}))
	}
}
