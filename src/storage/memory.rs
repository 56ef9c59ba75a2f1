//! In-memory storage for tests and hosts without a writable filesystem.

use super::StorageBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryStorage {
	entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.read().map(|entries| entries.len()).unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[async_trait]
impl StorageBackend for MemoryStorage {
	fn initialize(&self) -> bool {
		true
	}

	async fn get(&self, key: &str) -> Option<String> {
		self.get_sync(key)
	}

	async fn set(&self, key: &str, value: &str) -> bool {
		self.set_sync(key, value)
	}

	async fn remove(&self, key: &str) -> bool {
		self.remove_sync(key)
	}

	async fn has(&self, key: &str) -> bool {
		self.has_sync(key)
	}

	async fn keys(&self) -> Vec<String> {
		self.keys_sync().collect()
	}

	fn get_sync(&self, key: &str) -> Option<String> {
		self.entries.read().ok()?.get(key).cloned()
	}

	fn set_sync(&self, key: &str, value: &str) -> bool {
		match self.entries.write() {
			Ok(mut entries) => {
				entries.insert(key.to_string(), value.to_string());
				true
			}
			Err(_) => false,
		}
	}

	fn remove_sync(&self, key: &str) -> bool {
		match self.entries.write() {
			Ok(mut entries) => entries.remove(key).is_some(),
			Err(_) => false,
		}
	}

	fn has_sync(&self, key: &str) -> bool {
		self.entries.read().map(|entries| entries.contains_key(key)).unwrap_or(false)
	}

	fn keys_sync(&self) -> Box<dyn Iterator<Item = String> + Send> {
		let keys: Vec<String> = self
			.entries
			.read()
			.map(|entries| entries.keys().cloned().collect())
			.unwrap_or_default();
		Box::new(keys.into_iter())
	}
}
