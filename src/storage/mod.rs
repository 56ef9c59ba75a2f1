//! Abstract byte-string key/value storage.
//!
//! The reporting library must never crash its host over a storage fault, so
//! no backend operation returns an error: failures degrade to `false`,
//! `None`, or an empty key listing. Sync and async variants are semantically
//! equivalent; the async ones exist so suspension-friendly callers never
//! block an executor thread on disk I/O.

mod fs;
mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;

#[async_trait]
pub trait StorageBackend: Send + Sync {
	/// Prepare the backend for use (e.g. create the backing directory).
	/// Returning false disables whatever sits on top of this backend.
	fn initialize(&self) -> bool;

	async fn get(&self, key: &str) -> Option<String>;
	async fn set(&self, key: &str, value: &str) -> bool;
	async fn remove(&self, key: &str) -> bool;
	async fn has(&self, key: &str) -> bool;

	/// Current keys, unordered. Finite and restartable: each call produces a
	/// fresh enumeration.
	async fn keys(&self) -> Vec<String>;

	fn get_sync(&self, key: &str) -> Option<String>;
	fn set_sync(&self, key: &str, value: &str) -> bool;
	fn remove_sync(&self, key: &str) -> bool;
	fn has_sync(&self, key: &str) -> bool;
	fn keys_sync(&self) -> Box<dyn Iterator<Item = String> + Send>;
}
