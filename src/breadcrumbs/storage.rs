//! Breadcrumb history storage.
//!
//! The file-backed storage is the durable one: each breadcrumb becomes a
//! JSON line in the rotating log, so a crash loses at most the last
//! unflushed line and the two log files travel with the next report as
//! attachments. The in-memory storage serves hosts without a writable
//! filesystem.

use super::error::BreadcrumbsResult;
use super::model::{Breadcrumb, RawBreadcrumb};
use super::writer::AlternatingLogWriter;
use crate::model::Attachment;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub const BREADCRUMB_ATTACHMENT_MAIN: &str = "bt-breadcrumbs-0";
pub const BREADCRUMB_ATTACHMENT_FALLBACK: &str = "bt-breadcrumbs-1";

#[async_trait]
pub trait BreadcrumbsStorage: Send + Sync {
	/// Record a breadcrumb, returning its assigned id.
	async fn add(&self, breadcrumb: RawBreadcrumb) -> BreadcrumbsResult<u64>;

	/// The breadcrumb history as report attachments.
	fn attachments(&self) -> Vec<Attachment>;
}

fn seed_id() -> AtomicU64 {
	// Seeding from the wall clock keeps ids increasing across restarts.
	AtomicU64::new(Utc::now().timestamp().max(0) as u64)
}

pub struct FileBreadcrumbsStorage {
	writer: AlternatingLogWriter,
	main: PathBuf,
	fallback: PathBuf,
	next_id: AtomicU64,
}

impl FileBreadcrumbsStorage {
	/// `maximum_breadcrumbs` bounds the total history; each of the two log
	/// files holds half of it.
	pub fn new(
		main: impl Into<PathBuf>, fallback: impl Into<PathBuf>, maximum_breadcrumbs: usize,
	) -> Self {
		let main = main.into();
		let fallback = fallback.into();
		let writer = AlternatingLogWriter::new(&main, &fallback, maximum_breadcrumbs / 2);
		Self { writer, main, fallback, next_id: seed_id() }
	}

	pub async fn dispose(&self) {
		self.writer.dispose().await;
	}
}

#[async_trait]
impl BreadcrumbsStorage for FileBreadcrumbsStorage {
	async fn add(&self, breadcrumb: RawBreadcrumb) -> BreadcrumbsResult<u64> {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
		let breadcrumb = Breadcrumb::from_raw(id, breadcrumb);
		let line = serde_json::to_string(&breadcrumb)?;
		self.writer.write_line(&line).await?;
		Ok(id)
	}

	fn attachments(&self) -> Vec<Attachment> {
		vec![
			Attachment::file(BREADCRUMB_ATTACHMENT_MAIN, &self.main),
			Attachment::file(BREADCRUMB_ATTACHMENT_FALLBACK, &self.fallback),
		]
	}
}

pub struct InMemoryBreadcrumbsStorage {
	maximum_breadcrumbs: usize,
	breadcrumbs: Mutex<VecDeque<Breadcrumb>>,
	next_id: AtomicU64,
}

impl InMemoryBreadcrumbsStorage {
	pub fn new(maximum_breadcrumbs: usize) -> Self {
		Self {
			maximum_breadcrumbs,
			breadcrumbs: Mutex::new(VecDeque::new()),
			next_id: seed_id(),
		}
	}

	/// The retained history as a JSON array.
	pub fn get(&self) -> String {
		let breadcrumbs = match self.breadcrumbs.lock() {
			Ok(breadcrumbs) => breadcrumbs,
			Err(_) => return "[]".to_string(),
		};
		serde_json::to_string(&breadcrumbs.iter().collect::<Vec<_>>())
			.unwrap_or_else(|_| "[]".to_string())
	}
}

#[async_trait]
impl BreadcrumbsStorage for InMemoryBreadcrumbsStorage {
	async fn add(&self, breadcrumb: RawBreadcrumb) -> BreadcrumbsResult<u64> {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
		let breadcrumb = Breadcrumb::from_raw(id, breadcrumb);
		if let Ok(mut breadcrumbs) = self.breadcrumbs.lock() {
			breadcrumbs.push_back(breadcrumb);
			while breadcrumbs.len() > self.maximum_breadcrumbs {
				breadcrumbs.pop_front();
			}
		}
		Ok(id)
	}

	fn attachments(&self) -> Vec<Attachment> {
		vec![Attachment::buffer(BREADCRUMB_ATTACHMENT_MAIN, self.get().into_bytes())]
	}
}
