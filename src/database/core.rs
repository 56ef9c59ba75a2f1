//! Send/retry orchestration over the context, the storage provider, and the
//! record senders.
//!
//! Lifecycle: Disabled -> Enabled -> Disposed (terminal). A database that
//! never enables (configuration off, or the storage provider refusing to
//! start) turns every mutating call into a no-op failure; the host keeps
//! running either way. Within one instance the `locked` flag stops a manual
//! `send` racing the background tick from double-submitting a record. There
//! is no cross-process guarantee: two instances over one storage location
//! can resend the same record, which at-least-once delivery tolerates.

use super::config::DatabaseConfig;
use super::context::DatabaseContext;
use super::error::{DatabaseError, DatabaseResult};
use super::events::DatabaseEvent;
use super::provider::StorageProvider;
use super::record::{AttachmentRecord, DatabaseRecord, RecordType, ReportRecord};
use super::sender;
use crate::cancel::CancelToken;
use crate::model::{Attachment, ReportPayload};
use crate::storage::StorageBackend;
use crate::submission::ReportSubmission;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const STATE_DISABLED: u8 = 0;
const STATE_ENABLED: u8 = 1;
const STATE_DISPOSED: u8 = 2;

const EVENT_CHANNEL_CAPACITY: usize = 64;

struct DatabaseInner {
	config: DatabaseConfig,
	context: Mutex<DatabaseContext>,
	provider: StorageProvider,
	transport: Arc<dyn ReportSubmission>,
	events: broadcast::Sender<DatabaseEvent>,
	state: AtomicU8,
}

pub struct Database {
	inner: Arc<DatabaseInner>,
	shutdown: watch::Sender<bool>,
	ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Database {
	pub fn new(
		config: DatabaseConfig, backend: Arc<dyn StorageBackend>,
		transport: Arc<dyn ReportSubmission>,
	) -> DatabaseResult<Self> {
		config.validate()?;
		let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
		let (shutdown, _) = watch::channel(false);
		let context = DatabaseContext::new(config.maximum_retries);
		Ok(Self {
			inner: Arc::new(DatabaseInner {
				context: Mutex::new(context),
				provider: StorageProvider::new(backend),
				transport,
				events,
				state: AtomicU8::new(STATE_DISABLED),
				config,
			}),
			shutdown,
			ticker: Mutex::new(None),
		})
	}

	/// Move Disabled -> Enabled: storage readiness check, recovery of
	/// persisted records, then the background tick. Returns whether the
	/// database is enabled afterwards.
	pub async fn initialize(&self) -> bool {
		match self.inner.state.load(Ordering::SeqCst) {
			STATE_ENABLED => return true,
			STATE_DISPOSED => return false,
			_ => {}
		}

		if !self.inner.config.enabled {
			return false;
		}
		if !self.inner.provider.start() {
			warn!("Storage provider failed to start, offline report queue stays disabled");
			return false;
		}

		let recovered = self.load_persisted_records().await;
		if recovered > 0 {
			info!("Recovered {recovered} pending records from storage");
		}

		self.inner.state.store(STATE_ENABLED, Ordering::SeqCst);
		self.spawn_ticker().await;
		true
	}

	/// Queue a built report and one attachment record per attachment.
	/// Returns the report record, or `None` when the database is not
	/// enabled.
	pub async fn add(
		&self, data: ReportPayload, attachments: Vec<Attachment>, session_id: Option<String>,
	) -> Option<DatabaseRecord> {
		if !self.is_enabled() {
			return None;
		}

		let report = ReportRecord::new(data, attachments.clone(), session_id.clone());
		let rxid = report.id.clone();
		let mut records = vec![DatabaseRecord::Report(report)];
		for attachment in attachments {
			records.push(DatabaseRecord::Attachment(AttachmentRecord::new(
				rxid.clone(),
				attachment,
				session_id.clone(),
			)));
		}

		let added = records[0].clone();
		for record in records {
			{
				let mut context = self.inner.context.lock().await;
				context.add(record.clone());
			}
			if !self.inner.provider.add(&record).await {
				debug!("Record {} not persisted, kept in memory only", record.id());
			}
			self.inner.emit(DatabaseEvent::Added { record });
		}

		self.inner.enforce_limits().await;
		Some(added)
	}

	/// Attempt delivery of every unlocked record. Successful records are
	/// removed; everything else stays for the next cycle.
	pub async fn send(&self) -> DatabaseResult<()> {
		self.ensure_enabled()?;
		self.inner.send_all(None).await;
		Ok(())
	}

	/// `send` with a cancellation token threaded to the transport.
	/// Cancelling leaves every undelivered record unlocked for a later
	/// retry.
	pub async fn send_with_token(&self, token: CancelToken) -> DatabaseResult<()> {
		self.ensure_enabled()?;
		self.inner.send_all(Some(token)).await;
		Ok(())
	}

	/// Attempt delivery, then drop every record that was queued when the
	/// flush started, regardless of outcome. Guarantees a bounded-time
	/// drain at the cost of possible data loss.
	pub async fn flush(&self) -> DatabaseResult<()> {
		self.ensure_enabled()?;
		let start = Utc::now();
		self.inner.send_all(None).await;

		let leftovers: Vec<DatabaseRecord> = {
			let context = self.inner.context.lock().await;
			context.get().into_iter().filter(|record| record.timestamp() <= start).collect()
		};
		for record in leftovers {
			self.inner.remove_record(record.id()).await;
		}
		Ok(())
	}

	/// Remove a record from the index and from storage.
	pub async fn remove(&self, id: &str) -> bool {
		if !self.is_enabled() {
			return false;
		}
		self.inner.remove_record(id).await
	}

	pub async fn count(&self) -> usize {
		self.inner.context.lock().await.count()
	}

	pub async fn count_by_type(&self) -> HashMap<RecordType, usize> {
		self.inner.context.lock().await.count_by_type()
	}

	/// Value copies of all queued records.
	pub async fn get(&self) -> Vec<DatabaseRecord> {
		self.inner.context.lock().await.get()
	}

	pub fn subscribe(&self) -> broadcast::Receiver<DatabaseEvent> {
		self.inner.events.subscribe()
	}

	pub fn is_enabled(&self) -> bool {
		self.inner.state.load(Ordering::SeqCst) == STATE_ENABLED
	}

	/// Terminal: stop the background tick and refuse all further mutation.
	/// Persisted records stay on disk for the next instance to recover.
	pub async fn dispose(&self) {
		self.inner.state.store(STATE_DISPOSED, Ordering::SeqCst);
		let _ = self.shutdown.send(true);
		if let Some(ticker) = self.ticker.lock().await.take() {
			ticker.abort();
		}
	}

	fn ensure_enabled(&self) -> DatabaseResult<()> {
		match self.inner.state.load(Ordering::SeqCst) {
			STATE_ENABLED => Ok(()),
			STATE_DISPOSED => Err(DatabaseError::Disposed),
			_ => Err(DatabaseError::NotEnabled),
		}
	}

	async fn load_persisted_records(&self) -> usize {
		let mut records = self.inner.provider.get().await;

		// Cap recovery to the configured ceiling, newest first; surplus
		// entries are deleted so they do not resurface on the next start.
		if let Some(total) = self.inner.config.limits.total() {
			if records.len() > total {
				records.sort_by(|a, b| {
					(b.timestamp(), b.id()).cmp(&(a.timestamp(), a.id()))
				});
				for surplus in records.split_off(total) {
					self.inner.provider.delete(surplus.id()).await;
				}
			}
		}

		let recovered = records.len();
		let mut context = self.inner.context.lock().await;
		context.load(records);
		recovered
	}

	async fn spawn_ticker(&self) {
		let inner = self.inner.clone();
		let mut shutdown = self.shutdown.subscribe();
		let handle = tokio::spawn(async move {
			let mut interval = tokio::time::interval(inner.config.retry_interval);
			// The first tick fires immediately: send what recovery loaded,
			// but do not age records that only just came back.
			let mut first = true;
			loop {
				tokio::select! {
					_ = interval.tick() => {
						if first {
							first = false;
						} else {
							inner.age().await;
						}
						if inner.config.auto_send {
							inner.send_all(None).await;
						}
					}
					_ = shutdown.changed() => break,
				}
			}
		});
		*self.ticker.lock().await = Some(handle);
	}
}

impl DatabaseInner {
	fn emit(&self, event: DatabaseEvent) {
		// No subscribers is fine; the queue never depends on listeners.
		let _ = self.events.send(event);
	}

	async fn send_all(&self, token: Option<CancelToken>) {
		let ids = {
			let context = self.context.lock().await;
			context.unlocked_ids()
		};

		for id in ids {
			if token.as_ref().map(|t| t.is_cancelled()).unwrap_or(false) {
				debug!("Send cycle cancelled, leaving remaining records queued");
				break;
			}

			let locked = {
				let mut context = self.context.lock().await;
				context.lock(&id)
			};
			let Some(record) = locked else {
				// Removed or locked by a concurrent cycle in the meantime.
				continue;
			};

			self.emit(DatabaseEvent::BeforeSend { record: record.clone() });
			let result =
				sender::send_record(self.transport.as_ref(), &record, token.clone()).await;
			self.emit(DatabaseEvent::AfterSend {
				record: record.clone(),
				result: result.clone(),
			});

			let removed = {
				let mut context = self.context.lock().await;
				context.unlock(&id);
				if result.is_ok() {
					context.remove(&id)
				} else {
					None
				}
			};
			if let Some(record) = removed {
				self.provider.delete(&id).await;
				self.emit(DatabaseEvent::Removed { record });
			}
		}
	}

	/// One aging cycle: advance every generation, then enforce the count
	/// ceilings. Evicted records are dropped without a delivery attempt.
	async fn age(&self) {
		let evicted = {
			let mut context = self.context.lock().await;
			let mut evicted = context.increase_bucket(0);
			evicted.extend(context.drop_over_limits(&self.config.limits));
			evicted
		};
		for record in evicted {
			debug!("Evicting record {} without delivery", record.id());
			self.provider.delete(record.id()).await;
			self.emit(DatabaseEvent::Removed { record });
		}
	}

	async fn enforce_limits(&self) {
		let dropped = {
			let mut context = self.context.lock().await;
			context.drop_over_limits(&self.config.limits)
		};
		for record in dropped {
			self.provider.delete(record.id()).await;
			self.emit(DatabaseEvent::Removed { record });
		}
	}

	async fn remove_record(&self, id: &str) -> bool {
		let removed = {
			let mut context = self.context.lock().await;
			context.remove(id)
		};
		match removed {
			Some(record) => {
				self.provider.delete(id).await;
				self.emit(DatabaseEvent::Removed { record });
				true
			}
			// Not indexed: still try to clear a stray persisted entry.
			None => self.provider.delete(id).await,
		}
	}
}
