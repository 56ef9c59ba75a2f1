//! Common test utilities for the faultline integration suite

#![allow(dead_code)]

use async_trait::async_trait;
use faultline::cancel::CancelToken;
use faultline::model::{Attachment, ReportPayload};
use faultline::submission::{ReportSubmission, SubmissionResult, SubmissionStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn setup_temp_dir() -> TempDir {
	init_tracing();
	TempDir::new().expect("Failed to create temp directory")
}

/// Route library logs to the test harness; safe to call repeatedly.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Transport double: returns a fixed status and records what it was asked
/// to deliver.
pub struct TestTransport {
	status: Mutex<SubmissionStatus>,
	calls: AtomicUsize,
	sent_attachment_names: Mutex<Vec<String>>,
}

impl TestTransport {
	pub fn new(status: SubmissionStatus) -> Arc<Self> {
		Arc::new(Self {
			status: Mutex::new(status),
			calls: AtomicUsize::new(0),
			sent_attachment_names: Mutex::new(Vec::new()),
		})
	}

	pub fn set_status(&self, status: SubmissionStatus) {
		*self.status.lock().unwrap() = status;
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn sent_attachment_names(&self) -> Vec<String> {
		self.sent_attachment_names.lock().unwrap().clone()
	}

	fn result(&self) -> SubmissionResult {
		self.calls.fetch_add(1, Ordering::SeqCst);
		SubmissionResult { status: *self.status.lock().unwrap(), message: None }
	}
}

#[async_trait]
impl ReportSubmission for TestTransport {
	async fn send_report(
		&self, _payload: &ReportPayload, attachments: &[Attachment],
		_token: Option<CancelToken>,
	) -> SubmissionResult {
		let mut names = self.sent_attachment_names.lock().unwrap();
		names.extend(attachments.iter().map(|a| a.name().to_string()));
		drop(names);
		self.result()
	}

	async fn send_attachment(
		&self, _rxid: &str, attachment: &Attachment, _token: Option<CancelToken>,
	) -> SubmissionResult {
		self.sent_attachment_names.lock().unwrap().push(attachment.name().to_string());
		self.result()
	}
}
