//! Delivery-outcome taxonomy and the transport contract.
//!
//! Every sender returns the same closed set of outcomes. Only `Ok` removes a
//! record from the queue; every other outcome leaves it for a later cycle.
//! Eviction is governed purely by generation and count limits, never by
//! outcome kind.

use crate::cancel::CancelToken;
use crate::model::{Attachment, ReportPayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
	Ok,
	LimitReached,
	ServerError,
	NetworkError,
	InvalidToken,
	Unknown,
	DisabledSdk,
	ReportSkipped,
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
	pub status: SubmissionStatus,
	pub message: Option<String>,
}

impl SubmissionResult {
	pub fn ok() -> Self {
		Self { status: SubmissionStatus::Ok, message: None }
	}

	pub fn limit_reached() -> Self {
		Self {
			status: SubmissionStatus::LimitReached,
			message: Some("Report limit reached".to_string()),
		}
	}

	pub fn server_error(message: impl Into<String>) -> Self {
		Self { status: SubmissionStatus::ServerError, message: Some(message.into()) }
	}

	pub fn network_error(message: impl Into<String>) -> Self {
		Self { status: SubmissionStatus::NetworkError, message: Some(message.into()) }
	}

	pub fn invalid_token() -> Self {
		Self { status: SubmissionStatus::InvalidToken, message: None }
	}

	pub fn unknown(message: impl Into<String>) -> Self {
		Self { status: SubmissionStatus::Unknown, message: Some(message.into()) }
	}

	pub fn disabled_sdk() -> Self {
		Self { status: SubmissionStatus::DisabledSdk, message: None }
	}

	pub fn report_skipped() -> Self {
		Self { status: SubmissionStatus::ReportSkipped, message: None }
	}

	pub fn is_ok(&self) -> bool {
		self.status == SubmissionStatus::Ok
	}
}

/// The submission transport. Implementations own URLs, timeouts, and retries
/// at the wire level; the queue only consumes the outcome taxonomy.
#[async_trait]
pub trait ReportSubmission: Send + Sync {
	async fn send_report(
		&self, payload: &ReportPayload, attachments: &[Attachment], token: Option<CancelToken>,
	) -> SubmissionResult;

	async fn send_attachment(
		&self, rxid: &str, attachment: &Attachment, token: Option<CancelToken>,
	) -> SubmissionResult;
}
