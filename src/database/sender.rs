//! Per-type translation from a queued record to a delivery call.
//!
//! Dispatch is an exhaustive match over the record union, so adding a record
//! type is a compile-time-visible change here. Senders are stateless; all
//! retry policy lives in the database orchestration.

use super::record::DatabaseRecord;
use crate::cancel::CancelToken;
use crate::submission::{ReportSubmission, SubmissionResult};

pub async fn send_record(
	transport: &dyn ReportSubmission, record: &DatabaseRecord, token: Option<CancelToken>,
) -> SubmissionResult {
	match record {
		DatabaseRecord::Report(report) => {
			transport.send_report(&report.data, &report.attachments, token).await
		}
		DatabaseRecord::Attachment(attachment) => {
			transport.send_attachment(&attachment.rxid, &attachment.attachment, token).await
		}
	}
}
