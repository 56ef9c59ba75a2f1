//! Retry queue configuration.

use super::error::{DatabaseError, DatabaseResult};
use super::record::RecordType;
use std::time::Duration;

/// Per-type count ceilings. `None` means unlimited. These ceilings, together
/// with generational aging, are the only backpressure against a persistently
/// unreachable endpoint growing local storage without bound.
#[derive(Debug, Clone)]
pub struct RecordLimits {
	pub report: Option<usize>,
	pub attachment: Option<usize>,
}

impl RecordLimits {
	pub fn limit_for(&self, record_type: RecordType) -> Option<usize> {
		match record_type {
			RecordType::Report => self.report,
			RecordType::Attachment => self.attachment,
		}
	}

	/// Combined ceiling, when every type has one.
	pub fn total(&self) -> Option<usize> {
		Some(self.report? + self.attachment?)
	}
}

impl Default for RecordLimits {
	fn default() -> Self {
		// 8 queued reports, with room for a few attachments each.
		Self { report: Some(8), attachment: Some(24) }
	}
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	/// When false, `initialize` fails and every mutating call is a no-op.
	pub enabled: bool,

	/// Per-type record count ceilings.
	pub limits: RecordLimits,

	/// Interval of the background tick driving aging and automatic resend.
	pub retry_interval: Duration,

	/// How many retry cycles an unsent record survives before eviction.
	pub maximum_retries: u32,

	/// Resend pending records on the background tick. When false, delivery
	/// only happens through explicit `send`/`flush` calls.
	pub auto_send: bool,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			limits: RecordLimits::default(),
			retry_interval: Duration::from_secs(60),
			maximum_retries: 3,
			auto_send: true,
		}
	}
}

impl DatabaseConfig {
	pub fn disabled() -> Self {
		Self { enabled: false, ..Self::default() }
	}

	pub fn validate(&self) -> DatabaseResult<()> {
		if self.maximum_retries == 0 {
			return Err(DatabaseError::InvalidConfiguration(
				"maximum_retries must be greater than 0".to_string(),
			));
		}
		if self.retry_interval.is_zero() {
			return Err(DatabaseError::InvalidConfiguration(
				"retry_interval must be greater than 0".to_string(),
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config_is_valid() {
		assert!(DatabaseConfig::default().validate().is_ok());
		assert!(DatabaseConfig::disabled().validate().is_ok());
	}

	#[test]
	fn test_zero_retries_is_rejected() {
		let config = DatabaseConfig { maximum_retries: 0, ..DatabaseConfig::default() };
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_zero_interval_is_rejected() {
		let config =
			DatabaseConfig { retry_interval: Duration::ZERO, ..DatabaseConfig::default() };
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_limits_total() {
		assert_eq!(RecordLimits::default().total(), Some(32));
		let unlimited = RecordLimits { report: None, attachment: Some(4) };
		assert_eq!(unlimited.total(), None);
	}
}
