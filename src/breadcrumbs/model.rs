use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbType {
	Manual,
	Log,
	Navigation,
	Http,
	System,
	User,
	Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbLevel {
	Debug,
	Info,
	Warning,
	Error,
}

/// A breadcrumb as supplied by the host application, before an id and
/// timestamp are assigned.
#[derive(Debug, Clone)]
pub struct RawBreadcrumb {
	pub message: String,
	pub level: BreadcrumbLevel,
	pub kind: BreadcrumbType,
	pub attributes: Option<Map<String, Value>>,
}

impl RawBreadcrumb {
	pub fn new(message: impl Into<String>, level: BreadcrumbLevel, kind: BreadcrumbType) -> Self {
		Self { message: message.into(), level, kind, attributes: None }
	}

	pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
		self.attributes = Some(attributes);
		self
	}
}

/// A fully formed breadcrumb, one JSON line in the rotating log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
	pub id: u64,
	pub message: String,
	/// Unix milliseconds.
	pub timestamp: i64,
	#[serde(rename = "type")]
	pub kind: BreadcrumbType,
	pub level: BreadcrumbLevel,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub attributes: Option<Map<String, Value>>,
}

impl Breadcrumb {
	pub fn from_raw(id: u64, raw: RawBreadcrumb) -> Self {
		Self {
			id,
			message: raw.message,
			timestamp: Utc::now().timestamp_millis(),
			kind: raw.kind,
			level: raw.level,
			attributes: raw.attributes,
		}
	}
}
