//! Sliding window wire format

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One outcome in a breaker's sliding window.
///
/// Stored in the window list as `"{timestamp}:{0|1}"` where `1` is a success.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowEntry {
	pub timestamp: f64,
	pub success: bool,
}

impl WindowEntry {
	pub fn new(timestamp: f64, success: bool) -> Self {
		Self { timestamp, success }
	}

	pub fn encode(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for WindowEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.timestamp, u8::from(self.success))
	}
}

#[derive(Debug, Error, PartialEq)]
#[error("Malformed window entry: {raw:?}")]
pub struct WindowEntryParseError {
	pub raw: String,
}

impl FromStr for WindowEntry {
	type Err = WindowEntryParseError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let malformed = || WindowEntryParseError {
			raw: raw.to_string(),
		};
		let (timestamp, outcome) = raw.rsplit_once(':').ok_or_else(malformed)?;
		let timestamp = timestamp.parse::<f64>().map_err(|_| malformed())?;
		let success = match outcome {
			"1" => true,
			"0" => false,
			_ => return Err(malformed()),
		};
		Ok(Self { timestamp, success })
	}
}
