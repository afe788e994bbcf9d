//! Application configuration constants, overridable from JSON.

use core::num::NonZeroUsize;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Endpoint, paging and timing constants shared by the store and the views.
///
/// Every field has a default, so [`Config::from_json`] only needs the fields that differ.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Base recipe resource URL, including the trailing slash.
	pub api_url: String,
	pub api_key: String,
	pub results_per_page: NonZeroUsize,
	/// Duration after which a pending request is abandoned.
	pub timeout_seconds: u64,
	/// Delay before the submission form closes after a successful upload.
	pub modal_close_seconds: f64,
	/// Durable local storage key holding the serialized bookmark sequence.
	pub bookmarks_key: String,
	pub icons_url: String,
}

pub const API_URL: &str = "https://forkify-api.herokuapp.com/api/v2/recipes/";
pub const RES_PER_PAGE: usize = 10;
pub const TIMEOUT_SEC: u64 = 10;
pub const MODAL_CLOSE_SEC: f64 = 2.5;

impl Default for Config {
	fn default() -> Self {
		Self {
			api_url: API_URL.to_owned(),
			api_key: String::new(),
			results_per_page: NonZeroUsize::new(RES_PER_PAGE).unwrap_or(NonZeroUsize::MIN),
			timeout_seconds: TIMEOUT_SEC,
			modal_close_seconds: MODAL_CLOSE_SEC,
			bookmarks_key: "bookmarks".to_owned(),
			icons_url: "img/icons.svg".to_owned(),
		}
	}
}

impl Config {
	/// Parses a (possibly partial) JSON configuration object.
	///
	/// # Errors
	///
	/// Iff `json` is not an object of the fields above with the correct types.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	#[must_use]
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_seconds)
	}

	#[must_use]
	pub fn modal_close_delay(&self) -> Duration {
		Duration::try_from_secs_f64(self.modal_close_seconds.max(0.0)).unwrap_or_else(|error| {
			warn!("Invalid modal close delay {}: {}", self.modal_close_seconds, error);
			Duration::from_secs_f64(MODAL_CLOSE_SEC)
		})
	}
}
