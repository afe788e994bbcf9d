//! The Remote Data Client: JSON requests raced against a fixed timeout.

use crate::error::FetchError;
use async_trait::async_trait;
use futures::future::{self, Either};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
}

impl Method {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
		}
	}
}

/// A single HTTP exchange as seen by a [`Transport`].
///
/// `body`, if present, is JSON text and must be sent with a JSON content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
	pub method: Method,
	pub url: String,
	pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
	pub status: u16,
	pub body: String,
}

impl Response {
	#[must_use]
	pub fn ok(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Host I/O used by [`RemoteClient`].
///
/// In the browser this is [`web::WebTransport`](`crate::web::WebTransport`).
#[async_trait(?Send)]
pub trait Transport {
	/// Performs `request` without any timeout of its own.
	///
	/// # Errors
	///
	/// Iff no response was received at all.
	async fn send(&self, request: Request) -> Result<Response, FetchError>;

	/// Completes after `duration` has elapsed.
	async fn sleep(&self, duration: Duration);
}

#[derive(Debug)]
pub struct RemoteClient<T> {
	transport: T,
	timeout: Duration,
}

impl<T: Transport> RemoteClient<T> {
	#[must_use]
	pub fn new(transport: T, timeout: Duration) -> Self {
		Self { transport, timeout }
	}

	#[must_use]
	pub fn transport(&self) -> &T {
		&self.transport
	}

	/// GETs `url`, or POSTs `body` to it as JSON if present, and parses the JSON response.
	///
	/// # Errors
	///
	/// - [`FetchError::Timeout`] if the timeout elapses first,
	/// - [`FetchError::Status`] for a non-success status, with the server-supplied message,
	/// - [`FetchError::Network`] or [`FetchError::Decode`] otherwise.
	#[instrument(skip(self, body), fields(post = body.is_some()))]
	pub async fn request(&self, url: &str, body: Option<&Value>) -> Result<Value, FetchError> {
		let request = Request {
			method: if body.is_some() { Method::Post } else { Method::Get },
			url: url.to_owned(),
			body: body.map(serde_json::to_string).transpose()?,
		};

		let response = match future::select(self.transport.send(request), self.transport.sleep(self.timeout)).await {
			Either::Left((response, _)) => response?,
			Either::Right(((), _)) => {
				warn!("Request timed out after {:?}.", self.timeout);
				return Err(FetchError::Timeout { seconds: self.timeout.as_secs() });
			}
		};
		debug!("Received status {}.", response.status);

		let data = serde_json::from_str::<Value>(&response.body);
		if !response.ok() {
			let message = data
				.ok()
				.as_ref()
				.and_then(|data| data.get("message"))
				.and_then(Value::as_str)
				.map_or_else(|| "Request failed".to_owned(), str::to_owned);
			return Err(FetchError::Status { message, status: response.status });
		}
		Ok(data?)
	}
}
