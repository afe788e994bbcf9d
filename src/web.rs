//! Browser implementations of [`Transport`] and [`BookmarkSlot`].

use crate::{
	bookmarks::BookmarkSlot,
	client::{Method, Request, Response, Transport},
	error::FetchError,
};
use async_trait::async_trait;
use core::convert::TryFrom;
use js_sys::{Function, Promise};
use std::time::Duration;
use tracing::{error, instrument, trace};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, RequestInit, Storage};

fn network_error(value: &JsValue) -> FetchError {
	FetchError::Network(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

/// Sends requests through the window's `fetch` and sleeps on `setTimeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebTransport;

#[async_trait(?Send)]
impl Transport for WebTransport {
	#[instrument(skip(self, request), fields(method = request.method.as_str()))]
	async fn send(&self, request: Request) -> Result<Response, FetchError> {
		let window = web_sys::window().ok_or_else(|| FetchError::Network("No window available.".to_owned()))?;

		let init = RequestInit::new();
		init.set_method(request.method.as_str());
		if let (Method::Post, Some(body)) = (request.method, &request.body) {
			let headers = Headers::new().map_err(|error| network_error(&error))?;
			headers.set("Content-Type", "application/json").map_err(|error| network_error(&error))?;
			init.set_headers(headers.as_ref());
			init.set_body(&JsValue::from_str(body));
		}

		let web_request = web_sys::Request::new_with_str_and_init(&request.url, &init).map_err(|error| network_error(&error))?;
		let response: web_sys::Response = JsFuture::from(window.fetch_with_request(&web_request))
			.await
			.and_then(JsCast::dyn_into)
			.map_err(|error| network_error(&error))?;
		let text = response.text().map_err(|error| network_error(&error))?;
		let body = JsFuture::from(text).await.map_err(|error| network_error(&error))?;

		trace!(status = response.status(), "Fetched.");
		Ok(Response { status: response.status(), body: body.as_string().unwrap_or_default() })
	}

	async fn sleep(&self, duration: Duration) {
		let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
		let promise = Promise::new(&mut |resolve: Function, _reject: Function| match web_sys::window() {
			Some(window) => {
				if let Err(error) = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis) {
					error!("Could not schedule timeout: {:?}", error);
				}
			}
			None => error!("No window available to schedule a timeout. It will never elapse."),
		});
		if let Err(error) = JsFuture::from(promise).await {
			error!("Timeout promise rejected: {:?}", error);
		}
	}
}

/// A single `localStorage` key.
#[derive(Debug, Clone)]
pub struct LocalStorageSlot {
	storage: Storage,
	key: String,
}

impl LocalStorageSlot {
	/// [`None`] iff `localStorage` is unavailable, for example because it was disabled.
	#[must_use]
	pub fn new(key: impl Into<String>) -> Option<Self> {
		let storage = web_sys::window()?.local_storage().ok()??;
		Some(Self { storage, key: key.into() })
	}
}

impl BookmarkSlot for LocalStorageSlot {
	fn read(&self) -> Option<String> {
		match self.storage.get_item(&self.key) {
			Ok(value) => value,
			Err(error) => {
				error!("Could not read {:?} from local storage: {:?}", self.key, error);
				None
			}
		}
	}

	fn write(&self, value: &str) {
		if let Err(error) = self.storage.set_item(&self.key, value) {
			error!("Could not write {:?} to local storage: {:?}", self.key, error);
		}
	}
}
