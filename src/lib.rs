//! Application state and in-place DOM reconciliation for a browser-resident recipe lookup app.
//!
//! - [`store::Store`] owns the [`store::ApplicationState`] and performs every load, pagination,
//!   rescaling and bookmark operation.
//! - [`diff::DomReconciler`] and [`view::Region`] render view markup into a container element,
//!   either from scratch or by patching text and attributes in place.
//! - [`web`] provides the browser's `fetch`/`setTimeout` transport and `localStorage` bookmark slot.

#![doc(html_root_url = "https://docs.rs/recipe-dom/0.1.0")]
#![warn(clippy::pedantic)]

pub use lignin;

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod bookmarks;
pub mod client;
pub mod config;
pub mod diff;
pub mod error;
pub mod load;
pub mod navigation;
pub mod recipe;
pub mod store;
pub mod upload;
pub mod view;
pub mod web;

pub use config::Config;
pub use error::{Error, FetchError, ReconcileError, ValidationError};
