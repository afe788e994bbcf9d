//! Render modes shared by every view region.

use crate::{config::Config, diff::DomReconciler, error::ReconcileError};
use tracing::{debug, instrument, warn};

/// A per-feature markup generator.
pub trait View {
	type Data: ?Sized;

	fn generate_markup(&self, data: &Self::Data) -> String;

	/// Whether `data` counts as empty, which renders the error panel instead.
	fn is_empty(&self, _data: &Self::Data) -> bool {
		false
	}

	/// The default message of [`Region::render_error`].
	fn error_message(&self) -> &str;

	/// The default message of [`Region::render_message`].
	fn message(&self) -> &str {
		""
	}
}

/// A [`View`] bound to the container element it renders into.
#[derive(Debug)]
pub struct Region<V> {
	view: V,
	reconciler: DomReconciler,
	icons_url: String,
}

impl<V: View> Region<V> {
	#[must_use]
	pub fn new(view: V, parent_element: web_sys::Element, config: &Config) -> Self {
		Self {
			view,
			reconciler: DomReconciler::new_for_element_child_nodes(parent_element),
			icons_url: config.icons_url.clone(),
		}
	}

	#[must_use]
	pub fn view(&self) -> &V {
		&self.view
	}

	#[must_use]
	pub fn parent_element(&self) -> &web_sys::Element {
		self.reconciler.element()
	}

	/// The markup for `data`, or [`None`] if `data` is absent or empty.
	#[must_use]
	pub fn markup(&self, data: Option<&V::Data>) -> Option<String> {
		data.filter(|data| !self.view.is_empty(data)).map(|data| self.view.generate_markup(data))
	}

	/// Replaces the region's content with the markup for `data`, or with the error panel.
	#[instrument(skip(self, data))]
	pub fn render(&self, data: Option<&V::Data>) {
		match self.markup(data) {
			Some(markup) => self.reconciler.replace_child_nodes(&markup),
			None => self.render_error(None),
		}
	}

	/// Patches the rendered region in place to show `data`.
	///
	/// Absent or empty data leaves the region as it is.
	///
	/// # Errors
	///
	/// Iff the new markup's element structure differs from what is currently rendered.
	#[instrument(skip(self, data))]
	pub fn update(&self, data: Option<&V::Data>) -> Result<(), ReconcileError> {
		match self.markup(data) {
			Some(markup) => self.reconciler.update_child_nodes(&markup).map(drop).map_err(|error| {
				warn!("In-place update failed: {}", error);
				error
			}),
			None => {
				debug!("Nothing to update.");
				Ok(())
			}
		}
	}

	pub fn render_spinner(&self) {
		let markup = format!(
			r#"<div class="spinner"><svg><use href="{icons}#icon-loader"></use></svg></div>"#,
			icons = escape(&self.icons_url),
		);
		self.reconciler.replace_child_nodes(&markup);
	}

	/// Renders the error panel with `message`, or the view's default error message.
	pub fn render_error(&self, message: Option<&str>) {
		let message = message.unwrap_or_else(|| self.view.error_message());
		self.reconciler.replace_child_nodes(&panel("error", &self.icons_url, "icon-alert-triangle", message));
	}

	/// Renders the transient success panel with `message`, or the view's default message.
	pub fn render_message(&self, message: Option<&str>) {
		let message = message.unwrap_or_else(|| self.view.message());
		self.reconciler.replace_child_nodes(&panel("message", &self.icons_url, "icon-smile", message));
	}
}

fn panel(class: &str, icons_url: &str, icon: &str, message: &str) -> String {
	format!(
		r#"<div class="{class}"><div><svg><use href="{icons}#{icon}"></use></svg></div><p>{message}</p></div>"#,
		class = class,
		icons = escape(icons_url),
		icon = icon,
		message = escape(message),
	)
}

/// Escapes `text` for use in element content and quoted attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}
	escaped
}
