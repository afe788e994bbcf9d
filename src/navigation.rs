//! The location fragment (`#<id>`) as routing state.

use tracing::error;
use wasm_bindgen::JsValue;

/// The recipe id in `fragment`, with or without its leading `#`.
#[must_use]
pub fn recipe_id_from_fragment(fragment: &str) -> Option<&str> {
	let id = fragment.strip_prefix('#').unwrap_or(fragment);
	if id.is_empty() {
		None
	} else {
		Some(id)
	}
}

/// The recipe id in the current page location, if any.
#[must_use]
pub fn current_recipe_id() -> Option<String> {
	let hash = web_sys::window()?.location().hash().ok()?;
	recipe_id_from_fragment(&hash).map(str::to_owned)
}

/// Rewrites the location fragment to `id` without reloading or triggering navigation.
pub fn push_recipe_id(id: &str) {
	let history = match web_sys::window().map(|window| window.history()) {
		Some(Ok(history)) => history,
		_ => return error!("No history available to record the recipe id."),
	};
	if let Err(error) = history.push_state_with_url(&JsValue::NULL, "", Some(&format!("#{}", id))) {
		error!("Could not push the recipe id: {:?}", error);
	}
}
