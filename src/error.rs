use thiserror::Error;

/// A failed exchange with the remote recipe API.
#[derive(Debug, Error)]
pub enum FetchError {
	#[error("Network request failed: {0}")]
	Network(String),

	#[error("Request took too long! Timeout after {seconds} second(s)")]
	Timeout { seconds: u64 },

	/// The server answered with a non-success status.
	#[error("{message} ({status})")]
	Status { message: String, status: u16 },

	#[error("Unexpected response payload: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("Invalid request URL: {0}")]
	Url(#[from] url::ParseError),

	/// The API URL can't carry a recipe id as its last path segment.
	#[error("Cannot address recipe {id:?} below the API URL")]
	RecipeId { id: String },
}

/// Malformed user input in the recipe submission form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Wrong ingredient format! Please use the format 'quantity,unit,description' ({field}: {line:?})")]
	IngredientFormat { field: String, line: String },

	#[error("Ingredient quantity {quantity:?} is not a number ({field})")]
	Quantity { field: String, quantity: String },

	#[error("Field {field} must be a non-negative whole number, but was {value:?}")]
	Number { field: String, value: String },
}

/// Either failure of [`Store::upload_recipe`](`crate::store::Store::upload_recipe`).
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Fetch(#[from] FetchError),

	#[error(transparent)]
	Validation(#[from] ValidationError),
}

/// An in-place update that could not be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
	/// The live region and the new markup don't have the same number of elements.
	#[error("Cannot update in place: the rendered region has {current} element(s) but the new markup has {next}")]
	ShapeMismatch { current: usize, next: usize },

	#[error("DOM operation failed: {0}")]
	Dom(String),
}
