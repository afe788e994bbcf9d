//! The canonical recipe entities and their normalization from raw API payloads.

use crate::error::FetchError;
use serde::{Deserialize, Serialize};

/// A normalized dish record.
///
/// This camel-cased shape is also the persisted bookmark layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
	pub id: String,
	pub title: String,
	pub publisher: String,
	pub source_url: String,
	pub image: String,
	pub servings: u32,
	pub cooking_time: u32,
	pub ingredients: Vec<Ingredient>,
	/// Cached membership of [`Recipe::id`] in the bookmark sequence, as last computed.
	#[serde(default)]
	pub bookmarked: bool,
	/// Publisher API key, present only on user-submitted recipes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
	pub quantity: Option<f64>,
	#[serde(default)]
	pub unit: String,
	#[serde(default)]
	pub description: String,
}

/// The reduced projection of a [`Recipe`] listed by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
	pub id: String,
	pub title: String,
	pub publisher: String,
	pub image: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub key: Option<String>,
}

#[derive(Deserialize)]
struct Envelope<T> {
	data: T,
}

#[derive(Deserialize)]
struct RecipeData {
	recipe: RawRecipe,
}

#[derive(Deserialize)]
struct SearchData {
	recipes: Vec<RawSearchResult>,
}

#[derive(Deserialize)]
struct RawRecipe {
	id: String,
	title: String,
	publisher: String,
	source_url: String,
	image_url: String,
	servings: u32,
	cooking_time: u32,
	#[serde(default)]
	ingredients: Vec<Ingredient>,
	#[serde(default)]
	key: Option<String>,
}

#[derive(Deserialize)]
struct RawSearchResult {
	id: String,
	title: String,
	publisher: String,
	image_url: String,
	#[serde(default)]
	key: Option<String>,
}

impl From<RawRecipe> for Recipe {
	fn from(raw: RawRecipe) -> Self {
		Self {
			id: raw.id,
			title: raw.title,
			publisher: raw.publisher,
			source_url: raw.source_url,
			image: raw.image_url,
			servings: raw.servings,
			cooking_time: raw.cooking_time,
			ingredients: raw.ingredients,
			bookmarked: false,
			key: raw.key.filter(|key| !key.is_empty()),
		}
	}
}

impl From<RawSearchResult> for SearchResultItem {
	fn from(raw: RawSearchResult) -> Self {
		Self {
			id: raw.id,
			title: raw.title,
			publisher: raw.publisher,
			image: raw.image_url,
			key: raw.key.filter(|key| !key.is_empty()),
		}
	}
}

impl Recipe {
	/// Normalizes a `{ "data": { "recipe": { … } } }` payload.
	///
	/// The result is not bookmarked; the store recomputes that flag.
	///
	/// # Errors
	///
	/// Iff the payload doesn't have that shape.
	pub fn from_payload(payload: serde_json::Value) -> Result<Self, FetchError> {
		let envelope: Envelope<RecipeData> = serde_json::from_value(payload)?;
		Ok(envelope.data.recipe.into())
	}

	/// Rescales every known quantity linearly relative to the current [`Recipe::servings`].
	///
	/// Does nothing if the current serving count is zero.
	pub fn rescale(&mut self, new_servings: u32) {
		if self.servings == 0 {
			return;
		}
		let (new, current) = (f64::from(new_servings), f64::from(self.servings));
		for quantity in self.ingredients.iter_mut().filter_map(|ingredient| ingredient.quantity.as_mut()) {
			*quantity = *quantity * new / current;
		}
		self.servings = new_servings;
	}
}

impl SearchResultItem {
	/// Normalizes a `{ "data": { "recipes": [ … ] } }` payload, preserving order.
	///
	/// # Errors
	///
	/// Iff the payload doesn't have that shape.
	pub fn list_from_payload(payload: serde_json::Value) -> Result<Vec<Self>, FetchError> {
		let envelope: Envelope<SearchData> = serde_json::from_value(payload)?;
		Ok(envelope.data.recipes.into_iter().map(Into::into).collect())
	}
}
