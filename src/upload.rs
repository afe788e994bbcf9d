//! Parsing of the user-authored recipe submission form.

use crate::{error::ValidationError, recipe::Ingredient};
use core::iter::FromIterator;
use serde::Serialize;

/// Submitted form entries in document order, like `Object.fromEntries(new FormData(form))`.
///
/// Recognized names are `title`, `sourceUrl`, `image`, `publisher`, `cookingTime`, `servings`
/// and any number of fields whose name starts with `ingredient`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeForm {
	entries: Vec<(String, String)>,
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RecipeForm {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self { entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
	}
}

impl RecipeForm {
	/// The value of the first entry named `name`, or `""`.
	#[must_use]
	pub fn get(&self, name: &str) -> &str {
		self.entries.iter().find(|(k, _)| k == name).map_or("", |(_, v)| v.as_str())
	}

	/// Parses every non-empty `ingredient…` entry, in order.
	///
	/// # Errors
	///
	/// Iff a non-empty entry isn't exactly three comma-separated fields, or has a non-numeric quantity.
	pub fn ingredients(&self) -> Result<Vec<Ingredient>, ValidationError> {
		self.entries
			.iter()
			.filter(|(name, line)| name.starts_with("ingredient") && !line.is_empty())
			.map(|(name, line)| parse_ingredient(name, line))
			.collect()
	}

	/// Assembles the creation payload.
	///
	/// # Errors
	///
	/// See [`RecipeForm::ingredients`]. Also fails iff `cookingTime` or `servings` is not a whole number.
	pub fn to_payload(&self) -> Result<NewRecipe, ValidationError> {
		Ok(NewRecipe {
			title: self.get("title").to_owned(),
			source_url: self.get("sourceUrl").to_owned(),
			image_url: self.get("image").to_owned(),
			publisher: self.get("publisher").to_owned(),
			cooking_time: self.number("cookingTime")?,
			servings: self.number("servings")?,
			ingredients: self.ingredients()?,
		})
	}

	fn number(&self, field: &str) -> Result<u32, ValidationError> {
		let value = self.get(field).trim();
		value.parse().map_err(|_| ValidationError::Number { field: field.to_owned(), value: value.to_owned() })
	}
}

/// The body POSTed to create a recipe, in the API's field naming.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRecipe {
	pub title: String,
	pub source_url: String,
	pub image_url: String,
	pub publisher: String,
	pub cooking_time: u32,
	pub servings: u32,
	pub ingredients: Vec<Ingredient>,
}

fn parse_ingredient(field: &str, line: &str) -> Result<Ingredient, ValidationError> {
	let parts: Vec<&str> = line.split(',').map(str::trim).collect();
	let (quantity, unit, description) = match parts[..] {
		[quantity, unit, description] => (quantity, unit, description),
		_ => {
			return Err(ValidationError::IngredientFormat { field: field.to_owned(), line: line.to_owned() });
		}
	};

	let quantity = if quantity.is_empty() {
		None
	} else {
		Some(quantity.parse::<f64>().map_err(|_| ValidationError::Quantity { field: field.to_owned(), quantity: quantity.to_owned() })?)
	};

	Ok(Ingredient { quantity, unit: unit.to_owned(), description: description.to_owned() })
}
