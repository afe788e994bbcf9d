//! The Application State Store.
//!
//! A [`Store`] owns the single mutable [`ApplicationState`]. All of its operations take `&self`:
//! state lives in a [`RefCell`] that is only borrowed between `.await` points, so two loads of
//! the same kind may overlap and whichever response arrives last wins.
//! The store is deliberately `!Sync` and meant to be shared through an `Rc` by event handlers.

use crate::{
	bookmarks::{self, BookmarkSlot},
	client::{RemoteClient, Transport},
	config::Config,
	error::{Error, FetchError},
	recipe::{Recipe, SearchResultItem},
	upload::RecipeForm,
};
use core::num::NonZeroUsize;
use std::cell::{Ref, RefCell};
use tracing::{debug, info, instrument, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationState {
	/// The currently displayed recipe; [`None`] before the first load.
	pub recipe: Option<Recipe>,
	pub search: SearchState,
	/// Bookmarks in insertion order. Ids are not de-duplicated.
	pub bookmarks: Vec<Recipe>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
	pub query: String,
	pub results: Vec<SearchResultItem>,
	pub results_per_page: NonZeroUsize,
	/// 1-based index of the current page.
	pub page: usize,
}

/// The buttons of the pagination control for the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNavigation {
	pub previous: Option<usize>,
	pub current: usize,
	pub next: Option<usize>,
}

impl SearchState {
	#[must_use]
	pub fn new(results_per_page: NonZeroUsize) -> Self {
		Self { query: String::new(), results: Vec::new(), results_per_page, page: 1 }
	}

	#[must_use]
	pub fn page_count(&self) -> usize {
		(self.results.len() + self.results_per_page.get() - 1) / self.results_per_page.get()
	}

	/// The items on `page`, which is empty beyond the last page.
	#[must_use]
	pub fn page_slice(&self, page: usize) -> &[SearchResultItem] {
		let start = page.saturating_sub(1).saturating_mul(self.results_per_page.get());
		let end = page.saturating_mul(self.results_per_page.get()).min(self.results.len());
		self.results.get(start..end).unwrap_or(&[])
	}

	#[must_use]
	pub fn navigation(&self) -> PageNavigation {
		let (current, count) = (self.page, self.page_count());
		let previous = if current > 1 && current <= count && count > 1 { Some(current - 1) } else { None };
		let next = if current < count { Some(current + 1) } else { None };
		PageNavigation { previous, current, next }
	}
}

impl ApplicationState {
	#[must_use]
	pub fn new(results_per_page: NonZeroUsize, bookmarks: Vec<Recipe>) -> Self {
		Self { recipe: None, search: SearchState::new(results_per_page), bookmarks }
	}

	fn is_bookmarked(&self, id: &str) -> bool {
		self.bookmarks.iter().any(|bookmark| bookmark.id == id)
	}
}

#[derive(Debug)]
pub struct Store<T, S> {
	state: RefCell<ApplicationState>,
	client: RemoteClient<T>,
	slot: S,
	config: Config,
}

impl<T: Transport, S: BookmarkSlot> Store<T, S> {
	/// Creates the store, hydrating bookmarks from `slot`.
	///
	/// This is the only time `slot` is read.
	#[must_use]
	pub fn new(config: Config, transport: T, slot: S) -> Self {
		let bookmarks = bookmarks::hydrate(&slot);
		Self {
			state: RefCell::new(ApplicationState::new(config.results_per_page, bookmarks)),
			client: RemoteClient::new(transport, config.timeout()),
			slot,
			config,
		}
	}

	/// # Panics
	///
	/// Iff borrowed while a synchronous mutation is in progress, which can't happen between operations.
	#[must_use]
	pub fn state(&self) -> Ref<'_, ApplicationState> {
		self.state.borrow()
	}

	#[must_use]
	pub fn config(&self) -> &Config {
		&self.config
	}

	#[must_use]
	pub fn client(&self) -> &RemoteClient<T> {
		&self.client
	}

	#[must_use]
	pub fn slot(&self) -> &S {
		&self.slot
	}

	/// The API URL, extended by `id` as one percent-encoded path segment, with `query` and the key appended.
	fn url(&self, id: Option<&str>, query: &[(&str, &str)]) -> Result<Url, FetchError> {
		let mut url = Url::parse(&self.config.api_url)?;
		if let Some(id) = id {
			let invalid = || FetchError::RecipeId { id: id.to_owned() };
			// Dot segments would be resolved against the API path.
			if matches!(id, "" | "." | "..") {
				return Err(invalid());
			}
			url.path_segments_mut().map_err(|()| invalid())?.pop_if_empty().push(id);
		}
		url.query_pairs_mut().extend_pairs(query).append_pair("key", &self.config.api_key);
		Ok(url)
	}

	/// Fetches and normalizes recipe `id` into [`ApplicationState::recipe`].
	///
	/// # Errors
	///
	/// Iff the request fails, in which case the current recipe is left unchanged.
	#[instrument(skip(self))]
	pub async fn load_recipe(&self, id: &str) -> Result<(), FetchError> {
		let url = self.url(Some(id), &[]).map_err(|error| {
			warn!("Could not address recipe: {}", error);
			error
		})?;
		let mut recipe = self.client.request(url.as_str(), None).await.and_then(Recipe::from_payload).map_err(|error| {
			warn!("Could not load recipe: {}", error);
			error
		})?;

		let mut state = self.state.borrow_mut();
		recipe.bookmarked = state.is_bookmarked(&recipe.id);
		info!(bookmarked = recipe.bookmarked, "Loaded recipe.");
		state.recipe = Some(recipe);
		Ok(())
	}

	/// Records `query`, then fetches its results and resets to the first page.
	///
	/// # Errors
	///
	/// Iff the request fails, in which case the previous results (but not the query) are kept.
	#[instrument(skip(self))]
	pub async fn load_search_results(&self, query: &str) -> Result<(), FetchError> {
		query.clone_into(&mut self.state.borrow_mut().search.query);

		let url = self.url(None, &[("search", query)])?;
		let results = self.client.request(url.as_str(), None).await.and_then(SearchResultItem::list_from_payload).map_err(|error| {
			warn!("Could not load search results: {}", error);
			error
		})?;

		let mut state = self.state.borrow_mut();
		info!("Found {} result(s).", results.len());
		state.search.results = results;
		state.search.page = 1;
		Ok(())
	}

	/// Navigates to `page` (by default the current one) and returns its items.
	///
	/// Pages beyond the last are stored as-is and yield no items.
	#[instrument(skip(self))]
	pub fn get_results_page(&self, page: Option<usize>) -> Vec<SearchResultItem> {
		let mut state = self.state.borrow_mut();
		let page = page.unwrap_or(state.search.page);
		state.search.page = page;
		state.search.page_slice(page).to_vec()
	}

	/// Rescales the current recipe's quantities relative to its current serving count.
	#[instrument(skip(self))]
	///
	/// Zero servings are rejected, leaving the recipe unchanged.
	pub fn rescale_servings(&self, new_servings: u32) {
		let mut state = self.state.borrow_mut();
		match state.recipe.as_mut() {
			_ if new_servings == 0 => warn!("Cannot rescale to zero servings."),
			Some(recipe) if recipe.servings == 0 => warn!("Cannot rescale a recipe with zero servings."),
			Some(recipe) => recipe.rescale(new_servings),
			None => warn!("No recipe to rescale."),
		}
	}

	/// Appends `recipe` to the bookmarks without checking for duplicates, then persists them.
	#[instrument(skip(self, recipe), fields(id = %recipe.id))]
	pub fn add_bookmark(&self, mut recipe: Recipe) {
		let mut state = self.state.borrow_mut();
		if let Some(current) = state.recipe.as_mut().filter(|current| current.id == recipe.id) {
			current.bookmarked = true;
			recipe.bookmarked = true;
		}
		state.bookmarks.push(recipe);
		bookmarks::persist(&self.slot, &state.bookmarks);
		debug!("{} bookmark(s).", state.bookmarks.len());
	}

	/// Removes the first bookmark with `id`, then persists the bookmarks even if none matched.
	#[instrument(skip(self))]
	pub fn remove_bookmark(&self, id: &str) {
		let mut state = self.state.borrow_mut();
		match state.bookmarks.iter().position(|bookmark| bookmark.id == id) {
			Some(index) => drop(state.bookmarks.remove(index)),
			None => debug!("No bookmark to remove."),
		}
		if let Some(current) = state.recipe.as_mut().filter(|current| current.id == id) {
			current.bookmarked = false;
		}
		bookmarks::persist(&self.slot, &state.bookmarks);
	}

	/// Validates and submits `form`; the created recipe becomes the current one.
	///
	/// # Errors
	///
	/// - [`Error::Validation`] before anything is sent,
	/// - [`Error::Fetch`] if the request fails, in which case the current recipe is left unchanged.
	#[instrument(skip(self, form))]
	pub async fn upload_recipe(&self, form: &RecipeForm) -> Result<(), Error> {
		let payload = form.to_payload().map_err(|error| {
			warn!("Rejected recipe submission: {}", error);
			error
		})?;
		let body = serde_json::to_value(&payload).map_err(FetchError::from)?;

		let url = self.url(None, &[])?;
		let mut recipe = self.client.request(url.as_str(), Some(&body)).await.and_then(Recipe::from_payload).map_err(|error| {
			warn!("Could not upload recipe: {}", error);
			error
		})?;

		let mut state = self.state.borrow_mut();
		recipe.bookmarked = state.is_bookmarked(&recipe.id);
		info!(id = %recipe.id, "Uploaded recipe.");
		state.recipe = Some(recipe);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{bookmarks::MemorySlot, client::mock::MockTransport, recipe::Ingredient};
	use futures::{
		executor::{block_on, LocalPool},
		future,
	};
	use serde_json::{json, Value};

	fn recipe_payload(id: &str, servings: u32, quantity: f64) -> Value {
		json!({ "status": "success", "data": { "recipe": {
			"id": id,
			"title": format!("Recipe {}", id),
			"publisher": "Test Kitchen",
			"source_url": "https://example.com/source",
			"image_url": "https://example.com/image.jpg",
			"servings": servings,
			"cooking_time": 20,
			"ingredients": [
				{ "quantity": quantity, "unit": "kg", "description": "potatoes" },
				{ "quantity": null, "unit": "", "description": "salt" }
			]
		} } })
	}

	fn search_payload(count: usize) -> Value {
		let recipes: Vec<Value> = (0..count)
			.map(|i| json!({ "id": format!("r{}", i), "title": format!("Pasta {}", i), "publisher": "P", "image_url": "i" }))
			.collect();
		json!({ "status": "success", "results": count, "data": { "recipes": recipes } })
	}

	fn store(slot: &MemorySlot) -> Store<MockTransport, &MemorySlot> {
		let config = Config { api_key: "test-key".to_owned(), ..Config::default() };
		Store::new(config, MockTransport::default(), slot)
	}

	#[test]
	fn load_recipe_normalizes_and_flags_bookmark() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		store.client().transport().respond(200, &recipe_payload("abc", 4, 2.0));
		block_on(store.load_recipe("abc")).unwrap();
		assert!(!store.state().recipe.as_ref().unwrap().bookmarked);

		let loaded = store.state().recipe.clone().unwrap();
		store.add_bookmark(loaded);
		store.client().transport().respond(200, &recipe_payload("abc", 4, 2.0));
		block_on(store.load_recipe("abc")).unwrap();

		let state = store.state();
		let recipe = state.recipe.as_ref().unwrap();
		assert!(recipe.bookmarked);
		assert_eq!(recipe.title, "Recipe abc");
		assert_eq!(recipe.ingredients[0], Ingredient { quantity: Some(2.0), unit: "kg".to_owned(), description: "potatoes".to_owned() });

		let sent = store.client().transport().sent.borrow();
		assert_eq!(sent[0].url, "https://forkify-api.herokuapp.com/api/v2/recipes/abc?key=test-key");
	}

	#[test]
	fn recipe_id_stays_one_path_segment() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		let ids = ["//evil.example/x", "https://evil.example/", "../../v1", "abc?x=1", "a#b"];
		for id in &ids {
			store.client().transport().respond(200, &recipe_payload("abc", 4, 2.0));
			block_on(store.load_recipe(id)).unwrap();
		}

		let sent = store.client().transport().sent.borrow();
		assert_eq!(sent.len(), ids.len());
		for request in sent.iter() {
			let url = Url::parse(&request.url).unwrap();
			assert_eq!(url.host_str(), Some("forkify-api.herokuapp.com"));
			assert_eq!(url.query(), Some("key=test-key"));
			assert_eq!(url.fragment(), None);
			let segments: Vec<&str> = url.path_segments().unwrap().collect();
			assert_eq!(segments.len(), 4, "{}", url);
			assert_eq!(segments[..3], ["api", "v2", "recipes"]);
		}
		assert_eq!(sent[0].url, "https://forkify-api.herokuapp.com/api/v2/recipes/%2F%2Fevil.example%2Fx?key=test-key");
		assert_eq!(sent[4].url, "https://forkify-api.herokuapp.com/api/v2/recipes/a%23b?key=test-key");
	}

	#[test]
	fn dot_segment_ids_are_not_sent() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		for id in &["", ".", ".."] {
			assert!(matches!(block_on(store.load_recipe(id)), Err(FetchError::RecipeId { .. })));
		}
		assert!(store.client().transport().sent.borrow().is_empty());
	}

	#[test]
	fn failed_load_keeps_current_recipe() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		store.client().transport().respond(200, &recipe_payload("abc", 4, 2.0));
		block_on(store.load_recipe("abc")).unwrap();

		store.client().transport().respond(400, &json!({ "status": "fail", "message": "Invalid _id: xyz" }));
		let error = block_on(store.load_recipe("xyz")).unwrap_err();
		assert_eq!(error.to_string(), "Invalid _id: xyz (400)");
		assert_eq!(store.state().recipe.as_ref().unwrap().id, "abc");
	}

	#[test]
	fn search_resets_page_and_paginates_without_clamping() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		store.client().transport().respond(200, &search_payload(25));

		store.get_results_page(Some(3));
		block_on(store.load_search_results("pasta")).unwrap();
		assert_eq!(store.state().search.page, 1);
		assert_eq!(store.state().search.query, "pasta");
		assert_eq!(store.client().transport().sent.borrow()[0].url, "https://forkify-api.herokuapp.com/api/v2/recipes/?search=pasta&key=test-key");

		let first = store.get_results_page(None);
		assert_eq!(first.iter().map(|item| item.id.as_str()).collect::<Vec<_>>(), (0..10).map(|i| format!("r{}", i)).collect::<Vec<_>>());

		let third = store.get_results_page(Some(3));
		assert_eq!(third.len(), 5);
		assert_eq!(third[0].id, "r20");
		assert_eq!(store.state().search.page, 3);

		assert!(store.get_results_page(Some(4)).is_empty());
		assert_eq!(store.state().search.page, 4);
	}

	#[test]
	fn failed_search_keeps_results() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		store.client().transport().respond(200, &search_payload(3));
		block_on(store.load_search_results("pasta")).unwrap();

		store.client().transport().fail(FetchError::Network("offline".to_owned()));
		assert!(block_on(store.load_search_results("pizza")).is_err());
		assert_eq!(store.state().search.results.len(), 3);
		assert_eq!(store.state().search.query, "pizza");
	}

	#[test]
	fn navigation_matches_pagination_buttons() {
		let mut search = SearchState::new(NonZeroUsize::new(10).unwrap());
		search.results = SearchResultItem::list_from_payload(search_payload(25)).unwrap();

		assert_eq!(search.page_count(), 3);
		assert_eq!(search.navigation(), PageNavigation { previous: None, current: 1, next: Some(2) });
		search.page = 2;
		assert_eq!(search.navigation(), PageNavigation { previous: Some(1), current: 2, next: Some(3) });
		search.page = 3;
		assert_eq!(search.navigation(), PageNavigation { previous: Some(2), current: 3, next: None });

		search.results.truncate(4);
		search.page = 1;
		assert_eq!(search.navigation(), PageNavigation { previous: None, current: 1, next: None });
	}

	#[test]
	fn rescaling_compounds_on_the_previous_state() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		store.client().transport().respond(200, &recipe_payload("abc", 4, 2.0));
		block_on(store.load_recipe("abc")).unwrap();

		store.rescale_servings(8);
		{
			let state = store.state();
			let recipe = state.recipe.as_ref().unwrap();
			assert_eq!(recipe.servings, 8);
			assert_eq!(recipe.ingredients[0].quantity, Some(4.0));
			assert_eq!(recipe.ingredients[1].quantity, None);
		}

		store.rescale_servings(2);
		assert_eq!(store.state().recipe.as_ref().unwrap().ingredients[0].quantity, Some(1.0));
	}

	#[test]
	fn rescaling_to_zero_is_ignored() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		store.client().transport().respond(200, &recipe_payload("abc", 4, 2.0));
		block_on(store.load_recipe("abc")).unwrap();

		store.rescale_servings(0);
		store.rescale_servings(8);

		let state = store.state();
		let recipe = state.recipe.as_ref().unwrap();
		assert_eq!(recipe.servings, 8);
		assert_eq!(recipe.ingredients[0].quantity, Some(4.0));
	}

	#[test]
	fn bookmarks_round_trip_through_slot() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		for id in &["a", "b", "c"] {
			store.client().transport().respond(200, &recipe_payload(id, 2, 1.0));
			block_on(store.load_recipe(id)).unwrap();
			let loaded = store.state().recipe.clone().unwrap();
			store.add_bookmark(loaded);
		}
		let duplicate = store.state().bookmarks[0].clone();
		store.add_bookmark(duplicate);
		store.remove_bookmark("b");
		assert!(store.state().recipe.as_ref().unwrap().bookmarked);
		store.remove_bookmark("c");
		assert!(!store.state().recipe.as_ref().unwrap().bookmarked);

		let reloaded = self::store(&slot);
		assert_eq!(reloaded.state().bookmarks, store.state().bookmarks);
		assert_eq!(reloaded.state().bookmarks.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(), ["a", "a"]);
	}

	#[test]
	fn removing_unknown_bookmark_still_writes() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		store.client().transport().respond(200, &recipe_payload("a", 2, 1.0));
		block_on(store.load_recipe("a")).unwrap();
		let loaded = store.state().recipe.clone().unwrap();
		store.add_bookmark(loaded);
		let before = store.state().bookmarks.clone();
		let writes = slot.writes();

		store.remove_bookmark("missing");

		assert_eq!(store.state().bookmarks, before);
		assert_eq!(slot.writes(), writes + 1);
	}

	#[test]
	fn slot_is_read_once_then_only_written() {
		let slot = MemorySlot::with_value("[]");
		let store = store(&slot);
		assert_eq!(slot.reads(), 1);

		store.client().transport().respond(200, &recipe_payload("a", 2, 1.0));
		block_on(store.load_recipe("a")).unwrap();
		let loaded = store.state().recipe.clone().unwrap();
		store.add_bookmark(loaded);
		store.client().transport().respond(200, &recipe_payload("b", 2, 1.0));
		block_on(store.load_recipe("b")).unwrap();
		store.remove_bookmark("a");
		store.remove_bookmark("missing");

		assert_eq!(slot.reads(), 1);
		assert_eq!(slot.writes(), 3);
	}

	#[test]
	fn upload_replaces_current_recipe() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		store.client().transport().respond(200, &recipe_payload("old", 2, 1.0));
		block_on(store.load_recipe("old")).unwrap();

		let mut created = recipe_payload("new-id", 4, 1.0);
		created["data"]["recipe"]["key"] = json!("test-key");
		store.client().transport().respond(201, &created);

		let form: RecipeForm = vec![
			("title", "Test"),
			("sourceUrl", "https://example.com"),
			("image", "https://example.com/i.jpg"),
			("publisher", "Me"),
			("cookingTime", "10"),
			("servings", "4"),
			("ingredient-1", "1,kg,chicken breast"),
			("ingredient-2", ""),
		]
		.into_iter()
		.collect();
		block_on(store.upload_recipe(&form)).unwrap();

		let state = store.state();
		let recipe = state.recipe.as_ref().unwrap();
		assert_eq!(recipe.id, "new-id");
		assert_eq!(recipe.key.as_deref(), Some("test-key"));

		let sent = store.client().transport().sent.borrow();
		let body: Value = serde_json::from_str(sent[1].body.as_deref().unwrap()).unwrap();
		assert_eq!(body["ingredients"].as_array().unwrap().len(), 1);
		assert_eq!(sent[1].url, "https://forkify-api.herokuapp.com/api/v2/recipes/?key=test-key");
	}

	#[test]
	fn invalid_upload_sends_nothing() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		let form: RecipeForm = vec![("cookingTime", "10"), ("servings", "4"), ("ingredient-1", "kg,chicken")].into_iter().collect();

		assert!(matches!(block_on(store.upload_recipe(&form)), Err(Error::Validation(_))));
		assert!(store.client().transport().sent.borrow().is_empty());
		assert!(store.state().recipe.is_none());
	}

	#[test]
	fn overlapping_loads_keep_last_response() {
		let slot = MemorySlot::default();
		let store = store(&slot);
		store.client().transport().respond(200, &recipe_payload("first", 2, 1.0));
		store.client().transport().respond(200, &recipe_payload("second", 2, 1.0));

		let (first, second) = LocalPool::new().run_until(future::join(store.load_recipe("first"), store.load_recipe("second")));
		first.unwrap();
		second.unwrap();

		assert_eq!(store.state().recipe.as_ref().unwrap().id, "second");
	}
}
