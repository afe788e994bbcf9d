//! The durable single-key slot mirroring the bookmark sequence.

use crate::recipe::Recipe;
use std::cell::{Cell, RefCell};
use tracing::{error, info, warn};

/// One key in a durable local key-value store.
///
/// Writes replace the whole value. Failures are the implementation's to log, since the
/// in-memory bookmark sequence stays authoritative either way.
pub trait BookmarkSlot {
	fn read(&self) -> Option<String>;
	fn write(&self, value: &str);
}

/// Reads the persisted bookmark sequence. Missing or unreadable content yields an empty sequence.
#[must_use]
pub fn hydrate(slot: &impl BookmarkSlot) -> Vec<Recipe> {
	let stored = match slot.read() {
		Some(stored) if !stored.is_empty() => stored,
		_ => return Vec::new(),
	};
	match serde_json::from_str::<Vec<Recipe>>(&stored) {
		Ok(bookmarks) => {
			info!("Hydrated {} bookmark(s).", bookmarks.len());
			bookmarks
		}
		Err(error) => {
			warn!("Discarding unreadable persisted bookmarks: {}", error);
			Vec::new()
		}
	}
}

/// Serializes the entire sequence into `slot`.
pub fn persist(slot: &impl BookmarkSlot, bookmarks: &[Recipe]) {
	match serde_json::to_string(bookmarks) {
		Ok(serialized) => slot.write(&serialized),
		Err(error) => error!("Could not serialize bookmarks: {}", error),
	}
}

/// A [`BookmarkSlot`] that lives only as long as the process, counting its reads and writes.
#[derive(Debug, Default)]
pub struct MemorySlot {
	value: RefCell<Option<String>>,
	reads: Cell<usize>,
	writes: Cell<usize>,
}

impl MemorySlot {
	#[must_use]
	pub fn with_value(value: impl Into<String>) -> Self {
		Self { value: RefCell::new(Some(value.into())), ..Self::default() }
	}

	#[must_use]
	pub fn value(&self) -> Option<String> {
		self.value.borrow().clone()
	}

	#[must_use]
	pub fn reads(&self) -> usize {
		self.reads.get()
	}

	#[must_use]
	pub fn writes(&self) -> usize {
		self.writes.get()
	}
}

impl BookmarkSlot for MemorySlot {
	fn read(&self) -> Option<String> {
		self.reads.set(self.reads.get() + 1);
		self.value()
	}

	fn write(&self, value: &str) {
		*self.value.borrow_mut() = Some(value.to_owned());
		self.writes.set(self.writes.get() + 1);
	}
}

impl<S: BookmarkSlot + ?Sized> BookmarkSlot for &S {
	fn read(&self) -> Option<String> {
		(**self).read()
	}

	fn write(&self, value: &str) {
		(**self).write(value)
	}
}
