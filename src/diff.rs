//! The View Reconciler.
//!
//! [`compute_patches`] compares a rendered region with freshly generated markup element by element
//! in document order and yields text and attribute patches only. Nodes are never inserted or
//! removed, so focus, caret position and running transitions in the live region survive.
//!
//! # Shape precondition
//!
//! Both trees must contain the same elements in the same order. This is checked by element count;
//! a mismatch fails with [`ReconcileError::ShapeMismatch`] instead of patching misaligned nodes.

use crate::{error::ReconcileError, load::load_child_nodes};
use bumpalo::Bump;
use core::slice;
use hashbrown::HashMap;
use lignin::{Element, Node, ThreadBound};
use tracing::{debug, error, instrument, trace, warn};
use wasm_bindgen::{JsCast, JsValue};

/// One in-place change to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
	/// Child node indices from the container down to the element.
	pub path: Vec<u32>,
	/// Replacement text content, which replaces all of the element's children.
	pub text: Option<String>,
	/// Attributes to set. Attributes not listed here are left alone.
	pub attributes: Vec<(String, String)>,
}

/// Appends the DOM nodes `nodes` stand for, expanding fragments.
fn flatten<'a, 'b: 'a>(nodes: &'a [Node<'b, ThreadBound>], out: &mut Vec<&'a Node<'b, ThreadBound>>) {
	for node in nodes {
		match *node {
			Node::Multi(nodes) => flatten(nodes, out),
			Node::Keyed(fragments) => {
				for fragment in fragments {
					flatten(slice::from_ref(&fragment.content), out)
				}
			}
			Node::Memoized { content, .. } => flatten(slice::from_ref(content), out),
			Node::RemnantSite(_) => warn!("Ignoring remnant site."),
			_ => out.push(node),
		}
	}
}

fn dom_children<'a, 'b: 'a>(element: &'a Element<'b, ThreadBound>) -> Vec<&'a Node<'b, ThreadBound>> {
	let mut children = Vec::new();
	flatten(slice::from_ref(&element.content), &mut children);
	children
}

fn as_element<'a, 'b: 'a>(node: &'a Node<'b, ThreadBound>) -> Option<&'a Element<'b, ThreadBound>> {
	match *node {
		Node::HtmlElement { element, .. } | Node::MathMlElement { element, .. } | Node::SvgElement { element, .. } => Some(element),
		_ => None,
	}
}

/// Deep structural equality, like the DOM's [***isEqualNode***](https://developer.mozilla.org/en-US/docs/Web/API/Node/isEqualNode).
///
/// Attribute order is irrelevant.
#[must_use]
pub fn is_equal_node(a: &Node<'_, ThreadBound>, b: &Node<'_, ThreadBound>) -> bool {
	match (a, b) {
		(Node::Text { text: t_1, .. }, Node::Text { text: t_2, .. }) => t_1 == t_2,
		(Node::Comment { comment: c_1, .. }, Node::Comment { comment: c_2, .. }) => c_1 == c_2,
		(Node::HtmlElement { element: e_1, .. }, Node::HtmlElement { element: e_2, .. })
		| (Node::MathMlElement { element: e_1, .. }, Node::MathMlElement { element: e_2, .. })
		| (Node::SvgElement { element: e_1, .. }, Node::SvgElement { element: e_2, .. }) => is_equal_element(e_1, e_2),
		_ => false,
	}
}

#[must_use]
pub fn is_equal_element(e_1: &Element<'_, ThreadBound>, e_2: &Element<'_, ThreadBound>) -> bool {
	if e_1.name != e_2.name || e_1.attributes.len() != e_2.attributes.len() {
		return false;
	}

	let attributes: HashMap<&str, &str> = e_2.attributes.iter().map(|attribute| (attribute.name, attribute.value)).collect();
	if !e_1.attributes.iter().all(|attribute| attributes.get(attribute.name) == Some(&attribute.value)) {
		return false;
	}

	let (c_1, c_2) = (dom_children(e_1), dom_children(e_2));
	c_1.len() == c_2.len() && c_1.iter().zip(c_2.iter()).all(|(a, b)| is_equal_node(a, b))
}

/// Concatenated descendant text, like [***textContent***](https://developer.mozilla.org/en-US/docs/Web/API/Node/textContent).
#[must_use]
pub fn text_content(element: &Element<'_, ThreadBound>) -> String {
	fn collect(node: &Node<'_, ThreadBound>, out: &mut String) {
		match node {
			Node::Text { text, .. } => out.push_str(text),
			_ => {
				if let Some(element) = as_element(node) {
					for child in dom_children(element) {
						collect(child, out)
					}
				}
			}
		}
	}

	let mut out = String::new();
	for child in dom_children(element) {
		collect(child, &mut out)
	}
	out
}

/// Whether `element` starts with text that isn't only whitespace.
fn has_leading_text(element: &Element<'_, ThreadBound>) -> bool {
	matches!(dom_children(element).first(), Some(Node::Text { text, .. }) if !text.trim().is_empty())
}

/// All elements below `nodes` in document order, with their child index paths.
#[must_use]
pub fn elements<'a, 'b: 'a>(nodes: &'a [Node<'b, ThreadBound>]) -> Vec<(Vec<u32>, &'a Element<'b, ThreadBound>)> {
	fn walk<'a, 'b: 'a>(nodes: Vec<&'a Node<'b, ThreadBound>>, path: &mut Vec<u32>, out: &mut Vec<(Vec<u32>, &'a Element<'b, ThreadBound>)>) {
		for (i, node) in (0_u32..).zip(nodes) {
			if let Some(element) = as_element(node) {
				path.push(i);
				out.push((path.clone(), element));
				walk(dom_children(element), path, out);
				path.pop();
			}
		}
	}

	let mut flat = Vec::new();
	flatten(nodes, &mut flat);
	let mut out = Vec::new();
	walk(flat, &mut Vec::new(), &mut out);
	out
}

/// Pairs the elements of `current` and `next` in document order and computes the patches that
/// make `current` show what `next` shows.
///
/// For each unequal pair, all of `next`'s attributes are copied, and its text content replaces the
/// current text iff `next` begins with non-blank text.
///
/// # Errors
///
/// Iff the element counts differ. See [the module documentation](self#shape-precondition).
#[instrument(skip(current, next))]
pub fn compute_patches(current: &[Node<'_, ThreadBound>], next: &[Node<'_, ThreadBound>]) -> Result<Vec<Patch>, ReconcileError> {
	let (current, next) = (elements(current), elements(next));
	if current.len() != next.len() {
		error!("Refusing to update {} rendered element(s) from {} new one(s).", current.len(), next.len());
		return Err(ReconcileError::ShapeMismatch { current: current.len(), next: next.len() });
	}

	let mut patches = Vec::new();
	for ((path, e_1), (_, e_2)) in current.into_iter().zip(next) {
		if e_1.name != e_2.name {
			warn!("Patching <{}> from <{}>; The region's shape has likely changed.", e_1.name, e_2.name);
		}
		if is_equal_element(e_1, e_2) {
			continue;
		}

		let text = if has_leading_text(e_2) { Some(text_content(e_2)) } else { None };
		let attributes: Vec<(String, String)> = e_2.attributes.iter().map(|attribute| (attribute.name.to_owned(), attribute.value.to_owned())).collect();
		if text.is_none() && attributes.is_empty() {
			continue;
		}
		if cfg!(feature = "log-paths") {
			trace!(?path, text = text.is_some(), attributes = attributes.len(), "Patch");
		}
		patches.push(Patch { path, text, attributes });
	}
	debug!("Computed {} patch(es).", patches.len());
	Ok(patches)
}

fn dom_error(value: &JsValue) -> ReconcileError {
	ReconcileError::Dom(format!("{:?}", value))
}

/// Attached to a specific [`web_sys::Element`], this `struct` replaces or patches its [***childNodes***](https://developer.mozilla.org/en-US/docs/Web/API/Node/childNodes).
///
/// The element itself is never replaced.
#[derive(Debug, Clone)]
pub struct DomReconciler {
	element: web_sys::Element,
}

impl DomReconciler {
	#[must_use]
	pub fn new_for_element_child_nodes(element: web_sys::Element) -> Self {
		Self { element }
	}

	#[must_use]
	pub fn element(&self) -> &web_sys::Element {
		&self.element
	}

	/// Discards all children and inserts `markup` as-is.
	#[instrument(skip(self, markup))]
	pub fn replace_child_nodes(&self, markup: &str) {
		self.element.set_inner_html("");
		if let Err(error) = self.element.insert_adjacent_html("afterbegin", markup) {
			error!("Failed to insert markup: {:?}", error);
		}
	}

	/// Patches the current children in place to match `markup`.
	///
	/// Returns the number of patches applied.
	///
	/// # Errors
	///
	/// Iff `markup` can't be parsed or its shape differs from the rendered region's.
	#[instrument(skip(self, markup))]
	pub fn update_child_nodes(&self, markup: &str) -> Result<usize, ReconcileError> {
		let document = self.element.owner_document().ok_or_else(|| ReconcileError::Dom("No owner document found for root element.".to_owned()))?;
		let fragment = document.create_range().and_then(|range| range.create_contextual_fragment(markup)).map_err(|error| dom_error(&error))?;

		let bump = Bump::new();
		let current = load_child_nodes(&self.element.child_nodes(), &&bump);
		let next = load_child_nodes(&fragment.child_nodes(), &&bump);
		let patches = compute_patches(current, next)?;
		Ok(apply_patches(&self.element, &patches))
	}
}

/// Applies `patches` below `container`, skipping (and logging) any whose path doesn't resolve to an element.
///
/// Returns the number of patches applied.
pub fn apply_patches(container: &web_sys::Element, patches: &[Patch]) -> usize {
	let mut applied = 0;
	'patches: for patch in patches {
		let mut node: web_sys::Node = container.clone().into();
		for &i in &patch.path {
			node = match node.child_nodes().item(i) {
				Some(child) => child,
				None => {
					// Expected below elements whose text content was replaced earlier.
					debug!("Skipping patch at detached path {:?}.", patch.path);
					continue 'patches;
				}
			};
		}

		let element = match node.dyn_ref::<web_sys::Element>() {
			Some(element) => element,
			None => {
				warn!("Expected to patch `web_sys::Element` but found {:?}; Skipping.", node);
				continue;
			}
		};

		if let Some(text) = &patch.text {
			if cfg!(feature = "dangerous-logging") {
				trace!("Setting text of <{}> to {:?}.", element.tag_name(), text);
			}
			element.set_text_content(Some(text.as_str()));
		}
		for (name, value) in &patch.attributes {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Could not set attribute {:?} on <{}>: {:?}", name, element.tag_name(), error);
			}
		}
		applied += 1;
	}
	applied
}
