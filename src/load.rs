//! Construction of [`lignin`] trees from live DOM nodes, so that rendered regions and freshly
//! parsed markup can be compared as plain data.

use bumpalo::Bump;
use lignin::{Attribute, Element as lElement, ElementCreationOptions, Node, ThreadBound};
use tracing::{error, warn};
use wasm_bindgen::JsCast;
use web_sys::{Attr, Comment, Element, NamedNodeMap, Node as wNode, NodeList, SvgElement, Text};

const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Backing storage for loaded trees, which borrow from it for `'a`.
pub trait Allocator<'a> {
	fn allocate<T>(&self, instance: T) -> &'a T;
	fn allocate_slice<T>(&self, iter: &mut dyn ExactSizeIterator<Item = T>) -> &'a [T];
	fn allocate_str(&self, str: &str) -> &'a str;
}

impl<'a> Allocator<'a> for &'a Bump {
	fn allocate<T>(&self, instance: T) -> &'a T {
		let bump: &'a Bump = self;
		bump.alloc(instance)
	}

	fn allocate_slice<T>(&self, iter: &mut dyn ExactSizeIterator<Item = T>) -> &'a [T] {
		let bump: &'a Bump = self;
		bump.alloc_slice_fill_iter(iter)
	}

	fn allocate_str(&self, str: &str) -> &'a str {
		let bump: &'a Bump = self;
		bump.alloc_str(str)
	}
}

pub fn load_child_nodes<'a>(child_nodes: &NodeList, allocator: &impl Allocator<'a>) -> &'a [Node<'a, ThreadBound>] {
	allocator.allocate_slice(&mut (0..child_nodes.length()).map(|i| match child_nodes.item(i) {
		Some(child) => load_node(&child, allocator),
		None => {
			error!("Child node {} vanished while loading.", i);
			Node::Multi(&[])
		}
	}))
}

/// Loads an element, text or comment. Other node kinds load as empty fragments.
pub fn load_node<'a>(node: &wNode, allocator: &impl Allocator<'a>) -> Node<'a, ThreadBound> {
	if let Some(svg_element) = node.dyn_ref::<SvgElement>() {
		Node::SvgElement { element: allocator.allocate(load_element(svg_element, allocator)), dom_binding: None }
	} else if let Some(element) = node.dyn_ref::<Element>() {
		let element_ref = allocator.allocate(load_element(element, allocator));
		if element.namespace_uri().as_deref() == Some(MATHML_NAMESPACE) {
			Node::MathMlElement { element: element_ref, dom_binding: None }
		} else {
			Node::HtmlElement { element: element_ref, dom_binding: None }
		}
	} else if let Some(text) = node.dyn_ref::<Text>() {
		Node::Text { text: allocator.allocate_str(&text.data()), dom_binding: None }
	} else if let Some(comment) = node.dyn_ref::<Comment>() {
		Node::Comment { comment: allocator.allocate_str(&comment.data()), dom_binding: None }
	} else {
		warn!("Unrecognised child node type {}; Treating it as empty.", node.node_type());
		Node::Multi(&[])
	}
}

pub fn load_element<'a>(element: &Element, allocator: &impl Allocator<'a>) -> lElement<'a, ThreadBound> {
	let node: &wNode = element.as_ref();
	lElement {
		name: allocator.allocate_str(&element.tag_name()),
		creation_options: ElementCreationOptions::new(),
		attributes: load_attributes(&element.attributes(), allocator),
		content: Node::Multi(load_child_nodes(&node.child_nodes(), allocator)),
		event_bindings: &[],
	}
}

pub fn load_attributes<'a>(attributes: &NamedNodeMap, allocator: &impl Allocator<'a>) -> &'a [Attribute<'a>] {
	let loaded: Vec<Attribute<'a>> = (0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| load_attribute(&attribute, allocator)).collect();
	allocator.allocate_slice(&mut loaded.into_iter())
}

pub fn load_attribute<'a>(attribute: &Attr, allocator: &impl Allocator<'a>) -> Attribute<'a> {
	Attribute {
		name: allocator.allocate_str(&attribute.name()),
		value: allocator.allocate_str(&attribute.value()),
	}
}
