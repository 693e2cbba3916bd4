//! Attribute resolution.
//!
//! Every element keeps its raw `name -> value` map in a [`RawElement`]. During
//! the build pass a node sees its element through an [`AttributeView`], which
//! adds inheritance through the parent chain and id lookups through the
//! document's [`NameRegistry`].

pub mod font;
pub mod grammar;
pub mod paint;
pub mod parser;
pub mod transform;

use std::collections::HashMap;
use std::str::FromStr;

use glam::DAffine2;

use crate::log::warn;
use crate::nodes::{NodeId, Ref, RefTarget};
use crate::parser::NameRegistry;
use crate::types::Length;

pub use font::{FontSize, FontSpec, FontStyle, FontWeight, ResolvedFont};
pub use paint::{FillRule, LineCap, LineJoin, Paint, PaintContext};

/// Presentation attributes whose value falls back to the parent element
/// when absent.
const INHERITED: &[&str] = &[
    "clip-rule",
    "color",
    "direction",
    "dominant-baseline",
    "fill",
    "fill-opacity",
    "fill-rule",
    "font-family",
    "font-size",
    "font-stretch",
    "font-style",
    "font-weight",
    "letter-spacing",
    "marker-end",
    "marker-mid",
    "marker-start",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "text-anchor",
    "visibility",
    "word-spacing",
    "xml:space",
];

pub fn is_inheritable(name: &str) -> bool {
    INHERITED.binary_search(&name).is_ok()
}

/// One parsed start tag
#[derive(Clone, Debug, Default)]
pub struct RawElement {
    pub tag: String,
    pub attributes: HashMap<String, String>,
    /// Enclosing element at parse time
    pub parent: Option<NodeId>,
}

/// Read-only view of one element's attributes.
///
/// Only valid during (or after) the build pass: id resolution needs the
/// complete registry.
#[derive(Clone, Copy)]
pub struct AttributeView<'a> {
    node: NodeId,
    elements: &'a [RawElement],
    registry: &'a NameRegistry,
}

impl<'a> AttributeView<'a> {
    pub(crate) fn new(node: NodeId, elements: &'a [RawElement], registry: &'a NameRegistry) -> Self {
        AttributeView {
            node,
            elements,
            registry,
        }
    }

    fn element(&self) -> Option<&'a RawElement> {
        self.elements.get(self.node.index())
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn tag(&self) -> &'a str {
        self.element().map(|e| e.tag.as_str()).unwrap_or_default()
    }

    pub fn parent(&self) -> Option<AttributeView<'a>> {
        let parent = self.element()?.parent?;
        Some(AttributeView { node: parent, ..*self })
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The raw value declared on this element.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.element()?.attributes.get(name).map(String::as_str)
    }

    /// The raw value, falling back through the parent chain for inheritable
    /// properties or an explicit `inherit`.
    pub fn get_inherited(&self, name: &str) -> Option<&'a str> {
        let inheritable = is_inheritable(name);
        let mut view = Some(*self);
        while let Some(current) = view {
            match current.get(name) {
                Some(value) if value.trim() != "inherit" => return Some(value),
                Some(_) => {}
                None if !inheritable => return None,
                None => {}
            }
            view = current.parent();
        }
        None
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    pub fn length(&self, name: &str) -> Option<Length> {
        self.get(name).and_then(parser::parse_length)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(parser::parse_float)
    }

    pub fn percentage(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(parser::parse_percentage)
    }

    pub fn angle(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(parser::parse_angle)
    }

    pub fn enum_value<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(parser::parse_enum)
    }

    pub fn number_list(&self, name: &str) -> Vec<f64> {
        self.get(name).map(parser::parse_number_list).unwrap_or_default()
    }

    pub fn length_list(&self, name: &str) -> Vec<Length> {
        self.get(name).map(parser::parse_length_list).unwrap_or_default()
    }

    pub fn transform(&self, name: &str) -> Option<DAffine2> {
        self.get(name).and_then(transform::parse_transform)
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Look up `id` in the registry, checking the node kind against `T`.
    pub fn resolve_by_id<T: RefTarget>(&self, id: &str) -> Option<Ref<T>> {
        let Some((node, kind)) = self.registry.lookup(id) else {
            warn!(id, referrer = self.tag(), "reference to missing id");
            return None;
        };
        if !T::accepts(kind) {
            warn!(
                id,
                referrer = self.tag(),
                found = kind.tag_name(),
                "reference to element of wrong kind"
            );
            return None;
        }
        Some(Ref::new(node))
    }

    /// Resolve a `#id` fragment.
    pub fn resolve_fragment<T: RefTarget>(&self, value: &str) -> Option<Ref<T>> {
        let id = value.trim().strip_prefix('#')?;
        self.resolve_by_id(id)
    }

    /// The element's `href`, or the legacy `xlink:href`.
    pub fn href(&self) -> Option<&'a str> {
        self.get("href").or_else(|| self.get("xlink:href"))
    }

    pub fn resolve_href<T: RefTarget>(&self) -> Option<Ref<T>> {
        self.href().and_then(|value| self.resolve_fragment(value))
    }

    /// Resolve a `url(#id)` valued attribute such as `clip-path`.
    pub fn resolve_url<T: RefTarget>(&self, name: &str) -> Option<Ref<T>> {
        self.url_value(self.get(name)?)
    }

    /// Like [`Self::resolve_url`], for inheritable references (markers).
    pub fn resolve_url_inherited<T: RefTarget>(&self, name: &str) -> Option<Ref<T>> {
        self.url_value(self.get_inherited(name)?)
    }

    fn url_value<T: RefTarget>(&self, value: &str) -> Option<Ref<T>> {
        if value.trim() == "none" {
            return None;
        }
        self.resolve_by_id(parser::parse_url_reference(value)?)
    }
}
