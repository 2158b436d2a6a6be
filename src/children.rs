//! Children of canvas-aware components.
//!
//! A container receives its children as an arbitrary mix of components,
//! nested fragments and primitive content. Before rendering them it tags
//! every component with its own node id so they attach beneath it.
//! Primitives have nothing to paint on a canvas and are dropped.

use crate::tree::NodeId;

/// A component that can be told which canvas node to attach under.
pub trait AcceptsParent {
    fn set_canvas_parent(&mut self, parent: NodeId);
}

/// One slot in a children list.
#[derive(Debug, Clone, PartialEq)]
pub enum Child<E> {
    Element(E),
    Fragment(Vec<Child<E>>),
    Text(String),
    Number(f64),
    Empty,
}

impl<E> Child<E> {
    /// Elements in document order, fragments flattened.
    pub fn elements(&self) -> Vec<&E> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a E>) {
        match self {
            Child::Element(element) => out.push(element),
            Child::Fragment(children) => {
                for child in children {
                    child.collect_into(out);
                }
            }
            Child::Text(_) | Child::Number(_) | Child::Empty => {}
        }
    }

    /// Owned elements in document order, fragments flattened.
    pub fn into_elements(self) -> Vec<E> {
        let mut out = Vec::new();
        self.drain_into(&mut out);
        out
    }

    fn drain_into(self, out: &mut Vec<E>) {
        match self {
            Child::Element(element) => out.push(element),
            Child::Fragment(children) => {
                for child in children {
                    child.drain_into(out);
                }
            }
            Child::Text(_) | Child::Number(_) | Child::Empty => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }
}

impl<E> Default for Child<E> {
    fn default() -> Self {
        Child::Empty
    }
}

impl<E> From<Vec<Child<E>>> for Child<E> {
    fn from(children: Vec<Child<E>>) -> Self {
        Child::Fragment(children)
    }
}

impl<E> From<&str> for Child<E> {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl<E> From<String> for Child<E> {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl<E> From<f64> for Child<E> {
    fn from(n: f64) -> Self {
        Child::Number(n)
    }
}

/// Tag every element in `children` with `parent`.
///
/// Fragments keep their shape with primitives removed; a primitive or an
/// empty slot at the top level yields `None`.
pub fn tag_children<E: AcceptsParent>(children: Child<E>, parent: NodeId) -> Option<Child<E>> {
    match children {
        Child::Element(mut element) => {
            element.set_canvas_parent(parent);
            Some(Child::Element(element))
        }
        Child::Fragment(items) => {
            let tagged = items
                .into_iter()
                .filter_map(|child| tag_children(child, parent))
                .collect();
            Some(Child::Fragment(tagged))
        }
        Child::Text(_) | Child::Number(_) | Child::Empty => None,
    }
}
