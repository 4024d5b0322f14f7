use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Click delivered to a listener while bubbling from `target` towards the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: NodeId,
    pub current_target: NodeId,
}

pub type ClickHandler = Arc<dyn Fn(&mut Document, &ClickEvent) + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("{0} does not exist")]
    Missing(NodeId),
    #[error("{0} is not an element")]
    NotAnElement(NodeId),
    #[error("appending {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

/// Ordered inline style declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    declarations: Vec<(String, String)>,
}

impl Style {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self.declarations.iter_mut().find(|(name, _)| name == property) {
            Some(slot) => slot.1 = value,
            None => self.declarations.push((property.to_string(), value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn to_css(&self) -> String {
        self.declarations
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: Style,
    children: Vec<NodeId>,
    listeners: Vec<ClickHandler>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            style: Style::default(),
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|existing| existing == class)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("classes", &self.classes)
            .field("style", &self.style)
            .field("children", &self.children)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[derive(Debug)]
enum NodeKind {
    Element(Element),
    Text(String),
    /// Markup inserted verbatim, never escaped on output.
    Markup(String),
}

#[derive(Debug)]
struct NodeSlot {
    kind: NodeKind,
    parent: Option<NodeId>,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Option<NodeSlot>>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    revision: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates `<html><head></head><body></body></html>`.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            revision: 0,
        };
        let root = doc.alloc(NodeKind::Element(Element::new("html")));
        let head = doc.alloc(NodeKind::Element(Element::new("head")));
        let body = doc.alloc(NodeKind::Element(Element::new("body")));
        doc.link(root, head);
        doc.link(root, body);
        doc.root = root;
        doc.head = head;
        doc.body = body;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(Element::new(tag)))
    }

    /// Starts a detached element; attach it with [`Document::append_child`].
    pub fn build(&mut self, tag: &str) -> ElementBuilder<'_> {
        let id = self.create_element(tag);
        ElementBuilder { doc: self, id }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.slot(id)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id)?.parent
    }

    /// True when the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.contains(child) {
            return Err(DomError::Missing(child));
        }
        match self.slot(parent) {
            None => return Err(DomError::Missing(parent)),
            Some(NodeSlot {
                kind: NodeKind::Element(_),
                ..
            }) => {}
            Some(_) => return Err(DomError::NotAnElement(parent)),
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        self.detach(child);
        self.link(parent, child);
        self.touch();
        Ok(())
    }

    /// Detaches the node and drops its subtree. Returns false if it was already gone.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.contains(id) || id == self.root {
            return false;
        }
        self.detach(id);
        self.drop_subtree(id);
        self.touch();
        true
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        if name == "class" {
            element.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            element.attributes.insert(name.to_string(), value);
        }
        self.touch();
        true
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        if !element.has_class(class) {
            element.classes.push(class.to_string());
        }
        self.touch();
        true
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: impl Into<String>) -> bool {
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        element.style.set(property, value);
        self.touch();
        true
    }

    pub fn add_click_listener(&mut self, id: NodeId, handler: ClickHandler) -> bool {
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        element.listeners.push(handler);
        self.touch();
        true
    }

    /// Replaces all children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        let text = text.into();
        if text.is_empty() {
            return self.replace_children(id, None);
        }
        self.replace_children(id, Some(NodeKind::Text(text)))
    }

    /// Replaces all children with raw markup. The markup is not escaped.
    pub fn set_inner_html(&mut self, id: NodeId, markup: impl Into<String>) -> bool {
        self.replace_children(id, Some(NodeKind::Markup(markup.into())))
    }

    /// Concatenated text of the subtree; raw markup contributes its text with tags stripped.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    /// Connected nodes in document order, starting at `from`.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slot(id) else {
                continue;
            };
            out.push(id);
            if let NodeKind::Element(element) = &slot.kind {
                stack.extend(element.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_elements(|element| element.id() == Some(id))
            .into_iter()
            .next()
    }

    pub fn elements_with_attribute(&self, name: &str) -> Vec<NodeId> {
        self.find_elements(|element| element.attribute(name).is_some())
    }

    pub fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        self.find_elements(|element| element.has_class(class))
    }

    pub fn find_elements(&self, predicate: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.element(*id).is_some_and(&predicate))
            .collect()
    }

    /// Nearest inclusive ancestor carrying `class`.
    pub fn closest_with_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.element(node).is_some_and(|element| element.has_class(class)) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Delivers a click to `target` and bubbles it to the root.
    ///
    /// The propagation path is fixed before any listener runs, so a listener
    /// that removes an ancestor does not stop the remaining listeners from
    /// seeing the event. Returns false when the target is not connected.
    pub fn dispatch_click(&mut self, target: NodeId) -> bool {
        if !self.is_connected(target) {
            return false;
        }
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(node) = current {
            if let Some(element) = self.element(node) {
                path.extend(
                    element
                        .listeners
                        .iter()
                        .map(|handler| (node, Arc::clone(handler))),
                );
            }
            current = self.parent(node);
        }
        for (current_target, handler) in path {
            handler(
                self,
                &ClickEvent {
                    target,
                    current_target,
                },
            );
        }
        true
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    pub fn to_html(&self) -> String {
        format!("<!DOCTYPE html>\n{}", self.outer_html(self.root))
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Some(NodeSlot { kind, parent: None }));
        NodeId(self.nodes.len() - 1)
    }

    fn slot(&self, id: NodeId) -> Option<&NodeSlot> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.slot_mut(id)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(element) = self.element_mut(parent) {
            element.children.push(child);
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.slot_mut(id).and_then(|slot| slot.parent.take()) else {
            return;
        };
        if let Some(element) = self.element_mut(parent) {
            element.children.retain(|child| *child != id);
        }
    }

    fn drop_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let Some(slot) = self.nodes.get_mut(node.0).and_then(Option::take) else {
                continue;
            };
            if let NodeKind::Element(element) = slot.kind {
                stack.extend(element.children);
            }
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, of: NodeId) -> bool {
        let mut current = Some(of);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    fn replace_children(&mut self, id: NodeId, kind: Option<NodeKind>) -> bool {
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        let old = std::mem::take(&mut element.children);
        for child in old {
            self.drop_subtree(child);
        }
        if let Some(kind) = kind {
            let child = self.alloc(kind);
            self.link(id, child);
        }
        self.touch();
        true
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.slot(id).map(|slot| &slot.kind) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Markup(markup)) => out.push_str(&strip_tags(markup)),
            Some(NodeKind::Element(element)) => {
                for child in &element.children {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match self.slot(id).map(|slot| &slot.kind) {
            Some(NodeKind::Text(text)) if raw_text => out.push_str(text),
            Some(NodeKind::Text(text)) => out.push_str(&escape_text(text)),
            Some(NodeKind::Markup(markup)) => out.push_str(markup),
            Some(NodeKind::Element(element)) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attributes {
                    out.push_str(&format!(" {name}=\"{}\"", escape_attribute(value)));
                }
                if !element.classes.is_empty() {
                    out.push_str(&format!(
                        " class=\"{}\"",
                        escape_attribute(&element.classes.join(" "))
                    ));
                }
                if !element.style.is_empty() {
                    out.push_str(&format!(
                        " style=\"{}\"",
                        escape_attribute(&element.style.to_css())
                    ));
                }
                out.push('>');
                if VOID_TAGS.contains(&element.tag.as_str()) {
                    return;
                }
                let raw = matches!(element.tag.as_str(), "style" | "script");
                for child in &element.children {
                    self.write_node(*child, raw, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
            None => {}
        }
    }
}

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Fluent construction of a detached element.
pub struct ElementBuilder<'a> {
    doc: &'a mut Document,
    id: NodeId,
}

impl ElementBuilder<'_> {
    pub fn attr(self, name: &str, value: impl Into<String>) -> Self {
        self.doc.set_attribute(self.id, name, value);
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.doc.add_class(self.id, class);
        self
    }

    pub fn style(self, property: &str, value: impl Into<String>) -> Self {
        self.doc.set_style(self.id, property, value);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.doc.set_text(self.id, text);
        self
    }

    pub fn markup(self, markup: impl Into<String>) -> Self {
        self.doc.set_inner_html(self.id, markup);
        self
    }

    pub fn on_click(self, handler: ClickHandler) -> Self {
        self.doc.add_click_listener(self.id, handler);
        self
    }

    pub fn finish(self) -> NodeId {
        self.id
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn strip_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            other if !in_tag => out.push(other),
            _ => {}
        }
    }
    out
}
