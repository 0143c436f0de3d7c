//! Inert document model.
//!
//! The runtime does not target a browser, so it carries its own minimal
//! node tree: just enough document for templates to render into and for
//! the component base to splice child subtrees, rewire event listeners
//! and toggle visibility.
//!
//! Nodes are shared handles ([`NodeRef`], an `Rc<RefCell<_>>`): a child
//! component keeps its rendered root while the same node sits inside the
//! parent's tree, so an in-place [`NodeRef::replace_with`] from either
//! side is visible to both. Parent links are `Weak` - the tree never
//! forms an `Rc` cycle.
//!
//! Everything is single-threaded and synchronous; there is no event
//! loop. [`NodeRef::dispatch`] exists so drivers and tests can fire the
//! handlers wired from a component's `events` prop.

mod parser;

pub use parser::{parse, single_root};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Handler attached to a node for a named document event.
pub type DomHandler = Rc<dyn Fn()>;

// =============================================================================
// Node Storage
// =============================================================================

enum NodeKind {
    Element {
        tag: String,
        /// Ordered so serialization is deterministic.
        attrs: BTreeMap<String, String>,
        listeners: Vec<(String, DomHandler)>,
    },
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Weak<RefCell<NodeData>>,
    children: Vec<NodeRef>,
}

/// Shared handle to an element or text node.
#[derive(Clone)]
pub struct NodeRef {
    inner: Rc<RefCell<NodeData>>,
}

// =============================================================================
// Construction
// =============================================================================

impl NodeRef {
    /// Create a detached element node.
    pub fn element(tag: &str) -> Self {
        Self::from_kind(NodeKind::Element {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            listeners: Vec::new(),
        })
    }

    /// Create a detached text node.
    pub fn text(content: &str) -> Self {
        Self::from_kind(NodeKind::Text(content.to_string()))
    }

    fn from_kind(kind: NodeKind) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NodeData {
                kind,
                parent: Weak::new(),
                children: Vec::new(),
            })),
        }
    }

    /// Append `child` to this node's child list, reparenting it.
    pub fn append_child(&self, child: &NodeRef) {
        child.inner.borrow_mut().parent = Rc::downgrade(&self.inner);
        self.inner.borrow_mut().children.push(child.clone());
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Identity comparison: do both handles point at the same node?
    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_element(&self) -> bool {
        matches!(self.inner.borrow().kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.inner.borrow().kind, NodeKind::Text(_))
    }

    /// Element tag name; `None` for text nodes.
    pub fn tag(&self) -> Option<String> {
        match &self.inner.borrow().kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// Attribute value; `None` for text nodes or absent attributes.
    pub fn attr(&self, name: &str) -> Option<String> {
        match &self.inner.borrow().kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    /// Snapshot of the child list.
    pub fn children(&self) -> Vec<NodeRef> {
        self.inner.borrow().children.clone()
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.inner.borrow().parent.upgrade().map(|inner| NodeRef { inner })
    }

    /// Concatenated text of this node and all descendants, in document
    /// order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let NodeKind::Text(content) = &self.inner.borrow().kind {
            out.push_str(content);
        }
        for child in self.children() {
            child.collect_text(out);
        }
    }

    /// Depth-first search (self included) for the first element whose
    /// `name` attribute equals `value`. This is how placeholder stubs
    /// are located by `data-id`.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeRef> {
        if self.attr(name).as_deref() == Some(value) {
            return Some(self.clone());
        }
        for child in self.children() {
            if let Some(found) = child.find_by_attr(name, value) {
                return Some(found);
            }
        }
        None
    }

    /// Count descendant elements (self included) carrying `name`.
    pub fn count_with_attr(&self, name: &str) -> usize {
        let here = usize::from(self.attr(name).is_some());
        here + self
            .children()
            .iter()
            .map(|child| child.count_with_attr(name))
            .sum::<usize>()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&self, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.inner.borrow_mut().kind {
            attrs.insert(name.to_string(), value.to_string());
        }
    }

    /// Remove an attribute. No-op when absent.
    pub fn remove_attr(&self, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.inner.borrow_mut().kind {
            attrs.remove(name);
        }
    }

    /// Swap this node for `new` inside its parent's child list.
    ///
    /// Returns false (and does nothing) when this node is detached.
    /// The replaced node is left parentless; `new` is reparented.
    pub fn replace_with(&self, new: &NodeRef) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        let mut parent_data = parent.inner.borrow_mut();
        let Some(pos) = parent_data
            .children
            .iter()
            .position(|child| child.ptr_eq(self))
        else {
            return false;
        };
        parent_data.children[pos] = new.clone();
        drop(parent_data);
        new.inner.borrow_mut().parent = Rc::downgrade(&parent.inner);
        self.inner.borrow_mut().parent = Weak::new();
        true
    }

    /// Merge space-separated class tokens into the `class` attribute,
    /// skipping tokens already present.
    pub fn add_classes(&self, tokens: &str) {
        let mut classes: Vec<String> = self
            .attr("class")
            .map(|existing| existing.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        for token in tokens.split_whitespace() {
            if !classes.iter().any(|c| c == token) {
                classes.push(token.to_string());
            }
        }
        if !classes.is_empty() {
            self.set_attr("class", &classes.join(" "));
        }
    }

    /// Whether the `class` attribute contains `token`.
    pub fn has_class(&self, token: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == token))
    }

    // =========================================================================
    // Inline Style
    // =========================================================================

    /// Read one property out of the `style` attribute.
    pub fn style(&self, prop: &str) -> Option<String> {
        self.style_decls()
            .into_iter()
            .find(|(name, _)| name == prop)
            .map(|(_, value)| value)
    }

    /// Set one property in the `style` attribute, preserving the rest.
    pub fn set_style(&self, prop: &str, value: &str) {
        let mut decls = self.style_decls();
        match decls.iter_mut().find(|(name, _)| name == prop) {
            Some((_, existing)) => *existing = value.to_string(),
            None => decls.push((prop.to_string(), value.to_string())),
        }
        self.write_style_decls(&decls);
    }

    /// Remove one property from the `style` attribute.
    pub fn remove_style(&self, prop: &str) {
        let mut decls = self.style_decls();
        decls.retain(|(name, _)| name != prop);
        if decls.is_empty() {
            self.remove_attr("style");
        } else {
            self.write_style_decls(&decls);
        }
    }

    fn style_decls(&self) -> Vec<(String, String)> {
        let Some(style) = self.attr("style") else {
            return Vec::new();
        };
        style
            .split(';')
            .filter_map(|decl| {
                let mut parts = decl.splitn(2, ':');
                let name = parts.next()?.trim();
                if name.is_empty() {
                    return None;
                }
                let value = parts.next().unwrap_or("").trim();
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    fn write_style_decls(&self, decls: &[(String, String)]) {
        let style = decls
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr("style", &style);
    }

    // =========================================================================
    // Event Listeners
    // =========================================================================

    /// Attach a handler for a named document event.
    pub fn add_listener(&self, event: &str, handler: DomHandler) {
        if let NodeKind::Element { listeners, .. } = &mut self.inner.borrow_mut().kind {
            listeners.push((event.to_string(), handler));
        }
    }

    /// Detach the first listener for `event` matching `handler` by
    /// identity. Returns whether one was removed.
    ///
    /// Nodes can be shared between components (a spliced child keeps
    /// its root while it sits in the parent's tree), so teardown must
    /// be able to target one owner's listeners without touching the
    /// other's.
    pub fn remove_listener(&self, event: &str, handler: &DomHandler) -> bool {
        if let NodeKind::Element { listeners, .. } = &mut self.inner.borrow_mut().kind {
            if let Some(pos) = listeners
                .iter()
                .position(|(name, h)| name == event && Rc::ptr_eq(h, handler))
            {
                listeners.remove(pos);
                return true;
            }
        }
        false
    }

    /// Detach every listener on this node.
    pub fn clear_listeners(&self) {
        if let NodeKind::Element { listeners, .. } = &mut self.inner.borrow_mut().kind {
            listeners.clear();
        }
    }

    /// Number of listeners attached for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        match &self.inner.borrow().kind {
            NodeKind::Element { listeners, .. } => {
                listeners.iter().filter(|(name, _)| name == event).count()
            }
            NodeKind::Text(_) => 0,
        }
    }

    /// Fire every handler attached for `event` on this node,
    /// synchronously and in attachment order. Returns how many ran.
    pub fn dispatch(&self, event: &str) -> usize {
        // Snapshot first so handlers may mutate the node freely.
        let handlers: Vec<DomHandler> = match &self.inner.borrow().kind {
            NodeKind::Element { listeners, .. } => listeners
                .iter()
                .filter(|(name, _)| name == event)
                .map(|(_, handler)| Rc::clone(handler))
                .collect(),
            NodeKind::Text(_) => Vec::new(),
        };
        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize this node and its subtree back to markup.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match &self.inner.borrow().kind {
            NodeKind::Text(content) => out.push_str(&escape_text(content)),
            NodeKind::Element { tag, attrs, .. } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if parser::is_void_element(tag) {
                    return;
                }
                for child in self.children() {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({})", self.outer_html())
    }
}

// =============================================================================
// Escaping
// =============================================================================

fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(input: &str) -> String {
    escape_text(input).replace('"', "&quot;")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_attrs_and_text() {
        let button = NodeRef::element("button");
        button.set_attr("type", "submit");
        button.append_child(&NodeRef::text("Save"));

        assert!(button.is_element());
        assert_eq!(button.tag().as_deref(), Some("button"));
        assert_eq!(button.attr("type").as_deref(), Some("submit"));
        assert_eq!(button.text_content(), "Save");
    }

    #[test]
    fn test_text_content_is_document_order() {
        let root = NodeRef::element("p");
        root.append_child(&NodeRef::text("a"));
        let strong = NodeRef::element("strong");
        strong.append_child(&NodeRef::text("b"));
        root.append_child(&strong);
        root.append_child(&NodeRef::text("c"));

        assert_eq!(root.text_content(), "abc");
    }

    #[test]
    fn test_find_by_attr_depth_first() {
        let root = NodeRef::element("div");
        let inner = NodeRef::element("div");
        let stub = NodeRef::element("div");
        stub.set_attr("data-id", "c7");
        inner.append_child(&stub);
        root.append_child(&inner);

        let found = root.find_by_attr("data-id", "c7").unwrap();
        assert!(found.ptr_eq(&stub));
        assert!(root.find_by_attr("data-id", "missing").is_none());
    }

    #[test]
    fn test_replace_with_swaps_in_parent() {
        let root = NodeRef::element("div");
        let old = NodeRef::element("span");
        let sibling = NodeRef::element("em");
        root.append_child(&old);
        root.append_child(&sibling);

        let new = NodeRef::element("button");
        assert!(old.replace_with(&new));

        let children = root.children();
        assert_eq!(children.len(), 2);
        assert!(children[0].ptr_eq(&new));
        assert!(children[1].ptr_eq(&sibling));
        assert!(new.parent().unwrap().ptr_eq(&root));
        assert!(old.parent().is_none());
    }

    #[test]
    fn test_replace_with_detached_is_noop() {
        let detached = NodeRef::element("div");
        assert!(!detached.replace_with(&NodeRef::element("span")));
    }

    #[test]
    fn test_add_classes_merges_without_duplicates() {
        let node = NodeRef::element("div");
        node.add_classes("btn primary");
        node.add_classes("primary large");

        assert_eq!(node.attr("class").as_deref(), Some("btn primary large"));
        assert!(node.has_class("btn"));
        assert!(!node.has_class("missing"));
    }

    #[test]
    fn test_style_roundtrip() {
        let node = NodeRef::element("div");
        node.set_style("display", "none");
        node.set_style("color", "red");
        assert_eq!(node.style("display").as_deref(), Some("none"));

        node.set_style("display", "block");
        assert_eq!(node.style("display").as_deref(), Some("block"));
        assert_eq!(node.style("color").as_deref(), Some("red"));

        node.remove_style("display");
        assert!(node.style("display").is_none());
        assert_eq!(node.attr("style").as_deref(), Some("color: red"));

        node.remove_style("color");
        assert!(node.attr("style").is_none());
    }

    #[test]
    fn test_dispatch_runs_matching_listeners_in_order() {
        use std::cell::RefCell;

        let node = NodeRef::element("button");
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_a = Rc::clone(&log);
        node.add_listener("click", Rc::new(move || log_a.borrow_mut().push("a")));
        let log_b = Rc::clone(&log);
        node.add_listener("click", Rc::new(move || log_b.borrow_mut().push("b")));
        let log_c = Rc::clone(&log);
        node.add_listener("hover", Rc::new(move || log_c.borrow_mut().push("c")));

        assert_eq!(node.dispatch("click"), 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(node.listener_count("hover"), 1);

        node.clear_listeners();
        assert_eq!(node.dispatch("click"), 0);
    }

    #[test]
    fn test_remove_listener_is_identity_scoped() {
        let node = NodeRef::element("button");
        let mine: DomHandler = Rc::new(|| {});
        let other: DomHandler = Rc::new(|| {});
        node.add_listener("click", Rc::clone(&mine));
        node.add_listener("click", Rc::clone(&other));

        assert!(node.remove_listener("click", &mine));
        // Already gone: removal is a no-op, not an error.
        assert!(!node.remove_listener("click", &mine));
        assert_eq!(node.listener_count("click"), 1);
        assert!(node.remove_listener("click", &other));
        assert_eq!(node.listener_count("click"), 0);
    }

    #[test]
    fn test_outer_html_escapes() {
        let node = NodeRef::element("div");
        node.set_attr("title", "a \"b\" & c");
        node.append_child(&NodeRef::text("1 < 2"));

        assert_eq!(
            node.outer_html(),
            "<div title=\"a &quot;b&quot; &amp; c\">1 &lt; 2</div>"
        );
    }

    #[test]
    fn test_outer_html_void_element() {
        let node = NodeRef::element("div");
        node.append_child(&NodeRef::element("br"));
        assert_eq!(node.outer_html(), "<div><br></div>");
    }
}
