//! Component base - lifecycle, reactive props, child composition.
//!
//! A [`Component`] gives a plain template function a lifecycle. The
//! state machine is driven entirely through the instance's private
//! event bus:
//!
//! ```text
//! Construct -> init -> render -> (driver) mounted -> render
//!                         ^                            |
//!                         +---- updated (gated) <------+-- set_props
//! ```
//!
//! The constructor partitions the input bag into props and children,
//! wires the four lifecycle handlers, and emits `init` synchronously -
//! the first render completes before the caller ever holds the
//! instance. Every later render replaces the whole rendered subtree:
//! there is no diffing by design.
//!
//! # Child composition
//!
//! The template never sees child components. Each child key is bound in
//! the template context to placeholder markup
//! (`<div data-id="{id}"></div>`, one per sequence element); after the
//! output is parsed, each stub is swapped in-place for the child's own
//! rendered root. A stub the template chose not to emit is tolerated
//! silently - that child is simply absent from this variant.
//!
//! # Example
//!
//! ```
//! use sprig::{template, Bag, Component};
//!
//! let button = template(|ctx| {
//!     format!(
//!         "<button href=\"{}\">{}</button>",
//!         ctx["url"].as_str().unwrap(),
//!         ctx["label"].as_str().unwrap(),
//!     )
//! });
//!
//! let mut bag = Bag::new();
//! bag.insert("label".into(), "Save".into());
//! bag.insert("url".into(), "#".into());
//!
//! let mut save = Component::new(button, bag).unwrap();
//! assert_eq!(save.content().unwrap().text_content(), "Save");
//!
//! save.set_prop("label", "Saved").unwrap();
//! assert_eq!(save.content().unwrap().text_content(), "Saved");
//! ```

mod props;

pub use props::{PropStore, CLASSES_KEY, EVENTS_KEY};

use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, trace};
use serde_json::Value;

use crate::bus::{self, EventArgs, EventBus, Lifecycle};
use crate::dom::{self, DomHandler, NodeRef};
use crate::error::Error;
use crate::registry;
use crate::types::{Bag, PropMap, PropValue, Slot, Template, TemplateContext};

// =============================================================================
// Hooks
// =============================================================================

/// Customization points a concrete component may supply. Every hook is
/// optional; defaults are a no-op creation/mount hook and a shallow
/// inequality update gate.
#[derive(Default, Clone)]
pub struct Hooks {
    /// Runs inside `init`, before the first render.
    pub on_created: Option<Rc<dyn Fn(&mut Component)>>,
    /// Runs on the `mounted` signal, before the re-render it triggers.
    pub on_mounted: Option<Rc<dyn Fn(&mut Component)>>,
    /// Decides whether an update re-renders, given the before/after
    /// property snapshots. Default: shallow value inequality.
    pub should_update: Option<Rc<dyn Fn(&PropMap, &PropMap) -> bool>>,
}

// =============================================================================
// Children
// =============================================================================

/// A named child entry: one component, or an ordered sequence rendered
/// under a single key.
pub enum Child {
    Single(Component),
    Sequence(Vec<Component>),
}

// =============================================================================
// Component
// =============================================================================

/// A unit with reactive props, optional named children, and a lifecycle
/// producing one rendered root node.
pub struct Component {
    /// Opaque token correlating this instance's subtree with its
    /// placeholder stub in a parent's template output. Immutable.
    id: String,
    props: PropStore,
    children: BTreeMap<String, Child>,
    /// Single root of the currently rendered subtree; `None` only
    /// before the first render inside the constructor.
    rendered: Option<NodeRef>,
    /// Listeners this instance attached to `rendered` from its `events`
    /// prop. Teardown removes exactly these: when a child's stub is the
    /// template's whole output, `rendered` aliases the child's own node
    /// and the child's wiring must survive a parent re-render.
    wired: Vec<(String, DomHandler)>,
    /// Private - lifecycle wiring is an implementation detail.
    bus: EventBus<Component>,
    template: Template,
    hooks: Hooks,
}

impl Component {
    /// Construct with default hooks. The input bag is partitioned into
    /// props and children; `init` (and through it the first render)
    /// fires before this returns.
    pub fn new(template: Template, bag: Bag) -> Result<Self, Error> {
        Self::with_hooks(template, bag, Hooks::default())
    }

    /// Construct with custom lifecycle hooks.
    ///
    /// Hooks run during construction (`on_created` fires inside the
    /// synchronous `init`), so they observe the instance before the
    /// caller does.
    pub fn with_hooks(template: Template, bag: Bag, hooks: Hooks) -> Result<Self, Error> {
        let mut prop_values = PropMap::new();
        let mut children = BTreeMap::new();
        for (key, slot) in bag {
            // Decided once, at the call site; a key lands in exactly
            // one of the three.
            match slot {
                Slot::Prop(value) => {
                    prop_values.insert(key, value);
                }
                Slot::Child(child) => {
                    children.insert(key, Child::Single(child));
                }
                Slot::Children(sequence) => {
                    children.insert(key, Child::Sequence(sequence));
                }
            }
        }

        let mut component = Self {
            id: registry::next_id(),
            props: PropStore::new(prop_values),
            children,
            rendered: None,
            wired: Vec::new(),
            bus: Self::lifecycle_bus(),
            template,
            hooks,
        };

        debug!(
            "constructed component {} ({} props, {} child keys)",
            component.id,
            component.props.len(),
            component.children.len()
        );
        component.emit(Lifecycle::Init, &EventArgs::None)?;
        Ok(component)
    }

    /// Wire the four lifecycle handlers.
    fn lifecycle_bus() -> EventBus<Component> {
        let mut bus = EventBus::new();

        bus.on(
            Lifecycle::Init,
            Rc::new(|c: &mut Component, _| {
                if let Some(hook) = c.hooks.on_created.clone() {
                    hook(c);
                }
                c.emit(Lifecycle::Render, &EventArgs::None)
            }),
        );

        bus.on(
            Lifecycle::Render,
            Rc::new(|c: &mut Component, _| c.render()),
        );

        // Every mount re-renders once even though content is already
        // current: listeners and classes are reapplied to a fresh tree.
        // Preserved contract, not an optimization target.
        bus.on(
            Lifecycle::Mounted,
            Rc::new(|c: &mut Component, _| {
                if let Some(hook) = c.hooks.on_mounted.clone() {
                    hook(c);
                }
                c.emit(Lifecycle::Render, &EventArgs::None)
            }),
        );

        bus.on(
            Lifecycle::Updated,
            Rc::new(|c: &mut Component, args| {
                let EventArgs::Update { old, new } = args else {
                    // The bus is private and `updated` is only ever
                    // emitted from `set_props` with both snapshots.
                    debug_assert!(false, "updated emitted without property snapshots");
                    return Ok(());
                };
                if c.update_changed(old, new) {
                    c.emit(Lifecycle::Render, &EventArgs::None)
                } else {
                    trace!("component {}: update gated, props unchanged", c.id);
                    Ok(())
                }
            }),
        );

        bus
    }

    fn emit(&mut self, event: Lifecycle, args: &EventArgs) -> Result<(), Error> {
        bus::emit(self, |c| c.bus.handlers(event), event, args)
    }

    fn update_changed(&self, old: &PropMap, new: &PropMap) -> bool {
        match &self.hooks.should_update {
            Some(hook) => hook(old, new),
            None => old != new,
        }
    }

    // =========================================================================
    // Render
    // =========================================================================

    /// Run the template against the current props, splice children over
    /// their stubs, and swap the result in for the previous subtree.
    fn render(&mut self) -> Result<(), Error> {
        let context = self.template_context();
        let markup = (self.template)(&context);
        let parsed = dom::parse(&markup)?;
        let root = self.splice_children(dom::single_root(parsed)?);

        if let Some(old) = self.rendered.take() {
            // Detach only the listeners this component wired: the old
            // node may be a child's own root (stub-as-root splice), and
            // the child's wiring is not ours to tear down.
            for (name, handler) in self.wired.drain(..) {
                old.remove_listener(&name, &handler);
            }
            old.replace_with(&root);
        }

        let wired: Vec<(String, DomHandler)> = self
            .props
            .events()
            .map(|events| {
                events
                    .iter()
                    .map(|(name, handler)| (name.clone(), Rc::clone(handler)))
                    .collect()
            })
            .unwrap_or_default();
        for (name, handler) in &wired {
            root.add_listener(name, Rc::clone(handler));
        }
        self.wired = wired;

        if let Some(classes) = self.props.classes() {
            root.add_classes(classes);
        }

        debug!("rendered component {}", self.id);
        self.rendered = Some(root);
        Ok(())
    }

    /// The `Data` props plus one placeholder markup string per child
    /// key (sequences concatenate placeholders in order).
    fn template_context(&self) -> TemplateContext {
        let mut context = self.props.data_context();
        for (key, child) in &self.children {
            let stubs = match child {
                Child::Single(c) => placeholder(c.id()),
                Child::Sequence(cs) => cs.iter().map(|c| placeholder(c.id())).collect(),
            };
            context.insert(key.clone(), Value::String(stubs));
        }
        context
    }

    /// Swap each child's rendered root over its `data-id` stub.
    ///
    /// A missing stub means the template variant omitted that child -
    /// tolerated silently. A stub that *is* the root swaps the whole
    /// root.
    fn splice_children(&self, mut root: NodeRef) -> NodeRef {
        for child in self.children.values() {
            match child {
                Child::Single(c) => root = Self::splice_one(root, c),
                Child::Sequence(cs) => {
                    for c in cs {
                        root = Self::splice_one(root, c);
                    }
                }
            }
        }
        root
    }

    fn splice_one(root: NodeRef, child: &Component) -> NodeRef {
        let Some(stub) = root.find_by_attr("data-id", child.id()) else {
            return root;
        };
        let Some(content) = child.content() else {
            return root;
        };
        if stub.ptr_eq(&root) {
            content
        } else {
            stub.replace_with(&content);
            root
        }
    }

    // =========================================================================
    // Public Operations
    // =========================================================================

    /// Merge a partial mapping into the props. One call is one update:
    /// the comparison gate and any re-render run once, not per key.
    pub fn set_props(&mut self, partial: PropMap) -> Result<(), Error> {
        let old = self.props.snapshot();
        self.props.merge(partial);
        let new = self.props.snapshot();
        self.emit(Lifecycle::Updated, &EventArgs::Update { old, new })
    }

    /// Convenience single-key [`set_props`](Self::set_props).
    pub fn set_prop(&mut self, key: &str, value: impl Into<PropValue>) -> Result<(), Error> {
        self.set_props([(key.to_string(), value.into())].into())
    }

    /// Property deletion is disallowed: always fails with
    /// [`Error::InvalidOperation`], leaving the store untouched.
    pub fn remove_prop(&mut self, key: &str) -> Result<(), Error> {
        Err(Error::prop_deletion(key))
    }

    /// The current rendered root, or `None` before the first render.
    pub fn content(&self) -> Option<NodeRef> {
        self.rendered.clone()
    }

    /// Advance the lifecycle to mounted. Called by the external driver
    /// once it has placed the content in the live document; never
    /// automatic.
    pub fn dispatch_mounted(&mut self) -> Result<(), Error> {
        self.emit(Lifecycle::Mounted, &EventArgs::None)
    }

    /// Make the rendered node visible (`display: block`).
    pub fn show(&self) {
        if let Some(node) = &self.rendered {
            node.set_style("display", "block");
        }
    }

    /// Hide the rendered node (`display: none`).
    pub fn hide(&self) {
        if let Some(node) = &self.rendered {
            node.set_style("display", "none");
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn props(&self) -> &PropStore {
        &self.props
    }

    /// Read one property.
    pub fn prop(&self, key: &str) -> Option<&PropValue> {
        self.props.get(key)
    }

    /// Invoke a function-valued property bound to the store.
    pub fn call_prop(&self, key: &str) -> Option<Value> {
        self.props.call(key)
    }

    /// A single named child.
    pub fn child(&self, key: &str) -> Option<&Component> {
        match self.children.get(key)? {
            Child::Single(c) => Some(c),
            Child::Sequence(_) => None,
        }
    }

    /// Mutable access to a single named child, e.g. to drive its props.
    pub fn child_mut(&mut self, key: &str) -> Option<&mut Component> {
        match self.children.get_mut(key)? {
            Child::Single(c) => Some(c),
            Child::Sequence(_) => None,
        }
    }

    /// A named child sequence.
    pub fn sequence(&self, key: &str) -> Option<&[Component]> {
        match self.children.get(key)? {
            Child::Sequence(cs) => Some(cs),
            Child::Single(_) => None,
        }
    }

    /// Mutable access to a named child sequence.
    pub fn sequence_mut(&mut self, key: &str) -> Option<&mut [Component]> {
        match self.children.get_mut(key)? {
            Child::Sequence(cs) => Some(cs),
            Child::Single(_) => None,
        }
    }

    /// Keys of all named children.
    pub fn child_keys(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }
}

fn placeholder(id: &str) -> String {
    format!("<div data-id=\"{id}\"></div>")
}

// =============================================================================
// Tests
// =============================================================================
